//! Individual verification services used by the rule engine and tools.

pub mod blacklist;
pub mod distance;
pub mod employer;

pub use blacklist::NameBlacklist;
pub use distance::{DistanceCheck, DistanceChecker, GeoLookup, GeocodeResult, geodesic_km};
pub use employer::{EmployerVerifier, PassedBy, VerificationResult, VerificationSource};
