//! External capabilities the checks depend on.
//!
//! Each capability is a trait so checks can be exercised against in-memory
//! fakes; the concrete HTTP implementations live alongside the traits.

pub mod cache;
pub mod geocode;
pub mod table;
pub mod web_search;

pub use cache::CachedSet;
pub use geocode::{Coordinates, GeoStatus, GeocodeResponse, Geocoder, GoogleGeocoder};
pub use table::{HttpCsvFetcher, TableFetcher, TableRow, parse_csv};
pub use web_search::{CompanyJudgment, Verdict, WebJudge, WebSearchJudge};
