//! Rule engine: every validation rule, evaluated concurrently.

pub mod alignment;
pub mod checks;

pub use alignment::{Alignment, AlignmentMatrix};

use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::checks::{DistanceChecker, EmployerVerifier, NameBlacklist};
use crate::intake::{ApplicationData, RedFlag, RuleId};

/// Owns the services the rules consult.
pub struct RuleEngine {
    blacklist: Arc<NameBlacklist>,
    employer: Arc<EmployerVerifier>,
    distance: Arc<DistanceChecker>,
    matrix: Arc<AlignmentMatrix>,
    distance_limit_km: f64,
}

impl RuleEngine {
    pub fn new(
        blacklist: Arc<NameBlacklist>,
        employer: Arc<EmployerVerifier>,
        distance: Arc<DistanceChecker>,
        matrix: Arc<AlignmentMatrix>,
        distance_limit_km: f64,
    ) -> Self {
        Self {
            blacklist,
            employer,
            distance,
            matrix,
            distance_limit_km,
        }
    }

    async fn run(&self, rule: RuleId, app: &ApplicationData) -> Option<RedFlag> {
        match rule {
            RuleId::BlacklistCheck => checks::check_blacklist(app, &self.blacklist).await,
            RuleId::EmployerVerificationCheck => checks::check_employer(app, &self.employer).await,
            RuleId::DistanceCheck => {
                checks::check_distance(app, &self.distance, self.distance_limit_km).await
            }
            RuleId::PoliticalExposureCheck => checks::check_political_exposure(app),
            RuleId::SourceOfFundsAlignmentCheck => checks::check_source_of_funds(app, &self.matrix),
        }
    }

    /// Run every rule concurrently. Flags come back in rule priority order,
    /// independent of which rule finished first.
    pub async fn validate(&self, app: &ApplicationData) -> Vec<RedFlag> {
        let span = tracing::info_span!("validate", validation_id = %uuid::Uuid::new_v4());

        async {
            let outcomes = join_all(RuleId::PRIORITY.iter().map(|rule| self.run(*rule, app))).await;
            let flags: Vec<RedFlag> = outcomes.into_iter().flatten().collect();

            tracing::info!(
                red_flags = flags.len(),
                rules = ?flags.iter().map(|f| f.rule.as_str()).collect::<Vec<_>>(),
                "Validation complete"
            );
            flags
        }
        .instrument(span)
        .await
    }
}
