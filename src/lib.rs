pub mod analytics;
pub mod authorization;
pub mod clinic;
pub mod config;
pub mod db;
pub mod error;
pub mod measurements;
pub mod models;
pub mod notifications;
pub mod prescriptions;
pub mod vitals;

mod phi_audit;

#[cfg(test)]
pub(crate) mod test_support;

pub use authorization::{Caller, IdentityGate, UserDirectory};
pub use clinic::{Clinic, PatientCard};
pub use config::ClinicConfig;
pub use error::{ClinicError, ValidationError, Violation};
pub use notifications::{CareTeam, ConsultingCareTeam};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured filter. Later calls are no-ops.
pub fn init_logging(settings: &ClinicConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_twice_is_harmless() {
        let settings = ClinicConfig::default();
        init_logging(&settings);
        init_logging(&settings);
    }
}
