pub mod config;
pub mod models;
pub mod safety;

use tracing_subscriber::EnvFilter;

pub use config::EngineConfig;
pub use models::{Allergy, Medication, MedicationStatus};
pub use safety::{SafetyEngine, SafetyError, SafetyReport};

/// Install the global fmt subscriber. `RUST_LOG` wins over the default
/// filter; later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} safety engine v{}", config::APP_NAME, config::APP_VERSION);
    }
}
