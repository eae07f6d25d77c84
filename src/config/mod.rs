//! Layered configuration
//!
//! Embedded defaults, then the user and repository files (or a single
//! explicit file), then `NUCLEI_STEP_` environment variables.

pub mod core;
pub mod formats;
pub mod smart_load;

pub use self::core::{ConfigSources, HttpConfig, RemoteConfig, ScanConfig, StepConfig};
pub use formats::ConfigFormat;
