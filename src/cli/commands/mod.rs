//! CLI command implementations.

mod analyze;
mod config;
mod doctor;
mod format;
mod pull;
mod transcribe;

pub use analyze::run_analyze;
pub use config::run_config;
pub use doctor::run_doctor;
pub use format::run_format;
pub use pull::run_pull;
pub use transcribe::run_transcribe;
