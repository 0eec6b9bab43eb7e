pub mod config;
pub mod diagnostics;
pub mod error;
pub mod post;
pub mod rules;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::{AppConfig, PluginParams};
pub use error::{Error, Result};
pub use scheduler::{CronRequest, DispatchOutcome, RuleEngine, RunReport};
