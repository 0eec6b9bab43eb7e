mod dispatch;
mod engine;

pub use dispatch::{Client, CronRequest};
pub use engine::{DispatchOutcome, ProcessedEntry, RuleEngine, RunReport, SkipReason};
