mod applier;
mod loader;
mod matcher;

pub use applier::{ActionApplier, ActionResult, ActionStep};
pub use loader::{load_rules, Rule, RuleAction, MAX_DAYS, MIN_DAYS, RULE_SLOTS};
pub use matcher::{cutoff_for, PostMatcher};
