use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PluginParams;

/// Number of rule slots read from the parameters
pub const RULE_SLOTS: usize = 9;
pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 3650;

const DEFAULT_DAYS: i64 = 30;

/// What happens to a post matched by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Unpublish the post
    #[default]
    Disable,
    /// Move the post to the archived state
    Archive,
    /// Archive, then unpublish
    Both,
}

impl RuleAction {
    /// Parse a configured action; anything unknown falls back to `Disable`
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "disable" => Self::Disable,
            "archive" => Self::Archive,
            "both" => Self::Both,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Archive => "archive",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated expiration rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// 1-based parameter slot the rule was read from
    pub slot: usize,
    pub title_search: String,
    pub days: u32,
    pub action: RuleAction,
}

/// Read every rule slot and keep the usable ones, in slot order.
///
/// A slot is used only when it is enabled, has a non-blank title search and
/// a day count within `MIN_DAYS..=MAX_DAYS`. Anything else is skipped quietly:
/// half-filled slots are normal.
pub fn load_rules(params: &PluginParams) -> Vec<Rule> {
    let mut rules = Vec::new();

    for slot in 1..=RULE_SLOTS {
        let enabled = params.get_bool(&format!("rule{slot}_enabled"), false);
        let title = params.get_string(&format!("rule{slot}_title"), "");
        let days = params.get_int(&format!("rule{slot}_days"), DEFAULT_DAYS);
        let action = params.get_string(&format!("rule{slot}_action"), "disable");

        tracing::debug!(
            slot,
            enabled,
            title = %title,
            days,
            action = %action,
            "Reading rule slot"
        );

        let title_search = title.trim();
        if !enabled || title_search.is_empty() || !(MIN_DAYS..=MAX_DAYS).contains(&days) {
            tracing::debug!(slot, "Rule slot skipped");
            continue;
        }

        rules.push(Rule {
            slot,
            title_search: title_search.to_string(),
            days: days as u32,
            action: RuleAction::parse_or_default(&action),
        });
    }

    tracing::debug!("Loaded {} rules", rules.len());
    rules
}
