//! Plain-text diagnostics file shared with the blog's own diagnostics.
//!
//! The file is created on first use with a short header. Every run that
//! touched posts appends one summary block. Appends hold an exclusive file
//! lock so overlapping cron invocations do not interleave their blocks.

use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::scheduler::ProcessedEntry;
use crate::Result;

const RULE_WIDTH: usize = 80;
const TITLE_LIMIT: usize = 50;
const PHP_GUARD: &str = "<?php defined('_JEXEC') or die; ?>";

#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    path: PathBuf,
    php_guard: bool,
}

impl DiagnosticsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            php_guard: true,
        }
    }

    /// Build from configuration; `None` when diagnostics are turned off
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.diagnostics.enabled {
            return None;
        }
        Some(Self::new(config.diagnostics_path()).with_php_guard(config.diagnostics.php_guard))
    }

    pub fn with_php_guard(mut self, php_guard: bool) -> Self {
        self.php_guard = php_guard;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a run summary, creating the file with its header if needed
    pub fn append_summary(
        &self,
        entries: &[ProcessedEntry],
        development_mode: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.append(&format_summary(entries, development_mode, now), now)
    }

    fn header(&self, now: DateTime<Utc>) -> String {
        let mut header = String::new();
        if self.php_guard {
            header.push_str(PHP_GUARD);
            header.push('\n');
        }
        header.push_str("Blog Diagnostics Log File\n");
        header.push_str(&format!("Generated: {}\n", timestamp(now)));
        header
    }

    fn append(&self, block: &str, now: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // The header check happens under the lock so only the first writer adds it
        file.lock()?;
        let written = self.write_locked(&mut file, block, now);
        file.unlock()?;
        written
    }

    fn write_locked(&self, file: &mut File, block: &str, now: DateTime<Utc>) -> Result<()> {
        if file.metadata()?.len() == 0 {
            file.write_all(self.header(now).as_bytes())?;
        }
        file.write_all(block.as_bytes())?;
        Ok(())
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_LIMIT {
        let mut short: String = title.chars().take(TITLE_LIMIT).collect();
        short.push_str("...");
        short
    } else {
        title.to_string()
    }
}

/// Render the summary block for one run
pub fn format_summary(
    entries: &[ProcessedEntry],
    development_mode: bool,
    now: DateTime<Utc>,
) -> String {
    let mode = if development_mode { " (DEVELOPMENT MODE)" } else { "" };
    let test_only = if development_mode { " [TEST ONLY]" } else { "" };

    let mut out = String::new();
    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&format!(
        "[{}] Blog Auto Expire{} - Processed {} posts\n",
        timestamp(now),
        mode,
        entries.len()
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for entry in entries {
        out.push_str(&format!(
            "Post ID: {} | Title: {} | Action: {} | Rule: {} | Search: '{}' | Days: {}{}\n",
            entry.post_id,
            truncate_title(&entry.title),
            entry.action,
            entry.rule_slot,
            entry.search_term,
            entry.days,
            test_only
        ));
    }

    if development_mode {
        out.push_str("\n*** DEVELOPMENT MODE ACTIVE - NO ACTUAL CHANGES MADE ***\n");
    }

    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out
}
