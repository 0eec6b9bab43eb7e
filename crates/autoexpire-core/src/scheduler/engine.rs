use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::CronRequest;
use crate::config::PluginParams;
use crate::diagnostics::DiagnosticsLog;
use crate::rules::{load_rules, ActionApplier, PostMatcher};
use crate::storage::PostStore;
use crate::Result;

/// One post acted upon (or that would have been, in development mode)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEntry {
    pub post_id: i64,
    pub title: String,
    /// Action label, e.g. "archived" or "would disable"
    pub action: String,
    /// 1-based slot of the rule that matched
    pub rule_slot: usize,
    pub search_term: String,
    pub days: u32,
    pub development_mode: bool,
}

/// Result of one pass over all rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries: Vec<ProcessedEntry>,
    pub development_mode: bool,
    /// Posts where at least one store write failed
    pub failures: usize,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The blog or its required feature is missing
    FeatureUnavailable,
    /// Not a site-side cron request
    NotCron,
    /// No usable rule configured
    NoRules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Completed(RunReport),
    /// The run hit an unexpected error; already logged
    Failed(String),
}

/// Applies the configured expiration rules to the blog's posts.
///
/// All work for one invocation happens sequentially. Nothing here ever
/// returns an error to the caller: failures are logged and folded into the
/// returned `DispatchOutcome`.
pub struct RuleEngine<S: PostStore> {
    store: S,
    params: PluginParams,
    diagnostics: Option<DiagnosticsLog>,
    feature_available: OnceCell<bool>,
}

impl<S: PostStore> RuleEngine<S> {
    pub fn new(store: S, params: PluginParams) -> Self {
        Self {
            store,
            params,
            diagnostics: None,
            feature_available: OnceCell::new(),
        }
    }

    /// Set the diagnostics file for run summaries
    pub fn with_diagnostics(mut self, diagnostics: Option<DiagnosticsLog>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Feature gate, checked against the store once per engine
    pub async fn feature_available(&self) -> bool {
        *self
            .feature_available
            .get_or_init(|| async {
                match self.store.is_enabled().await {
                    Ok(enabled) => enabled,
                    Err(e) => {
                        debug!(error = %e, "Blog feature check failed");
                        false
                    }
                }
            })
            .await
    }

    /// Entry point for an incoming request
    pub async fn on_request(&self, request: &CronRequest) -> DispatchOutcome {
        if !self.feature_available().await {
            debug!("Blog not found or not enabled, skipping");
            return DispatchOutcome::Skipped(SkipReason::FeatureUnavailable);
        }

        debug!(
            task = request.task.as_deref().unwrap_or(""),
            cron = request.cron,
            client = ?request.client,
            "Checking cron parameters"
        );

        if !request.is_cron() {
            debug!("Cron conditions not met, skipping");
            return DispatchOutcome::Skipped(SkipReason::NotCron);
        }

        self.process_expired_posts().await
    }

    pub async fn process_expired_posts(&self) -> DispatchOutcome {
        self.process_expired_posts_at(Utc::now()).await
    }

    /// Run every rule as of `now`
    pub async fn process_expired_posts_at(&self, now: DateTime<Utc>) -> DispatchOutcome {
        match self.run(now).await {
            Ok(Some(report)) => DispatchOutcome::Completed(report),
            Ok(None) => DispatchOutcome::Skipped(SkipReason::NoRules),
            Err(e) => {
                error!(error = %e, "Blog Auto Expire run failed");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<Option<RunReport>> {
        let rules = load_rules(&self.params);
        let development_mode = self.params.development_mode();

        debug!(
            "Found {} rules, development mode: {}",
            rules.len(),
            if development_mode { "YES" } else { "NO" }
        );

        if rules.is_empty() {
            debug!("No rules configured, exiting");
            return Ok(None);
        }

        let matcher = PostMatcher::new(&self.store);
        let applier = ActionApplier::new(&self.store);
        let mut report = RunReport {
            development_mode,
            ..RunReport::default()
        };

        for rule in &rules {
            let posts = matcher.find_matches(rule, now).await?;

            for post in posts {
                debug!(
                    post_id = post.id,
                    title = %post.title,
                    created = %post.created.format("%Y-%m-%d %H:%M:%S"),
                    "Post found"
                );

                let Some(current) = self.store.fetch_by_id(post.id).await? else {
                    debug!(post_id = post.id, "Post disappeared before processing");
                    continue;
                };

                let result = applier.apply(&current, rule.action, development_mode).await;
                if !result.is_success() {
                    report.failures += 1;
                }

                report.entries.push(ProcessedEntry {
                    post_id: current.id,
                    title: post.title,
                    action: result.label().to_string(),
                    rule_slot: rule.slot,
                    search_term: rule.title_search.clone(),
                    days: rule.days,
                    development_mode,
                });
            }
        }

        if report.processed() > 0 {
            if let Some(log) = &self.diagnostics {
                if let Err(e) = log.append_summary(&report.entries, development_mode, now) {
                    warn!(
                        path = %log.path().display(),
                        "Failed to write to blog diagnostics log: {}",
                        e
                    );
                }
            }

            if development_mode {
                info!(
                    "Blog Auto Expire (development mode) would have processed {} posts",
                    report.processed()
                );
            } else {
                info!("Blog Auto Expire processed {} posts", report.processed());
            }
        }

        Ok(Some(report))
    }
}
