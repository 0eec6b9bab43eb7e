use anyhow::Result;
use tracing::error;

use autoexpire_core::{
    diagnostics::DiagnosticsLog,
    scheduler::SkipReason,
    storage::{Database, PostRepository},
    AppConfig, CronRequest, DispatchOutcome, RuleEngine, RunReport,
};

pub async fn run(config: &AppConfig, request: CronRequest, dry_run: bool) -> Result<()> {
    // A missing database is logged, never surfaced to the cron caller
    let db = match Database::new(config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Could not open blog database: {}", e);
            return Ok(());
        }
    };

    let mut params = config.params.clone();
    if dry_run {
        params.set("development_mode", true);
    }

    let store = PostRepository::new(&db, &config.store.required_feature);
    let engine = RuleEngine::new(store, params)
        .with_diagnostics(DiagnosticsLog::from_config(config));

    match engine.on_request(&request).await {
        DispatchOutcome::Completed(report) => print_report(&report),
        DispatchOutcome::Skipped(SkipReason::NoRules) => {
            println!("No rules configured.");
        }
        DispatchOutcome::Skipped(SkipReason::NotCron) => {
            println!("Not a site cron request, nothing to do.");
        }
        DispatchOutcome::Skipped(SkipReason::FeatureUnavailable) => {
            println!(
                "Blog feature '{}' is not available, nothing to do.",
                config.store.required_feature
            );
        }
        // Already logged by the engine
        DispatchOutcome::Failed(_) => {}
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    if report.processed() == 0 {
        println!("No posts matched.");
        return;
    }

    if report.development_mode {
        println!("Development mode: no posts were changed.\n");
    }

    for entry in &report.entries {
        println!(
            "  #{} {} - {} (rule {}: '{}' older than {} days)",
            entry.post_id, entry.title, entry.action, entry.rule_slot, entry.search_term, entry.days
        );
    }

    println!("\n{} posts processed.", report.processed());
    if report.failures > 0 {
        println!("{} posts had errors, see the log for details.", report.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoexpire_core::storage::PostStore;
    use chrono::{Duration, Utc};

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.general.data_dir = dir.to_path_buf();
        config.diagnostics.log_file = Some(dir.join("diag.php"));
        config
    }

    #[tokio::test]
    async fn test_unopenable_database_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let mut config = config_in(dir.path());
        config.store.database_path = Some(blocker.join("blog.db"));

        assert!(run(&config, CronRequest::scheduled(), false).await.is_ok());
        assert!(!dir.path().join("diag.php").exists());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_posts_published() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.params.set("rule1_enabled", true);
        config.params.set("rule1_title", "Sale");
        config.params.set("rule1_days", 7);

        let db = Database::new(&config).await.unwrap();
        let repo = PostRepository::new(&db, &config.store.required_feature);
        let id = repo
            .create("Summer Sale", Utc::now() - Duration::days(10), true)
            .await
            .unwrap();

        run(&config, CronRequest::scheduled(), true).await.unwrap();

        assert!(repo.fetch_by_id(id).await.unwrap().unwrap().is_published());
        let diagnostics = std::fs::read_to_string(dir.path().join("diag.php")).unwrap();
        assert!(diagnostics.contains("would disable"));
        assert!(diagnostics.contains("[TEST ONLY]"));
    }
}
