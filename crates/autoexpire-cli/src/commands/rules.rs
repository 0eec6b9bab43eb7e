use anyhow::Result;

use autoexpire_core::{rules::load_rules, AppConfig};

pub fn run(config: &AppConfig, json: bool) -> Result<()> {
    let rules = load_rules(&config.params);

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules configured.");
        println!("\nAdd rules to {} under [params], e.g.:", AppConfig::config_path().display());
        println!("  rule1_enabled = true");
        println!("  rule1_title = \"Sale\"");
        println!("  rule1_days = 30");
        println!("  rule1_action = \"archive\"");
        return Ok(());
    }

    println!("Rules ({}):\n", rules.len());

    for rule in &rules {
        println!(
            "  {}. title contains '{}', older than {} days -> {}",
            rule.slot, rule.title_search, rule.days, rule.action
        );
    }

    if config.params.development_mode() {
        println!("\nDevelopment mode is on: runs only report what they would do.");
    }

    Ok(())
}
