//! `worldline-gateway doctor` (§6.5): diagnostic checks against the
//! environment-derived configuration. Grounded on the teacher's
//! `cli/doctor.rs` check-function/`print_check` pattern, narrowed to what
//! this system actually has at startup — no config file (env-var only)
//! and no globally-registered provider list (providers are per-session,
//! set via `POST /api/provider/{id}/set`).

use ws_domain::config::{Config, ConfigSeverity};
use ws_store::Store;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config) -> anyhow::Result<bool> {
    println!("worldline-gateway doctor");
    println!("========================\n");

    let mut all_passed = true;

    check_config_validation(config, &mut all_passed);
    check_db_reachable(config, &mut all_passed).await;

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

async fn check_db_reachable(config: &Config, all_passed: &mut bool) {
    let reachable = Store::connect(&config.db_url, config.app_secret_key.expose()).await.is_ok();

    print_check(
        "Session store reachable",
        reachable,
        if reachable {
            config.db_url.clone()
        } else {
            format!("{} (unreachable)", config.db_url)
        },
    );

    if !reachable {
        *all_passed = false;
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
