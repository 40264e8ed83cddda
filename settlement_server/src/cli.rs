use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // SE_ODDS_API_KEY is deliberately absent
    const DISPLAY_ENVS: [&str; 18] = [
        "RUST_LOG",
        "SE_DATABASE_URL",
        "SE_DB_MAX_CONNECTIONS",
        "SE_EVENT_BUFFER_SIZE",
        "SE_LOCKING_INTERVAL_SECS",
        "SE_SCORE_SYNC_INTERVAL_SECS",
        "SE_SETTLEMENT_INTERVAL_SECS",
        "SE_SUBSCRIPTION_INTERVAL_SECS",
        "SE_SCORE_SYNC_ENABLED",
        "SE_PROVIDER_TIMEOUT_SECS",
        "SE_TRACKED_LEAGUES",
        "SE_LEAGUE_LOOKBACK_HOURS",
        "SE_MATCH_MAX_DURATION_HOURS",
        "SE_SETTLEMENT_CONCURRENCY",
        "SE_QUOTA_WARNING_THRESHOLD",
        "SE_ODDS_API_URL",
        "SE_ODDS_API_DAYS_FROM",
        "SE_MAILER_FROM",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
