use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Secrets, tokens and webhook URLs are deliberately left out
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "OSB_HOST",
        "OSB_PORT",
        "OSB_DATABASE_URL",
        "OSB_PRODUCT_IDS",
        "OSB_FINOPS_API_BASE_URL",
        "OSB_FINOPS_SUB",
        "OSB_FINOPS_TIMEOUT",
        "OSB_MARKETPLACE_API_BASE_URL",
        "OSB_MARKETPLACE_TIMEOUT",
        "OSB_POLL_INTERVAL",
        "OSB_POLL_CONCURRENCY",
        "OSB_SHUTDOWN_GRACE",
        "OSB_RETRY_BASE_MS",
        "OSB_RETRY_CAP_SECS",
        "OSB_RETRY_MAX_ATTEMPTS",
        "OSB_DUE_DATE_DAYS",
        "OSB_CHAT_NOTIFICATIONS",
        "OSB_EMAIL_NOTIFICATIONS",
        "OSB_EMAIL_API_URL",
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
