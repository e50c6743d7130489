use std::{env, env::VarError};

/// The bot takes no arguments. Any argument prints the help and the current configuration instead.
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
    // The bot token is left out on purpose
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "GYRO_DATABASE_URL",
        "GYRO_DB_MAX_CONNECTIONS",
        "GYRO_RUN_MIGRATIONS",
        "GYRO_TIMEZONE",
        "GYRO_EXPIRY_INTERVAL_SECS",
        "GYRO_EVENT_BUFFER_SIZE",
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
