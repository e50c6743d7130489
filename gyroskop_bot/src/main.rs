use dotenvy::dotenv;
use gyroskop_bot::{bot::run_bot, cli::handle_command_line_args, config::BotConfig};
use log::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = BotConfig::from_env_or_default();

    info!("🚀️ Starting Gyroskop bot ({})", config.database_url);
    match run_bot(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
