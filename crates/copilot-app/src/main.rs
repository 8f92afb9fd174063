//! Intraday Co-Pilot - Entry Point

use anyhow::Result;
use clap::Parser;
use copilot_app::{AppConfig, Application, Cli, Command, ConfigCommand, PolicyCommand};
use serde::Serialize;
use tracing::info;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first so its log_level can seed the filter
    let config = AppConfig::load(cli.config.as_deref())?;
    copilot_telemetry::init_logging(config.log_level.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_base_url = %config.api_base_url,
        "Starting Co-Pilot"
    );

    let app = Application::new(config)?;

    match cli.command() {
        Command::Watch => app.run_watch().await?,
        Command::Session => print_json(&app.session().await?)?,
        Command::Plan { top } => print_json(&app.plan(top).await?)?,
        Command::Policy { action } => match action {
            PolicyCommand::Show => print_json(&app.policy_show().await?)?,
            PolicyCommand::Set { path, value } => print_json(&app.policy_set(&path, &value).await?)?,
            PolicyCommand::TimeFilter { kind, start, end } => print_json(
                &app.policy_time_filter(kind, start.as_deref(), end.as_deref())
                    .await?,
            )?,
            PolicyCommand::Thresholds { json } => print_json(&app.policy_thresholds(&json).await?)?,
        },
        Command::Config { action } => match action {
            ConfigCommand::Show => print_json(&app.config_show().await?)?,
            ConfigCommand::Set { pinned, limit } => {
                print_json(&app.config_set(pinned.as_deref(), limit).await?)?
            }
        },
        Command::HintRev => match app.hint_rev() {
            Some(hint) => println!("{hint}"),
            None => println!("none"),
        },
    }

    Ok(())
}
