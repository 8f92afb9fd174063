//! Command-line interface.

use clap::{Parser, Subcommand};
use copilot_core::TimeFilterKind;

/// Intraday Co-Pilot client
#[derive(Parser, Debug)]
#[command(name = "copilot", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COPILOT_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// `watch` when no subcommand is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Poll session and plan until Ctrl-C
    Watch,
    /// Print the current session as JSON
    Session,
    /// Print the ranked plan as JSON
    Plan {
        /// Rows to request (defaults to plan_top from config)
        #[arg(long)]
        top: Option<u32>,
    },
    /// Inspect or edit the policy document
    Policy {
        #[command(subcommand)]
        action: PolicyCommand,
    },
    /// Inspect or edit the active-universe config
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Print the current policy revision hint
    HintRev,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PolicyCommand {
    /// Print the policy snapshot as JSON
    Show,
    /// Set a value at a dotted path and save
    Set {
        /// Dotted path, e.g. universe.min_price
        path: String,
        /// JSON value, e.g. 25 or '["EQ","BE"]'
        value: String,
    },
    /// Save the default time-of-day filter
    TimeFilter {
        #[arg(value_parser = parse_time_filter_kind)]
        kind: TimeFilterKind,
        /// HH:MM, custom only
        #[arg(long)]
        start: Option<String>,
        /// HH:MM, custom only
        #[arg(long)]
        end: Option<String>,
    },
    /// Replace the thresholds object from JSON text
    Thresholds { json: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Print the universe config as JSON
    Show,
    /// Update pinned symbols and/or the universe limit
    Set {
        /// Comma-separated, SYMBOL or EXCH:SYMBOL
        #[arg(long)]
        pinned: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

fn parse_time_filter_kind(raw: &str) -> Result<TimeFilterKind, String> {
    raw.parse().map_err(|e: copilot_core::CoreError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_watch() {
        let cli = Cli::try_parse_from(["copilot"]).unwrap();
        assert_eq!(cli.command(), Command::Watch);
    }

    #[test]
    fn test_plan_top() {
        let cli = Cli::try_parse_from(["copilot", "plan", "--top", "25"]).unwrap();
        assert_eq!(cli.command(), Command::Plan { top: Some(25) });
    }

    #[test]
    fn test_policy_set() {
        let cli =
            Cli::try_parse_from(["copilot", "policy", "set", "universe.min_price", "25"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Policy {
                action: PolicyCommand::Set {
                    path: "universe.min_price".to_string(),
                    value: "25".to_string(),
                }
            }
        );
    }

    #[test]
    fn test_time_filter_kind() {
        let cli = Cli::try_parse_from([
            "copilot", "policy", "time-filter", "custom", "--start", "10:30", "--end", "14:00",
        ])
        .unwrap();
        assert_eq!(
            cli.command(),
            Command::Policy {
                action: PolicyCommand::TimeFilter {
                    kind: TimeFilterKind::Custom,
                    start: Some("10:30".to_string()),
                    end: Some("14:00".to_string()),
                }
            }
        );
        assert!(Cli::try_parse_from(["copilot", "policy", "time-filter", "lunch"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["copilot", "hint-rev", "--config", "/etc/copilot.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/copilot.toml"));
        assert_eq!(cli.command(), Command::HintRev);
    }
}
