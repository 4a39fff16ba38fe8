use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(about = "Earthquake anomaly detection service", long_about = None)]
pub struct Cli {
    /// Path to config file (defaults to FAULTLINE_CONFIG or ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory for daily rolling log files
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Emit JSON logs on stdout
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Keep events and anomalies in memory instead of ClickHouse
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API with the collection, detection and report loops
    Serve,
    /// Poll every collector once
    Collect,
    /// Run one detection pass
    Detect,
    /// Collect, then detect
    RunOnce,
    /// Write today's report now
    Report,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["faultline"]).unwrap();
        assert_eq!(cli.command(), Command::Serve);
        assert!(!cli.memory);
    }

    #[test]
    fn parses_subcommand_with_global_flags() {
        let cli = Cli::try_parse_from([
            "faultline",
            "run-once",
            "--config",
            "/etc/faultline.toml",
            "--memory",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.command(), Command::RunOnce);
        assert_eq!(cli.config.as_deref(), Some("/etc/faultline.toml"));
        assert!(cli.memory);
        assert!(cli.log_json);
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["faultline", "migrate"]).is_err());
    }
}
