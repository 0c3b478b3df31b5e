use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskflow",
    version,
    about = "TaskFlow: task dashboard over an in-memory mock backend"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// all, pending, in_progress, completed or urgent
    #[arg(long = "filter")]
    pub filter: Option<String>,

    /// dueDate, priority, status or created
    #[arg(long = "sort")]
    pub sort: Option<String>,

    #[arg(long = "search")]
    pub search: Option<String>,

    #[arg(long = "toggle-dark")]
    pub toggle_dark: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{GlobalCli, KeyVal};

    #[test]
    fn parses_view_flags_and_overrides() {
        let cli = GlobalCli::parse_from([
            "taskflow",
            "-vv",
            "--rc",
            "latency.scale=0",
            "--filter",
            "urgent",
            "--sort",
            "priority",
            "--search",
            "bug",
            "--toggle-dark",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "latency.scale");
        assert_eq!(cli.rc_overrides[0].value, "0");
        assert_eq!(cli.filter.as_deref(), Some("urgent"));
        assert_eq!(cli.sort.as_deref(), Some("priority"));
        assert_eq!(cli.search.as_deref(), Some("bug"));
        assert!(cli.toggle_dark);
    }

    #[test]
    fn key_val_requires_equals() {
        assert!("nope".parse::<KeyVal>().is_err());
    }
}
