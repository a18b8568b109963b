use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "hourbase", version, about = "Track billable hours from the terminal")]
pub struct Cli {
    /// Read environment variables from this file instead of `.env`
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Screen to open on start: /, /projects, /calendar
    #[arg(long, value_name = "ROUTE", default_value = "/")]
    pub open: String,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_the_dashboard() {
        let cli = Cli::parse_from(["hourbase"]);
        assert_eq!(cli.open, "/");
        assert!(cli.env_file.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn flags_are_parsed() {
        let cli = Cli::parse_from(["hourbase", "--open", "/calendar", "-v", "--env-file", "prod.env"]);
        assert_eq!(cli.open, "/calendar");
        assert!(cli.verbose);
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
    }
}
