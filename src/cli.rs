//! Command-line arguments for the `secret-words-service` binary.

// std
use std::{net::SocketAddr, path::PathBuf};
// crates.io
use clap::Parser;

/// Secret words service backed by a client-credentials token broker.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Cli {
	/// Path to the TOML configuration file.
	#[arg(long, short, env = "SECRET_WORDS_CONFIG", default_value = "secret-words.toml")]
	pub config: PathBuf,
	/// Overrides `server.bind`.
	#[arg(long, env = "SECRET_WORDS_BIND")]
	pub bind: Option<SocketAddr>,
	/// Emit logs as JSON lines.
	#[arg(long)]
	pub json_logs: bool,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_overrides() {
		let cli = Cli::try_parse_from([
			"secret-words-service",
			"--config",
			"/etc/secret-words.toml",
			"--bind",
			"0.0.0.0:8080",
			"--json-logs",
		])
		.expect("CLI arguments should parse.");

		assert_eq!(cli.config, PathBuf::from("/etc/secret-words.toml"));
		assert_eq!(cli.bind, Some(SocketAddr::from(([0, 0, 0, 0], 8080))));
		assert!(cli.json_logs);
	}
}
