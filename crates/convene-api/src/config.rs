//! Binary configuration.
//!
//! Every knob is a flag with an environment fallback; the parsed struct is
//! immutable for the life of the process.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "convene", about = "Meeting scheduling bot", version)]
pub struct Config {
    /// Chat platform bot token.
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: String,

    /// Port for the HTTP health endpoint.
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database URL. Omit to run with the in-memory backend.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Default voting window in minutes.
    #[arg(long, env = "VOTING_DURATION", default_value_t = 120)]
    pub voting_duration: u32,

    /// Emit one JSON object per log line instead of human-readable output.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Bridge tracing spans to an OpenTelemetry stdout exporter.
    #[arg(long, env = "ENABLE_OTEL")]
    pub enable_otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["convene", "--bot-token", "t0k3n"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.voting_duration, 120);
        assert!(config.database_url.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_database_url_flag() {
        let config = Config::try_parse_from([
            "convene",
            "--bot-token",
            "t0k3n",
            "--database-url",
            "sqlite://convene.db",
            "--port",
            "9090",
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite://convene.db"));
        assert_eq!(config.port, 9090);
    }
}
