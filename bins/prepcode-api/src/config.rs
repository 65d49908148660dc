// Service configuration: command-line flags with environment fallbacks

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "prepcode-api")]
#[command(about = "Code execution and grading API", long_about = None)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: String,

    /// Redis holding questions and user progress
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Root of the Piston-compatible execution API
    #[arg(long, env = "ENGINE_URL", default_value = "https://emkc.org/api/v2/piston")]
    pub engine_url: String,

    /// Upper bound on one engine round-trip, in milliseconds
    #[arg(long, env = "ENGINE_TIMEOUT_MS", default_value_t = 30_000)]
    pub engine_timeout_ms: u64,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["prepcode-api"]).unwrap();
        assert_eq!(config.engine_timeout_ms, 30_000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.engine_url.ends_with("/piston"));
    }

    #[test]
    fn test_flags_override() {
        let config = Config::try_parse_from([
            "prepcode-api",
            "--engine-url",
            "http://piston:2000/api/v2",
            "--engine-timeout-ms",
            "5000",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.engine_url, "http://piston:2000/api/v2");
        assert_eq!(config.engine_timeout_ms, 5000);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Config::try_parse_from(["prepcode-api", "--log-format", "xml"]).is_err());
    }
}
