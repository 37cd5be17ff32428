//! Number Duel server binary.
//!
//! # Usage
//!
//! ```bash
//! # Local play on the default port
//! numduel-server
//!
//! # Platform deployment: the platform injects $PORT
//! PORT=10000 numduel-server --host 0.0.0.0
//! ```

use clap::Parser;
use numduel_core::{DEFAULT_MAX_ROOMS, RegistryConfig};
use numduel_server::{Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Number Duel server
#[derive(Parser, Debug)]
#[command(name = "numduel-server")]
#[command(about = "Two-player number guessing game over WebSocket")]
#[command(version)]
struct Args {
    /// Interface to bind to
    #[arg(long, env = "NUMDUEL_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum concurrently open rooms
    #[arg(long, env = "MAX_ROOMS", default_value_t = DEFAULT_MAX_ROOMS)]
    max_rooms: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn runtime_config(self) -> ServerRuntimeConfig {
        ServerRuntimeConfig {
            host: self.host,
            port: self.port,
            registry: RegistryConfig { max_rooms: self.max_rooms },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Number Duel server starting");
    tracing::info!("Binding to {}:{}", args.host, args.port);

    let server = Server::bind(args.runtime_config()).await?;

    tracing::info!("Open http://{} in two browsers to play", server.local_addr()?);

    server.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn arg(id: &str) -> clap::Arg {
        Args::command().get_arguments().find(|a| a.get_id().as_str() == id).cloned().unwrap()
    }

    fn default_of(id: &str) -> Option<String> {
        arg(id).get_default_values().first().and_then(|v| v.to_str()).map(str::to_owned)
    }

    fn env_of(id: &str) -> Option<String> {
        arg(id).get_env().and_then(|v| v.to_str()).map(str::to_owned)
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_deployment_expectations() {
        assert_eq!(default_of("host").as_deref(), Some("0.0.0.0"));
        assert_eq!(default_of("port").as_deref(), Some("8000"));
        assert_eq!(default_of("max_rooms").as_deref(), Some("1000"));
        assert_eq!(default_of("log_level").as_deref(), Some("info"));
    }

    #[test]
    fn settings_fall_back_to_environment() {
        assert_eq!(env_of("host").as_deref(), Some("NUMDUEL_HOST"));
        assert_eq!(env_of("port").as_deref(), Some("PORT"));
        assert_eq!(env_of("max_rooms").as_deref(), Some("MAX_ROOMS"));
        assert_eq!(env_of("log_level"), None);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "numduel-server",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--max-rooms",
            "5",
        ])
        .unwrap();

        let config = args.runtime_config();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.registry, RegistryConfig { max_rooms: 5 });
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Args::try_parse_from(["numduel-server", "--port", "70000"]).is_err());
    }
}
