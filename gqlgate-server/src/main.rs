//! gqlgate server binary

use anyhow::{Context, Result};
use clap::Parser;
use gqlgate_config::{ConfigLoader, Environment, GatewayConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

use gqlgate_server::{Server, ServerOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server bind address, e.g. 0.0.0.0:4000
    #[arg(short, long)]
    bind: Option<String>,

    /// Deployment environment (development, testing, production)
    #[arg(short, long)]
    environment: Option<Environment>,

    /// Prefix of the environment variables that override configuration
    #[arg(long, value_name = "PREFIX", default_value = "GQLGATE")]
    env_prefix: String,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print the default configuration as YAML and exit
    #[arg(long, conflicts_with = "print_config")]
    sample_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", GatewayConfig::generate_sample());
        return Ok(());
    }

    // File first, then prefixed environment variables, then CLI flags
    let mut config = ConfigLoader::with_prefix(&cli.env_prefix)
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli)?;
    config.validate_all().context("Invalid configuration")?;

    if cli.print_config {
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let server = Server::new(ServerOptions::assemble(&config)).await?;
    server.start().await
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut GatewayConfig, cli: &Cli) -> Result<()> {
    if let Some(bind) = &cli.bind {
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind, e))?;
        config.server.bind_address = addr.ip().to_string();
        config.server.port = addr.port();
    }

    if let Some(environment) = cli.environment {
        config.environment = environment;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["gqlgate-server"]);
        assert_eq!(cli.env_prefix, "GQLGATE");
        assert!(!cli.print_config);
        assert!(!cli.sample_config);
    }

    #[test]
    fn test_bind_override() {
        let cli = Cli::parse_from([
            "gqlgate-server",
            "--bind",
            "0.0.0.0:8080",
            "--environment",
            "production",
        ]);
        let mut config = GatewayConfig::default();
        apply_cli_overrides(&mut config, &cli).unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        let cli = Cli::parse_from(["gqlgate-server", "--bind", "localhost"]);
        assert!(apply_cli_overrides(&mut GatewayConfig::default(), &cli).is_err());
    }

    #[test]
    fn test_sample_and_print_conflict() {
        let result = Cli::try_parse_from(["gqlgate-server", "--sample-config", "--print-config"]);
        assert!(result.is_err());
    }
}
