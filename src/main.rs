//! KegDB server entry point.
//!
//! Sets up logging, the shared store and its expiry sweeper, then accepts
//! connections and spawns one handler task per client.

use kegdb::commands::CommandHandler;
use kegdb::connection::{handle_connection, ConnectionStats};
use kegdb::store::{start_sweeper, Store};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: kegdb::DEFAULT_HOST.to_string(),
            port: kegdb::DEFAULT_PORT,
        }
    }
}

/// Outcomes of flag parsing other than a runnable [`Config`].
#[derive(Debug)]
enum ArgsError {
    Help,
    Version,
    Invalid(String),
}

impl Config {
    /// Parse configuration from command-line arguments, exiting on
    /// `--help`, `--version` or a bad flag.
    fn from_args() -> Self {
        match Self::parse(std::env::args().skip(1)) {
            Ok(config) => config,
            Err(ArgsError::Help) => {
                print_help();
                std::process::exit(0);
            }
            Err(ArgsError::Version) => {
                println!("KegDB version {}", kegdb::VERSION);
                std::process::exit(0);
            }
            Err(ArgsError::Invalid(msg)) => {
                eprintln!("Error: {}", msg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = Config::default();

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--host" | "-h" => config.host = flag_value(&flag, args.next())?,
                "--port" | "-p" => {
                    let value = flag_value(&flag, args.next())?;
                    config.port = value.parse().map_err(|_| {
                        ArgsError::Invalid(format!("invalid port number '{}'", value))
                    })?;
                }
                "--help" => return Err(ArgsError::Help),
                "--version" | "-v" => return Err(ArgsError::Version),
                other => return Err(ArgsError::Invalid(format!("unrecognized option '{}'", other))),
            }
        }

        Ok(config)
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn flag_value(flag: &str, value: Option<String>) -> Result<String, ArgsError> {
    value.ok_or_else(|| ArgsError::Invalid(format!("{} requires a value", flag)))
}

fn print_help() {
    println!(
        r#"
KegDB - An In-Memory Key-Value Store with TTL Support

USAGE:
    kegdb [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 6380)
    -v, --version        Print version information
        --help           Print this help message

CONNECTING:
    Any RESP client works:
    $ redis-cli -p 6380
    127.0.0.1:6380> SET session token EX 60
    OK
    127.0.0.1:6380> TTL session
    (integer) 60
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("KegDB v{} starting", kegdb::VERSION);

    // One store shared by every connection and the sweeper.
    let store = Arc::new(Store::new());
    let _sweeper = start_sweeper(Arc::clone(&store));

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("listening on {}", config.bind_address());

    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        info!("shutdown signal received, stopping server");
    };

    tokio::select! {
        _ = accept_loop(listener, store, stats) => {}
        _ = shutdown => {}
    }

    info!("server shutdown complete");
    Ok(())
}

/// Accepts incoming connections and spawns one task per client.
async fn accept_loop(listener: TcpListener, store: Arc<Store>, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let commands = CommandHandler::new(Arc::clone(&store));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, commands, stats).await;
                });
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ArgsError> {
        Config::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_with_no_flags() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.host, kegdb::DEFAULT_HOST);
        assert_eq!(config.port, kegdb::DEFAULT_PORT);
    }

    #[test]
    fn host_and_port_flags() {
        let config = parse(&["-h", "0.0.0.0", "--port", "7000"]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7000);
        assert_eq!(config.bind_address(), "0.0.0.0:7000");
    }

    #[test]
    fn invalid_flags_are_rejected() {
        assert!(matches!(parse(&["--port"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(&["--host"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(&["-p", "abc"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(&["--nope"]), Err(ArgsError::Invalid(_))));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert!(matches!(parse(&["--help"]), Err(ArgsError::Help)));
        assert!(matches!(parse(&["-v"]), Err(ArgsError::Version)));
        assert!(matches!(
            parse(&["-p", "7000", "--version"]),
            Err(ArgsError::Version)
        ));
    }
}
