//! deepseek-proxy binary entry point

use std::{fs::OpenOptions, sync::Arc, time::Duration};

use color_eyre::Result;
use deepseek_proxy::{
    cli::{Cli, Commands},
    config::{Config, ModelList},
    server::{run_server, AppState},
    services::{
        automation::ReauthGate, build_driver, reauthenticator_from_config, session::SessionStore,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Install error handler
    color_eyre::install()?;
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    let config_path = Config::resolve_path(cli.config.clone());
    let mut config = Config::load_with_env(&config_path)?;
    if cli.verbose {
        config.debug = true;
    }

    init_logging(&config)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }
        None => serve(config).await?,
        Some(Commands::Models) => {
            let models = ModelList::new(config.models.clone());
            println!("{}", serde_json::to_string_pretty(&models)?);
        }
        Some(Commands::Reauth) => {
            let store = SessionStore::new();
            let gate = ReauthGate::new(
                reauthenticator_from_config(&config),
                Duration::from_secs(config.automation.timeout_secs),
            );
            gate.refresh(&store, store.generation()).await?;

            let session = store.get();
            println!("Captured {} cookies:", session.cookies.len());
            for cookie in &session.cookies {
                println!("  {} ({}{})", cookie.name, cookie.domain, cookie.path);
            }
            println!("Storage keys:");
            for key in session.storage.keys() {
                println!("  {key}");
            }
        }
        Some(Commands::Config { path }) => {
            if path {
                println!("{}", config_path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        Some(Commands::Version) => {
            println!("deepseek-proxy version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let store = Arc::new(SessionStore::new());
    let driver = build_driver(&config, store, reauthenticator_from_config(&config))?;
    let state = AppState::new(driver, config.models.clone());

    run_server(state, &config.bind_address()).await?;
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = if config.debug {
        EnvFilter::new("deepseek_proxy=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
