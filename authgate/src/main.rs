mod server;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use authgate_core::{bootstrap, bootstrap::load_config, logging};

/// Authenticating gateway in front of an `OAuth2` / OIDC identity provider
#[derive(Debug, Parser)]
#[command(name = "authgate", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "AUTHGATE_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load and validate configuration
    let (config, source) = load_config(cli.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "authgate starting...");
    info!(
        source = %source,
        provider = %config.oauth.provider,
        http_address = %config.http_address(),
        "Configuration loaded and validated"
    );

    // 3. Provider and session store; any failure ends the process here
    let ctx = match bootstrap(config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    info!(
        provider = %ctx.provider().kind(),
        sessions = %ctx.sessions().describe(),
        "Gateway ready"
    );

    // 4. Serve until shutdown
    server::serve(ctx).await
}
