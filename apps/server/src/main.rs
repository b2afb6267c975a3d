use anyhow::Context;
use monolith_kernel::config::{load_configuration, seed_from_dotenv};
use monolith_kernel::domain::config::Configuration;
use monolith_kernel::domain::constants::{APP_NAME, DOTENV_FILE};
use monolith_logger::{LevelFilter, Logger};
use monolith_server::{Server, VERSION};
use std::path::Path;
use tracing::{debug, error, info};

fn init_logger(cfg: &Configuration) -> anyhow::Result<Logger> {
    let level: LevelFilter = cfg
        .log_level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", cfg.log_level))?;

    let mut builder = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(level)
        .quiet("hyper")
        .quiet("axum_server");

    if let Some(filter) = &cfg.log_filter {
        builder = builder.env_filter(filter.clone());
    }

    let logger = match &cfg.log_dir {
        Some(dir) => builder.path(dir.clone()).json(cfg.log_json).init(),
        None => builder.init(),
    };

    logger.context("Critical: Logger initialization failed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = seed_from_dotenv(DOTENV_FILE).context("Critical: Dotenv file is malformed")?;
    let cfg = load_configuration().context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg)?;

    info!(app = APP_NAME, version = VERSION, environment = %cfg.environment, "Initializing");
    dotenv.log(Path::new(DOTENV_FILE));
    debug!(config = ?cfg, "Configuration loaded");

    serve(cfg).await.inspect_err(|e| error!("Host terminated: {e:#}"))
}

async fn serve(cfg: Configuration) -> anyhow::Result<()> {
    // Business modules are registered here, e.g. `.module("artists", Artists::default)`.
    Server::builder().config(cfg).build().await?.run().await
}
