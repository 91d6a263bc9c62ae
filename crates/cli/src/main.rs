use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::Parser,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    vetrina_config::{Severity, VetrinaConfig},
    vetrina_gateway::{build_app, serve},
    vetrina_integrations::IntegrationService,
    vetrina_oauth::{DemoExchange, HttpExchange, Provider, ProviderConfig, StateSigner},
    vetrina_publish::{DemoPublisher, InstagramPublisher, MediaPublisher},
    vetrina_store::{SqliteCampaignStore, SqliteUserStore, init_schema},
    vetrina_vault::CredentialVault,
};

#[derive(Parser)]
#[command(name = "vetrina", about = "Vetrina — marketing integration service", version)]
struct Cli {
    /// Path to vetrina.toml (overrides discovery).
    #[arg(long, env = "VETRINA_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<VetrinaConfig> {
    let mut config = match &cli.config {
        Some(path) => vetrina_config::load_config(path)?,
        None => vetrina_config::discover_and_load()?,
    };
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

/// Wire up the orchestrator from config. Demo implementations are chosen
/// here, once, by the `demo_mode` flag.
fn build_service(
    config: &VetrinaConfig,
    users: Arc<SqliteUserStore>,
    campaigns: Arc<SqliteCampaignStore>,
) -> anyhow::Result<IntegrationService> {
    let timeout = Duration::from_secs(config.http.timeout_secs);

    // Demo mode runs with fixed local secrets so the pipeline works out of
    // the box; anything encrypted under them is throwaway by definition.
    let (encryption_secret, session_secret) = if config.demo_mode {
        ("vetrina-demo-encryption", "vetrina-demo-session")
    } else {
        (
            config.secrets.encryption_secret.as_str(),
            config.secrets.session_secret.as_str(),
        )
    };

    let vault = CredentialVault::new(encryption_secret)?;
    let signer = StateSigner::new(session_secret);

    let publisher: Arc<dyn MediaPublisher> = if config.demo_mode {
        Arc::new(DemoPublisher::new())
    } else {
        Arc::new(InstagramPublisher::new(timeout).context("instagram publisher")?)
    };

    let mut service = IntegrationService::new(users, campaigns, vault, publisher, signer);

    if config.demo_mode {
        service = service
            .with_exchange(Arc::new(DemoExchange::new(Provider::Instagram)))
            .with_exchange(Arc::new(DemoExchange::new(Provider::Shopify)));
        return Ok(service);
    }

    let instagram = ProviderConfig::instagram(
        config.instagram.client_id.clone(),
        config.instagram.client_secret.clone(),
        config.instagram.redirect_uri.clone(),
    );
    service = service.with_exchange(Arc::new(
        HttpExchange::new(Provider::Instagram, instagram, timeout).context("instagram oauth")?,
    ));

    if config.shopify.is_configured() {
        let shopify = ProviderConfig::shopify(
            config.shopify.client_id.clone(),
            config.shopify.client_secret.clone(),
            config.shopify.redirect_uri.clone(),
        );
        service = service.with_exchange(Arc::new(
            HttpExchange::new(Provider::Shopify, shopify, timeout).context("shopify oauth")?,
        ));
    }

    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(&cli)?;

    let diagnostics = vetrina_config::validate(&config);
    for d in &diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
        }
    }
    if vetrina_config::has_errors(&diagnostics) {
        anyhow::bail!("configuration is invalid; refusing to start");
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.database.path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("opening database {}", config.database.path))?;
    init_schema(&pool).await?;

    let users = Arc::new(SqliteUserStore::new(pool.clone()));
    let campaigns = Arc::new(SqliteCampaignStore::new(pool));
    let service = Arc::new(build_service(&config, users, campaigns)?);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.server.bind, config.server.port))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        demo = config.demo_mode,
        "starting vetrina"
    );
    serve(addr, build_app(service)).await?;
    Ok(())
}
