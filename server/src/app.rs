//! Application wiring: configuration, storage, resolver, server

use std::sync::Arc;

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::APP_NAME_LOWER;
use crate::core::shutdown::ShutdownService;
use crate::data::cache::CacheService;
use crate::data::postgres::PostgresService;
use crate::domain::reports::{ReportResolver, seed_catalog};

/// Everything a running server is made of
pub struct App {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<PostgresService>,
    pub cache: Arc<CacheService>,
    pub resolver: Arc<ReportResolver>,
}

impl App {
    /// Process entry point: parse the command line and dispatch
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        // Logging comes up after the CLI parse so --log / CADENCE_LOG can
        // shape the filter.
        let (flags, command) = cli::parse();
        Self::init_logging(flags.log.as_deref(), flags.debug);

        tracing::debug!("Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Seed) => {
                // init() already reconciles the catalog; nothing left to do.
                let app = Self::init(&flags).await?;
                app.database.close().await;
                tracing::info!("Seed complete");
                Ok(())
            }
            Some(Commands::Start) | None => {
                let app = Self::init(&flags).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(flags: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(flags)?;

        let cache = CacheService::new(&config.database.cache_config())
            .map_err(|e| anyhow::anyhow!("Cache setup failed: {e}"))?;
        let cache = Arc::new(cache);
        tracing::debug!(backend = cache.backend_name(), "Cache ready");

        // Migrations run inside init, before anything queries.
        let database = PostgresService::init(&config.database.postgres)
            .await
            .map_err(|e| anyhow::anyhow!("PostgreSQL setup failed: {e}"))?;
        let database = Arc::new(database);

        seed_catalog(database.pool())
            .await
            .map_err(|e| anyhow::anyhow!("Report catalog reconciliation failed: {e}"))?;

        let resolver = Arc::new(ReportResolver::new(database.pool().clone(), cache.clone()));

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            database,
            cache,
            resolver,
        })
    }

    fn init_logging(cli_filter: Option<&str>, verbose: bool) {
        let filter = match cli_filter {
            Some(f) => f.to_string(),
            None => std::env::var("RUST_LOG").unwrap_or_else(|_| {
                if verbose {
                    format!("info,{APP_NAME_LOWER}=debug,tower_http=debug")
                } else {
                    format!("info,{APP_NAME_LOWER}=info")
                }
            }),
        };

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Signal handlers go in before anything can block.
        app.shutdown.install_signal_handlers();

        let health_task = app.database.spawn_health_task(app.shutdown.subscribe());
        app.shutdown.register(health_task).await;

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        // The pool closes only after the background tasks have drained.
        app.database.close().await;

        Ok(())
    }
}
