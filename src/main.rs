use std::{process, sync::Arc, time::Duration};

use portico::{
    application::{
        admin::{entries::EntryService, social_links::SocialLinkService},
        content::{ContentService, fallbacks::default_fallbacks},
        error::AppError,
        repos::{EntriesRepo, SocialLinksRepo},
    },
    cache::{
        CacheConfig, Clock, MemorySnapshotStore, PurgeOutcome, SnapshotCache, SnapshotStore,
        SystemClock,
    },
    config,
    infra::{
        db::{PostgresRepositories, PostgresSnapshotStore},
        error::InfraError,
        http::{self, AdminState, HttpState},
        memory::{InMemoryEntriesRepo, InMemorySocialLinksRepo},
        telemetry,
    },
};
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Purge(args) => run_purge(settings, args).await,
    }
}

/// Repositories, snapshot cache and, when configured, the database handle.
struct ApplicationContext {
    db: Option<Arc<PostgresRepositories>>,
    links: Arc<dyn SocialLinksRepo>,
    entries: Arc<dyn EntriesRepo>,
    cache: Arc<SnapshotCache>,
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let fallbacks = default_fallbacks();
    fallbacks.ensure_complete()?;

    let cache_config = Arc::new(CacheConfig::from(&settings.cache));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let db = init_repositories(settings).await?;
    let (links, entries, store) = match db.as_ref() {
        Some(repositories) => {
            let links: Arc<dyn SocialLinksRepo> = repositories.clone();
            let entries: Arc<dyn EntriesRepo> = repositories.clone();
            let store: Arc<dyn SnapshotStore> = Arc::new(PostgresSnapshotStore::new(
                repositories,
                cache_config.clone(),
                clock.clone(),
            ));
            (links, entries, store)
        }
        None => {
            warn!("database url is not configured; content and snapshots are kept in memory");
            let links: Arc<dyn SocialLinksRepo> = Arc::new(InMemorySocialLinksRepo::default());
            let entries: Arc<dyn EntriesRepo> = Arc::new(InMemoryEntriesRepo::default());
            let store: Arc<dyn SnapshotStore> =
                Arc::new(MemorySnapshotStore::new(cache_config.clone(), clock.clone()));
            (links, entries, store)
        }
    };

    let cache = Arc::new(SnapshotCache::new(
        cache_config,
        store,
        Arc::new(fallbacks),
        clock,
    ));

    Ok(ApplicationContext {
        db,
        links,
        entries,
        cache,
    })
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Option<Arc<PostgresRepositories>>, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        return Ok(None);
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Some(Arc::new(PostgresRepositories::new(pool))))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    let content =
        ContentService::standard(app.cache.clone(), app.links.clone(), app.entries.clone())?;
    let http_state = HttpState {
        content: Arc::new(content),
        db: app.db.clone(),
    };
    let admin_state = AdminState {
        social_links: Arc::new(SocialLinkService::new(app.links.clone(), app.cache.clone())),
        entries: Arc::new(EntryService::new(app.entries.clone(), app.cache.clone())),
        cache: app.cache.clone(),
        db: app.db.clone(),
    };

    info!(
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        cache_enabled = settings.cache.enabled,
        "Starting Portico"
    );

    serve_http(&settings, http_state, admin_state).await
}

async fn run_purge(settings: config::Settings, args: config::PurgeArgs) -> Result<(), AppError> {
    let modules = args
        .selected_modules()
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    if settings.database.url.is_none() {
        return Err(AppError::from(InfraError::configuration(
            "purge requires a database url; in-memory snapshots live only inside a running server",
        )));
    }

    let app = build_application_context(&settings).await?;
    let mut deferred = 0usize;
    for (module, outcome) in app.cache.purge_many(&modules).await {
        match outcome {
            PurgeOutcome::Purged => info!(module = module.as_str(), "Snapshot purged"),
            PurgeOutcome::Skipped => {
                info!(module = module.as_str(), "Snapshot cache disabled; nothing to purge")
            }
            PurgeOutcome::Deferred => deferred += 1,
        }
    }

    if deferred > 0 {
        return Err(AppError::from(InfraError::database(format!(
            "{deferred} purge(s) could not reach the snapshot store"
        ))));
    }
    Ok(())
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received; draining connections");
        let _ = shutdown_tx.send(true);
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(shutdown_requested(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(shutdown_requested(shutdown_rx.clone()));

    let servers = async { try_join!(public_server, admin_server) };
    let drain_deadline = drain_deadline(shutdown_rx, settings.server.graceful_shutdown);

    tokio::select! {
        result = servers => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline => {
            warn!(
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

/// Never resolves if the signal listener went away without requesting shutdown.
async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Resolves once shutdown was requested and the grace period has elapsed.
async fn drain_deadline(rx: watch::Receiver<bool>, grace: Duration) {
    shutdown_requested(rx).await;
    tokio::time::sleep(grace).await;
}
