mod app;
mod args;
mod config;
mod db;
mod util;
mod version;

use app::{load_templates, madang_app, state::*};
use args::RunMode;
use config::MadangConfig;
use db::Db;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::layer as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MadangConfig::discover(args::config_path())?;

    // Set up tracing. Hang onto the guard, or buffered file logs get lost
    // on the way out.
    let _log_guard = init_tracing(&config);
    info!(
        commit = version::commit_sha(),
        built = version::build_date(),
        production = config.production,
        "madang starting up"
    );

    // Open the store: one read/write connection, held until shutdown.
    info!(db_file = ?config.db_file, "opening database");
    let db = Db::open(&config.db_file).await?;

    match args::run_mode() {
        RunMode::Migrate => {
            db.migrations().run().await?;
        }
        RunMode::Status => {
            for status in db.migrations().info().await? {
                println!("{}", status);
            }
        }
        RunMode::Serve => {
            if config.migrate_on_startup {
                db.migrations().run().await?;
            } else {
                db.migrations().validate().await?;
            }
            serve(db.clone(), config).await?;
        }
    }

    db.close().await;
    Ok(())
}

/// stdout always; daily files too if there's a log_dir.
fn init_tracing(config: &MadangConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer());
    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "madang.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt_layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Build the app and run it until ctrl-c.
async fn serve(db: Db, config: MadangConfig) -> anyhow::Result<()> {
    let port = config.port;
    let templates = load_templates()?;
    let inner = MSInner {
        db,
        config,
        templates,
    };
    let state: MadangState = Arc::new(inner);
    let app = madang_app(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    // If we can't listen for ctrl-c, we just run until killed.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
