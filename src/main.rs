use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use futures::future::{Either, select};
use futures::pin_mut;
use tracing::{error, info};

use ponto::config::Config;
use ponto::db::init_db;
use ponto::shutdown::{self, SHUTDOWN_GRACE, ShutdownOutcome};
use ponto::store::RecordStore;
use ponto::{routes, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let log_guard = telemetry::init(&config)?;

    info!("Server starting...");

    let pool = match init_db(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = ?e, "Schema initialization failed, refusing to serve");
            return Err(e);
        }
    };
    let store = Data::new(RecordStore::new(pool));
    let app_store = store.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(routes::cors())
            .app_data(app_store.clone())
            .configure(routes::configure)
    })
    .disable_signals()
    .shutdown_timeout(SHUTDOWN_GRACE.as_secs())
    .bind(&config.server_addr)?
    .run();

    let handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);
    info!(addr = %config.server_addr, "Listening");

    let signal = shutdown::wait_for_signal();
    pin_mut!(signal);

    match select(signal, &mut server_task).await {
        Either::Left((received, _)) => received?,
        Either::Right((finished, _)) => {
            // Server ended without a shutdown request.
            store.close().await;
            finished??;
            return Ok(());
        }
    }

    info!("Shutting down server...");

    let drain = async {
        handle.stop(true).await;
        match (&mut server_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Server exited with an error"),
            Err(e) => error!(error = %e, "Server task failed"),
        }
        store.close().await;
    };

    match shutdown::drain_within(drain, SHUTDOWN_GRACE).await {
        ShutdownOutcome::Drained => {
            info!("Server stopped");
            Ok(())
        }
        ShutdownOutcome::TimedOut => {
            error!("Could not close connections in time, forcefully shutting down");
            drop(log_guard);
            std::process::exit(1);
        }
    }
}
