#![allow(dead_code)]
use actix_web::web::Data;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ponto::db::{connect, migrate::run_pending_migrations};
use ponto::store::RecordStore;

/// Fresh store backed by a private in-memory database.
pub async fn memory_store() -> Data<RecordStore> {
    let pool = connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database");
    run_pending_migrations(&pool).await.expect("migrations");
    Data::new(RecordStore::new(pool))
}

/// Store on a database file under the temp dir, with the pool size the
/// server uses by default. Remove the file with [`remove_db`] afterwards.
pub async fn file_store(name: &str) -> (Data<RecordStore>, PathBuf) {
    let mut path = env::temp_dir();
    path.push(format!("{}_{}_ponto.sqlite", name, std::process::id()));
    remove_db(&path);

    let pool = connect(&format!("sqlite://{}", path.display()), 5)
        .await
        .expect("file database");
    run_pending_migrations(&pool).await.expect("migrations");
    (Data::new(RecordStore::new(pool)), path)
}

pub fn remove_db(path: &Path) {
    fs::remove_file(path).ok();
    for suffix in ["sqlite-journal", "sqlite-wal", "sqlite-shm"] {
        fs::remove_file(path.with_extension(suffix)).ok();
    }
}

/// Builds the app the same way `main` does.
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::NormalizePath::trim())
                .wrap(ponto::routes::cors())
                .app_data($store.clone())
                .configure(ponto::routes::configure),
        )
        .await
    };
}
