use log::*;
use tempfile::TempDir;

use crate::SqliteDatabase;

/// Creates a migrated SQLite database in a fresh temporary directory. The database is deleted when the returned
/// [`TempDir`] is dropped, so keep it alive for the duration of the test.
pub async fn prepare_test_db() -> (SqliteDatabase, TempDir) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("osb_test.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    (db, dir)
}
