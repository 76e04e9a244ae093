use atrium_accounts::{SessionApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the session expiry worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// Expired session records are rejected on read whether or not they have been cleaned up; this
/// worker only keeps the sessions table from growing without bound.
pub fn start_expiry_worker(db: SqliteDatabase) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(300));
        let api = SessionApi::new(db);
        info!("🕰️ Session expiry worker started");
        loop {
            timer.tick().await;
            match api.delete_expired_sessions().await {
                Ok(0) => trace!("🕰️ No expired session records to remove"),
                Ok(n) => info!("🕰️ Removed {n} expired session record(s)"),
                Err(e) => error!("🕰️ Error running session expiry job: {e}"),
            }
        }
    })
}
