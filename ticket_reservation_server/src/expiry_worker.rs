use chrono::Duration;
use log::*;
use ticket_reservation_engine::{db_types::Hold, events::EventProducers, ReservationApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the hold expiry reaper. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(30));
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        let api = ReservationApi::new(db, producers);
        info!("🕰️ Hold expiry reaper started, sweeping every {interval}");
        loop {
            timer.tick().await;
            trace!("🕰️ Running hold expiry sweep");
            match api.expire_old_holds().await {
                Ok(result) => {
                    if result.released_count() > 0 {
                        info!("🕰️ {} hold(s) expired", result.released_count());
                        debug!("🕰️ Expired holds: {}", hold_list(&result.released));
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running hold expiry sweep: {e}");
                },
            }
        }
    })
}

fn hold_list(holds: &[Hold]) -> String {
    holds
        .iter()
        .map(|h| format!("[{}] seat: {} session: {}", h.id, h.seat_id, h.session_token))
        .collect::<Vec<String>>()
        .join(", ")
}
