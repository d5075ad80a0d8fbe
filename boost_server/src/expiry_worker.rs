use boost_engine::{events::EventProducers, SettlementApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each tick demotes listings whose boost window has lapsed and reconciles abandoned pending transactions.
/// Every underlying statement is a conditional batch update, so the worker is safe to run alongside live
/// settlements and concurrent instances.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        let api = SettlementApi::new(db, producers);
        info!("🕰️ Promotion expiry worker started (every {interval_secs}s)");
        loop {
            timer.tick().await;
            trace!("🕰️ Running promotion expiry job");
            match api.expire_promotions().await {
                Ok(result) => {
                    if result.total_count() > 0 {
                        info!(
                            "🕰️ Sweep complete. {} boost(s) demoted: [{}]. {} pending transaction(s) reconciled: [{}]",
                            result.demoted.len(),
                            listing_list(&result),
                            result.reconciled.len(),
                            tx_list(&result)
                        );
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running promotion expiry job: {e}");
                },
            }
        }
    })
}

fn listing_list(result: &boost_engine::SweepResult) -> String {
    result.demoted.iter().map(|l| l.id.to_string()).collect::<Vec<String>>().join(", ")
}

fn tx_list(result: &boost_engine::SweepResult) -> String {
    result.reconciled.iter().map(|t| t.id.to_string()).collect::<Vec<String>>().join(", ")
}
