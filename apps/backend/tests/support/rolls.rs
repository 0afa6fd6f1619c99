use std::time::Duration;

use scriptorium::db::txn::with_txn;
use scriptorium::entities::rolls::RollStatus;
use scriptorium::repos::rolls::{self, Roll};
use scriptorium::state::app_state::AppState;
use scriptorium::AppError;

/// Poll until the roll leaves `pending` or the deadline passes. No
/// transaction is held between polls so the executor can write.
pub async fn wait_for_settled(
    state: &AppState,
    roll_id: i64,
    deadline: Duration,
) -> Result<Roll, AppError> {
    let started = tokio::time::Instant::now();
    loop {
        let roll = with_txn(None, state, |txn| {
            Box::pin(async move { Ok(rolls::require_roll(txn, roll_id).await?) })
        })
        .await?;
        if roll.status != RollStatus::Pending || started.elapsed() >= deadline {
            return Ok(roll);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
