//! Bounded worker pool that performs the dice rolls.
//!
//! `CreateRoll` commits a pending row and hands its id to `submit`. Workers
//! pull ids from a bounded queue, roll, and write the outcome in their own
//! transaction with a `status = 'pending'` condition, so a GM resolution or
//! invalidation that lands first wins. Failures go to an error channel that
//! a reporter task logs and counts. A failed roll stays pending; there is
//! no retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dice::{self, DiceRoller};
use crate::entities::rolls::RollStatus;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::events::{self, CoordinationEvent, EventSink};
use crate::infra::clock::Clock;
use crate::repos::{rolls, scenes};

#[derive(Debug)]
struct RollFailure {
    roll_id: i64,
    error: AppError,
}

/// Everything a worker needs to execute one roll.
#[derive(Clone)]
struct WorkerContext {
    db: DatabaseConnection,
    roller: Arc<dyn DiceRoller>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

struct Inner {
    sender: mpsc::Sender<i64>,
    cancel: CancellationToken,
    failures: Arc<AtomicU64>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Cheap to clone; all clones feed the same pool.
#[derive(Clone)]
pub struct RollExecutor {
    inner: Arc<Inner>,
}

impl RollExecutor {
    /// Start `workers` worker tasks and the failure reporter on the current
    /// tokio runtime.
    pub fn spawn(
        db: DatabaseConnection,
        roller: Arc<dyn DiceRoller>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<i64>(capacity.max(1));
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let (err_tx, err_rx) = mpsc::unbounded_channel::<RollFailure>();
        let cancel = CancellationToken::new();
        let failures = Arc::new(AtomicU64::new(0));
        let ctx = WorkerContext {
            db,
            roller,
            clock,
            events,
        };

        let mut handles = Vec::with_capacity(workers + 1);
        for worker in 0..workers.max(1) {
            handles.push(tokio::spawn(worker_loop(
                worker,
                ctx.clone(),
                Arc::clone(&receiver),
                err_tx.clone(),
                cancel.clone(),
            )));
        }
        handles.push(tokio::spawn(report_failures(err_rx, Arc::clone(&failures))));

        info!(workers, capacity, "roll executor started");
        Self {
            inner: Arc::new(Inner {
                sender,
                cancel,
                failures,
                handles: Mutex::new(handles),
            }),
        }
    }

    /// Queue a committed pending roll. Returns `false` when the queue is
    /// full or closed; the roll then stays pending.
    pub fn submit(&self, roll_id: i64) -> bool {
        match self.inner.sender.try_send(roll_id) {
            Ok(()) => {
                debug!(roll_id, "roll queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(roll_id, "roll queue full; roll left pending");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(roll_id, "roll executor stopped; roll left pending");
                false
            }
        }
    }

    /// Rolls that failed to execute since start.
    pub fn failure_count(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    /// Stop the workers. Queued jobs that have not started are dropped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.handles.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "roll executor task ended abnormally");
            }
        }
        info!("roll executor stopped");
    }
}

async fn worker_loop(
    worker: usize,
    ctx: WorkerContext,
    receiver: Arc<AsyncMutex<mpsc::Receiver<i64>>>,
    errors: mpsc::UnboundedSender<RollFailure>,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut rx = receiver.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(roll_id) = next else {
            break;
        };
        if let Err(error) = execute(&ctx, roll_id).await {
            // The reporter only goes away with the pool itself.
            let _ = errors.send(RollFailure { roll_id, error });
        }
    }
    debug!(worker, "roll worker exiting");
}

async fn report_failures(
    mut errors: mpsc::UnboundedReceiver<RollFailure>,
    failures: Arc<AtomicU64>,
) {
    while let Some(failure) = errors.recv().await {
        failures.fetch_add(1, Ordering::Relaxed);
        error!(
            roll_id = failure.roll_id,
            error = %failure.error,
            "roll execution failed; roll remains pending"
        );
    }
}

/// Roll the dice for one pending roll and persist the outcome.
async fn execute(ctx: &WorkerContext, roll_id: i64) -> Result<(), AppError> {
    let txn = ctx.db.begin().await?;

    let roll = rolls::find_by_id(&txn, roll_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Roll, format!("Roll {roll_id} not found"))
    })?;
    if roll.status != RollStatus::Pending {
        txn.rollback().await?;
        debug!(roll_id, status = ?roll.status, "roll already settled; skipping");
        return Ok(());
    }
    let scene = scenes::require_scene(&txn, roll.scene_id).await?;

    dice::validate_dice_type(roll.dice_type)?;
    dice::validate_dice_count(roll.dice_count)?;
    let faces = ctx
        .roller
        .roll(roll.dice_type as u32, roll.dice_count as u32);
    let total = dice::total(&faces, roll.modifier);

    let written = rolls::complete_if_pending(&txn, roll_id, &faces, total, ctx.clock.now()).await?;
    txn.commit().await?;

    if written {
        info!(roll_id, scene_id = scene.id, total, "roll completed");
        events::broadcast(
            &ctx.events,
            CoordinationEvent::RollResolved {
                campaign_id: scene.campaign_id,
                scene_id: scene.id,
                roll_id,
                status: RollStatus::Completed,
            },
        );
    } else {
        debug!(roll_id, "roll settled by the GM first; result discarded");
    }
    Ok(())
}
