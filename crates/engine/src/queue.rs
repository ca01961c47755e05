//! Serialized commits.
//!
//! Every read-modify-write of a wallet goes through one [`CommitQueue`].
//! Commits run strictly one after another in submission order, so no
//! commit ever reads a wallet another commit has not finished writing.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    Goal, LedgerStore, LogEntry, OperationInput, Plan, ResultEngine, WalletState, WalletStore,
    calculator::total, operation::apply, util::format_timestamp,
};

/// Outcome of a successful commit.
#[derive(Clone, Debug)]
pub struct Committed<H> {
    /// The wallet as reloaded from storage after the write.
    pub wallet: WalletState,
    pub record: LogEntry,
    /// Where the log entry was stored.
    pub handle: H,
}

/// FIFO queue of wallet mutations.
///
/// The lock is held across the whole load, apply, write and append sequence.
/// A failed commit releases it like a successful one, so later commits are
/// unaffected.
#[derive(Debug)]
pub struct CommitQueue<S> {
    store: Arc<S>,
    chain: Arc<Mutex<()>>,
}

impl<S> CommitQueue<S>
where
    S: WalletStore + LedgerStore + 'static,
    S::Handle: 'static,
{
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            chain: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the wallet, apply `op`, persist the new counts and append a log
    /// entry.
    ///
    /// If the operation is rejected nothing is written. If the wallet write
    /// succeeds but the log append fails the error is returned and the
    /// wallet keeps its new counts.
    ///
    /// Once the turn is taken the work runs on its own task, so dropping the
    /// returned future does not stop a commit halfway between the two
    /// writes. Dropping it while still waiting for the turn cancels the
    /// commit before anything is read.
    pub async fn commit(&self, op: OperationInput) -> ResultEngine<Committed<S::Handle>> {
        let turn = Arc::clone(&self.chain).lock_owned().await;
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let _turn = turn;
            run_commit(store.as_ref(), op).await
        })
        .await?
    }

    /// Replace the wallet with the default one, after every queued commit.
    pub async fn reset(&self) -> ResultEngine<WalletState> {
        let _turn = self.chain.lock().await;
        self.store.reset_wallet().await
    }

    /// Replace the savings plan. No log entry is written.
    pub async fn update_plan(&self, plan: Plan) -> ResultEngine<WalletState> {
        let _turn = self.chain.lock().await;
        let plan = serde_json::to_value(plan)?;
        self.store
            .update_wallet(move |document| {
                document.insert("plan".to_string(), plan);
            })
            .await
    }

    /// Replace the goal, or clear it with `None`. No log entry is written.
    pub async fn update_goal(&self, goal: Option<Goal>) -> ResultEngine<WalletState> {
        let _turn = self.chain.lock().await;
        let goal = goal.map(serde_json::to_value).transpose()?;
        self.store
            .update_wallet(move |document| match goal {
                Some(goal) => {
                    document.insert("goal".to_string(), goal);
                }
                None => {
                    document.remove("goal");
                }
            })
            .await
    }

    /// The current wallet, read after every commit queued before this call.
    pub async fn snapshot(&self) -> ResultEngine<WalletState> {
        let _turn = self.chain.lock().await;
        self.store.load_wallet().await
    }
}

async fn run_commit<S>(store: &S, op: OperationInput) -> ResultEngine<Committed<S::Handle>>
where
    S: WalletStore + LedgerStore,
{
    tracing::debug!(kind = %op.kind, "commit started");

    let state = store.load_wallet().await?;
    let total_before = total(&state);
    let applied = apply(&state, &op)?;

    let counts = serde_json::to_value(applied.next.counts())?;
    let wallet = store
        .update_wallet(move |document| {
            document.insert("counts".to_string(), counts);
        })
        .await?;
    let total_after = total(&wallet);

    let ts = format_timestamp(Utc::now());
    let id = match op.log_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{ts}-{}", &suffix[..8])
        }
    };
    let record = LogEntry {
        id,
        wallet: store.wallet_ref().to_string(),
        ts,
        kind: op.kind,
        delta: applied.delta,
        total_before: Some(total_before),
        total_after,
        comment: op.comment.as_deref().unwrap_or_default().trim().to_string(),
    };
    let handle = store.append_log(&record).await?;

    tracing::debug!(
        id = %record.id,
        kind = %record.kind,
        total_before,
        total_after,
        "committed operation"
    );

    Ok(Committed {
        wallet,
        record,
        handle,
    })
}
