use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use sea_orm::DbErr;
use serde_json::{Value, json};

use engine::{
    CommitQueue, Counts, CurrencyCode, Delta, Document, EngineError, Goal, Group, LedgerStore,
    LogEntry, OperationInput, Plan, ResultEngine, WalletState, WalletStore, calculator::total,
    schema::parse_wallet, verify_chain,
};

/// Store keeping the wallet document and the log in memory. Every call
/// suspends before touching its data so interleavings are observable.
#[derive(Default)]
struct MemoryStore {
    document: Mutex<Document>,
    logs: Mutex<Vec<LogEntry>>,
    fail_appends: AtomicBool,
    fail_loads: AtomicBool,
    slow_appends: AtomicBool,
}

impl MemoryStore {
    fn with_document(document: Value) -> Self {
        let Value::Object(document) = document else {
            panic!("wallet document must be an object");
        };
        Self {
            document: Mutex::new(document),
            ..Default::default()
        }
    }

    fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().unwrap().clone()
    }

    fn raw(&self) -> Document {
        self.document.lock().unwrap().clone()
    }

    fn parse(&self) -> ResultEngine<WalletState> {
        let document = Value::Object(self.raw());
        Ok(parse_wallet(&document, &CurrencyCode::default())?)
    }
}

async fn suspend() {
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(2)).await;
}

impl WalletStore for MemoryStore {
    fn wallet_ref(&self) -> &str {
        "main"
    }

    async fn load_wallet(&self) -> ResultEngine<WalletState> {
        suspend().await;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("wallet unavailable".to_string()).into());
        }
        self.parse()
    }

    async fn update_wallet<F>(&self, mutate: F) -> ResultEngine<WalletState>
    where
        F: FnOnce(&mut Document) + Send,
    {
        suspend().await;
        mutate(&mut self.document.lock().unwrap());
        suspend().await;
        self.parse()
    }

    async fn reset_wallet(&self) -> ResultEngine<WalletState> {
        suspend().await;
        let Value::Object(document) = WalletState::default_for(CurrencyCode::default()).to_record()
        else {
            unreachable!("wallet records are objects");
        };
        *self.document.lock().unwrap() = document;
        self.parse()
    }
}

impl LedgerStore for MemoryStore {
    type Handle = usize;

    async fn append_log(&self, entry: &LogEntry) -> ResultEngine<usize> {
        suspend().await;
        if self.slow_appends.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("disk full".to_string()).into());
        }
        let mut logs = self.logs.lock().unwrap();
        logs.push(entry.clone());
        Ok(logs.len() - 1)
    }

    async fn list_recent_logs(&self, limit: usize, wallet_ref: &str) -> ResultEngine<Vec<LogEntry>> {
        suspend().await;
        Ok(self
            .logs()
            .into_iter()
            .rev()
            .filter(|entry| entry.wallet == wallet_ref)
            .take(limit)
            .collect())
    }
}

fn small_wallet() -> Value {
    json!({
        "type": "cash_wallet",
        "schema_version": 1,
        "currency": "RUB",
        "denoms": {"banknotes": [100, 50], "coins": [10, 5]},
        "counts": {"banknotes": {}, "coins": {}},
        "plan": {"monthly": 0, "months": 0}
    })
}

fn queue() -> Arc<CommitQueue<MemoryStore>> {
    Arc::new(CommitQueue::new(MemoryStore::with_document(small_wallet())))
}

fn banknotes(denomination: u64, count: i64) -> Delta {
    Delta::new().with(Group::Banknotes, denomination, count)
}

#[tokio::test]
async fn deposit_withdraw_and_set_scenario() {
    let queue = queue();

    let committed = queue
        .commit(OperationInput::deposit(banknotes(100, 2)).comment("  salary "))
        .await
        .unwrap();
    assert_eq!(total(&committed.wallet), 200);
    assert_eq!(committed.record.delta, banknotes(100, 2));
    assert_eq!(committed.record.total_before, Some(0));
    assert_eq!(committed.record.total_after, 200);
    assert_eq!(committed.record.comment, "salary");
    assert_eq!(committed.record.wallet, "main");
    assert_eq!(committed.handle, 0);

    let err = queue
        .commit(OperationInput::withdraw(banknotes(100, 3)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NegativeCount {
            group: Group::Banknotes,
            denomination: 100,
        }
    );
    assert_eq!(total(&queue.snapshot().await.unwrap()), 200);
    assert_eq!(queue.store().logs().len(), 1);

    let committed = queue
        .commit(OperationInput::set(
            Counts::new()
                .with(Group::Banknotes, 100, 1)
                .with(Group::Banknotes, 50, 4)
                .with(Group::Coins, 10, 0)
                .with(Group::Coins, 5, 0),
        ))
        .await
        .unwrap();
    assert_eq!(total(&committed.wallet), 300);
    assert_eq!(
        committed.record.delta,
        banknotes(100, -1).with(Group::Banknotes, 50, 4)
    );
    assert!(verify_chain(&queue.store().logs()).is_empty());
}

#[tokio::test]
async fn concurrent_commits_apply_in_submission_order() {
    let queue = queue();

    let (first, second) = tokio::join!(
        queue.commit(OperationInput::deposit(banknotes(100, 2)).log_id("a")),
        queue.commit(OperationInput::deposit(banknotes(50, 1)).log_id("b")),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.record.id, "a");
    assert_eq!(second.record.id, "b");
    assert_eq!(second.record.total_before, Some(first.record.total_after));
    assert_eq!(total(&second.wallet), 250);

    let logs = queue.store().logs();
    assert_eq!(
        logs.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(),
        ["a", "b"]
    );
}

#[tokio::test]
async fn many_concurrent_deposits_lose_no_update() {
    let queue = queue();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue
                    .commit(OperationInput::deposit(
                        Delta::new().with(Group::Coins, 5, 1),
                    ))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let wallet = queue.snapshot().await.unwrap();
    assert_eq!(wallet.counts().get(Group::Coins, 5), 20);
    assert_eq!(total(&wallet), 100);

    let logs = queue.store().logs();
    assert_eq!(logs.len(), 20);
    for pair in logs.windows(2) {
        assert_eq!(pair[1].total_before, Some(pair[0].total_after));
    }
}

#[tokio::test]
async fn rejected_commit_does_not_block_the_next_one() {
    let queue = queue();

    let (rejected, accepted) = tokio::join!(
        queue.commit(OperationInput::withdraw(banknotes(100, 1))),
        queue.commit(OperationInput::deposit(banknotes(100, 1))),
    );

    assert!(matches!(
        rejected,
        Err(EngineError::NegativeCount { .. })
    ));
    let accepted = accepted.unwrap();
    assert_eq!(accepted.record.total_before, Some(0));
    assert_eq!(accepted.record.total_after, 100);
    assert_eq!(queue.store().logs().len(), 1);
}

#[tokio::test]
async fn storage_errors_reach_the_caller_only() {
    let queue = queue();

    queue.store().fail_loads.store(true, Ordering::SeqCst);
    let err = queue
        .commit(OperationInput::deposit(banknotes(50, 1)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Database(DbErr::Custom("wallet unavailable".to_string()))
    );
    queue.store().fail_loads.store(false, Ordering::SeqCst);

    queue.store().fail_appends.store(true, Ordering::SeqCst);
    let err = queue
        .commit(OperationInput::deposit(banknotes(50, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    queue.store().fail_appends.store(false, Ordering::SeqCst);

    // The wallet write happened before the failed append.
    assert_eq!(total(&queue.snapshot().await.unwrap()), 50);
    assert!(queue.store().logs().is_empty());

    let committed = queue
        .commit(OperationInput::deposit(banknotes(50, 1)))
        .await
        .unwrap();
    assert_eq!(committed.record.total_before, Some(50));
    assert_eq!(committed.record.total_after, 100);
}

#[tokio::test]
async fn set_without_payload_writes_nothing() {
    let queue = queue();
    let before = queue.store().raw();

    let err = queue
        .commit(OperationInput::new(engine::OperationKind::Set))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::MissingPayload);
    assert_eq!(queue.store().raw(), before);
    assert!(queue.store().logs().is_empty());
}

#[tokio::test]
async fn generated_ids_and_unknown_fields() {
    let mut document = small_wallet();
    document["note"] = json!("kept");
    let queue = CommitQueue::new(MemoryStore::with_document(document));

    let committed = queue
        .commit(OperationInput::deposit(banknotes(100, 1)).log_id("   "))
        .await
        .unwrap();

    let id = &committed.record.id;
    let (ts, suffix) = id.rsplit_once('-').unwrap();
    assert_eq!(ts, committed.record.ts);
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

    let raw = queue.store().raw();
    assert_eq!(raw["note"], "kept");
    assert_eq!(raw["counts"]["banknotes"]["100"], 1);
}

#[tokio::test]
async fn plan_and_goal_updates_write_no_log() {
    let queue = queue();

    let wallet = queue
        .update_plan(Plan::new(1500.0, 12).unwrap())
        .await
        .unwrap();
    assert_eq!(wallet.plan().monthly, 1500.0);
    assert_eq!(wallet.plan().months, 12);

    let goal = Goal::new(10000.0, "2027-06-01").unwrap();
    let wallet = queue.update_goal(goal).await.unwrap();
    assert_eq!(wallet.goal().map(|goal| goal.target), Some(10000.0));

    let wallet = queue.update_goal(None).await.unwrap();
    assert!(wallet.goal().is_none());
    assert!(!queue.store().raw().contains_key("goal"));

    assert!(queue.store().logs().is_empty());
    assert!(
        queue
            .store()
            .list_recent_logs(10, "main")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn dropped_commit_still_writes_its_log_entry() {
    let queue = queue();
    queue.store().slow_appends.store(true, Ordering::SeqCst);

    let timed_out = tokio::time::timeout(
        Duration::from_millis(10),
        queue.commit(OperationInput::deposit(banknotes(100, 2)).log_id("late")),
    )
    .await;
    assert!(timed_out.is_err());

    // The snapshot waits for the abandoned commit to finish both writes.
    let wallet = queue.snapshot().await.unwrap();
    assert_eq!(total(&wallet), 200);
    let logs = queue.store().logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, "late");
    assert_eq!(logs[0].total_after, 200);

    queue.store().slow_appends.store(false, Ordering::SeqCst);
    let committed = queue
        .commit(OperationInput::deposit(banknotes(50, 1)))
        .await
        .unwrap();
    assert_eq!(committed.record.total_before, Some(200));
}

#[tokio::test]
async fn reset_waits_for_queued_commits() {
    let mut document = small_wallet();
    document["note"] = json!("dropped on reset");
    let queue = CommitQueue::new(MemoryStore::with_document(document));

    let (committed, reset) = tokio::join!(
        queue.commit(OperationInput::deposit(banknotes(100, 2))),
        queue.reset(),
    );
    assert_eq!(committed.unwrap().record.total_after, 200);

    let reset = reset.unwrap();
    assert_eq!(total(&reset), 0);
    assert_eq!(reset.currency().code(), "RUB");
    assert!(!queue.store().raw().contains_key("note"));
    assert_eq!(total(&queue.snapshot().await.unwrap()), 0);
    assert_eq!(queue.store().logs().len(), 1);
}
