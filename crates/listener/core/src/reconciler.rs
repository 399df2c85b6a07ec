use crate::{ReconcileError, ReconcilerConfig, TransactionMatches, match_block, metrics::Metrics};
use alloy_primitives::B256;
use async_stream::{stream, try_stream};
use backon::Retryable;
use futures::{Stream, StreamExt, TryStreamExt};
use log_listener_storage::{LogEventReader, LogEventWriter, StorageError};
use log_listener_types::{Block, LogEvent, LogEventStatus, TxIdentity};
use std::{collections::HashSet, pin::pin, sync::Arc, time::Instant};
use tracing::{debug, info, warn};

/// A status change planned for a single pending log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Identifier of the log.
    pub id: String,
    /// Status the log moves to.
    pub status: LogEventStatus,
}

/// Turns per-transaction matches into an ordered list of status changes.
///
/// Transactions are walked in block order. Within a transaction the exact-hash group becomes
/// [`Inactive`](LogEventStatus::Inactive) and is listed before the nonce-collision group, which
/// becomes [`Dropped`](LogEventStatus::Dropped). A log tied to several transactions of the block
/// only keeps its first transition.
pub fn plan_transitions(matches: &[TransactionMatches<'_>]) -> Vec<Transition> {
    let mut planned = HashSet::new();
    let mut transitions = Vec::new();

    for tx_matches in matches {
        let groups = [
            (LogEventStatus::Inactive, &tx_matches.exact),
            (LogEventStatus::Dropped, &tx_matches.displaced),
        ];
        for (status, logs) in groups {
            for log in logs.iter().filter(|log| planned.insert(log.id.as_str())) {
                transitions.push(Transition { id: log.id.clone(), status });
            }
        }
    }

    transitions
}

/// Reconciles the pending logs of a source against newly observed blocks.
///
/// For every transaction of the block, pending logs produced by that exact transaction are marked
/// [`Inactive`](LogEventStatus::Inactive) and pending logs whose `(sender, nonce)` slot was taken
/// by it are marked [`Dropped`](LogEventStatus::Dropped). Both transitions hide the log.
///
/// Updates are conditional writes against the store. A version conflict reloads the record and
/// retries, up to [`ReconcilerConfig::max_conflict_retries`] times.
#[derive(Debug)]
pub struct PendingLogReconciler<S> {
    store: Arc<S>,
    config: ReconcilerConfig,
}

impl<S> PendingLogReconciler<S>
where
    S: LogEventReader + LogEventWriter + 'static,
{
    /// Creates a new [`PendingLogReconciler`] over the given store.
    pub fn new(store: Arc<S>, config: ReconcilerConfig) -> Self {
        Metrics::init();
        Self { store, config }
    }

    /// Returns the configuration of this reconciler.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reconciles the pending logs of `source_id` matching `topic` against `block`.
    ///
    /// Yields every updated record in block order, exact-hash updates before nonce-collision
    /// updates within a transaction. The stream ends after the first error; updates yielded before
    /// it stay committed. Running the same block again is safe: only logs that are still pending
    /// are considered.
    pub fn reconcile<'a>(
        &'a self,
        source_id: &'a str,
        topic: B256,
        block: &'a Block,
    ) -> impl Stream<Item = Result<LogEvent, ReconcileError>> + Send + 'a {
        stream! {
            let started = Instant::now();
            let mut updates = pin!(self.updates(source_id, topic, block));
            let mut updated = 0usize;
            let mut failure = None;

            while let Some(update) = updates.next().await {
                match update {
                    Ok(log) => {
                        updated += 1;
                        yield Ok(log);
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }

            Metrics::record_pass(started, failure.as_ref().map_or(Ok(()), Err));

            match failure {
                Some(err) => {
                    warn!(
                        target: "pending_logs",
                        source_id,
                        %topic,
                        block_number = block.number,
                        updated,
                        %err,
                        "Failed to reconcile pending logs"
                    );
                    yield Err(err);
                }
                None if updated > 0 => {
                    info!(
                        target: "pending_logs",
                        source_id,
                        %topic,
                        block_number = block.number,
                        updated,
                        "Reconciled pending logs"
                    );
                }
                None => {}
            }
        }
    }

    /// Runs [`Self::reconcile`] to completion and collects the updated records.
    pub async fn reconcile_all(
        &self,
        source_id: &str,
        topic: B256,
        block: &Block,
    ) -> Result<Vec<LogEvent>, ReconcileError> {
        self.reconcile(source_id, topic, block).try_collect().await
    }

    fn updates<'a>(
        &'a self,
        source_id: &'a str,
        topic: B256,
        block: &'a Block,
    ) -> impl Stream<Item = Result<LogEvent, ReconcileError>> + Send + 'a {
        try_stream! {
            let txs = validate(source_id, block)?;

            let pending: Vec<LogEvent> = self
                .store
                .find_pending_logs(source_id)
                .await?
                .into_iter()
                .filter(|log| log.topic == topic)
                .collect();
            if pending.is_empty() {
                debug!(
                    target: "pending_logs",
                    source_id,
                    %topic,
                    block_number = block.number,
                    "No pending logs to reconcile"
                );
                return;
            }

            let transitions = plan_transitions(&match_block(&txs, &pending));
            debug!(
                target: "pending_logs",
                source_id,
                %topic,
                block_number = block.number,
                pending = pending.len(),
                transitions = transitions.len(),
                "Matched pending logs against block"
            );

            let applied = futures::stream::iter(transitions)
                .map(|transition| self.apply(source_id, transition))
                .buffered(self.config.concurrency());
            let mut applied = pin!(applied);

            while let Some(update) = applied.next().await {
                if let Some(log) = update? {
                    yield log;
                }
            }
        }
    }

    /// Applies a single transition, retrying on version conflicts.
    ///
    /// Returns `Ok(None)` when there is nothing left to update: the record vanished or already
    /// left the pending state.
    async fn apply(
        &self,
        source_id: &str,
        transition: Transition,
    ) -> Result<Option<LogEvent>, ReconcileError> {
        let planned = &transition;
        let result = (move || self.try_apply(source_id, planned))
            .retry(self.config.backoff())
            .when(StorageError::is_conflict)
            .notify(|err, delay| {
                Metrics::record_conflict_retry();
                debug!(
                    target: "pending_logs",
                    source_id,
                    id = %planned.id,
                    ?delay,
                    %err,
                    "Version conflict, reloading log"
                );
            })
            .await;

        match result {
            Ok(Some(saved)) => {
                Metrics::record_update(saved.status);
                debug!(
                    target: "pending_logs",
                    source_id,
                    id = %saved.id,
                    status = %saved.status,
                    tx_hash = %saved.transaction_hash,
                    "Updated pending log"
                );
                Ok(Some(saved))
            }
            Ok(None) => Ok(None),
            Err(err) if err.is_conflict() => Err(ReconcileError::Contention {
                source_id: source_id.to_string(),
                id: transition.id,
                retries: self.config.max_conflict_retries,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Reloads the record and conditionally writes the new status.
    async fn try_apply(
        &self,
        source_id: &str,
        transition: &Transition,
    ) -> Result<Option<LogEvent>, StorageError> {
        let Some(current) = self.store.find_log_event(source_id, &transition.id).await? else {
            debug!(
                target: "pending_logs",
                source_id,
                id = %transition.id,
                "Log vanished before update, skipping"
            );
            return Ok(None);
        };

        if !current.is_pending() {
            debug!(
                target: "pending_logs",
                source_id,
                id = %transition.id,
                status = %current.status,
                "Log already left pending state, skipping"
            );
            return Ok(None);
        }

        match self.store.save(source_id, current.with_status(transition.status)).await {
            Ok(saved) => Ok(Some(saved)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn validate(source_id: &str, block: &Block) -> Result<Vec<TxIdentity>, ReconcileError> {
    if source_id.is_empty() {
        return Err(ReconcileError::EmptySource);
    }
    Ok(block.identities()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, TxHash};
    use async_trait::async_trait;
    use log_listener_storage::InMemoryLogStore;
    use mockall::mock;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    const SOURCE: &str = "S1";
    const TOPIC: B256 = B256::repeat_byte(0x7e);
    const SENDER: Address = Address::repeat_byte(0x01);

    mock! {
        #[derive(Debug)]
        pub Store {}

        #[async_trait]
        impl LogEventReader for Store {
            async fn find_pending_logs(
                &self,
                source_id: &str,
            ) -> Result<Vec<LogEvent>, StorageError>;
            async fn find_log_event(
                &self,
                source_id: &str,
                id: &str,
            ) -> Result<Option<LogEvent>, StorageError>;
        }

        #[async_trait]
        impl LogEventWriter for Store {
            async fn save(
                &self,
                source_id: &str,
                event: LogEvent,
            ) -> Result<LogEvent, StorageError>;
        }
    }

    /// Simulates a concurrent writer touching each listed record right before its first save.
    #[derive(Debug, Default)]
    struct ContendedStore {
        inner: InMemoryLogStore,
        contended: Mutex<HashSet<String>>,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl LogEventReader for ContendedStore {
        async fn find_pending_logs(&self, source_id: &str) -> Result<Vec<LogEvent>, StorageError> {
            self.inner.find_pending_logs(source_id).await
        }

        async fn find_log_event(
            &self,
            source_id: &str,
            id: &str,
        ) -> Result<Option<LogEvent>, StorageError> {
            self.inner.find_log_event(source_id, id).await
        }
    }

    #[async_trait]
    impl LogEventWriter for ContendedStore {
        async fn save(&self, source_id: &str, event: LogEvent) -> Result<LogEvent, StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let touch = self.contended.lock().unwrap().remove(&event.id);
            if touch {
                if let Some(current) = self.inner.get(source_id, &event.id).await {
                    self.inner.insert(source_id, current).await;
                }
            }
            self.inner.save(source_id, event).await
        }
    }

    fn config() -> ReconcilerConfig {
        ReconcilerConfig {
            max_conflict_retries: 2,
            retry_min_delay: Duration::from_millis(1),
            retry_max_delay: Duration::from_millis(2),
            update_concurrency: 4,
        }
    }

    fn log(id: &str, tx: u8, nonce: u64) -> LogEvent {
        LogEvent::pending(id, TOPIC, TxHash::repeat_byte(tx), SENDER, nonce)
    }

    fn block(txs: &[(u8, Address, u64)]) -> Block {
        Block {
            number: 100,
            hash: B256::repeat_byte(0x64),
            transactions: txs
                .iter()
                .map(|(hash, from, nonce)| {
                    TxIdentity::new(TxHash::repeat_byte(*hash), *from, *nonce).into()
                })
                .collect(),
        }
    }

    async fn seeded(logs: impl IntoIterator<Item = LogEvent>) -> Arc<InMemoryLogStore> {
        let store = Arc::new(InMemoryLogStore::new());
        for log in logs {
            store.insert(SOURCE, log).await;
        }
        store
    }

    fn summary(logs: &[LogEvent]) -> Vec<(&str, LogEventStatus, bool)> {
        logs.iter().map(|log| (log.id.as_str(), log.status, log.visible)).collect()
    }

    #[tokio::test]
    async fn test_exact_hash_inactive_and_nonce_collision_dropped() {
        let store = seeded([log("L1", 0xaa, 5), log("L2", 0xbb, 5)]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert_eq!(
            summary(&updated),
            vec![("L1", LogEventStatus::Inactive, false), ("L2", LogEventStatus::Dropped, false)]
        );
        assert_eq!(summary(&store.logs(SOURCE).await), summary(&updated));
    }

    #[tokio::test]
    async fn test_empty_block_changes_nothing() {
        let store = seeded([log("L1", 0xaa, 5), log("L2", 0xbb, 5)]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());

        let updated = reconciler.reconcile_all(SOURCE, TOPIC, &block(&[])).await.unwrap();

        assert!(updated.is_empty());
        assert!(store.logs(SOURCE).await.iter().all(|log| log.is_pending() && log.visible));
    }

    #[tokio::test]
    async fn test_second_pass_is_a_noop() {
        let store = seeded([log("L1", 0xaa, 5), log("L2", 0xbb, 5)]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());
        let block = block(&[(0xaa, SENDER, 5)]);

        reconciler.reconcile_all(SOURCE, TOPIC, &block).await.unwrap();
        let after_first = store.logs(SOURCE).await;

        let second = reconciler.reconcile_all(SOURCE, TOPIC, &block).await.unwrap();

        assert!(second.is_empty());
        assert_eq!(store.logs(SOURCE).await, after_first);
    }

    #[tokio::test]
    async fn test_other_topics_are_untouched() {
        let mut foreign = log("L2", 0xaa, 5);
        foreign.topic = B256::repeat_byte(0x01);
        let store = seeded([log("L1", 0xaa, 5), foreign.clone()]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert_eq!(summary(&updated), vec![("L1", LogEventStatus::Inactive, false)]);
        assert_eq!(store.get(SOURCE, "L2").await.unwrap(), foreign);
    }

    #[tokio::test]
    async fn test_unmatched_logs_stay_pending_and_visible() {
        let store = seeded([log("L1", 0xaa, 5), log("L3", 0xcc, 9)]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());
        let other = Address::repeat_byte(0x02);

        let updated = reconciler
            .reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5), (0xdd, other, 9)]))
            .await
            .unwrap();

        assert_eq!(summary(&updated), vec![("L1", LogEventStatus::Inactive, false)]);
        let untouched = store.get(SOURCE, "L3").await.unwrap();
        assert!(untouched.is_pending());
        assert!(untouched.visible);
    }

    #[tokio::test]
    async fn test_updates_follow_block_order() {
        let other = Address::repeat_byte(0x02);
        let mut l4 = log("L4", 0xee, 1);
        l4.from = other;
        let store =
            seeded([log("L1", 0xaa, 5), log("L2", 0xbb, 5), log("L3", 0xcc, 5), l4]).await;
        let reconciler = PendingLogReconciler::new(store, config());

        let updated = reconciler
            .reconcile_all(SOURCE, TOPIC, &block(&[(0xff, other, 1), (0xbb, SENDER, 5)]))
            .await
            .unwrap();

        assert_eq!(
            summary(&updated),
            vec![
                ("L4", LogEventStatus::Dropped, false),
                ("L2", LogEventStatus::Inactive, false),
                ("L1", LogEventStatus::Dropped, false),
                ("L3", LogEventStatus::Dropped, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_log_tied_to_two_transactions_keeps_first_transition() {
        // L1 claims tx 0xaa, but the block carries 0xaa from another sender and a second
        // transaction in L1's nonce slot.
        let other = Address::repeat_byte(0x02);
        let store = seeded([log("L1", 0xaa, 5)]).await;
        let reconciler = PendingLogReconciler::new(store.clone(), config());

        let updated = reconciler
            .reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, other, 0), (0xbb, SENDER, 5)]))
            .await
            .unwrap();

        assert_eq!(summary(&updated), vec![("L1", LogEventStatus::Inactive, false)]);
        assert_eq!(store.get(SOURCE, "L1").await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_conflict_is_retried_from_fresh_state() {
        let store = Arc::new(ContendedStore::default());
        store.inner.insert(SOURCE, log("L1", 0xaa, 5)).await;
        store.contended.lock().unwrap().insert("L1".to_string());
        let reconciler = PendingLogReconciler::new(store.clone(), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert_eq!(summary(&updated), vec![("L1", LogEventStatus::Inactive, false)]);
        // One concurrent touch plus one successful write.
        assert_eq!(updated[0].version, 2);
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_conflict_surfaces_contention() {
        let mut store = MockStore::new();
        let pending = log("L1", 0xaa, 5);
        let listed = pending.clone();
        store.expect_find_pending_logs().times(1).returning(move |_| Ok(vec![listed.clone()]));
        store.expect_find_log_event().times(3).returning(move |_, _| Ok(Some(pending.clone())));
        store.expect_save().times(3).returning(|source_id, event| {
            Err(StorageError::Conflict {
                source_id: source_id.to_string(),
                id: event.id,
                expected: event.version,
                found: event.version + 1,
            })
        });
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());

        let err = reconciler
            .reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Contention { ref id, retries: 2, .. } if id == "L1"
        ));
    }

    #[tokio::test]
    async fn test_unavailable_store_aborts_pass() {
        let mut store = MockStore::new();
        store
            .expect_find_pending_logs()
            .times(1)
            .returning(|_| Err(StorageError::Unavailable("connection refused".to_string())));
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());

        let results: Vec<_> =
            reconciler.reconcile(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).collect().await;

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ReconcileError::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_failed_update_ends_stream_after_committed_prefix() {
        let mut store = MockStore::new();
        let l1 = log("L1", 0xaa, 5);
        let l2 = log("L2", 0xbb, 5);
        let listed = vec![l1.clone(), l2.clone()];
        store.expect_find_pending_logs().returning(move |_| Ok(listed.clone()));
        store.expect_find_log_event().returning(move |_, id| {
            Ok(Some(if id == "L1" { l1.clone() } else { l2.clone() }))
        });
        store.expect_save().returning(|_, mut event| {
            if event.id == "L1" {
                event.version += 1;
                Ok(event)
            } else {
                Err(StorageError::Unavailable("timeout".to_string()))
            }
        });
        let reconciler = PendingLogReconciler::new(
            Arc::new(store),
            ReconcilerConfig { update_concurrency: 1, ..config() },
        );

        let results: Vec<_> =
            reconciler.reconcile(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().status, LogEventStatus::Inactive);
        assert!(matches!(results[1], Err(ReconcileError::Storage(_))));
    }

    #[tokio::test]
    async fn test_vanished_log_is_skipped() {
        let mut store = MockStore::new();
        let listed = vec![log("L1", 0xaa, 5)];
        store.expect_find_pending_logs().returning(move |_| Ok(listed.clone()));
        store.expect_find_log_event().times(1).returning(|_, _| Ok(None));
        store.expect_save().never();
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn test_log_removed_before_write_is_skipped() {
        let mut store = MockStore::new();
        let pending = log("L1", 0xaa, 5);
        let listed = vec![pending.clone()];
        store.expect_find_pending_logs().returning(move |_| Ok(listed.clone()));
        store.expect_find_log_event().times(1).returning(move |_, _| Ok(Some(pending.clone())));
        store.expect_save().times(1).returning(|source_id, event| {
            Err(StorageError::NotFound { source_id: source_id.to_string(), id: event.id })
        });
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn test_log_confirmed_concurrently_is_skipped() {
        let mut store = MockStore::new();
        let pending = log("L1", 0xaa, 5);
        let confirmed = pending.clone().with_status(LogEventStatus::Confirmed);
        store.expect_find_pending_logs().returning(move |_| Ok(vec![pending.clone()]));
        store.expect_find_log_event().returning(move |_, _| Ok(Some(confirmed.clone())));
        store.expect_save().never();
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());

        let updated =
            reconciler.reconcile_all(SOURCE, TOPIC, &block(&[(0xaa, SENDER, 5)])).await.unwrap();

        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_block_touches_no_store() {
        let store = MockStore::new();
        let reconciler = PendingLogReconciler::new(Arc::new(store), config());
        let mut block = block(&[(0xaa, SENDER, 5), (0xbb, SENDER, 6)]);
        block.transactions[1].hash = None;

        let err = reconciler.reconcile_all(SOURCE, TOPIC, &block).await.unwrap_err();

        assert!(matches!(err, ReconcileError::MalformedBlock(ref e) if e.tx_index == 1));
    }

    #[tokio::test]
    async fn test_empty_source_is_rejected() {
        let reconciler = PendingLogReconciler::new(Arc::new(MockStore::new()), config());

        let err = reconciler.reconcile_all("", TOPIC, &block(&[])).await.unwrap_err();

        assert!(matches!(err, ReconcileError::EmptySource));
    }
}
