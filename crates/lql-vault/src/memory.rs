use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use lql_criteria::QuerySpec;
use lql_types::{
    LinearId, Page, Party, RecordRef, RecordState, RecordStatus, RecordType, StoredRecord,
    TransactionId, TypeError, UpdateEvent,
};

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::eval::{compare_records, matches};
use crate::router::{UpdateRouter, UpdateStream};
use crate::traits::VaultService;

/// A record a transaction is about to produce. The vault assigns its
/// reference on commit.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    pub back_reference: Option<RecordRef>,
    pub lineage: Vec<RecordType>,
    pub payload: Value,
    pub participants: Vec<Party>,
    pub linear_id: Option<LinearId>,
}

impl OutputRecord {
    pub fn from_state<T: RecordState>(
        back_reference: Option<RecordRef>,
        state: &T,
    ) -> Result<Self, TypeError> {
        let payload =
            serde_json::to_value(state).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(Self {
            back_reference,
            lineage: T::lineage(),
            payload,
            participants: state.participants(),
            linear_id: state.linear_id(),
        })
    }
}

/// A transaction ready to be recorded: records it consumes and records it
/// produces. Output `i` gets reference `(id, i)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedTransaction {
    pub id: TransactionId,
    pub inputs: Vec<RecordRef>,
    pub outputs: Vec<OutputRecord>,
}

impl Default for CommittedTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl CommittedTransaction {
    pub fn new() -> Self {
        Self::with_id(TransactionId::ephemeral())
    }

    pub fn with_id(id: TransactionId) -> Self {
        Self {
            id,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, reference: RecordRef) -> Self {
        self.inputs.push(reference);
        self
    }

    /// Add a genesis output.
    pub fn output<T: RecordState>(self, state: &T) -> Result<Self, TypeError> {
        self.push_output(None, state)
    }

    /// Add an output that evolves `predecessor`.
    pub fn output_evolving<T: RecordState>(
        self,
        predecessor: RecordRef,
        state: &T,
    ) -> Result<Self, TypeError> {
        self.push_output(Some(predecessor), state)
    }

    /// Reference the `index`-th output will receive.
    pub fn output_ref(&self, index: u32) -> RecordRef {
        RecordRef::new(self.id, index)
    }

    fn push_output<T: RecordState>(
        mut self,
        back_reference: Option<RecordRef>,
        state: &T,
    ) -> Result<Self, TypeError> {
        self.outputs
            .push(OutputRecord::from_state(back_reference, state)?);
        Ok(self)
    }
}

#[derive(Default)]
struct VaultState {
    records: Vec<StoredRecord>,
    index: HashMap<RecordRef, usize>,
    transactions: HashSet<TransactionId>,
}

/// Reference [`VaultService`] holding every record in memory.
pub struct InMemoryVault {
    state: RwLock<VaultState>,
    router: UpdateRouter,
    config: VaultConfig,
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new(VaultConfig::default())
    }
}

impl InMemoryVault {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            state: RwLock::new(VaultState::default()),
            router: UpdateRouter::new(),
            config,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Commit `tx`: consume its inputs, record its outputs, and notify
    /// trackers. Either the whole transaction is applied or none of it.
    /// Trackers see events in the order transactions were committed.
    pub fn record(&self, tx: CommittedTransaction) -> VaultResult<UpdateEvent> {
        let event = {
            let mut state = self.state.write().map_err(|_| VaultError::LockPoisoned)?;
            Self::validate(&state, &tx)?;

            let now = Utc::now();
            let mut consumed = Vec::with_capacity(tx.inputs.len());
            for input in &tx.inputs {
                if let Some(&slot) = state.index.get(input) {
                    let record = &mut state.records[slot];
                    record.status = RecordStatus::Consumed;
                    record.consumed_at = Some(now);
                    consumed.push(record.clone());
                }
            }

            let mut produced = Vec::with_capacity(tx.outputs.len());
            for (i, output) in tx.outputs.into_iter().enumerate() {
                let reference = RecordRef::new(tx.id, i as u32);
                let relevant = self.config.is_relevant(&output.participants);
                let record = StoredRecord {
                    reference,
                    back_reference: output.back_reference,
                    lineage: output.lineage,
                    payload: output.payload,
                    participants: output.participants,
                    linear_id: output.linear_id,
                    relevant,
                    status: RecordStatus::Unconsumed,
                    recorded_at: now,
                    consumed_at: None,
                };
                let slot = state.records.len();
                state.records.push(record.clone());
                state.index.insert(reference, slot);
                produced.push(record);
            }
            state.transactions.insert(tx.id);

            let event = UpdateEvent {
                transaction_id: tx.id,
                consumed,
                produced,
            };
            info!(
                transaction = %event.transaction_id.short_hex(),
                consumed = event.consumed.len(),
                produced = event.produced.len(),
                "transaction recorded"
            );
            // Still under the write lock: trackers receive events in commit order.
            self.router.route(&event)?;
            event
        };
        Ok(event)
    }

    fn validate(state: &VaultState, tx: &CommittedTransaction) -> VaultResult<()> {
        if state.transactions.contains(&tx.id) {
            return Err(VaultError::DuplicateTransaction(tx.id));
        }
        let mut seen = HashSet::new();
        for input in &tx.inputs {
            let slot = state
                .index
                .get(input)
                .ok_or(VaultError::RecordNotFound(*input))?;
            if state.records[*slot].status == RecordStatus::Consumed || !seen.insert(*input) {
                return Err(VaultError::AlreadyConsumed(*input));
            }
        }
        for (i, output) in tx.outputs.iter().enumerate() {
            let Some(back) = output.back_reference else {
                continue;
            };
            if !state.index.contains_key(&back) {
                return Err(VaultError::ChainViolation {
                    reference: RecordRef::new(tx.id, i as u32),
                    reason: format!("predecessor {back} is not recorded"),
                });
            }
        }
        Ok(())
    }

    /// Look up one record by reference, whatever its status.
    pub fn get(&self, reference: &RecordRef) -> VaultResult<StoredRecord> {
        let state = self.state.read().map_err(|_| VaultError::LockPoisoned)?;
        state
            .index
            .get(reference)
            .map(|slot| state.records[*slot].clone())
            .ok_or(VaultError::RecordNotFound(*reference))
    }

    pub fn len(&self) -> VaultResult<usize> {
        Ok(self
            .state
            .read()
            .map_err(|_| VaultError::LockPoisoned)?
            .records
            .len())
    }

    pub fn is_empty(&self) -> VaultResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn tracker_count(&self) -> VaultResult<usize> {
        self.router.tracker_count()
    }
}

impl VaultService for InMemoryVault {
    fn query(&self, spec: &QuerySpec) -> VaultResult<Page<StoredRecord>> {
        if spec.paging.size() > self.config.max_page_size {
            return Err(VaultError::PageTooLarge {
                requested: spec.paging.size(),
                max: self.config.max_page_size,
            });
        }

        let mut hits: Vec<StoredRecord> = {
            let state = self.state.read().map_err(|_| VaultError::LockPoisoned)?;
            state
                .records
                .iter()
                .filter(|r| matches(&spec.criteria, r))
                .cloned()
                .collect()
        };
        if !spec.sort.is_unsorted() {
            hits.sort_by(|a, b| compare_records(&spec.sort, a, b));
        }

        let total_available = hits.len() as u64;
        let records: Vec<StoredRecord> = hits
            .into_iter()
            .skip(usize::try_from(spec.paging.offset()).unwrap_or(usize::MAX))
            .take(spec.paging.size() as usize)
            .collect();
        debug!(
            page = spec.paging.number(),
            returned = records.len(),
            total_available,
            "query answered"
        );
        Ok(Page {
            records,
            total_available,
        })
    }

    fn track(&self, spec: &QuerySpec) -> VaultResult<(Page<StoredRecord>, UpdateStream)> {
        let stream = self
            .router
            .subscribe(spec.criteria.clone(), self.config.channel_capacity)?;
        let snapshot = self.query(spec)?;
        Ok((snapshot, stream))
    }

    fn max_page_size(&self) -> u32 {
        self.config.max_page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lql_criteria::{Field, Predicate, QueryBuilder, StatusFilter};
    use lql_types::{PageSpec, Sort, SortDirection, SortKey};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        owner: String,
        amount: i64,
    }

    impl RecordState for Item {
        const RECORD_TYPE: RecordType = RecordType::new("test.Item");

        fn participants(&self) -> Vec<Party> {
            vec![Party::new(self.owner.clone())]
        }
    }

    fn item(owner: &str, amount: i64) -> Item {
        Item {
            owner: owner.into(),
            amount,
        }
    }

    fn unconsumed_items() -> QueryBuilder {
        QueryBuilder::for_type(Item::RECORD_TYPE, StatusFilter::Unconsumed)
    }

    fn seed(vault: &InMemoryVault, amounts: &[i64]) -> Vec<RecordRef> {
        amounts
            .iter()
            .map(|a| {
                let tx = CommittedTransaction::new().output(&item("alice", *a)).unwrap();
                let reference = tx.output_ref(0);
                vault.record(tx).unwrap();
                reference
            })
            .collect()
    }

    #[test]
    fn record_then_query() {
        let vault = InMemoryVault::default();
        seed(&vault, &[1, 2, 3]);
        let page = vault.query(&unconsumed_items().build()).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.total_available, 3);
    }

    #[test]
    fn consuming_moves_record_to_consumed() {
        let vault = InMemoryVault::default();
        let refs = seed(&vault, &[1]);
        let tx = CommittedTransaction::new()
            .input(refs[0])
            .output_evolving(refs[0], &item("alice", 2))
            .unwrap();
        let event = vault.record(tx).unwrap();
        assert_eq!(event.consumed.len(), 1);
        assert_eq!(event.consumed[0].status, RecordStatus::Consumed);
        assert!(event.consumed[0].consumed_at.is_some());

        let unconsumed = vault.query(&unconsumed_items().build()).unwrap();
        assert_eq!(unconsumed.len(), 1);
        assert_eq!(unconsumed.records[0].back_reference, Some(refs[0]));

        let consumed = vault
            .query(&unconsumed_items().status(StatusFilter::Consumed).build())
            .unwrap();
        assert_eq!(consumed.records[0].reference, refs[0]);
    }

    #[test]
    fn rejects_double_spend_and_unknown_inputs() {
        let vault = InMemoryVault::default();
        let refs = seed(&vault, &[1]);
        vault
            .record(CommittedTransaction::new().input(refs[0]))
            .unwrap();
        let error = vault
            .record(CommittedTransaction::new().input(refs[0]))
            .unwrap_err();
        assert_eq!(error, VaultError::AlreadyConsumed(refs[0]));

        let ghost = RecordRef::new(TransactionId::from_bytes(b"ghost"), 0);
        let error = vault
            .record(CommittedTransaction::new().input(ghost))
            .unwrap_err();
        assert_eq!(error, VaultError::RecordNotFound(ghost));
    }

    #[test]
    fn rejects_duplicate_transaction() {
        let vault = InMemoryVault::default();
        let id = TransactionId::from_bytes(b"once");
        vault
            .record(CommittedTransaction::with_id(id).output(&item("a", 1)).unwrap())
            .unwrap();
        let error = vault
            .record(CommittedTransaction::with_id(id))
            .unwrap_err();
        assert_eq!(error, VaultError::DuplicateTransaction(id));
    }

    #[test]
    fn rejects_unknown_predecessor_atomically() {
        let vault = InMemoryVault::default();
        let refs = seed(&vault, &[1]);
        let ghost = RecordRef::new(TransactionId::from_bytes(b"ghost"), 0);
        let tx = CommittedTransaction::new()
            .input(refs[0])
            .output_evolving(ghost, &item("a", 2))
            .unwrap();
        assert!(matches!(
            vault.record(tx).unwrap_err(),
            VaultError::ChainViolation { .. }
        ));
        assert_eq!(vault.get(&refs[0]).unwrap().status, RecordStatus::Unconsumed);
        assert_eq!(vault.len().unwrap(), 1);
    }

    #[test]
    fn paging_and_sorting() {
        let vault = InMemoryVault::default();
        seed(&vault, &[5, 1, 4, 2, 3]);
        let mut q = unconsumed_items();
        q.sort(Sort::by(SortKey::Field("amount".into()), SortDirection::Ascending))
            .page(PageSpec::new(2, 2).unwrap());
        let page = vault.query(&q.build()).unwrap();
        let amounts: Vec<i64> = page
            .records
            .iter()
            .map(|r| r.payload["amount"].as_i64().unwrap())
            .collect();
        assert_eq!(amounts, vec![3, 4]);
        assert_eq!(page.total_available, 5);

        q.page(PageSpec::new(4, 2).unwrap());
        let beyond = vault.query(&q.build()).unwrap();
        assert!(beyond.is_empty());
        assert_eq!(beyond.total_available, 5);
    }

    #[test]
    fn page_size_is_bounded() {
        let vault = InMemoryVault::new(VaultConfig {
            max_page_size: 10,
            ..VaultConfig::default()
        });
        let mut q = unconsumed_items();
        q.page(PageSpec::first(11).unwrap());
        assert_eq!(
            vault.query(&q.build()).unwrap_err(),
            VaultError::PageTooLarge {
                requested: 11,
                max: 10
            }
        );
    }

    #[test]
    fn relevancy_uses_local_parties() {
        let vault = InMemoryVault::new(VaultConfig {
            local_parties: vec![Party::new("alice")],
            ..VaultConfig::default()
        });
        vault
            .record(CommittedTransaction::new().output(&item("alice", 1)).unwrap())
            .unwrap();
        vault
            .record(CommittedTransaction::new().output(&item("bob", 2)).unwrap())
            .unwrap();
        let mut q = unconsumed_items();
        q.relevancy(lql_criteria::Relevancy::Relevant);
        let page = vault.query(&q.build()).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.records[0].payload["owner"], "alice");
    }

    #[test]
    fn track_delivers_snapshot_then_updates() {
        let vault = InMemoryVault::default();
        seed(&vault, &[1]);
        let mut q = unconsumed_items();
        let expr = Field::<i64>::new("amount")
            .matches(&Predicate::greater_than(1))
            .unwrap();
        q.filter(expr);
        let (snapshot, mut stream) = vault.track(&q.build()).unwrap();
        assert!(snapshot.is_empty());

        seed(&vault, &[0, 7]);
        let update = stream.try_recv().unwrap();
        assert_eq!(update.produced.len(), 1);
        assert_eq!(update.produced[0].payload["amount"], 7);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn status_set_after_or_applies_to_both_branches() {
        let vault = InMemoryVault::default();
        let refs = seed(&vault, &[7]);
        vault
            .record(CommittedTransaction::new().input(refs[0]))
            .unwrap();

        let amount_is = |n: i64| {
            Field::<i64>::new("amount")
                .matches(&Predicate::equal_to(n))
                .unwrap()
        };
        let mut q = unconsumed_items();
        q.filter(amount_is(1))
            .or(|nested| {
                nested.filter(amount_is(7));
            })
            .status(StatusFilter::All);
        let spec = q.build();
        assert_eq!(spec.criteria.status(), StatusFilter::All);
        let page = vault.query(&spec).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.records[0].reference, refs[0]);
    }

    #[test]
    fn concurrent_commits_reach_trackers_in_commit_order() {
        use std::sync::mpsc;

        let vault = InMemoryVault::new(VaultConfig {
            channel_capacity: 4096,
            ..VaultConfig::default()
        });
        let (_, mut stream) = vault
            .track(&unconsumed_items().status(StatusFilter::All).build())
            .unwrap();

        let (sender, receiver) = mpsc::channel::<RecordRef>();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for amount in 0..200 {
                    let tx = CommittedTransaction::new()
                        .output(&item("alice", amount))
                        .unwrap();
                    let reference = tx.output_ref(0);
                    vault.record(tx).unwrap();
                    sender.send(reference).unwrap();
                }
                drop(sender);
            });
            scope.spawn(|| {
                for reference in receiver {
                    vault
                        .record(CommittedTransaction::new().input(reference))
                        .unwrap();
                }
            });
        });

        let mut produced = HashSet::new();
        let mut consumed = 0;
        while let Ok(event) = stream.try_recv() {
            for record in &event.consumed {
                assert!(
                    produced.contains(&record.reference),
                    "consumption of {} delivered before its production",
                    record.reference
                );
                consumed += 1;
            }
            produced.extend(event.produced.iter().map(|r| r.reference));
        }
        assert_eq!(produced.len(), 200);
        assert_eq!(consumed, 200);
    }
}
