//! # In-Memory Verification Store
//!
//! `VerificationStore` backed by a `BTreeMap` behind a `parking_lot::RwLock`.
//! Every write takes the write lock, so the conditional update is atomic.

use crate::domain::record::{RecordId, RecordKey, StatusUpdate, VerificationRecord};
use crate::ports::outbound::{StoreError, VerificationStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Address, SystemTimeSource, TimeSource, VerificationStatus};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Table {
    records: BTreeMap<RecordId, VerificationRecord>,
    index: HashMap<RecordKey, RecordId>,
    next_id: RecordId,
}

impl Table {
    fn for_account(&self, account: Address) -> impl Iterator<Item = &VerificationRecord> + '_ {
        self.records.values().filter(move |r| r.account == account)
    }
}

/// Volatile record table. Contents are lost on restart.
pub struct InMemoryVerificationStore {
    table: RwLock<Table>,
    clock: Arc<dyn TimeSource>,
    reject_updates: AtomicBool,
}

impl Default for InMemoryVerificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }

    /// Store stamping `created` from `clock`.
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            table: RwLock::new(Table {
                next_id: 1,
                ..Table::default()
            }),
            clock,
            reject_updates: AtomicBool::new(false),
        }
    }

    /// When set, `attach_session` and `update_status` affect no rows.
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of every record, in id order.
    pub fn records(&self) -> Vec<VerificationRecord> {
        self.table.read().records.values().cloned().collect()
    }

    fn rejecting(&self) -> bool {
        self.reject_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.table.read().records.len() as u64)
    }

    async fn insert(&self, key: RecordKey) -> Result<VerificationRecord, StoreError> {
        let mut table = self.table.write();
        if table.index.contains_key(&key) {
            return Err(StoreError::Duplicate(key));
        }
        let id = table.next_id;
        table.next_id += 1;
        let record = VerificationRecord::new(id, key, self.clock.now_millis());
        table.index.insert(key, id);
        table.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: RecordId) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.table.read().records.get(&id).cloned())
    }

    async fn find(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        let table = self.table.read();
        Ok(table
            .index
            .get(key)
            .and_then(|id| table.records.get(id))
            .cloned())
    }

    async fn latest_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let table = self.table.read();
        Ok(table.for_account(account).max_by_key(|r| r.recency()).cloned())
    }

    async fn highest_block_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let table = self.table.read();
        Ok(table
            .for_account(account)
            .max_by_key(|r| (r.fee_paid_block, r.recency()))
            .cloned())
    }

    async fn verified_for_account(
        &self,
        account: Address,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let table = self.table.read();
        let mut verified: Vec<_> = table
            .for_account(account)
            .filter(|r| r.is_verified())
            .cloned()
            .collect();
        verified.sort_by_key(|r| std::cmp::Reverse(r.recency()));
        Ok(verified)
    }

    async fn attach_session(
        &self,
        id: RecordId,
        session_id: &str,
        status: Option<VerificationStatus>,
    ) -> Result<u64, StoreError> {
        if self.rejecting() {
            return Ok(0);
        }
        let mut table = self.table.write();
        let Some(record) = table.records.get_mut(&id) else {
            return Ok(0);
        };
        record.session_id = Some(session_id.to_string());
        if status.is_some() {
            record.status = status;
        }
        Ok(1)
    }

    async fn update_status(
        &self,
        id: RecordId,
        expected: Option<VerificationStatus>,
        update: &StatusUpdate,
    ) -> Result<u64, StoreError> {
        if self.rejecting() {
            return Ok(0);
        }
        let mut table = self.table.write();
        match table.records.get_mut(&id) {
            Some(record) if record.status == expected => {
                record.apply(update);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn mark_redacted(&self, id: RecordId) -> Result<u64, StoreError> {
        let mut table = self.table.write();
        let Some(record) = table.records.get_mut(&id) else {
            return Ok(0);
        };
        record.redact();
        Ok(1)
    }
}
