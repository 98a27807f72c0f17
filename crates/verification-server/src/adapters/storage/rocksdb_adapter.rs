//! # RocksDB Record Store
//!
//! Persistent `VerificationStore`.
//!
//! ## Column Families
//!
//! - `records` - `id (u64 BE)` → bincode `VerificationRecord`
//! - `record_index` - `account ‖ block (u64 BE) ‖ chain (u64 BE)` → `id`;
//!   the account prefix doubles as the per-account lookup
//! - `metadata` - id sequence
//!
//! Every write runs under one mutex, so the conditional status update and
//! the uniqueness check on insert are atomic with respect to each other.

use async_trait::async_trait;
use parking_lot::Mutex;
use pp_02_verification::domain::record::RecordId;
use pp_02_verification::{
    RecordKey, StatusUpdate, StoreError, VerificationRecord, VerificationStore,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use shared_types::{Address, SystemTimeSource, TimeSource, VerificationStatus};
use std::path::Path;
use std::sync::Arc;

pub const CF_RECORDS: &str = "records";
pub const CF_RECORD_INDEX: &str = "record_index";
pub const CF_METADATA: &str = "metadata";

/// All column families used by the store
pub const COLUMN_FAMILIES: &[&str] = &[CF_RECORDS, CF_RECORD_INDEX, CF_METADATA];

const NEXT_ID_KEY: &[u8] = b"next_id";

fn backend(context: &str, e: rocksdb::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

fn index_key(key: &RecordKey) -> [u8; 36] {
    let mut out = [0u8; 36];
    out[..20].copy_from_slice(key.account.as_bytes());
    out[20..28].copy_from_slice(&key.fee_paid_block.to_be_bytes());
    out[28..].copy_from_slice(&key.chain_id.value().to_be_bytes());
    out
}

fn decode_id(bytes: &[u8]) -> Result<RecordId, StoreError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization("record id is not 8 bytes".into()))?;
    Ok(u64::from_be_bytes(raw))
}

/// RocksDB-backed record table.
pub struct RocksDbVerificationStore {
    db: DB,
    write_lock: Mutex<()>,
    clock: Arc<dyn TimeSource>,
    sync_writes: bool,
}

impl RocksDbVerificationStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, Arc::new(SystemTimeSource))
    }

    pub fn open_with_clock(
        path: impl AsRef<Path>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| backend("Failed to open RocksDB", e))?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            clock,
            sync_writes: true,
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {}", name)))
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| backend("RocksDB batch write failed", e))
    }

    fn next_id(&self) -> Result<RecordId, StoreError> {
        let stored = self
            .db
            .get_cf(self.cf(CF_METADATA)?, NEXT_ID_KEY)
            .map_err(|e| backend("RocksDB get failed", e))?;
        match stored {
            Some(bytes) => decode_id(&bytes),
            None => Ok(1),
        }
    }

    fn load(&self, id: RecordId) -> Result<Option<VerificationRecord>, StoreError> {
        let stored = self
            .db
            .get_cf(self.cf(CF_RECORDS)?, id.to_be_bytes())
            .map_err(|e| backend("RocksDB get failed", e))?;
        stored
            .map(|bytes| {
                bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    fn save(&self, batch: &mut WriteBatch, record: &VerificationRecord) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        batch.put_cf(self.cf(CF_RECORDS)?, record.id.to_be_bytes(), bytes);
        Ok(())
    }

    /// Every record of `account`, via the index prefix.
    fn for_account(&self, account: Address) -> Result<Vec<VerificationRecord>, StoreError> {
        let prefix = account.as_bytes();
        let iter = self.db.iterator_cf(
            self.cf(CF_RECORD_INDEX)?,
            IteratorMode::From(prefix, Direction::Forward),
        );

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| backend("RocksDB scan failed", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(record) = self.load(decode_id(&value)?)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Read-modify-write of one record under the write lock.
    fn modify<F>(&self, id: RecordId, f: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut VerificationRecord) -> bool,
    {
        let _guard = self.write_lock.lock();
        let Some(mut record) = self.load(id)? else {
            return Ok(0);
        };
        if !f(&mut record) {
            return Ok(0);
        }
        let mut batch = WriteBatch::default();
        self.save(&mut batch, &record)?;
        self.write(batch)?;
        Ok(1)
    }
}

#[async_trait]
impl VerificationStore for RocksDbVerificationStore {
    async fn count(&self) -> Result<u64, StoreError> {
        // Records are never deleted, so the sequence is the count.
        Ok(self.next_id()? - 1)
    }

    async fn insert(&self, key: RecordKey) -> Result<VerificationRecord, StoreError> {
        let _guard = self.write_lock.lock();
        let index_cf = self.cf(CF_RECORD_INDEX)?;
        let index = index_key(&key);

        let existing = self
            .db
            .get_cf(index_cf, index)
            .map_err(|e| backend("RocksDB get failed", e))?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(key));
        }

        let id = self.next_id()?;
        let record = VerificationRecord::new(id, key, self.clock.now_millis());

        let mut batch = WriteBatch::default();
        self.save(&mut batch, &record)?;
        batch.put_cf(index_cf, index, id.to_be_bytes());
        batch.put_cf(self.cf(CF_METADATA)?, NEXT_ID_KEY, (id + 1).to_be_bytes());
        self.write(batch)?;

        Ok(record)
    }

    async fn get(&self, id: RecordId) -> Result<Option<VerificationRecord>, StoreError> {
        self.load(id)
    }

    async fn find(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        let stored = self
            .db
            .get_cf(self.cf(CF_RECORD_INDEX)?, index_key(key))
            .map_err(|e| backend("RocksDB get failed", e))?;
        match stored {
            Some(bytes) => self.load(decode_id(&bytes)?),
            None => Ok(None),
        }
    }

    async fn latest_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self
            .for_account(account)?
            .into_iter()
            .max_by_key(|r| r.recency()))
    }

    async fn highest_block_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self
            .for_account(account)?
            .into_iter()
            .max_by_key(|r| (r.fee_paid_block, r.recency())))
    }

    async fn verified_for_account(
        &self,
        account: Address,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let mut verified: Vec<_> = self
            .for_account(account)?
            .into_iter()
            .filter(|r| r.is_verified())
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
        self.modify(id, |record| {
            record.session_id = Some(session_id.to_string());
            if status.is_some() {
                record.status = status;
            }
            true
        })
    }

    async fn update_status(
        &self,
        id: RecordId,
        expected: Option<VerificationStatus>,
        update: &StatusUpdate,
    ) -> Result<u64, StoreError> {
        self.modify(id, |record| {
            if record.status != expected {
                return false;
            }
            record.apply(update);
            true
        })
    }

    async fn mark_redacted(&self, id: RecordId) -> Result<u64, StoreError> {
        self.modify(id, |record| {
            record.redact();
            true
        })
    }
}
