//! RocksDB-backed document store.
//!
//! One column family, `documents`, keyed by the document UUID. Values are
//! the JSON encoding of a [`DocumentRecord`], LZ4-compressed with a
//! prepended size. Snapshots repeat heavily between history entries, so
//! LZ4 recovers most of the JSON overhead.

use std::path::{Path, PathBuf};

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    IteratorMode, Options, SingleThreaded, WriteOptions,
};
use uuid::Uuid;

use easel_core::DocumentId;

use crate::{DocumentRecord, DocumentStore, StoreError};

const CF_DOCUMENTS: &str = "documents";

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// Enable fsync on every write (default: false)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 512)
    pub max_open_files: i32,
    /// Write buffer size (default: 64MB)
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("easel_data"),
            block_cache_size: 256 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 512,
            write_buffer_size: 64 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Config for testing (small caches, caller-provided temp directory).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
            write_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// RocksDB-backed document store.
pub struct RocksStore {
    /// Single-threaded mode — concurrency is handled above via tokio
    db: DBWithThreadMode<SingleThreaded>,
    config: StoreConfig,
}

impl RocksStore {
    /// Open the store at the configured path, creating it if missing.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);

        let mut cf_opts = Options::default();
        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        cf_opts.set_block_based_table_factory(&block_opts);
        // Values are already LZ4-compressed before they reach RocksDB
        cf_opts.set_compression_type(DBCompressionType::None);
        cf_opts.set_write_buffer_size(config.write_buffer_size);
        cf_opts.optimize_for_point_lookup(config.block_cache_size as u64);

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            vec![ColumnFamilyDescriptor::new(CF_DOCUMENTS, cf_opts)],
        )?;

        log::info!("document store opened at {}", config.path.display());
        Ok(Self { db, config })
    }

    /// The database directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_DOCUMENTS)
            .ok_or_else(|| StoreError::Database(format!("column family '{CF_DOCUMENTS}' missing")))
    }

    fn encode(record: &DocumentRecord) -> Result<Vec<u8>, StoreError> {
        let json = serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(lz4_flex::compress_prepend_size(&json))
    }

    fn decode(bytes: &[u8]) -> Result<DocumentRecord, StoreError> {
        let json = lz4_flex::decompress_size_prepended(bytes)
            .map_err(|e| StoreError::Compression(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl DocumentStore for RocksStore {
    fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        let cf = self.cf()?;
        let value = Self::encode(record)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_cf_opt(cf, record.id.as_bytes(), &value, &write_opts)?;
        Ok(())
    }

    fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        let cf = self.cf()?;
        self.db.delete_cf(cf, id.as_bytes())?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentId>, StoreError> {
        let cf = self.cf()?;
        let mut ids = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if key.len() == 16 {
                let bytes: [u8; 16] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| StoreError::Serialization("invalid UUID key".into()))?;
                ids.push(Uuid::from_bytes(bytes));
            }
        }
        Ok(ids)
    }
}
