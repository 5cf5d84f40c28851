use super::{Engine, Operation};
use crate::core::StorageError;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

const DATA_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("documents");

fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::DbError(e.to_string())
}

/// 基于 redb 的持久化引擎，每次写操作一个写事务
pub struct RedbEngine {
    db: Database,
    db_path: String,
}

impl RedbEngine {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_string_lossy().to_string();

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(db_err)?;
            }
        }

        let db = Database::create(path.as_ref()).map_err(db_err)?;

        // 确保表存在，避免只读事务打开表失败
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            write_txn.open_table(DATA_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl Engine for RedbEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(DATA_TABLE).map_err(db_err)?;

        let value = table.get(key).map_err(db_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.batch(vec![Operation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.batch(vec![Operation::delete(key)])
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(DATA_TABLE).map_err(db_err)?;

        // redb 按键有序存储，从前缀处开始，遇到第一个不匹配的键即停止
        let mut results: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        for item in table.range(prefix..).map_err(db_err)? {
            let (key, value) = item.map_err(db_err)?;
            let key_bytes = key.value();
            if !key_bytes.starts_with(prefix) {
                break;
            }
            results.push((key_bytes.to_vec(), value.value().to_vec()));
        }
        Ok(results)
    }

    fn batch(&mut self, ops: Vec<Operation>) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(DATA_TABLE).map_err(db_err)?;

            for op in &ops {
                match op {
                    Operation::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(db_err)?;
                    }
                    Operation::Delete { key } => {
                        table.remove(key.as_slice()).map_err(db_err)?;
                    }
                }
            }
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }
}
