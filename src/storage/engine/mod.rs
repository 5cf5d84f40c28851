use crate::core::StorageError;

pub mod memory_engine;
#[cfg(feature = "redb")]
pub mod redb_engine;

pub use memory_engine::MemoryEngine;
#[cfg(feature = "redb")]
pub use redb_engine::RedbEngine;

/// 有序字节键值引擎
///
/// `scan` 按键的字节序返回结果；`batch` 中的所有操作要么全部生效，要么全部不生效
pub trait Engine: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;
    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;
    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;
    fn batch(&mut self, ops: Vec<Operation>) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Operation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Operation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Operation::Delete { key: key.into() }
    }
}
