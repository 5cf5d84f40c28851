//! 用户ID - 12字节的 ObjectId 风格标识符
//!
//! 布局：4字节时间戳(秒，大端) + 5字节进程随机数 + 3字节自增计数器(大端)
//! 文本形式为 24 个小写十六进制字符，按创建时间有序

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;

/// 全局计数器，初始值随机
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
/// 进程级随机字节
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; ID_BYTES]);

impl UserId {
    /// Generates a fresh id for the current second
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::with_timestamp(secs)
    }

    fn with_timestamp(secs: u32) -> Self {
        let process = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x000F_FFFF))
            .fetch_add(1, Ordering::SeqCst)
            & 0x00FF_FFFF;

        let mut bytes = [0u8; ID_BYTES];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        UserId(bytes)
    }

    /// Parses the 24 character hex form. Anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != ID_HEX_LEN {
            return None;
        }
        let mut bytes = [0u8; ID_BYTES];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(UserId(bytes))
    }

    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_some()
    }

    /// 创建时间戳（秒）
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for UserId {
    type Err = crate::core::error::UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::parse(s).ok_or_else(|| crate::core::error::UserError::InvalidId(s.to_string()))
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UserId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid user id: {}", s)))
    }
}
