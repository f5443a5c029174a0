use cinder_privacy::SpendingAddress;

pub const DEFAULT_SHARD_COUNT: u8 = 16;

/// Shard an address belongs to: its last byte modulo the shard count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId(pub u8);

impl ShardId {
    pub fn of(address: &SpendingAddress, shard_count: u8) -> Self {
        Self(address.last_byte() % shard_count.max(1))
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for ShardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}
