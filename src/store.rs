//! Key-value primitives the remote backends are built on.
use crate::Result;

/// The subset of Redis commands used by [`RedisBackEnd`](crate::RedisBackEnd) and
/// [`RedisHighPerfBackEnd`](crate::RedisHighPerfBackEnd).
///
/// Implemented for [`redis::Connection`]. Timeouts and reconnection are whatever the connection
/// was configured with.
pub trait KeyValueStore {
    /// String value of `key`.
    fn get(&mut self, key: &str) -> Result<Option<String>>;
    /// Overwrite `key` with a string value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Delete `key`, whatever its type.
    fn del(&mut self, key: &str) -> Result<()>;
    /// Keys matching a glob pattern. O(N) on the whole keyspace.
    fn keys(&mut self, pattern: &str) -> Result<Vec<String>>;
    /// Add `member` to the set at `key`.
    fn sadd(&mut self, key: &str, member: &str) -> Result<()>;
    /// Whether `member` is in the set at `key`.
    fn sismember(&mut self, key: &str, member: &str) -> Result<bool>;
    /// Members of the set at `key`, in no particular order.
    fn smembers(&mut self, key: &str) -> Result<Vec<String>>;
}

impl KeyValueStore for redis::Connection {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(redis::cmd("GET").arg(key).query(self)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        redis::cmd("SET").arg(key).arg(value).query::<()>(self)?;
        Ok(())
    }

    fn del(&mut self, key: &str) -> Result<()> {
        redis::cmd("DEL").arg(key).query::<()>(self)?;
        Ok(())
    }

    fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        Ok(redis::cmd("KEYS").arg(pattern).query(self)?)
    }

    fn sadd(&mut self, key: &str, member: &str) -> Result<()> {
        redis::cmd("SADD").arg(key).arg(member).query::<()>(self)?;
        Ok(())
    }

    fn sismember(&mut self, key: &str, member: &str) -> Result<bool> {
        Ok(redis::cmd("SISMEMBER").arg(key).arg(member).query(self)?)
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>> {
        Ok(redis::cmd("SMEMBERS").arg(key).query(self)?)
    }
}
