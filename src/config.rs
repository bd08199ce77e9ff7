use crate::{RedisBackEnd, RedisHighPerfBackEnd, Result};

/// Connection settings for the Redis backends.
///
/// ```no_run
/// # use hanoi::RedisConfig;
/// let backend = RedisConfig::from_address("cache.internal", 6380, 2).to_backend()?;
/// # Ok::<(), hanoi::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    url: String,
}

impl RedisConfig {
    /// Local server, database 0.
    pub const DEFAULT_URL: &'static str = "redis://127.0.0.1:6379/0";

    /// Use a `redis://` (or `rediss://`, `redis+unix://`) URL.
    ///
    /// ```
    /// # use hanoi::RedisConfig;
    /// let config = RedisConfig::from_url("redis://:secret@cache.internal/1");
    /// assert_eq!(config.url(), "redis://:secret@cache.internal/1");
    /// ```
    pub fn from_url(url: impl Into<String>) -> Self {
        RedisConfig { url: url.into() }
    }

    /// Connect to `host:port`, selecting database `db`.
    pub fn from_address(host: &str, port: u16, db: u16) -> Self {
        RedisConfig {
            url: format!("redis://{host}:{port}/{db}"),
        }
    }

    /// The URL connections are opened with.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a connection. Fails if the URL is invalid or the server is unreachable.
    pub fn connect(&self) -> Result<redis::Connection> {
        log::debug!(target: "hanoi", url:display = self.url; "connecting to redis");
        let client = redis::Client::open(self.url.as_str())?;
        Ok(client.get_connection()?)
    }

    /// Connect and create a [`RedisBackEnd`].
    pub fn to_backend(&self) -> Result<RedisBackEnd> {
        Ok(RedisBackEnd::new(self.connect()?))
    }

    /// Connect and create a [`RedisHighPerfBackEnd`].
    pub fn to_high_perf_backend(&self) -> Result<RedisHighPerfBackEnd> {
        Ok(RedisHighPerfBackEnd::new(self.connect()?))
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig::from_url(RedisConfig::DEFAULT_URL)
    }
}
