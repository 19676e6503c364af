//! Redis-backed cache store.
//!
//! One multiplexed connection is opened on first use and shared by every
//! clone of the store. An I/O failure drops it, so the next command
//! reconnects after a server restart.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tracing::{debug, instrument};

use memora_core::constants::DEFAULT_SCAN_COUNT;
use memora_core::error::{MemoraError, Result};
use memora_core::traits::CacheStore;
use memora_core::types::{Expiry, KeyTtl};

/// Configuration for [`RedisStore`].
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// COUNT hint passed to each SCAN page.
    pub scan_count: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl RedisStoreConfig {
    /// Sets the SCAN page size hint. Zero is clamped to one.
    pub fn with_scan_count(mut self, count: usize) -> Self {
        self.scan_count = count.max(1);
        self
    }
}

/// [`CacheStore`] over a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
    config: RedisStoreConfig,
}

impl RedisStore {
    /// Wraps an existing client.
    pub fn new(client: redis::Client, config: RedisStoreConfig) -> Self {
        Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// Creates a store from a `redis://` URL with default configuration.
    ///
    /// The URL is validated here; no connection is made until first use.
    pub fn from_url(url: &str) -> Result<Self> {
        Self::from_url_with_config(url, RedisStoreConfig::default())
    }

    /// Creates a store from a URL with custom configuration.
    pub fn from_url_with_config(url: &str, config: RedisStoreConfig) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| MemoraError::ConfigError(format!("invalid Redis URL: {e}")))?;
        Ok(Self::new(client, config))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let cached = self.connection.lock().clone();
        if let Some(con) = cached {
            return Ok(con);
        }

        let con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| MemoraError::store(format!("Redis connection error: {e}")))?;
        debug!("Opened Redis connection");

        // A concurrent caller may have connected first; keep theirs.
        let mut slot = self.connection.lock();
        Ok(slot.get_or_insert(con).clone())
    }

    fn command_error(&self, command: &str, err: RedisError) -> MemoraError {
        if err.is_io_error() || err.is_connection_dropped() {
            self.connection.lock().take();
        }
        MemoraError::store(format!("Redis {command} error: {err}"))
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("client", &self.client)
            .field("connected", &self.connection.lock().is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn with_expiry(mut cmd: redis::Cmd, expiry: Expiry) -> redis::Cmd {
    match expiry {
        Expiry::Seconds(secs) => cmd.arg("EX").arg(secs),
        Expiry::Millis(ms) => cmd.arg("PX").arg(ms),
    };
    cmd
}

#[async_trait]
impl CacheStore for RedisStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut con = self.connection().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("GET", e))?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    async fn set(&self, key: &str, value: &[u8], expiry: Option<Expiry>) -> Result<()> {
        let mut con = self.connection().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(expiry) = expiry {
            cmd = with_expiry(cmd, expiry);
        }

        let _: () = cmd
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("SET", e))?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn set_if_absent(&self, key: &str, value: &[u8], expiry: Expiry) -> Result<bool> {
        let mut con = self.connection().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        let reply: Option<String> = with_expiry(cmd, expiry)
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("SET NX", e))?;

        let won = match reply.as_deref() {
            None => false,
            Some("OK") => true,
            Some(other) => {
                return Err(MemoraError::UnexpectedReply {
                    key: key.to_string(),
                    reason: format!("SET NX answered {other:?}"),
                })
            }
        };
        debug!(key, won, "Conditional set");
        Ok(won)
    }

    #[instrument(skip(self), fields(count = keys.len()))]
    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut con = self.connection().await?;
        let removed: u64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("DEL", e))?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut con = self.connection().await?;
        let pttl: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("PTTL", e))?;
        Ok(KeyTtl::from_pttl(pttl))
    }

    #[instrument(skip(self))]
    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut con = self.connection().await?;
        let mut keys = Vec::new();

        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.config.scan_count)
                .query_async(&mut con)
                .await
                .map_err(|e| self.command_error("SCAN", e))?;

            keys.extend(batch);

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once across pages.
        keys.sort();
        keys.dedup();

        debug!(pattern, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        let mut con = self.connection().await?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(|e| self.command_error("PING", e))?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(MemoraError::UnexpectedReply {
                key: String::new(),
                reason: format!("PING answered {reply:?}"),
            })
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
