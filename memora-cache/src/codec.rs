//! Entry codecs.

use serde::de::DeserializeOwned;
use serde::Serialize;

use memora_core::error::{MemoraError, Result};
use memora_core::traits::Codec;
use memora_core::types::CacheEntry;

/// JSON codec. The default: readable in `redis-cli` and across languages.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn encode(&self, entry: &CacheEntry<T>) -> Result<Vec<u8>> {
        serde_json::to_vec(entry).map_err(|e| MemoraError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheEntry<T>> {
        serde_json::from_slice(bytes).map_err(|e| MemoraError::Deserialization(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Compact binary codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn encode(&self, entry: &CacheEntry<T>) -> Result<Vec<u8>> {
        bincode::serialize(entry).map_err(|e| MemoraError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheEntry<T>> {
        bincode::deserialize(bytes).map_err(|e| MemoraError::Deserialization(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}
