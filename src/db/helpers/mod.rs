use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

pub fn decode_json<T: DeserializeOwned>(raw: &str, key: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("failed to decode document '{key}'"))
}

pub fn encode_json<T: Serialize>(value: &T, key: &str) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("failed to encode document '{key}'"))
}
