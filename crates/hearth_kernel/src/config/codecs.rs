use super::ConfigCodec;
use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// TOML codec for serde types.
pub struct TomlConfigCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TomlConfigCodec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for TomlConfigCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TomlConfigCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TomlConfigCodec")
    }
}

impl<T> ConfigCodec<T> for TomlConfigCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, text: &str) -> Result<T, CodecError> {
        toml::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<String, CodecError> {
        toml::to_string_pretty(value).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

/// Pretty-printed JSON codec for serde types.
pub struct JsonConfigCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConfigCodec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for JsonConfigCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonConfigCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonConfigCodec")
    }
}

impl<T> ConfigCodec<T> for JsonConfigCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, text: &str) -> Result<T, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string_pretty(value).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

/// Codec assembled from a pair of closures.
pub struct FnConfigCodec<D, E> {
    decode: D,
    encode: E,
}

impl<D, E> FnConfigCodec<D, E> {
    pub fn new(decode: D, encode: E) -> Self {
        Self { decode, encode }
    }
}

impl<T, D, E> ConfigCodec<T> for FnConfigCodec<D, E>
where
    D: Fn(&str) -> Result<T, CodecError> + Send + Sync,
    E: Fn(&T) -> Result<String, CodecError> + Send + Sync,
{
    fn decode(&self, text: &str) -> Result<T, CodecError> {
        (self.decode)(text)
    }

    fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }
}
