//! Whole-value serialization of the asset mapping
//!
//! The canonical [`framed`] layout is the only format with a binary
//! contract; `raw` and `json` exist for consumers that want the blob
//! untouched or want to point a generic JSON parser at the segment.

pub mod framed;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, ShmCastError};

/// Ordered record sequence as produced by a data source
pub type AssetRecords = Vec<(Vec<u8>, Vec<u8>)>;

/// Decoded mapping; duplicate wire keys resolve last-write-wins
pub type AssetMap = HashMap<Vec<u8>, Vec<u8>>;

/// How the record sequence is rendered into the segment payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Canonical length-prefixed framing (see [`framed`])
    Framed,
    /// Values concatenated in record order; publish-only
    Raw,
    /// One JSON object, keys and values passed through UTF-8 lossily
    Json,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Framed
    }
}

impl Strategy {
    /// Human-readable strategy name as written in configuration
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Framed => "framed",
            Strategy::Raw => "raw",
            Strategy::Json => "json",
        }
    }

    /// Render the record sequence into a segment payload
    pub fn encode(&self, records: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<u8>> {
        match self {
            Strategy::Framed => framed::encode(records),
            Strategy::Raw => Ok(records
                .iter()
                .flat_map(|(_, value)| value.iter().copied())
                .collect()),
            Strategy::Json => {
                let mut object = serde_json::Map::with_capacity(records.len());
                for (key, value) in records {
                    object.insert(
                        String::from_utf8_lossy(key).into_owned(),
                        serde_json::Value::String(String::from_utf8_lossy(value).into_owned()),
                    );
                }
                Ok(serde_json::to_vec(&serde_json::Value::Object(object))?)
            }
        }
    }

    /// Recover the mapping from segment bytes.
    ///
    /// Tolerates trailing slack for the framed layout, since the OS may
    /// report a larger size than was written. `raw` payloads carry no
    /// record structure; read the segment bytes directly instead.
    pub fn decode(&self, buffer: &[u8]) -> Result<AssetMap> {
        match self {
            Strategy::Framed => framed::decode_padded(buffer),
            Strategy::Json => {
                let object: HashMap<String, String> = serde_json::from_slice(buffer)
                    .map_err(|e| ShmCastError::malformed(format!("invalid JSON payload: {}", e)))?;
                Ok(object
                    .into_iter()
                    .map(|(key, value)| (key.into_bytes(), value.into_bytes()))
                    .collect())
            }
            Strategy::Raw => Err(ShmCastError::invalid_parameter(
                "strategy",
                "raw payloads carry no record structure; read the segment bytes directly",
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ShmCastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "framed" => Ok(Strategy::Framed),
            "raw" => Ok(Strategy::Raw),
            "json" => Ok(Strategy::Json),
            other => Err(ShmCastError::invalid_parameter(
                "strategy",
                format!("unknown strategy '{}', expected framed, raw or json", other),
            )),
        }
    }
}
