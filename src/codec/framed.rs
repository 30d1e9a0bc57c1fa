//! Canonical length-prefixed framing for the published record stream
//!
//! Layout, all integers little-endian and unsigned:
//!
//! ```text
//! [0..8)  record_count : u64
//! repeated record_count times:
//!   key_len   : u8
//!   key       : key_len bytes
//!   value_len : u64
//!   value     : value_len bytes
//! ```
//!
//! Keys and values are opaque byte strings; embedded zero bytes are fine.
//! Duplicate keys are legal on the wire and resolve last-write-wins when
//! decoded back into a map.

use crate::error::{Result, ShmCastError};

use super::AssetMap;

/// Longest key the one-byte length prefix can describe
pub const MAX_KEY_LEN: usize = 255;

const COUNT_LEN: usize = 8;
const KEY_PREFIX_LEN: usize = 1;
const VALUE_PREFIX_LEN: usize = 8;

/// Exact byte length `encode` will produce for `records`
pub fn encoded_len(records: &[(Vec<u8>, Vec<u8>)]) -> usize {
    COUNT_LEN
        + records
            .iter()
            .map(|(key, value)| KEY_PREFIX_LEN + key.len() + VALUE_PREFIX_LEN + value.len())
            .sum::<usize>()
}

/// Encode an ordered record sequence into a single flat buffer.
///
/// Every key is validated before the first byte is written, so a failed
/// encode never yields a partial buffer. Record order in the output equals
/// the input order.
pub fn encode(records: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<u8>> {
    for (key, _) in records {
        if key.len() > MAX_KEY_LEN {
            return Err(ShmCastError::key_too_long(key));
        }
    }

    let mut out = Vec::with_capacity(encoded_len(records));
    out.extend_from_slice(&(records.len() as u64).to_le_bytes());
    for (key, value) in records {
        out.push(key.len() as u8);
        out.extend_from_slice(key);
        out.extend_from_slice(&(value.len() as u64).to_le_bytes());
        out.extend_from_slice(value);
    }
    Ok(out)
}

/// Decode a buffer produced by [`encode`], rejecting trailing bytes.
pub fn decode(buffer: &[u8]) -> Result<AssetMap> {
    decode_inner(buffer, false)
}

/// Decode a buffer that may carry trailing slack beyond the record stream.
///
/// The OS may report a segment size larger than the bytes that were written
/// into it; readers go through this entry point. Anything *shorter* than the
/// declared record stream is still malformed.
pub fn decode_padded(buffer: &[u8]) -> Result<AssetMap> {
    decode_inner(buffer, true)
}

fn decode_inner(buffer: &[u8], allow_slack: bool) -> Result<AssetMap> {
    let mut cursor = Cursor::new(buffer);
    let record_count = cursor.take_u64("record count")?;

    let mut records = AssetMap::new();
    for _ in 0..record_count {
        let key_len = cursor.take_u8("key length")? as usize;
        let key = cursor.take(key_len, "key")?.to_vec();
        let value_len = cursor.take_u64("value length")?;
        let value_len = usize::try_from(value_len).map_err(|_| {
            ShmCastError::malformed(format!(
                "value length {} exceeds addressable memory",
                value_len
            ))
        })?;
        let value = cursor.take(value_len, "value")?.to_vec();
        // later duplicates overwrite earlier ones
        records.insert(key, value);
    }

    if !allow_slack && cursor.remaining() != 0 {
        return Err(ShmCastError::malformed(format!(
            "{} trailing bytes after {} records",
            cursor.remaining(),
            record_count
        )));
    }

    Ok(records)
}

/// Bounds-checked reader over the raw segment bytes
struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ShmCastError::malformed(format!(
                "truncated {} at offset {}: need {} bytes, {} remain",
                field,
                self.offset,
                len,
                self.remaining()
            )));
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn take_u64(&mut self, field: &'static str) -> Result<u64> {
        let bytes = self.take(8, field)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
        (key.as_bytes().to_vec(), value.as_bytes().to_vec())
    }

    #[test]
    fn test_empty_mapping_is_count_header_only() {
        let encoded = encode(&[]).unwrap();
        assert_eq!(encoded, vec![0u8; 8]);
        assert!(decode(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let records = vec![record("a", "hello"), record("bb", "world!")];
        let encoded = encode(&records).unwrap();
        assert_eq!(encoded.len(), encoded_len(&records));
    }

    #[test]
    fn test_max_length_key_is_accepted() {
        let records = vec![(vec![b'k'; MAX_KEY_LEN], b"v".to_vec())];
        let decoded = decode(&encode(&records).unwrap()).unwrap();
        assert_eq!(decoded[&vec![b'k'; MAX_KEY_LEN]], b"v");
    }

    #[test]
    fn test_oversized_key_rejected_before_any_output() {
        let records = vec![record("fine", "x"), (vec![b'k'; 256], b"v".to_vec())];
        let err = encode(&records).unwrap_err();
        assert!(matches!(
            err,
            ShmCastError::KeyTooLong { length: 256, .. }
        ));
    }

    #[test]
    fn test_absurd_record_count_fails_cleanly() {
        let mut buffer = u64::MAX.to_le_bytes().to_vec();
        buffer.push(0);
        let err = decode(&buffer).unwrap_err();
        assert!(matches!(err, ShmCastError::MalformedSegment { .. }));
    }
}
