//! Length-prefixed binary records.
//!
//! Scalars are little-endian. Strings and collections carry a `u64` length
//! prefix which readers validate against [`PersistenceConfig`] before
//! allocating anything.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use game_context::Value;
use std::collections::BTreeMap;
use std::io::{self, Read};

use crate::config::PersistenceConfig;
use crate::error::{EngineError, Result};

/// Append-only record buffer that enforces the save limits on write.
#[derive(Debug)]
pub struct RecordWriter {
    buf: Vec<u8>,
    limits: PersistenceConfig,
}

impl RecordWriter {
    pub fn new(limits: PersistenceConfig) -> Self {
        Self {
            buf: Vec::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &PersistenceConfig {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        Ok(self.buf.write_u8(v)?)
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(u8::from(v))
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        Ok(self.buf.write_u32::<LittleEndian>(v)?)
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        Ok(self.buf.write_i32::<LittleEndian>(v)?)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        Ok(self.buf.write_u64::<LittleEndian>(v)?)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        Ok(self.buf.write_i64::<LittleEndian>(v)?)
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        Ok(self.buf.write_f32::<LittleEndian>(v)?)
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        Ok(self.buf.write_f64::<LittleEndian>(v)?)
    }

    /// Raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a length prefix, refusing values above `max`.
    pub fn write_len(&mut self, field: &'static str, len: usize, max: usize) -> Result<()> {
        if len > max {
            return Err(EngineError::Oversized { field, len, max });
        }
        Ok(self.buf.write_u64::<LittleEndian>(len as u64)?)
    }

    /// Collection count bounded by `max_collection_len`.
    pub fn write_count(&mut self, field: &'static str, count: usize) -> Result<()> {
        self.write_len(field, count, self.limits.max_collection_len)
    }

    /// Length-prefixed blob bounded by `max_record_bytes`.
    pub fn write_blob(&mut self, field: &'static str, bytes: &[u8]) -> Result<()> {
        self.write_len(field, bytes.len(), self.limits.max_record_bytes)?;
        self.write_raw(bytes);
        Ok(())
    }

    /// String value bounded by `max_string_len`.
    pub fn write_str(&mut self, field: &'static str, s: &str) -> Result<()> {
        self.write_len(field, s.len(), self.limits.max_string_len)?;
        self.write_raw(s.as_bytes());
        Ok(())
    }

    /// Non-empty key or name bounded by `max_key_len`.
    pub fn write_key(&mut self, field: &'static str, s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(EngineError::Corrupt(format!("empty {field}")));
        }
        self.write_len(field, s.len(), self.limits.max_key_len)?;
        self.write_raw(s.as_bytes());
        Ok(())
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.write_u8(value.type_tag())?;
        match value {
            Value::Str(s) => self.write_str("string value", s),
            Value::Int(i) => self.write_i64(*i),
            Value::Float(f) => self.write_f64(*f),
            Value::Bool(b) => self.write_bool(*b),
        }
    }

    /// `count, (key, value)*` for a node's free-form state.
    pub fn write_state_map(&mut self, map: &BTreeMap<String, Value>) -> Result<()> {
        self.write_count("state entry count", map.len())?;
        for (key, value) in map {
            self.write_key("state key", key)?;
            self.write_value(value)?;
        }
        Ok(())
    }
}

/// Bounded reader over any byte source.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    limits: PersistenceConfig,
}

fn eof_as_truncated(field: &'static str) -> impl Fn(io::Error) -> EngineError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            EngineError::Truncated(field)
        } else {
            EngineError::Io(e)
        }
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, limits: PersistenceConfig) -> Self {
        Self { inner, limits }
    }

    pub fn limits(&self) -> &PersistenceConfig {
        &self.limits
    }

    /// Fail with [`EngineError::Corrupt`] unless the source has no bytes left.
    pub fn expect_end(&mut self, after: &'static str) -> Result<()> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(()),
                Ok(_) => return Err(EngineError::Corrupt(format!("trailing bytes after {after}"))),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(EngineError::Io(e)),
            }
        }
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        self.inner.read_u8().map_err(eof_as_truncated(field))
    }

    /// Only 0 and 1 are valid booleans.
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(EngineError::Corrupt(format!("{field}: invalid bool byte {other}"))),
        }
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    pub fn read_i32(&mut self, field: &'static str) -> Result<i32> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64> {
        self.inner
            .read_u64::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    pub fn read_i64(&mut self, field: &'static str) -> Result<i64> {
        self.inner
            .read_i64::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    pub fn read_f32(&mut self, field: &'static str) -> Result<f32> {
        self.inner
            .read_f32::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    pub fn read_f64(&mut self, field: &'static str) -> Result<f64> {
        self.inner
            .read_f64::<LittleEndian>()
            .map_err(eof_as_truncated(field))
    }

    /// Read exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.inner
            .read_exact(&mut out)
            .map_err(eof_as_truncated(field))?;
        Ok(out)
    }

    /// Read a length prefix and reject it if it exceeds `max`.
    pub fn read_len(&mut self, field: &'static str, max: usize) -> Result<usize> {
        let declared = self
            .inner
            .read_u64::<LittleEndian>()
            .map_err(eof_as_truncated(field))?;
        if declared > max as u64 {
            return Err(EngineError::LengthExceeded {
                field,
                declared,
                max: max as u64,
            });
        }
        Ok(declared as usize)
    }

    pub fn read_count(&mut self, field: &'static str) -> Result<usize> {
        let max = self.limits.max_collection_len;
        self.read_len(field, max)
    }

    /// Read `len` bytes; `len` must already be validated by the caller.
    fn read_exact_vec(&mut self, field: &'static str, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .map_err(eof_as_truncated(field))?;
        Ok(buf)
    }

    pub fn read_blob(&mut self, field: &'static str) -> Result<Vec<u8>> {
        let max = self.limits.max_record_bytes;
        let len = self.read_len(field, max)?;
        self.read_exact_vec(field, len)
    }

    fn read_utf8(&mut self, field: &'static str, len: usize) -> Result<String> {
        let bytes = self.read_exact_vec(field, len)?;
        String::from_utf8(bytes).map_err(|_| EngineError::Corrupt(format!("{field} is not valid UTF-8")))
    }

    pub fn read_str(&mut self, field: &'static str) -> Result<String> {
        let max = self.limits.max_string_len;
        let len = self.read_len(field, max)?;
        self.read_utf8(field, len)
    }

    pub fn read_key(&mut self, field: &'static str) -> Result<String> {
        let max = self.limits.max_key_len;
        let len = self.read_len(field, max)?;
        if len == 0 {
            return Err(EngineError::Corrupt(format!("empty {field}")));
        }
        self.read_utf8(field, len)
    }

    pub fn read_value(&mut self) -> Result<Value> {
        let tag = self.read_u8("value type")?;
        match tag {
            b's' => Ok(Value::Str(self.read_str("string value")?)),
            b'i' => Ok(Value::Int(self.read_i64("int value")?)),
            b'f' => Ok(Value::Float(self.read_f64("float value")?)),
            b'b' => Ok(Value::Bool(self.read_bool("bool value")?)),
            other => Err(EngineError::Corrupt(format!(
                "invalid value type tag {other:#04x}"
            ))),
        }
    }

    pub fn read_state_map(&mut self) -> Result<BTreeMap<String, Value>> {
        let count = self.read_count("state entry count")?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = self.read_key("state key")?;
            let value = self.read_value()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl RecordReader<&[u8]> {
    /// Whether every byte of the record has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PersistenceConfig {
        PersistenceConfig::default()
    }

    fn reader(bytes: &[u8]) -> RecordReader<&[u8]> {
        RecordReader::new(bytes, limits())
    }

    #[test]
    fn test_state_map_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("visited".to_string(), Value::Bool(true));
        map.insert("gold_owed".to_string(), Value::Int(-40));
        map.insert("mood".to_string(), Value::from("wary"));
        map.insert("heat".to_string(), Value::Float(0.25));

        let mut w = RecordWriter::new(limits());
        w.write_state_map(&map).unwrap();
        let bytes = w.into_bytes();

        let mut r = reader(&bytes);
        assert_eq!(r.read_state_map().unwrap(), map);
        assert!(r.is_exhausted());
    }

    #[test]
    fn test_oversized_length_rejected_before_read() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(10_001u64).to_le_bytes());
        // No payload at all: a reader that allocated first would report truncation.
        let err = reader(&bytes).read_str("description").unwrap_err();
        assert!(matches!(
            err,
            EngineError::LengthExceeded {
                field: "description",
                declared: 10_001,
                max: 10_000
            }
        ));
    }

    #[test]
    fn test_huge_count_rejected() {
        let bytes = u64::MAX.to_le_bytes();
        let err = reader(&bytes).read_count("region count").unwrap_err();
        assert!(matches!(err, EngineError::LengthExceeded { .. }));
    }

    #[test]
    fn test_truncated_string() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.extend_from_slice(b"ab");
        let err = reader(&bytes).read_str("name").unwrap_err();
        assert!(matches!(err, EngineError::Truncated("name")));
    }

    #[test]
    fn test_empty_key_rejected() {
        let bytes = 0u64.to_le_bytes();
        assert!(matches!(
            reader(&bytes).read_key("state key"),
            Err(EngineError::Corrupt(_))
        ));

        let mut w = RecordWriter::new(limits());
        assert!(w.write_key("state key", "").is_err());
    }

    #[test]
    fn test_invalid_value_tag() {
        let bytes = [b'x'];
        assert!(matches!(reader(&bytes).read_value(), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn test_invalid_bool_byte() {
        let bytes = [7u8];
        assert!(reader(&bytes).read_bool("flag").is_err());
    }

    #[test]
    fn test_writer_refuses_oversized_string() {
        let mut small = limits();
        small.max_string_len = 4;
        let mut w = RecordWriter::new(small);

        let err = w.write_str("description", "stormy").unwrap_err();
        assert!(matches!(err, EngineError::Oversized { len: 6, max: 4, .. }));
    }
}
