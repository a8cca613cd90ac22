//! Canonical byte encoding used for hashing and signing
//!
//! The layout is frozen: every stored block hash and every signature depends
//! on it. All integers are big-endian; strings are a `u32` length prefix
//! followed by their UTF-8 bytes.
//!
//! ```text
//! tx payload  = str(sender) | str(recipient) | u64(amount)
//! tx full     = tx payload  | str(signature)
//! block       = u64(index) | u32(tx_count) | tx full* | i64(timestamp)
//!               | str(previous_hash) | u64(nonce)
//! ```
//!
//! The block hash field itself is never part of the encoding.

/// Incremental writer for the canonical layout
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_str(&mut self, value: &str) -> &mut Self {
        // Strings on the ledger are keys and hex digests; u32 is plenty.
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything written after `len`, keeping the prefix
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Entities with a fixed canonical encoding
pub trait Canonical {
    fn encode_into(&self, writer: &mut CanonicalWriter);

    fn canonical_bytes(&self) -> Vec<u8> {
        let mut writer = CanonicalWriter::new();
        self.encode_into(&mut writer);
        writer.into_bytes()
    }
}
