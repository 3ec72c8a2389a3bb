//! Cursor codec
//!
//! Converts between the connector-native opaque byte cursor and the
//! standard base64 text used whenever a cursor leaves this crate.

use crate::error::Result;
use crate::types::EncodedSnapshot;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Opaque, connector-defined read position.
///
/// The bytes are never parsed or reinterpreted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Create the empty cursor (fresh task)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a cursor from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes of the cursor
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the cursor, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Zero-length cursor
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Transport encoding of this cursor
    pub fn encode(&self) -> EncodedSnapshot {
        encode(&self.0)
    }

    /// Parse a transport-encoded cursor
    pub fn decode(snapshot: &str) -> Result<Self> {
        decode(snapshot).map(Self)
    }
}

impl From<Vec<u8>> for Cursor {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Cursor {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Cursor {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Encode cursor bytes as standard base64. Never fails.
pub fn encode(bytes: &[u8]) -> EncodedSnapshot {
    STANDARD.encode(bytes)
}

/// Decode standard base64 back into cursor bytes
pub fn decode(snapshot: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(snapshot)?)
}

/// An encoded snapshot that carries nothing worth persisting.
///
/// Whitespace-only text is treated the same as empty text.
pub fn is_empty_payload(snapshot: &str) -> bool {
    snapshot.trim().is_empty()
}
