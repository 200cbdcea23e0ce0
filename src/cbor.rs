//! CBOR decoding for App Attest payloads
//!
//! Attestation objects, assertion objects and COSE keys arrive as CBOR
//! produced by the device. The input is attacker-controlled, so every
//! read goes through a bounds-checked cursor and any truncation or
//! marker outside the understood subset yields a typed error instead of
//! touching out-of-range memory.
//!
//! The supported subset is what the protocol actually uses: unsigned
//! and negative integers, byte strings, text strings, arrays, maps,
//! booleans and null. Tagged values are transparently unwrapped (the
//! tag number carries no meaning for App Attest). Indefinite lengths,
//! floats and the remaining simple values are rejected.

use crate::errors::AppAttestError;

/// A decoded CBOR value, owned by the caller that decoded it
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Major type 0
    Unsigned(u64),
    /// Major type 1, stored as the final value (`-1 - n`)
    Negative(i64),
    /// Major type 2
    Bytes(Vec<u8>),
    /// Major type 3
    Text(String),
    /// Major type 4
    Array(Vec<CborValue>),
    /// Major type 5, entries in encoded order
    Map(Vec<(CborValue, CborValue)>),
    /// Major type 7, simple values 20/21
    Bool(bool),
    /// Major type 7, simple value 22
    Null,
}

impl CborValue {
    /// Borrow the byte-string contents, if this is a byte string
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow the text contents, if this is a text string
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Look up a map entry by key; first match wins
    #[must_use]
    pub fn map_get(&self, key: &CborValue) -> Option<&CborValue> {
        match self {
            CborValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a map entry by text key
    #[must_use]
    pub fn map_get_text(&self, key: &str) -> Option<&CborValue> {
        self.map_get(&CborValue::Text(key.to_string()))
    }

    /// Look up a map entry by integer key (COSE keys use small
    /// negative labels)
    #[must_use]
    pub fn map_get_int(&self, key: i64) -> Option<&CborValue> {
        let key = if key < 0 {
            CborValue::Negative(key)
        } else {
            CborValue::Unsigned(key.unsigned_abs())
        };
        self.map_get(&key)
    }
}

/// Decode a single CBOR value from the start of `bytes`
///
/// Trailing bytes after the value are permitted; the COSE public key
/// occupies the tail of attestation authenticator data, so callers do
/// not always hand over a whole document.
///
/// # Errors
/// Returns `TruncatedInput` if any declared length runs past the end of
/// the buffer, or `UnsupportedEncoding` for markers outside the subset.
pub fn decode(bytes: &[u8]) -> Result<CborValue, AppAttestError> {
    let mut cursor = Cursor::new(bytes);
    cursor.decode_value(0)
}

/// Nesting deeper than this is rejected; App Attest structures are a
/// couple of levels deep at most, and the decoder recurses per level.
const MAX_NESTING_DEPTH: usize = 16;

/// Bounds-checked reader over untrusted bytes
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, AppAttestError> {
        let byte = *self.buf.get(self.pos).ok_or(AppAttestError::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], AppAttestError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(AppAttestError::TruncatedInput)?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read the argument encoded in the low five bits of the initial
    /// byte: an inline value below 24, or a 1/2/4/8-byte big-endian
    /// field. Indefinite-length markers (31) are not supported.
    fn read_argument(&mut self, initial: u8, info: u8) -> Result<u64, AppAttestError> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => Ok(u64::from(self.read_u8()?)),
            25 => {
                let bytes = self.read_slice(2)?;
                Ok(u64::from(u16::from_be_bytes([bytes[0], bytes[1]])))
            }
            26 => {
                let bytes = self.read_slice(4)?;
                Ok(u64::from(u32::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            27 => {
                let bytes = self.read_slice(8)?;
                // Assembled as two big-endian 32-bit halves into a u64
                let high = u64::from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
                let low = u64::from(u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]));
                Ok((high << 32) | low)
            }
            _ => Err(AppAttestError::UnsupportedEncoding(initial)),
        }
    }

    fn length(&self, argument: u64) -> Result<usize, AppAttestError> {
        // A declared length larger than the remaining buffer can never
        // be satisfied; reject before allocating anything.
        let len = usize::try_from(argument).map_err(|_| AppAttestError::TruncatedInput)?;
        if len > self.buf.len() - self.pos {
            return Err(AppAttestError::TruncatedInput);
        }
        Ok(len)
    }

    fn decode_value(&mut self, depth: usize) -> Result<CborValue, AppAttestError> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(AppAttestError::MalformedInput(
                "structure nested too deeply".into(),
            ));
        }
        let initial = self.read_u8()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            0 => Ok(CborValue::Unsigned(self.read_argument(initial, info)?)),
            1 => {
                let n = self.read_argument(initial, info)?;
                let n = i64::try_from(n).map_err(|_| AppAttestError::UnsupportedEncoding(initial))?;
                Ok(CborValue::Negative(-1 - n))
            }
            2 => {
                let argument = self.read_argument(initial, info)?;
                let len = self.length(argument)?;
                Ok(CborValue::Bytes(self.read_slice(len)?.to_vec()))
            }
            3 => {
                let argument = self.read_argument(initial, info)?;
                let len = self.length(argument)?;
                let text = std::str::from_utf8(self.read_slice(len)?)
                    .map_err(|_| AppAttestError::MalformedInput("invalid UTF-8 text".into()))?;
                Ok(CborValue::Text(text.to_string()))
            }
            4 => {
                let argument = self.read_argument(initial, info)?;
                // Every element occupies at least one byte, so the
                // element count is bounded by the remaining input.
                let count = self.length(argument)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.decode_value(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
            5 => {
                let argument = self.read_argument(initial, info)?;
                let count = self.length(argument)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = self.decode_value(depth + 1)?;
                    let value = self.decode_value(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(CborValue::Map(entries))
            }
            6 => {
                // Tagged value: the tag number is discarded and only
                // the wrapped value is kept
                self.read_argument(initial, info)?;
                self.decode_value(depth + 1)
            }
            _ => match info {
                20 => Ok(CborValue::Bool(false)),
                21 => Ok(CborValue::Bool(true)),
                22 => Ok(CborValue::Null),
                _ => Err(AppAttestError::UnsupportedEncoding(initial)),
            },
        }
    }
}
