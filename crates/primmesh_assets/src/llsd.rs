//! # LLSD Binary Codec
//!
//! Self-describing structured data used for mesh-asset headers and geometry
//! records.
//!
//! ## Encoding
//!
//! ```text
//! '!'                       undefined
//! '1' | '0'                 boolean true | false
//! 'i' i32 BE                integer
//! 'r' f64 BE                real
//! 'u' [u8; 16]              uuid
//! 'b' u32 BE len, bytes     binary
//! 's' u32 BE len, utf8      string
//! 'l' u32 BE len, utf8      uri
//! 'd' f64 LE                date (seconds since epoch)
//! '[' u32 BE n, n values, ']'
//! '{' u32 BE n, n * ('k' u32 BE len, utf8, value), '}'
//! ```
//!
//! A value is self-delimiting, so a decoder can report how many bytes it
//! consumed. Mesh assets rely on that to find where their body starts.

use std::collections::BTreeMap;

use primmesh_core::Uuid;

use crate::error::{LlsdError, LlsdResult};

/// Optional text prefix some writers emit before the first value.
pub const BINARY_PREFIX: &[u8] = b"<? LLSD/Binary ?>\n";

/// Lower-case prefix variant.
const BINARY_PREFIX_LOWER: &[u8] = b"<?llsd/binary?>\n";

/// Deepest container nesting the decoder accepts.
pub const MAX_DEPTH: usize = 64;

/// A decoded LLSD value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LlsdValue {
    /// No value.
    #[default]
    Undefined,
    /// Boolean.
    Boolean(bool),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit float.
    Real(f64),
    /// 128-bit identifier.
    Uuid(Uuid),
    /// UTF-8 text.
    String(String),
    /// Seconds since the Unix epoch.
    Date(f64),
    /// URI text.
    Uri(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// Ordered values.
    Array(Vec<LlsdValue>),
    /// Keyed values.
    Map(BTreeMap<String, LlsdValue>),
}

impl LlsdValue {
    /// Builds a map from key/value pairs.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, LlsdValue)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Uuid(_) => "uuid",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Uri(_) => "uri",
            Self::Binary(_) => "binary",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Member `key` of a map. `None` for missing keys and non-maps.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LlsdValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Map entries, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, LlsdValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Array elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[LlsdValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Binary payload, if this is binary.
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Text of a string or URI.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Uri(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value. Integers convert as `!= 0`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(b) => Some(b),
            Self::Integer(i) => Some(i != 0),
            _ => None,
        }
    }

    /// Integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            Self::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Numeric value as `f64`. Integers widen.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match *self {
            Self::Real(r) | Self::Date(r) => Some(r),
            Self::Integer(i) => Some(f64::from(i)),
            _ => None,
        }
    }

    /// Serializes to LLSD binary without the text prefix.
    ///
    /// # Errors
    ///
    /// Returns [`LlsdError::TooLarge`] if a string, binary or container
    /// exceeds `u32::MAX` entries.
    pub fn to_binary(&self) -> LlsdResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_binary(&mut out)?;
        Ok(out)
    }

    /// Appends the LLSD binary form of this value to `out`.
    ///
    /// # Errors
    ///
    /// See [`LlsdValue::to_binary`].
    pub fn write_binary(&self, out: &mut Vec<u8>) -> LlsdResult<()> {
        match self {
            Self::Undefined => out.push(b'!'),
            Self::Boolean(true) => out.push(b'1'),
            Self::Boolean(false) => out.push(b'0'),
            Self::Integer(i) => {
                out.push(b'i');
                out.extend_from_slice(&i.to_be_bytes());
            }
            Self::Real(r) => {
                out.push(b'r');
                out.extend_from_slice(&r.to_be_bytes());
            }
            Self::Uuid(id) => {
                out.push(b'u');
                out.extend_from_slice(id.as_bytes());
            }
            Self::String(s) => write_counted(out, b's', s.as_bytes())?,
            Self::Date(d) => {
                out.push(b'd');
                out.extend_from_slice(&d.to_le_bytes());
            }
            Self::Uri(s) => write_counted(out, b'l', s.as_bytes())?,
            Self::Binary(bytes) => write_counted(out, b'b', bytes)?,
            Self::Array(items) => {
                out.push(b'[');
                out.extend_from_slice(&count_u32(items.len())?.to_be_bytes());
                for item in items {
                    item.write_binary(out)?;
                }
                out.push(b']');
            }
            Self::Map(map) => {
                out.push(b'{');
                out.extend_from_slice(&count_u32(map.len())?.to_be_bytes());
                for (key, value) in map {
                    write_counted(out, b'k', key.as_bytes())?;
                    value.write_binary(out)?;
                }
                out.push(b'}');
            }
        }
        Ok(())
    }
}

impl From<bool> for LlsdValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for LlsdValue {
    fn from(i: i32) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for LlsdValue {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<&str> for LlsdValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for LlsdValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Uuid> for LlsdValue {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<Vec<u8>> for LlsdValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

fn count_u32(len: usize) -> LlsdResult<u32> {
    u32::try_from(len).map_err(|_| LlsdError::TooLarge { len })
}

fn write_counted(out: &mut Vec<u8>, marker: u8, bytes: &[u8]) -> LlsdResult<()> {
    out.push(marker);
    out.extend_from_slice(&count_u32(bytes.len())?.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decodes one LLSD binary value from the front of `data`.
///
/// A leading text prefix is skipped. Returns the value and the number of
/// bytes consumed, prefix included. Trailing bytes are left alone.
///
/// # Errors
///
/// Any [`LlsdError`] describing the first malformed byte.
pub fn decode_binary(data: &[u8]) -> LlsdResult<(LlsdValue, usize)> {
    let start = [BINARY_PREFIX, BINARY_PREFIX_LOWER]
        .into_iter()
        .find(|prefix| data.starts_with(prefix))
        .map_or(0, <[u8]>::len);

    let mut reader = Reader {
        data,
        position: start,
        depth: 0,
    };
    let value = reader.value()?;
    Ok((value, reader.position))
}

/// Cursor over LLSD binary input.
struct Reader<'a> {
    data: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> LlsdResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(LlsdError::UnexpectedEof {
                offset: self.position,
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> LlsdResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    fn byte(&mut self) -> LlsdResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    #[inline]
    fn count(&mut self) -> LlsdResult<usize> {
        Ok(u32::from_be_bytes(self.array()?) as usize)
    }

    fn text(&mut self) -> LlsdResult<String> {
        let len = self.count()?;
        let offset = self.position;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| LlsdError::InvalidUtf8 { offset })
    }

    fn expect(&mut self, closing: u8) -> LlsdResult<()> {
        let offset = self.position;
        match self.byte() {
            Ok(b) if b == closing => Ok(()),
            _ => Err(LlsdError::MissingTerminator {
                expected: char::from(closing),
                offset,
            }),
        }
    }

    fn enter(&mut self) -> LlsdResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(LlsdError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    /// Capacity hint that a hostile count cannot inflate past the input.
    fn capacity_for(&self, count: usize) -> usize {
        count.min(self.data.len().saturating_sub(self.position))
    }

    fn value(&mut self) -> LlsdResult<LlsdValue> {
        let offset = self.position;
        let marker = self.byte()?;
        let value = match marker {
            b'!' => LlsdValue::Undefined,
            b'1' => LlsdValue::Boolean(true),
            b'0' => LlsdValue::Boolean(false),
            b'i' => LlsdValue::Integer(i32::from_be_bytes(self.array()?)),
            b'r' => LlsdValue::Real(f64::from_be_bytes(self.array()?)),
            b'u' => LlsdValue::Uuid(Uuid::from_bytes(self.array()?)),
            b'b' => {
                let len = self.count()?;
                LlsdValue::Binary(self.take(len)?.to_vec())
            }
            b's' => LlsdValue::String(self.text()?),
            b'l' => LlsdValue::Uri(self.text()?),
            b'd' => LlsdValue::Date(f64::from_le_bytes(self.array()?)),
            b'[' => {
                self.enter()?;
                let count = self.count()?;
                let mut items = Vec::with_capacity(self.capacity_for(count));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                self.expect(b']')?;
                self.depth -= 1;
                LlsdValue::Array(items)
            }
            b'{' => {
                self.enter()?;
                let count = self.count()?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key_offset = self.position;
                    if self.byte()? != b'k' {
                        return Err(LlsdError::ExpectedKey { offset: key_offset });
                    }
                    let key = self.text()?;
                    let value = self.value()?;
                    map.insert(key, value);
                }
                self.expect(b'}')?;
                self.depth -= 1;
                LlsdValue::Map(map)
            }
            other => {
                return Err(LlsdError::UnknownMarker {
                    marker: other,
                    offset,
                })
            }
        };
        Ok(value)
    }
}
