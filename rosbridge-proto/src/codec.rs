//! Payload codecs, one per wire type.
//!
//! | Wire type           | Payload text                          |
//! |---------------------|---------------------------------------|
//! | `Bool`              | `1` for true, `0` for false           |
//! | `Float64`           | default float formatting, e.g. `12.5` |
//! | `String`            | the string verbatim                   |
//! | `Float64MultiArray` | `<count>,<v0>,<v1>,...,` (trailing `,`) |
//!
//! Decoding never fails on malformed numbers: they read as `0.0`. The only
//! decode errors are non-UTF-8 string payloads and arrays longer than
//! [`MAX_ARRAY_LEN`].
//!
//! # Bool asymmetry
//!
//! The encoder writes `1` for `true`, but the decoder reports `true` only for
//! a payload of exactly `0`. Both halves match what deployed ground stations
//! expect, so `decode_bool(encode(true))` is `false`.

use core::fmt::Write;

use heapless::Vec;

use crate::fmt::{parse_f64_lenient, VecWriter};
use crate::types::Value;

/// Largest array a `Float64MultiArray` payload may declare.
pub const MAX_ARRAY_LEN: usize = 32;

/// Decoded `Float64MultiArray` payload.
pub type Float64Array = Vec<f64, MAX_ARRAY_LEN>;

/// Separator between array elements.
const ARRAY_SEPARATOR: u8 = b',';

/// Error type for payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Topic name length does not fit in the configured digit width.
    TopicNameTooLong {
        /// Length of the rejected name.
        len: usize,
        /// Longest name the width allows.
        max: usize,
    },
    /// The message does not fit in the output buffer.
    BufferFull,
    /// Too many topics for one subscription announcement.
    TooManyTopics,
    /// A `Float64MultiArray` has more than [`MAX_ARRAY_LEN`] elements.
    ArrayTooLong {
        /// Number of elements offered.
        len: usize,
    },
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TopicNameTooLong { len, max } => {
                write!(f, "topic name length {} exceeds {}", len, max)
            }
            Self::BufferFull => write!(f, "buffer full"),
            Self::TooManyTopics => write!(f, "too many topics"),
            Self::ArrayTooLong { len } => {
                write!(f, "array of {} exceeds {}", len, MAX_ARRAY_LEN)
            }
        }
    }
}

/// Error type for payload decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A `String` payload is not valid UTF-8.
    InvalidUtf8,
    /// A `Float64MultiArray` declares more than [`MAX_ARRAY_LEN`] elements.
    ArrayTooLong {
        /// Declared element count.
        declared: usize,
    },
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidUtf8 => write!(f, "string payload is not UTF-8"),
            Self::ArrayTooLong { declared } => {
                write!(f, "array of {} exceeds {}", declared, MAX_ARRAY_LEN)
            }
        }
    }
}

/// Append the payload text for `value`.
///
/// On error `out` may hold a partial payload; callers discard the buffer.
pub fn encode_value<const N: usize>(
    value: &Value<'_>,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    match *value {
        Value::Bool(v) => encode_bool(v, out),
        Value::Float64(v) => encode_f64(v, out),
        Value::String(v) => encode_str(v, out),
        Value::Float64MultiArray(v) => encode_f64_array(v, out),
    }
}

/// Append `1` or `0`.
pub fn encode_bool<const N: usize>(
    value: bool,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    out.push(if value { b'1' } else { b'0' })
        .map_err(|_| EncodeError::BufferFull)
}

/// Append the default textual form of `value`.
pub fn encode_f64<const N: usize>(
    value: f64,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    write!(VecWriter(out), "{}", value).map_err(|_| EncodeError::BufferFull)
}

/// Append `value` verbatim.
pub fn encode_str<const N: usize>(
    value: &str,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    out.extend_from_slice(value.as_bytes())
        .map_err(|_| EncodeError::BufferFull)
}

/// Append `<count>,` followed by `<value>,` for every element.
///
/// Arrays longer than [`MAX_ARRAY_LEN`] are refused, matching the decoder.
pub fn encode_f64_array<const N: usize>(
    values: &[f64],
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    if values.len() > MAX_ARRAY_LEN {
        return Err(EncodeError::ArrayTooLong { len: values.len() });
    }
    let mut w = VecWriter(out);
    write!(w, "{},", values.len()).map_err(|_| EncodeError::BufferFull)?;
    for v in values {
        write!(w, "{},", v).map_err(|_| EncodeError::BufferFull)?;
    }
    Ok(())
}

/// `true` iff the payload is exactly `0`. See the module docs.
#[inline]
#[must_use]
pub fn decode_bool(payload: &[u8]) -> bool {
    payload == b"0"
}

/// Parse a float, reading malformed text as `0.0`.
#[inline]
#[must_use]
pub fn decode_f64(payload: &[u8]) -> f64 {
    parse_f64_lenient(payload)
}

/// Borrow the payload as a string.
#[inline]
pub fn decode_str(payload: &[u8]) -> Result<&str, DecodeError> {
    core::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)
}

/// Decode a comma separated array whose first token is the element count.
///
/// The result always has exactly the declared length. Surplus tokens are
/// ignored and missing ones read as `0.0`. A single trailing comma is
/// optional.
pub fn decode_f64_array(payload: &[u8]) -> Result<Float64Array, DecodeError> {
    let payload = payload
        .strip_suffix(&[ARRAY_SEPARATOR])
        .unwrap_or(payload);
    let mut tokens = payload.split(|&b| b == ARRAY_SEPARATOR);

    // The count is read like any other number; negative or NaN saturates to 0.
    let declared = tokens.next().map_or(0.0, parse_f64_lenient) as usize;
    if declared > MAX_ARRAY_LEN {
        return Err(DecodeError::ArrayTooLong { declared });
    }

    let mut values = Float64Array::new();
    for _ in 0..declared {
        let v = tokens.next().map_or(0.0, parse_f64_lenient);
        // Cannot fail: declared <= capacity
        let _ = values.push(v);
    }
    Ok(values)
}
