//! No-std number formatting and parsing for the text wire format.
//!
//! Numbers travel as ASCII text. Writers append to `heapless::Vec` buffers;
//! parsers read from byte slices without allocating.

use heapless::Vec;

/// Append `value` as a zero-padded decimal exactly `width` digits wide.
///
/// Returns `None` (leaving `out` untouched) if the value needs more than
/// `width` digits or the buffer lacks room.
pub fn write_padded_decimal<const N: usize>(
    out: &mut Vec<u8, N>,
    value: usize,
    width: usize,
) -> Option<()> {
    // Digits in reverse order
    let mut temp = [0u8; 20];
    let mut n = value;
    let mut len = 0;
    loop {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
        if n == 0 {
            break;
        }
    }

    if len > width || out.capacity() - out.len() < width {
        return None;
    }

    for _ in len..width {
        out.push(b'0').ok()?;
    }
    for i in (0..len).rev() {
        out.push(temp[i]).ok()?;
    }
    Some(())
}

/// Parse an unsigned decimal made only of ASCII digits.
///
/// Leading zeros are allowed. Empty input, signs and whitespace are rejected.
pub fn parse_decimal(s: &[u8]) -> Option<usize> {
    if s.is_empty() {
        return None;
    }
    let mut value: usize = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as usize)?;
    }
    Some(value)
}

/// Parse a float the way the firmware always has: permissively.
///
/// Surrounding whitespace is ignored. If the text is not a complete float
/// literal, the longest leading prefix that is one is used (`"12.5abc"` reads
/// as `12.5`). Text with no numeric prefix reads as `0.0`.
pub fn parse_f64_lenient(s: &[u8]) -> f64 {
    let s = trim_ascii(s);
    let Ok(text) = core::str::from_utf8(s) else {
        return 0.0;
    };
    if let Ok(value) = text.parse::<f64>() {
        return value;
    }

    let prefix_len = text
        .bytes()
        .position(|b| !matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
        .unwrap_or(text.len());

    // All candidate bytes are ASCII, so every cut is a char boundary.
    (1..=prefix_len)
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Trim ASCII whitespace from both ends.
#[inline]
fn trim_ascii(s: &[u8]) -> &[u8] {
    let start = s
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(s.len());
    let end = s
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &s[start..end]
}

/// `core::fmt::Write` adapter that appends UTF-8 text to a byte buffer.
///
/// Used to reuse the core float formatter without an intermediate string.
pub struct VecWriter<'a, const N: usize>(pub &'a mut Vec<u8, N>);

impl<const N: usize> core::fmt::Write for VecWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0
            .extend_from_slice(s.as_bytes())
            .map_err(|_| core::fmt::Error)
    }
}
