//! Topic envelope encoding and frame parsing.
//!
//! A frame is one delimiter- or datagram-bounded unit. Its first byte is a
//! control flag; publish frames carry an envelope:
//!
//! ```text
//! <flag:1> <nameLen:D digits, zero-padded> <name> <type:1 digit> <payload>
//! ```
//!
//! The flag is written by the transport, so the encoders here produce the
//! body (everything after the flag) and [`parse_frame`] expects the flag.
//!
//! A subscription announcement (flag `S`) lists the identities the firmware
//! wants to receive:
//!
//! ```text
//! <count:2 digits> { <nameLen:D digits> <name> <type:1 digit> }*
//! ```

use heapless::Vec;

use crate::codec::{encode_value, EncodeError};
use crate::fmt::{parse_decimal, write_padded_decimal};
use crate::types::{NameLengthDigits, Value, WireType, FLAG_PUBLISH};

/// Longest topic name accepted regardless of the digit width.
pub const MAX_TOPIC_NAME_LEN: usize = 64;

/// Largest encoded envelope body (flag and delimiter excluded).
///
/// Fits any `Float64` on a name of [`MAX_TOPIC_NAME_LEN`] at the widest
/// length field. A negative subnormal renders as 327 characters.
pub const MAX_ENVELOPE_LEN: usize = 400;

/// Width of the topic count in a subscription announcement.
pub const ANNOUNCE_COUNT_DIGITS: usize = 2;

/// Buffer holding one encoded envelope body.
pub type EnvelopeBuf = Vec<u8, MAX_ENVELOPE_LEN>;

/// Error type for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Zero-length frame.
    Empty,
    /// The frame ends before the envelope does.
    Truncated,
    /// The name length field is not a decimal number.
    InvalidLength,
    /// The topic name is not valid UTF-8.
    InvalidTopicName,
    /// The type tag is not a known wire type.
    UnknownWireType(u8),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty frame"),
            Self::Truncated => write!(f, "truncated envelope"),
            Self::InvalidLength => write!(f, "invalid name length field"),
            Self::InvalidTopicName => write!(f, "topic name is not UTF-8"),
            Self::UnknownWireType(b) => write!(f, "unknown wire type tag 0x{:02X}", b),
        }
    }
}

/// A parsed publish envelope borrowing from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Envelope<'a> {
    pub topic: &'a str,
    pub wire_type: WireType,
    pub payload: &'a [u8],
}

/// Result of parsing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum ParsedFrame<'a> {
    /// A topic publication.
    Publish(Envelope<'a>),
    /// Any other flag. The body is left unparsed.
    Control { flag: u8, body: &'a [u8] },
}

/// Split a frame into its flag and, for publish frames, the envelope.
pub fn parse_frame(
    frame: &[u8],
    digits: NameLengthDigits,
) -> Result<ParsedFrame<'_>, ParseError> {
    let (&flag, body) = frame.split_first().ok_or(ParseError::Empty)?;
    if flag != FLAG_PUBLISH {
        return Ok(ParsedFrame::Control { flag, body });
    }

    let (topic, wire_type, payload) = parse_topic_identity(body, digits)?;
    Ok(ParsedFrame::Publish(Envelope {
        topic,
        wire_type,
        payload,
    }))
}

/// Encode a publish envelope body for `topic` carrying `value`.
///
/// `out` is cleared first. Fails without a usable body if the name length
/// does not fit the digit width or the body does not fit the buffer.
pub fn encode_publish(
    topic: &str,
    value: &Value<'_>,
    digits: NameLengthDigits,
    out: &mut EnvelopeBuf,
) -> Result<(), EncodeError> {
    out.clear();
    let result = write_topic_identity(topic, value.wire_type(), digits, out)
        .and_then(|()| encode_value(value, out));
    if result.is_err() {
        out.clear();
    }
    result
}

/// Encode a subscription announcement body listing `topics`.
///
/// `out` is cleared first.
pub fn encode_subscribe_announcement<'t, I>(
    topics: I,
    digits: NameLengthDigits,
    out: &mut EnvelopeBuf,
) -> Result<(), EncodeError>
where
    I: IntoIterator<Item = (&'t str, WireType)>,
    I::IntoIter: ExactSizeIterator,
{
    out.clear();
    let topics = topics.into_iter();
    let result = write_padded_decimal(out, topics.len(), ANNOUNCE_COUNT_DIGITS)
        .ok_or(EncodeError::TooManyTopics)
        .and_then(|()| {
            topics
                .into_iter()
                .try_for_each(|(name, wire_type)| {
                    write_topic_identity(name, wire_type, digits, out)
                })
        });
    if result.is_err() {
        out.clear();
    }
    result
}

/// Iterate over the identities listed in a subscription announcement body.
pub fn parse_subscribe_announcement(
    body: &[u8],
    digits: NameLengthDigits,
) -> Result<AnnouncedTopics<'_>, ParseError> {
    if body.len() < ANNOUNCE_COUNT_DIGITS {
        return Err(ParseError::Truncated);
    }
    let (count, rest) = body.split_at(ANNOUNCE_COUNT_DIGITS);
    let remaining = parse_decimal(count).ok_or(ParseError::InvalidLength)?;
    Ok(AnnouncedTopics {
        rest,
        remaining,
        digits,
    })
}

/// Iterator returned by [`parse_subscribe_announcement`].
///
/// Stops after the announced count or at the first malformed entry.
pub struct AnnouncedTopics<'a> {
    rest: &'a [u8],
    remaining: usize,
    digits: NameLengthDigits,
}

impl<'a> Iterator for AnnouncedTopics<'a> {
    type Item = Result<(&'a str, WireType), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match parse_topic_identity(self.rest, self.digits) {
            Ok((name, wire_type, rest)) => {
                self.rest = rest;
                Some(Ok((name, wire_type)))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Write `<nameLen><name><type>`.
fn write_topic_identity(
    topic: &str,
    wire_type: WireType,
    digits: NameLengthDigits,
    out: &mut EnvelopeBuf,
) -> Result<(), EncodeError> {
    let max = digits.max_name_len().min(MAX_TOPIC_NAME_LEN);
    if topic.len() > max {
        return Err(EncodeError::TopicNameTooLong {
            len: topic.len(),
            max,
        });
    }
    write_padded_decimal(out, topic.len(), digits.get() as usize)
        .ok_or(EncodeError::BufferFull)?;
    out.extend_from_slice(topic.as_bytes())
        .map_err(|_| EncodeError::BufferFull)?;
    out.push(wire_type.ascii())
        .map_err(|_| EncodeError::BufferFull)
}

/// Read `<nameLen><name><type>` and return the bytes after it.
fn parse_topic_identity(
    data: &[u8],
    digits: NameLengthDigits,
) -> Result<(&str, WireType, &[u8]), ParseError> {
    let width = digits.get() as usize;
    if data.len() < width {
        return Err(ParseError::Truncated);
    }
    let (len_field, rest) = data.split_at(width);
    let name_len = parse_decimal(len_field).ok_or(ParseError::InvalidLength)?;

    // Name plus the one-byte type tag
    if rest.len() < name_len + 1 {
        return Err(ParseError::Truncated);
    }
    let (name, rest) = rest.split_at(name_len);
    let name = core::str::from_utf8(name).map_err(|_| ParseError::InvalidTopicName)?;
    let wire_type = WireType::from_ascii(rest[0]).ok_or(ParseError::UnknownWireType(rest[0]))?;
    Ok((name, wire_type, &rest[1..]))
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec as StdVec;

    use super::*;
    use crate::codec::decode_f64;
    use crate::types::FLAG_SUBSCRIBE;

    fn publish_frame(topic: &str, value: Value<'_>) -> StdVec<u8> {
        let mut body = EnvelopeBuf::new();
        encode_publish(topic, &value, NameLengthDigits::DEFAULT, &mut body).unwrap();
        let mut frame = StdVec::from([FLAG_PUBLISH]);
        frame.extend_from_slice(&body);
        frame
    }

    #[test]
    fn test_encode_publish_layout() {
        let mut body = EnvelopeBuf::new();
        encode_publish("alt", &Value::Float64(12.5), NameLengthDigits::DEFAULT, &mut body).unwrap();
        assert_eq!(&body[..], b"03alt312.5");
    }

    #[test]
    fn test_encode_publish_each_type_tag() {
        let mut body = EnvelopeBuf::new();
        let digits = NameLengthDigits::DEFAULT;
        encode_publish("a", &Value::Float64MultiArray(&[1.0]), digits, &mut body).unwrap();
        assert_eq!(&body[..], b"01a01,1,");
        encode_publish("a", &Value::Bool(true), digits, &mut body).unwrap();
        assert_eq!(&body[..], b"01a11");
        encode_publish("a", &Value::String("hi"), digits, &mut body).unwrap();
        assert_eq!(&body[..], b"01a2hi");
        encode_publish("a", &Value::Float64(0.5), digits, &mut body).unwrap();
        assert_eq!(&body[..], b"01a30.5");
    }

    #[test]
    fn test_encode_publish_name_too_long_for_width() {
        let digits = NameLengthDigits::new(1).unwrap();
        let mut body = EnvelopeBuf::new();
        assert_eq!(
            encode_publish("0123456789", &Value::Bool(true), digits, &mut body),
            Err(EncodeError::TopicNameTooLong { len: 10, max: 9 })
        );
        assert!(body.is_empty());
    }

    #[test]
    fn test_encode_publish_name_over_capacity() {
        let name = "n".repeat(MAX_TOPIC_NAME_LEN + 1);
        let mut body = EnvelopeBuf::new();
        assert_eq!(
            encode_publish(&name, &Value::Bool(true), NameLengthDigits::DEFAULT, &mut body),
            Err(EncodeError::TopicNameTooLong {
                len: MAX_TOPIC_NAME_LEN + 1,
                max: MAX_TOPIC_NAME_LEN
            })
        );
    }

    #[test]
    fn test_encode_publish_payload_too_large() {
        let text = "x".repeat(MAX_ENVELOPE_LEN);
        let mut body = EnvelopeBuf::new();
        assert_eq!(
            encode_publish("t", &Value::String(&text), NameLengthDigits::DEFAULT, &mut body),
            Err(EncodeError::BufferFull)
        );
        assert!(body.is_empty());
    }

    #[test]
    fn test_encode_publish_longest_float() {
        let name = "n".repeat(MAX_TOPIC_NAME_LEN);
        let digits = NameLengthDigits::new(NameLengthDigits::MAX).unwrap();
        let mut body = EnvelopeBuf::new();
        encode_publish(&name, &Value::Float64(-5e-324), digits, &mut body).unwrap();
        assert_eq!(body.len(), 3 + MAX_TOPIC_NAME_LEN + 1 + 327);

        let mut frame = StdVec::from([FLAG_PUBLISH]);
        frame.extend_from_slice(&body);
        let ParsedFrame::Publish(env) = parse_frame(&frame, digits).unwrap() else {
            panic!("expected publish frame");
        };
        assert_eq!(env.topic, name);
        assert_eq!(decode_f64(env.payload), -5e-324);
    }

    #[test]
    fn test_parse_publish_frame() {
        let frame = publish_frame("alt", Value::Float64(12.5));
        let parsed = parse_frame(&frame, NameLengthDigits::DEFAULT).unwrap();
        let ParsedFrame::Publish(env) = parsed else {
            panic!("expected publish frame");
        };
        assert_eq!(env.topic, "alt");
        assert_eq!(env.wire_type, WireType::Float64);
        assert_eq!(decode_f64(env.payload), 12.5);
    }

    #[test]
    fn test_parse_empty_name_and_payload() {
        let parsed = parse_frame(b"P002", NameLengthDigits::DEFAULT).unwrap();
        assert_eq!(
            parsed,
            ParsedFrame::Publish(Envelope {
                topic: "",
                wire_type: WireType::String,
                payload: b"",
            })
        );
    }

    #[test]
    fn test_parse_control_flag_passthrough() {
        let parsed = parse_frame(b"Hwhatever", NameLengthDigits::DEFAULT).unwrap();
        assert_eq!(
            parsed,
            ParsedFrame::Control {
                flag: b'H',
                body: b"whatever"
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let d = NameLengthDigits::DEFAULT;
        assert_eq!(parse_frame(b"", d), Err(ParseError::Empty));
        assert_eq!(parse_frame(b"P0", d), Err(ParseError::Truncated));
        assert_eq!(parse_frame(b"Px3alt3", d), Err(ParseError::InvalidLength));
        assert_eq!(parse_frame(b"P05alt3", d), Err(ParseError::Truncated));
        assert_eq!(parse_frame(b"P03alt", d), Err(ParseError::Truncated));
        assert_eq!(parse_frame(b"P03alt9", d), Err(ParseError::UnknownWireType(b'9')));
        assert_eq!(
            parse_frame(&[b'P', b'0', b'1', 0xFF, b'1'], d),
            Err(ParseError::InvalidTopicName)
        );
    }

    #[test]
    fn test_parse_respects_digit_width() {
        let d3 = NameLengthDigits::new(3).unwrap();
        let mut body = EnvelopeBuf::new();
        encode_publish("alt", &Value::Bool(false), d3, &mut body).unwrap();
        assert_eq!(&body[..], b"003alt10");

        let mut frame = StdVec::from([FLAG_PUBLISH]);
        frame.extend_from_slice(&body);
        let ParsedFrame::Publish(env) = parse_frame(&frame, d3).unwrap() else {
            panic!("expected publish frame");
        };
        assert_eq!(env.topic, "alt");
        assert_eq!(env.payload, b"0");
    }

    #[test]
    fn test_subscribe_announcement_layout() {
        let mut body = EnvelopeBuf::new();
        let topics = [("motors", WireType::Float64MultiArray), ("auto", WireType::Bool)];
        encode_subscribe_announcement(topics, NameLengthDigits::DEFAULT, &mut body).unwrap();
        assert_eq!(&body[..], b"0206motors004auto1");
    }

    #[test]
    fn test_subscribe_announcement_round_trip() {
        let mut body = EnvelopeBuf::new();
        let topics = [("motors", WireType::Float64MultiArray), ("auto", WireType::Bool)];
        encode_subscribe_announcement(topics, NameLengthDigits::DEFAULT, &mut body).unwrap();

        let mut frame = StdVec::from([FLAG_SUBSCRIBE]);
        frame.extend_from_slice(&body);
        let ParsedFrame::Control { flag, body } =
            parse_frame(&frame, NameLengthDigits::DEFAULT).unwrap()
        else {
            panic!("expected control frame");
        };
        assert_eq!(flag, FLAG_SUBSCRIBE);

        let parsed: StdVec<_> = parse_subscribe_announcement(body, NameLengthDigits::DEFAULT)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(parsed, topics);
    }

    #[test]
    fn test_subscribe_announcement_empty() {
        let mut body = EnvelopeBuf::new();
        let topics: [(&str, WireType); 0] = [];
        encode_subscribe_announcement(topics, NameLengthDigits::DEFAULT, &mut body).unwrap();
        assert_eq!(&body[..], b"00");
        let mut topics = parse_subscribe_announcement(&body, NameLengthDigits::DEFAULT).unwrap();
        assert!(topics.next().is_none());
    }

    #[test]
    fn test_subscribe_announcement_truncated_entry() {
        let mut topics = parse_subscribe_announcement(b"0203abc", NameLengthDigits::DEFAULT).unwrap();
        assert_eq!(topics.next(), Some(Err(ParseError::Truncated)));
        assert_eq!(topics.next(), None);
    }
}
