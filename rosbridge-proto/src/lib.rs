//! Wire format for the blimp ROS bridge.
//!
//! This crate provides everything needed to speak the bridge's text protocol:
//!
//! - **Types**: [`WireType`] tags, [`Value`] payloads, control flags and the
//!   [`NameLengthDigits`] width shared by both ends of the link
//! - **Codecs**: per-type payload encoders and decoders ([`codec`])
//! - **Envelopes**: publish envelope and subscription announcement encoding,
//!   frame parsing ([`encode_publish`], [`parse_frame`])
//!
//! # Protocol Format
//!
//! ```text
//! <flag:1> <nameLen:D digits> <name> <type:1 digit> <payload> <delimiter>
//! ```
//!
//! - `flag` - `P` for a publication, other values are reserved
//! - `nameLen` - topic name length, zero-padded to `D` digits (default 2)
//! - `type` - `0` Float64MultiArray, `1` Bool, `2` String, `3` Float64
//! - `payload` - codec-specific text, see [`codec`]
//! - `delimiter` - only on streaming links; datagrams need none
//!
//! The delimiter byte must never appear in a topic name or payload on a
//! streaming link. Nothing here checks that.
//!
//! # Example
//!
//! ```
//! use rosbridge_proto::{
//!     encode_publish, parse_frame, EnvelopeBuf, NameLengthDigits, ParsedFrame, Value,
//!     WireType, FLAG_PUBLISH,
//! };
//!
//! let mut body = EnvelopeBuf::new();
//! encode_publish("alt", &Value::Float64(12.5), NameLengthDigits::DEFAULT, &mut body).unwrap();
//! assert_eq!(&body[..], b"03alt312.5");
//!
//! let mut frame = [0u8; 16];
//! frame[0] = FLAG_PUBLISH;
//! frame[1..=body.len()].copy_from_slice(&body);
//! let frame = &frame[..=body.len()];
//!
//! let ParsedFrame::Publish(env) = parse_frame(frame, NameLengthDigits::DEFAULT).unwrap() else {
//!     panic!("expected a publish frame");
//! };
//! assert_eq!(env.topic, "alt");
//! assert_eq!(env.wire_type, WireType::Float64);
//! assert_eq!(env.payload, b"12.5");
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod codec;
pub mod envelope;
pub mod fmt;
pub mod types;

pub use codec::{
    decode_bool, decode_f64, decode_f64_array, decode_str, encode_value, DecodeError,
    EncodeError, Float64Array, MAX_ARRAY_LEN,
};
pub use envelope::{
    encode_publish, encode_subscribe_announcement, parse_frame, parse_subscribe_announcement,
    AnnouncedTopics, Envelope, EnvelopeBuf, ParseError, ParsedFrame, MAX_ENVELOPE_LEN,
    MAX_TOPIC_NAME_LEN,
};
pub use types::{NameLengthDigits, Value, WireType, FLAG_PUBLISH, FLAG_SUBSCRIBE};
