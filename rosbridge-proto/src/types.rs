//! Control flags, wire type tags and topic values.

/// Flag byte that marks a topic publication.
pub const FLAG_PUBLISH: u8 = b'P';

/// Flag byte that marks a subscription announcement.
///
/// Received announcements are not acted on; the firmware only sends them.
pub const FLAG_SUBSCRIBE: u8 = b'S';

/// Payload type of a topic, sent on the wire as a single decimal digit.
///
/// The digit assignment is shared with the ground station and must match on
/// both ends of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WireType {
    /// `std_msgs/Float64MultiArray`
    Float64MultiArray = 0,
    /// `std_msgs/Bool`
    Bool = 1,
    /// `std_msgs/String`
    String = 2,
    /// `std_msgs/Float64`
    Float64 = 3,
}

// Tags are written as one ASCII digit.
const _: () = assert!((WireType::Float64 as u8) <= 9);

impl WireType {
    /// Every wire type, in tag order.
    pub const ALL: [WireType; 4] = [
        WireType::Float64MultiArray,
        WireType::Bool,
        WireType::String,
        WireType::Float64,
    ];

    /// Numeric tag value (0-9).
    #[inline]
    #[must_use]
    pub const fn digit(self) -> u8 {
        self as u8
    }

    /// Tag as the ASCII digit written on the wire.
    #[inline]
    #[must_use]
    pub const fn ascii(self) -> u8 {
        b'0' + self as u8
    }

    /// Look up a wire type by numeric tag.
    #[must_use]
    pub const fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(WireType::Float64MultiArray),
            1 => Some(WireType::Bool),
            2 => Some(WireType::String),
            3 => Some(WireType::Float64),
            _ => None,
        }
    }

    /// Look up a wire type by its ASCII digit.
    #[must_use]
    pub const fn from_ascii(byte: u8) -> Option<Self> {
        if byte.is_ascii_digit() {
            Self::from_digit(byte - b'0')
        } else {
            None
        }
    }

    /// ROS message type name used by the ground station.
    #[must_use]
    pub const fn ros_type(self) -> &'static str {
        match self {
            WireType::Float64MultiArray => "std_msgs/Float64MultiArray",
            WireType::Bool => "std_msgs/Bool",
            WireType::String => "std_msgs/String",
            WireType::Float64 => "std_msgs/Float64",
        }
    }
}

/// A value to publish on a topic.
///
/// The variant selects both the codec and the wire type tag.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value<'a> {
    Bool(bool),
    Float64(f64),
    String(&'a str),
    Float64MultiArray(&'a [f64]),
}

impl Value<'_> {
    /// Wire type this value is encoded as.
    #[inline]
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Value::Bool(_) => WireType::Bool,
            Value::Float64(_) => WireType::Float64,
            Value::String(_) => WireType::String,
            Value::Float64MultiArray(_) => WireType::Float64MultiArray,
        }
    }
}

/// Width of the zero-padded decimal topic name length field.
///
/// Both ends of the link must agree on the width. A topic name whose length
/// needs more digits than this cannot be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NameLengthDigits(u8);

impl NameLengthDigits {
    /// Smallest supported width.
    pub const MIN: u8 = 1;
    /// Largest supported width.
    pub const MAX: u8 = 3;
    /// Width used by the ground station.
    pub const DEFAULT: Self = Self(2);

    /// Create a width, or `None` if it is outside `MIN..=MAX`.
    #[must_use]
    pub const fn new(digits: u8) -> Option<Self> {
        if digits >= Self::MIN && digits <= Self::MAX {
            Some(Self(digits))
        } else {
            None
        }
    }

    /// Number of digits.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Longest name length representable in this many digits.
    #[must_use]
    pub const fn max_name_len(self) -> usize {
        let mut max = 1usize;
        let mut i = 0;
        while i < self.0 {
            max *= 10;
            i += 1;
        }
        max - 1
    }
}

impl Default for NameLengthDigits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_tags_match_ground_station() {
        assert_eq!(WireType::Float64MultiArray.digit(), 0);
        assert_eq!(WireType::Bool.digit(), 1);
        assert_eq!(WireType::String.digit(), 2);
        assert_eq!(WireType::Float64.digit(), 3);
    }

    #[test]
    fn test_wire_type_ascii_round_trip() {
        for wt in WireType::ALL {
            assert_eq!(WireType::from_ascii(wt.ascii()), Some(wt));
        }
        assert_eq!(WireType::from_ascii(b'4'), None);
        assert_eq!(WireType::from_ascii(b'x'), None);
    }

    #[test]
    fn test_value_wire_type() {
        assert_eq!(Value::Bool(true).wire_type(), WireType::Bool);
        assert_eq!(Value::Float64(1.0).wire_type(), WireType::Float64);
        assert_eq!(Value::String("").wire_type(), WireType::String);
        assert_eq!(
            Value::Float64MultiArray(&[]).wire_type(),
            WireType::Float64MultiArray
        );
    }

    #[test]
    fn test_name_length_digits_bounds() {
        assert_eq!(NameLengthDigits::new(0), None);
        assert_eq!(NameLengthDigits::new(4), None);
        assert_eq!(NameLengthDigits::new(1).map(|d| d.max_name_len()), Some(9));
        assert_eq!(NameLengthDigits::DEFAULT.max_name_len(), 99);
        assert_eq!(NameLengthDigits::new(3).map(|d| d.max_name_len()), Some(999));
    }
}
