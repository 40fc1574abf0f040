//! Topic registry: maps `(topic name, wire type)` to a typed callback.
//!
//! Callbacks are plain function pointers that receive the application
//! context passed to [`RosBridge::update`](crate::RosBridge::update), so the
//! registry owns no closures and needs no allocator.

use heapless::{String, Vec};
use rosbridge_proto::{
    decode_bool, decode_f64, decode_f64_array, decode_str, DecodeError, WireType,
    MAX_TOPIC_NAME_LEN,
};

/// Subscriptions a bridge holds unless told otherwise.
pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 16;

pub type TopicName = String<MAX_TOPIC_NAME_LEN>;

/// Error type for subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscribeError {
    /// Name cannot be encoded in the configured length width.
    TopicNameTooLong {
        len: usize,
        max: usize,
    },
    /// Every subscription slot is taken.
    RegistryFull,
}

impl core::fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TopicNameTooLong { len, max } => {
                write!(f, "topic name length {} exceeds {}", len, max)
            }
            Self::RegistryFull => write!(f, "subscription registry full"),
        }
    }
}

/// A typed callback. The variant fixes the wire type it accepts.
pub enum Handler<C> {
    Bool(fn(&mut C, bool)),
    Float64(fn(&mut C, f64)),
    String(fn(&mut C, &str)),
    Float64MultiArray(fn(&mut C, &[f64])),
}

// Derives would demand `C: Clone`.
impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handler<C> {}

impl<C> Handler<C> {
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Handler::Bool(_) => WireType::Bool,
            Handler::Float64(_) => WireType::Float64,
            Handler::String(_) => WireType::String,
            Handler::Float64MultiArray(_) => WireType::Float64MultiArray,
        }
    }

    /// Decode `payload` with this handler's codec and call it.
    ///
    /// The callback is not invoked if decoding fails.
    pub fn invoke(&self, ctx: &mut C, payload: &[u8]) -> Result<(), DecodeError> {
        match *self {
            Handler::Bool(f) => f(ctx, decode_bool(payload)),
            Handler::Float64(f) => f(ctx, decode_f64(payload)),
            Handler::String(f) => f(ctx, decode_str(payload)?),
            Handler::Float64MultiArray(f) => {
                let values = decode_f64_array(payload)?;
                f(ctx, &values);
            }
        }
        Ok(())
    }
}

pub struct Subscription<C> {
    name: TopicName,
    handler: Handler<C>,
}

impl<C> Subscription<C> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.handler.wire_type()
    }

    #[inline]
    pub fn handler(&self) -> &Handler<C> {
        &self.handler
    }
}

/// Fixed-capacity subscription table.
///
/// The same name may be registered once per wire type. Registering an
/// identity again replaces its callback.
pub struct TopicRegistry<C, const N: usize = DEFAULT_MAX_SUBSCRIPTIONS> {
    entries: Vec<Subscription<C>, N>,
}

impl<C, const N: usize> TopicRegistry<C, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace the callback for `(name, handler.wire_type())`.
    ///
    /// Returns `true` if an existing subscription was replaced.
    pub fn insert(&mut self, name: &str, handler: Handler<C>) -> Result<bool, SubscribeError> {
        let wire_type = handler.wire_type();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|s| s.name == name && s.wire_type() == wire_type)
        {
            existing.handler = handler;
            return Ok(true);
        }

        let mut topic = TopicName::new();
        topic
            .push_str(name)
            .map_err(|()| SubscribeError::TopicNameTooLong {
                len: name.len(),
                max: MAX_TOPIC_NAME_LEN,
            })?;
        self.entries
            .push(Subscription {
                name: topic,
                handler,
            })
            .map_err(|_| SubscribeError::RegistryFull)?;
        Ok(false)
    }

    /// Look up the handler for an exact identity.
    pub fn get(&self, name: &str, wire_type: WireType) -> Option<&Handler<C>> {
        self.entries
            .iter()
            .find(|s| s.name == name && s.wire_type() == wire_type)
            .map(|s| &s.handler)
    }

    /// Registered identities, in subscription order.
    pub fn identities(&self) -> impl ExactSizeIterator<Item = (&str, WireType)> + '_ {
        self.entries.iter().map(|s| (s.name(), s.wire_type()))
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Subscription<C>> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }
}

impl<C, const N: usize> Default for TopicRegistry<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
