//! RosBridge: routes inbound frames to topic callbacks and encodes
//! outbound publications.

use rosbridge_proto::{
    encode_publish, encode_subscribe_announcement, parse_frame, EncodeError, EnvelopeBuf,
    ParseError, ParsedFrame, Value, FLAG_PUBLISH, FLAG_SUBSCRIBE, MAX_TOPIC_NAME_LEN,
};

use crate::config::{BridgeConfig, ConfigError};
use crate::liveness::{LinkEvent, LinkState};
use crate::registry::{Handler, SubscribeError, TopicRegistry, DEFAULT_MAX_SUBSCRIPTIONS};
use crate::transport::{bump, LinkHandler, Transport, TransportStats};

/// Error type for publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// Name cannot be encoded in the configured length width.
    TopicNameTooLong { len: usize, max: usize },
    /// The encoded envelope exceeds the envelope buffer.
    MessageTooLarge,
    /// Too many subscriptions to list in one announcement.
    TooManyTopics,
    /// A `Float64MultiArray` holds more elements than a peer can decode.
    ArrayTooLong { len: usize },
}

impl From<EncodeError> for PublishError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::TopicNameTooLong { len, max } => Self::TopicNameTooLong { len, max },
            EncodeError::BufferFull => Self::MessageTooLarge,
            EncodeError::TooManyTopics => Self::TooManyTopics,
            EncodeError::ArrayTooLong { len } => Self::ArrayTooLong { len },
        }
    }
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TopicNameTooLong { len, max } => {
                write!(f, "topic name length {} exceeds {}", len, max)
            }
            Self::MessageTooLarge => write!(f, "message too large"),
            Self::TooManyTopics => write!(f, "too many topics to announce"),
            Self::ArrayTooLong { len } => write!(f, "array of {} elements too long", len),
        }
    }
}

/// Any error the bridge API can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    Config(ConfigError),
    Subscribe(SubscribeError),
    Publish(PublishError),
}

impl From<ConfigError> for BridgeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SubscribeError> for BridgeError {
    fn from(e: SubscribeError) -> Self {
        Self::Subscribe(e)
    }
}

impl From<PublishError> for BridgeError {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {}", e),
            Self::Subscribe(e) => write!(f, "subscribe: {}", e),
            Self::Publish(e) => write!(f, "publish: {}", e),
        }
    }
}

/// Dispatch counters. All saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    /// Frames that reached a callback.
    pub dispatched: u32,
    /// Frames whose flag is not a publication.
    pub unknown_flags: u32,
    /// Well-formed publications nobody subscribed to.
    pub unknown_topics: u32,
    /// Publications whose envelope could not be parsed.
    pub malformed: u32,
    /// Payloads the subscribed codec rejected.
    pub decode_failures: u32,
    /// Publish calls that failed to encode.
    pub publish_failures: u32,
}

/// Hooks run on link state changes, with the update context.
struct LinkHooks<C> {
    on_connect: Option<fn(&mut C)>,
    on_disconnect: Option<fn(&mut C)>,
}

/// A topic bridge over one transport.
///
/// `C` is the application context handed to every callback during
/// [`update`](Self::update). `N` bounds the number of subscriptions.
///
/// # Example
///
/// ```
/// use rosbridge_core::{BridgeConfig, LinkConfig, RosBridge, SerialPort, StreamTransport};
/// # use rosbridge_core::LinkError;
/// # struct Port;
/// # impl SerialPort for Port {
/// #     fn read_byte(&mut self) -> Result<Option<u8>, LinkError> { Ok(None) }
/// #     fn write(&mut self, _: &[u8]) -> Result<(), LinkError> { Ok(()) }
/// # }
///
/// struct Blimp {
///     autonomous: bool,
/// }
///
/// fn on_auto(blimp: &mut Blimp, value: bool) {
///     blimp.autonomous = value;
/// }
///
/// let transport = StreamTransport::new(Port, LinkConfig::new()).unwrap();
/// let mut bridge: RosBridge<_, Blimp> = RosBridge::new(transport, BridgeConfig::new());
/// bridge.init();
/// bridge.subscribe_bool("auto", on_auto).unwrap();
///
/// let mut blimp = Blimp { autonomous: false };
/// bridge.update(0, &mut blimp);
/// bridge.publish_string("state", "idle").unwrap();
/// ```
pub struct RosBridge<T, C, const N: usize = DEFAULT_MAX_SUBSCRIPTIONS> {
    transport: T,
    registry: TopicRegistry<C, N>,
    config: BridgeConfig,
    hooks: LinkHooks<C>,
    stats: BridgeStats,
    scratch: EnvelopeBuf,
}

impl<T: Transport, C, const N: usize> RosBridge<T, C, N> {
    pub fn new(transport: T, config: BridgeConfig) -> Self {
        Self {
            transport,
            registry: TopicRegistry::new(),
            config,
            hooks: LinkHooks {
                on_connect: None,
                on_disconnect: None,
            },
            stats: BridgeStats::default(),
            scratch: EnvelopeBuf::new(),
        }
    }

    /// Reset the transport. Call once before the first update.
    pub fn init(&mut self) {
        self.transport.init();
    }

    /// Run one tick of the transport, dispatching every completed frame.
    ///
    /// Returns the last link event seen during the tick, if any.
    pub fn update(&mut self, now_us: u64, ctx: &mut C) -> Option<LinkEvent> {
        let mut dispatcher = Dispatcher {
            registry: &self.registry,
            hooks: &self.hooks,
            stats: &mut self.stats,
            config: self.config,
            ctx,
            last_event: None,
        };
        self.transport.update(now_us, &mut dispatcher);
        dispatcher.last_event
    }

    /// Register `handler` for `topic` at the handler's wire type.
    ///
    /// Subscribing an identity again replaces its callback. The change is
    /// seen from the next dispatched frame.
    pub fn subscribe(&mut self, topic: &str, handler: Handler<C>) -> Result<(), SubscribeError> {
        let max = self.config.name_digits.max_name_len().min(MAX_TOPIC_NAME_LEN);
        if topic.len() > max {
            return Err(SubscribeError::TopicNameTooLong {
                len: topic.len(),
                max,
            });
        }
        let wire_type = handler.wire_type();
        if self.registry.insert(topic, handler)? {
            debug!("replaced subscription {} ({:?})", topic, wire_type);
        } else {
            debug!("subscribed {} ({:?})", topic, wire_type);
        }
        Ok(())
    }

    pub fn subscribe_bool(&mut self, topic: &str, f: fn(&mut C, bool)) -> Result<(), SubscribeError> {
        self.subscribe(topic, Handler::Bool(f))
    }

    pub fn subscribe_f64(&mut self, topic: &str, f: fn(&mut C, f64)) -> Result<(), SubscribeError> {
        self.subscribe(topic, Handler::Float64(f))
    }

    pub fn subscribe_string(
        &mut self,
        topic: &str,
        f: fn(&mut C, &str),
    ) -> Result<(), SubscribeError> {
        self.subscribe(topic, Handler::String(f))
    }

    pub fn subscribe_f64_array(
        &mut self,
        topic: &str,
        f: fn(&mut C, &[f64]),
    ) -> Result<(), SubscribeError> {
        self.subscribe(topic, Handler::Float64MultiArray(f))
    }

    /// Run `f` each time the link comes up.
    pub fn on_connect(&mut self, f: fn(&mut C)) {
        self.hooks.on_connect = Some(f);
    }

    /// Run `f` each time the link is lost.
    pub fn on_disconnect(&mut self, f: fn(&mut C)) {
        self.hooks.on_disconnect = Some(f);
    }

    /// Encode `value` on `topic` and queue it on the transport.
    ///
    /// An `Ok` means the envelope was handed to the transport, not that it
    /// will be delivered.
    pub fn publish(&mut self, topic: &str, value: Value<'_>) -> Result<(), PublishError> {
        if let Err(e) = encode_publish(topic, &value, self.config.name_digits, &mut self.scratch) {
            bump(&mut self.stats.publish_failures);
            warn!("publish on {} failed: {:?}", topic, e);
            return Err(e.into());
        }
        self.transport.send(FLAG_PUBLISH, &self.scratch);
        Ok(())
    }

    pub fn publish_bool(&mut self, topic: &str, value: bool) -> Result<(), PublishError> {
        self.publish(topic, Value::Bool(value))
    }

    pub fn publish_f64(&mut self, topic: &str, value: f64) -> Result<(), PublishError> {
        self.publish(topic, Value::Float64(value))
    }

    pub fn publish_string(&mut self, topic: &str, value: &str) -> Result<(), PublishError> {
        self.publish(topic, Value::String(value))
    }

    pub fn publish_f64_array(&mut self, topic: &str, values: &[f64]) -> Result<(), PublishError> {
        self.publish(topic, Value::Float64MultiArray(values))
    }

    /// Send one `S` message listing every subscribed identity.
    pub fn announce_subscriptions(&mut self) -> Result<(), PublishError> {
        encode_subscribe_announcement(
            self.registry.identities(),
            self.config.name_digits,
            &mut self.scratch,
        )?;
        self.transport.send(FLAG_SUBSCRIBE, &self.scratch);
        info!("announced {} subscriptions", self.registry.len());
        Ok(())
    }

    pub fn link_state(&self) -> LinkState {
        self.transport.link_state()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &TopicRegistry<C, N> {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Decompose the bridge into its transport and registry.
    pub fn into_parts(self) -> (T, TopicRegistry<C, N>) {
        (self.transport, self.registry)
    }
}

/// Borrowed view of the bridge handed to the transport for one tick.
struct Dispatcher<'a, C, const N: usize> {
    registry: &'a TopicRegistry<C, N>,
    hooks: &'a LinkHooks<C>,
    stats: &'a mut BridgeStats,
    config: BridgeConfig,
    ctx: &'a mut C,
    last_event: Option<LinkEvent>,
}

impl<C, const N: usize> LinkHandler for Dispatcher<'_, C, N> {
    fn on_frame(&mut self, frame: &[u8]) {
        let envelope = match parse_frame(frame, self.config.name_digits) {
            Ok(ParsedFrame::Publish(envelope)) => envelope,
            Ok(ParsedFrame::Control { flag, .. }) => {
                bump(&mut self.stats.unknown_flags);
                trace!("ignoring frame with flag {}", flag);
                return;
            }
            Err(ParseError::Empty) => {
                trace!("ignoring empty frame");
                return;
            }
            Err(e) => {
                bump(&mut self.stats.malformed);
                debug!("malformed envelope: {:?}", e);
                return;
            }
        };

        let Some(handler) = self.registry.get(envelope.topic, envelope.wire_type) else {
            bump(&mut self.stats.unknown_topics);
            trace!(
                "no subscriber for {} ({:?})",
                envelope.topic,
                envelope.wire_type
            );
            return;
        };

        match handler.invoke(self.ctx, envelope.payload) {
            Ok(()) => bump(&mut self.stats.dispatched),
            Err(e) => {
                bump(&mut self.stats.decode_failures);
                debug!("bad payload on {}: {:?}", envelope.topic, e);
            }
        }
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        let hook = match event {
            LinkEvent::Connected => self.hooks.on_connect,
            LinkEvent::Disconnected => self.hooks.on_disconnect,
        };
        if let Some(hook) = hook {
            hook(self.ctx);
        }
        self.last_event = Some(event);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use rosbridge_proto::{parse_subscribe_announcement, NameLengthDigits, WireType};
    use std::string::String;
    use std::vec;
    use std::vec::Vec;

    /// Transport that hands queued frames and events to the bridge and
    /// records everything sent.
    #[derive(Default)]
    struct MockTransport {
        inbound: Vec<Vec<u8>>,
        events: Vec<LinkEvent>,
        sent: Vec<(u8, Vec<u8>)>,
        state: LinkState,
    }

    impl Transport for MockTransport {
        fn init(&mut self) {
            self.state = LinkState::Disconnected;
        }

        fn update<H: LinkHandler>(&mut self, _now_us: u64, handler: &mut H) {
            for event in self.events.drain(..) {
                self.state = match event {
                    LinkEvent::Connected => LinkState::Connected,
                    LinkEvent::Disconnected => LinkState::Disconnected,
                };
                handler.on_link_event(event);
            }
            for frame in self.inbound.drain(..) {
                handler.on_frame(&frame);
            }
        }

        fn send(&mut self, flag: u8, payload: &[u8]) {
            self.sent.push((flag, payload.to_vec()));
        }

        fn link_state(&self) -> LinkState {
            self.state
        }

        fn stats(&self) -> TransportStats {
            TransportStats::default()
        }
    }

    #[derive(Default)]
    struct Blimp {
        motors: Vec<Vec<f64>>,
        auto: Vec<bool>,
        altitude: Vec<f64>,
        notes: Vec<String>,
        connects: u32,
        disconnects: u32,
    }

    fn on_motors(b: &mut Blimp, v: &[f64]) {
        b.motors.push(v.to_vec());
    }

    fn on_auto(b: &mut Blimp, v: bool) {
        b.auto.push(v);
    }

    fn on_altitude(b: &mut Blimp, v: f64) {
        b.altitude.push(v);
    }

    fn on_note(b: &mut Blimp, v: &str) {
        b.notes.push(v.into());
    }

    fn on_connect(b: &mut Blimp) {
        b.connects += 1;
    }

    fn on_disconnect(b: &mut Blimp) {
        b.disconnects += 1;
        b.motors.push(vec![0.0; 4]);
    }

    fn bridge() -> RosBridge<MockTransport, Blimp, 4> {
        let mut bridge = RosBridge::new(MockTransport::default(), BridgeConfig::new());
        bridge.init();
        bridge
    }

    fn deliver(bridge: &mut RosBridge<MockTransport, Blimp, 4>, frames: &[&[u8]], blimp: &mut Blimp) {
        bridge
            .transport_mut()
            .inbound
            .extend(frames.iter().map(|f| f.to_vec()));
        bridge.update(0, blimp);
    }

    #[test]
    fn test_dispatches_by_identity() {
        let mut bridge = bridge();
        bridge.subscribe_f64("alt", on_altitude).unwrap();
        bridge.subscribe_bool("alt", on_auto).unwrap();

        let mut blimp = Blimp::default();
        deliver(&mut bridge, &[b"P03alt312.5"], &mut blimp);

        assert_eq!(blimp.altitude, [12.5]);
        assert!(blimp.auto.is_empty());
        assert_eq!(bridge.stats().dispatched, 1);
    }

    #[test]
    fn test_every_codec_reaches_its_callback() {
        let mut bridge = bridge();
        bridge.subscribe_f64_array("motors", on_motors).unwrap();
        bridge.subscribe_bool("auto", on_auto).unwrap();
        bridge.subscribe_string("note", on_note).unwrap();

        let mut blimp = Blimp::default();
        deliver(
            &mut bridge,
            &[b"P06motors02,0.5,-0.5,", b"P04auto10", b"P04note2hi there", b"P06motors00,"],
            &mut blimp,
        );

        assert_eq!(blimp.motors, [vec![0.5, -0.5], vec![]]);
        assert_eq!(blimp.auto, [true]);
        assert_eq!(blimp.notes, ["hi there"]);
    }

    #[test]
    fn test_unknown_and_malformed_frames_are_counted() {
        let mut bridge = bridge();
        bridge.subscribe_bool("auto", on_auto).unwrap();

        let mut blimp = Blimp::default();
        deliver(
            &mut bridge,
            &[
                b"P05other1",
                b"X04auto11",
                b"S0104auto1",
                b"P9",
                b"P04auto9",
                b"",
            ],
            &mut blimp,
        );

        let stats = bridge.stats();
        assert_eq!(stats.unknown_topics, 1);
        assert_eq!(stats.unknown_flags, 2);
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.dispatched, 0);
        assert!(blimp.auto.is_empty());
        assert_eq!(bridge.registry().len(), 1);
    }

    #[test]
    fn test_decode_failure_counted() {
        let mut bridge = bridge();
        bridge.subscribe_string("note", on_note).unwrap();
        let mut blimp = Blimp::default();
        deliver(&mut bridge, &[b"P04note2\xff\xfe"], &mut blimp);
        assert_eq!(bridge.stats().decode_failures, 1);
        assert!(blimp.notes.is_empty());
    }

    #[test]
    fn test_resubscribe_applies_to_next_frame() {
        fn on_altitude_negated(b: &mut Blimp, v: f64) {
            b.altitude.push(-v);
        }

        let mut bridge = bridge();
        bridge.subscribe_f64("alt", on_altitude).unwrap();
        let mut blimp = Blimp::default();
        deliver(&mut bridge, &[b"P03alt31"], &mut blimp);
        bridge.subscribe_f64("alt", on_altitude_negated).unwrap();
        deliver(&mut bridge, &[b"P03alt31"], &mut blimp);

        assert_eq!(blimp.altitude, [1.0, -1.0]);
        assert_eq!(bridge.registry().len(), 1);
    }

    #[test]
    fn test_subscribe_limits() {
        let mut bridge = bridge();
        let long = "x".repeat(100);
        assert_eq!(
            bridge.subscribe_bool(&long, on_auto),
            Err(SubscribeError::TopicNameTooLong { len: 100, max: 64 })
        );
        for name in ["a", "b", "c", "d"] {
            bridge.subscribe_bool(name, on_auto).unwrap();
        }
        assert_eq!(
            bridge.subscribe_bool("e", on_auto),
            Err(SubscribeError::RegistryFull)
        );
    }

    #[test]
    fn test_publish_frames() {
        let mut bridge = bridge();
        bridge.publish_f64("alt", 12.5).unwrap();
        bridge.publish_bool("auto", true).unwrap();
        bridge.publish_string("state", "ok").unwrap();
        bridge.publish_f64_array("motors", &[1.0, 2.0]).unwrap();

        let sent = &bridge.transport().sent;
        assert_eq!(sent[0], (b'P', b"03alt312.5".to_vec()));
        assert_eq!(sent[1], (b'P', b"04auto11".to_vec()));
        assert_eq!(sent[2], (b'P', b"05state2ok".to_vec()));
        assert_eq!(sent[3], (b'P', b"06motors02,1,2,".to_vec()));
    }

    #[test]
    fn test_publish_rejects_long_name() {
        let config = BridgeConfig::new().with_name_digits(1).unwrap();
        let mut bridge: RosBridge<MockTransport, Blimp, 4> =
            RosBridge::new(MockTransport::default(), config);
        assert_eq!(
            bridge.publish_bool("altitude10", true),
            Err(PublishError::TopicNameTooLong { len: 10, max: 9 })
        );
        assert!(bridge.transport().sent.is_empty());
        assert_eq!(bridge.stats().publish_failures, 1);
    }

    #[test]
    fn test_publish_rejects_undecodable_array() {
        let mut bridge = bridge();
        assert_eq!(
            bridge.publish_f64_array("motors", &[1.0; 33]),
            Err(PublishError::ArrayTooLong { len: 33 })
        );
        assert!(bridge.transport().sent.is_empty());
        assert_eq!(bridge.stats().publish_failures, 1);

        bridge.publish_f64_array("motors", &[1.0; 32]).unwrap();
        assert_eq!(bridge.transport().sent.len(), 1);
    }

    #[test]
    fn test_announce_lists_subscriptions() {
        let mut bridge = bridge();
        bridge.subscribe_f64_array("motors", on_motors).unwrap();
        bridge.subscribe_bool("auto", on_auto).unwrap();
        bridge.announce_subscriptions().unwrap();

        let (flag, body) = &bridge.transport().sent[0];
        assert_eq!(*flag, b'S');
        assert_eq!(body, b"0206motors004auto1");

        let topics: Vec<_> = parse_subscribe_announcement(body, NameLengthDigits::DEFAULT)
            .unwrap()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(
            topics,
            [("motors", WireType::Float64MultiArray), ("auto", WireType::Bool)]
        );
    }

    #[test]
    fn test_link_hooks_and_events() {
        let mut bridge = bridge();
        bridge.on_connect(on_connect);
        bridge.on_disconnect(on_disconnect);
        let mut blimp = Blimp::default();

        bridge.transport_mut().events.push(LinkEvent::Connected);
        assert_eq!(bridge.update(0, &mut blimp), Some(LinkEvent::Connected));
        assert!(bridge.is_connected());
        assert_eq!(bridge.update(1, &mut blimp), None);

        bridge.transport_mut().events.push(LinkEvent::Disconnected);
        assert_eq!(bridge.update(2, &mut blimp), Some(LinkEvent::Disconnected));
        assert_eq!(blimp.connects, 1);
        assert_eq!(blimp.disconnects, 1);
        assert_eq!(blimp.motors, [vec![0.0; 4]]);
    }

    #[test]
    fn test_into_parts() {
        let mut bridge = bridge();
        bridge.subscribe_bool("auto", on_auto).unwrap();
        let (transport, registry) = bridge.into_parts();
        assert!(transport.sent.is_empty());
        assert_eq!(registry.len(), 1);
    }
}
