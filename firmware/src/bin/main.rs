#![no_std]
#![no_main]

use core::fmt::Write as _;

use blimp_rosbridge::config::{
    BLIMP_ID, BRIDGE, DEBUG_INTERVAL_MS, IDENTIFY_INTERVAL_MS, LINK, STATE_INTERVAL_MS,
    TICK_INTERVAL_MS, TOPIC_DEBUG, TOPIC_IDENTIFY, TOPIC_STATE, UART_BAUDRATE, UART_RX_BUF_LEN,
    UART_TX_BUF_LEN,
};
use blimp_rosbridge::{Blimp, IoPort, LinkEvent, RosBridge, StreamTransport, UartBridge};
use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_time::{Duration, Instant, Ticker};
use heapless::String;
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// UART ring buffers.
static UART_TX_BUF: StaticCell<[u8; UART_TX_BUF_LEN]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; UART_RX_BUF_LEN]> = StaticCell::new();

type Bridge = UartBridge<BufferedUart>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("blimp-rosbridge starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = UART_BAUDRATE;

    let uart = BufferedUart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        UART_TX_BUF.init([0; UART_TX_BUF_LEN]),
        UART_RX_BUF.init([0; UART_RX_BUF_LEN]),
        uart_config,
    );

    // --- Bridge Setup ---
    let transport = match StreamTransport::new(IoPort(uart), LINK) {
        Ok(transport) => transport,
        Err(e) => {
            error!("invalid link config: {}", e);
            return;
        }
    };
    let mut bridge: Bridge = RosBridge::new(transport, BRIDGE);
    bridge.init();
    if let Err(e) = Blimp::register(&mut bridge) {
        error!("subscription failed: {}", e);
        return;
    }

    // On-board LED mirrors the link state
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(bridge_task(bridge, led).unwrap());

    info!("blimp-rosbridge initialized, waiting for ground station...");
}

/// Bridge task - ticks the link and publishes telemetry.
#[embassy_executor::task]
async fn bridge_task(mut bridge: Bridge, mut led: Output<'static>) {
    let mut blimp = Blimp::new();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    let mut telemetry = Telemetry::new(Instant::now());
    publish(&mut bridge, TOPIC_IDENTIFY, BLIMP_ID);

    loop {
        let now = Instant::now();
        match bridge.update(now.as_micros(), &mut blimp) {
            Some(LinkEvent::Connected) => {
                info!("ground station connected");
                led.set_high();
                if let Err(e) = bridge.announce_subscriptions() {
                    warn!("announce failed: {}", e);
                }
            }
            Some(LinkEvent::Disconnected) => led.set_low(),
            None => {}
        }

        if telemetry.identify.due(now) {
            publish(&mut bridge, TOPIC_IDENTIFY, BLIMP_ID);
        }
        if telemetry.state.due(now) {
            publish(&mut bridge, TOPIC_STATE, blimp.mode.as_str());
        }
        if telemetry.debug.due(now) {
            let mut text: String<32> = String::new();
            let secs = now.as_millis() as f64 / 1000.0;
            if write!(text, "Time: {:.2}", secs).is_ok() {
                publish(&mut bridge, TOPIC_DEBUG, &text);
            }
        }

        ticker.next().await;
    }
}

fn publish(bridge: &mut Bridge, topic: &str, text: &str) {
    if let Err(e) = bridge.publish_string(topic, text) {
        warn!("publish {} failed: {}", topic, e);
    }
}

/// Fixed-rate publication schedule.
struct Every {
    period: Duration,
    next: Instant,
}

impl Every {
    fn new(period_ms: u64, start: Instant) -> Self {
        let period = Duration::from_millis(period_ms);
        Self {
            period,
            next: start + period,
        }
    }

    fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }
}

struct Telemetry {
    identify: Every,
    state: Every,
    debug: Every,
}

impl Telemetry {
    fn new(start: Instant) -> Self {
        Self {
            identify: Every::new(IDENTIFY_INTERVAL_MS, start),
            state: Every::new(STATE_INTERVAL_MS, start),
            debug: Every::new(DEBUG_INTERVAL_MS, start),
        }
    }
}
