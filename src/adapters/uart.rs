//! Wired link: UART from the companion computer.
//!
//! The companion writes one `"<signal>, <distance>, <near>, <far>\r"`
//! line per update. A reader thread pulls bytes off UART1 and runs them
//! through a [`LineFramer`], which turns the byte stream into
//! [`LinkCommand`]s for the inbound queue.
//!
//! ```text
//!  UART1 RX ──bytes──▶ LineFramer ──Data / Overflow──▶ events::INBOUND
//!                          ▲
//!            read timeout ─┘ (flush unterminated burst)
//! ```
//!
//! Pin map (DevKitC): TX = GPIO17, RX = GPIO16, 8N1.

use crate::app::commands::{LinkCommand, Payload};

/// UART1 TX pin.
pub const UART_TX_GPIO: u8 = 17;
/// UART1 RX pin.
pub const UART_RX_GPIO: u8 = 16;
/// How long one driver read waits before reporting the line idle.
pub const READ_TIMEOUT_MS: u64 = 20;

/// Splits a byte stream into messages.
///
/// - `\r` or `\n` ends a message; empty lines are skipped.
/// - A read that returns nothing flushes a pending unterminated message,
///   so a producer that omits the terminator still gets through.
/// - A message longer than [`MAX_MESSAGE_LEN`](crate::reading::MAX_MESSAGE_LEN)
///   is reported once as [`LinkCommand::Overflow`] and the rest of it is
///   discarded up to the next terminator or idle gap.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Payload,
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one driver read. An empty `chunk` means the read timed out.
    pub fn on_read(&mut self, chunk: &[u8], mut out: impl FnMut(LinkCommand)) {
        if chunk.is_empty() {
            self.flush(&mut out);
            return;
        }
        for &byte in chunk {
            self.push(byte, &mut out);
        }
    }

    /// Bytes buffered for the message in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn push(&mut self, byte: u8, out: &mut impl FnMut(LinkCommand)) {
        if byte == b'\r' || byte == b'\n' {
            if self.discarding {
                self.discarding = false;
            } else if !self.buf.is_empty() {
                out(LinkCommand::Data(core::mem::take(&mut self.buf)));
            }
            return;
        }
        if self.discarding {
            return;
        }
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
            out(LinkCommand::Overflow);
        }
    }

    fn flush(&mut self, out: &mut impl FnMut(LinkCommand)) {
        self.discarding = false;
        if !self.buf.is_empty() {
            out(LinkCommand::Data(core::mem::take(&mut self.buf)));
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF reader
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
mod esp_impl {
    use esp_idf_hal::delay::TickType;
    use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin};
    use esp_idf_hal::peripheral::Peripheral;
    use esp_idf_hal::uart::{config::Config, Uart, UartDriver};
    use esp_idf_hal::units::Hertz;
    use log::{info, warn};

    use super::{LineFramer, READ_TIMEOUT_MS};
    use crate::error::{Error, TransportError};
    use crate::events;

    /// Owns the UART driver; [`spawn`](Self::spawn) moves it onto its own
    /// reader thread.
    pub struct UartLink {
        driver: UartDriver<'static>,
    }

    impl UartLink {
        pub fn new(
            uart: impl Peripheral<P = impl Uart> + 'static,
            tx: impl Peripheral<P = impl OutputPin> + 'static,
            rx: impl Peripheral<P = impl InputPin> + 'static,
            baud: u32,
        ) -> Result<Self, Error> {
            let config = Config::default().baudrate(Hertz(baud));
            let driver = UartDriver::new(
                uart,
                tx,
                rx,
                Option::<AnyIOPin>::None,
                Option::<AnyIOPin>::None,
                &config,
            )
            .map_err(|_| Error::Init("UART1 driver"))?;
            info!("UART: link on TX{}/RX{} at {} baud", super::UART_TX_GPIO, super::UART_RX_GPIO, baud);
            Ok(Self { driver })
        }

        pub fn spawn(self) -> Result<std::thread::JoinHandle<()>, Error> {
            std::thread::Builder::new()
                .name("uart-rx".into())
                .stack_size(4096)
                .spawn(move || self.read_loop())
                .map_err(|_| Error::Init("UART reader thread"))
        }

        fn read_loop(self) {
            let mut framer = LineFramer::new();
            let mut chunk = [0u8; 64];
            let timeout = TickType::new_millis(READ_TIMEOUT_MS).ticks();
            loop {
                match self.driver.read(&mut chunk, timeout) {
                    Ok(n) => framer.on_read(&chunk[..n], |cmd| {
                        events::push(cmd);
                    }),
                    Err(e) => {
                        warn!("UART: read failed ({}): {}", Error::Transport(TransportError::Io), e);
                        framer.on_read(&[], |cmd| {
                            events::push(cmd);
                        });
                        std::thread::sleep(core::time::Duration::from_millis(100));
                    }
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp_impl::UartLink;
