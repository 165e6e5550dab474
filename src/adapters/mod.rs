//! Adapters: concrete implementations of the hexagonal port traits and
//! the link transports.
//!
//! | Adapter    | Implements / produces | Connects to                    |
//! |------------|-----------------------|--------------------------------|
//! | `ble`      | `LinkCommand`s        | Bluedroid GATT server          |
//! | `hardware` | ActuatorPort          | Indicator GPIO (embedded-hal)  |
//! | `log_sink` | EventSink             | Serial log output              |
//! | `time`     | ClockPort             | ESP32 system timer             |
//! | `uart`     | `LinkCommand`s        | UART1 from the companion       |

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod uart;
