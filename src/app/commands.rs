//! Inbound commands from the link transports.
//!
//! The UART reader and the BLE GATT callbacks turn whatever their driver
//! hands them into a [`LinkCommand`] and queue it for the
//! [`Ingestor`](super::ingest::Ingestor), which is the only component
//! allowed to write the shared reading.

use crate::reading::MAX_MESSAGE_LEN;

/// One message payload, copied out of the driver buffer.
pub type Payload = heapless::Vec<u8, MAX_MESSAGE_LEN>;

/// Commands that transports can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    /// One framed message (UART line or characteristic write).
    Data(Payload),

    /// The peer attached with this connection handle.
    Connected(u16),

    /// The peer went away.
    Disconnected,

    /// Keep-alive from the peer; carries no reading.
    Heartbeat,

    /// The transport dropped bytes that did not fit one message.
    Overflow,
}

impl LinkCommand {
    /// Wrap `bytes` as [`LinkCommand::Data`], or [`LinkCommand::Overflow`]
    /// if they do not fit one message buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match Payload::from_slice(bytes) {
            Ok(payload) => Self::Data(payload),
            Err(()) => Self::Overflow,
        }
    }

    /// Data, heartbeats and overflow reports may be discarded under
    /// backpressure. Link events may not.
    pub fn is_droppable(&self) -> bool {
        !matches!(self, Self::Connected(_) | Self::Disconnected)
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Connected(_) => "connected",
            Self::Disconnected => "disconnected",
            Self::Heartbeat => "heartbeat",
            Self::Overflow => "overflow",
        }
    }
}
