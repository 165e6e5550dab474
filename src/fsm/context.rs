//! Per-tick context handed to pattern handlers.
//!
//! Deliberately tiny: the only state a pattern may read or write is the
//! indicator level. Everything the engine decides *which* pattern on lives
//! in [`LinkSnapshot`](crate::state::LinkSnapshot), outside the FSM.

/// Mutable context threaded through `on_enter` / `on_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveContext {
    /// Indicator level going into the handler; the handler leaves the
    /// level to drive in the same field.
    pub level: bool,
}
