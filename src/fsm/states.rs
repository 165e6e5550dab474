//! Pattern handler implementations.
//!
//! Each pattern has an optional `on_enter`, a mandatory `on_tick` that
//! sets the output level, and an interval selector reading the cadence
//! table from [`CadenceConfig`].

use super::context::DriveContext;
use super::{AlertPattern, PatternDescriptor};
use crate::config::CadenceConfig;

/// Build the pattern table. Index `i` must describe `AlertPattern::from_index(i)`.
pub fn build_pattern_table() -> [PatternDescriptor; AlertPattern::COUNT] {
    [
        PatternDescriptor {
            id: AlertPattern::NoConnection,
            name: "NoConnection",
            on_enter: None,
            on_tick: hold_on,
            interval: |c| c.no_connection_interval_ms,
        },
        PatternDescriptor {
            id: AlertPattern::Clear,
            name: "Clear",
            on_enter: None,
            on_tick: hold_off,
            interval: |c| c.clear_interval_ms,
        },
        PatternDescriptor {
            id: AlertPattern::Urgent,
            name: "Urgent",
            on_enter: Some(go_dark),
            on_tick: toggle,
            interval: CadenceConfig::urgent_interval_ms,
        },
        PatternDescriptor {
            id: AlertPattern::Caution,
            name: "Caution",
            on_enter: Some(go_dark),
            on_tick: toggle,
            interval: CadenceConfig::caution_interval_ms,
        },
    ]
}

fn hold_on(ctx: &mut DriveContext) {
    ctx.level = true;
}

fn hold_off(ctx: &mut DriveContext) {
    ctx.level = false;
}

/// Blink patterns start from dark so their first toggle is a visible flash,
/// even when entered from the solid-on link-down pattern.
fn go_dark(ctx: &mut DriveContext) {
    ctx.level = false;
}

fn toggle(ctx: &mut DriveContext) {
    ctx.level = !ctx.level;
}
