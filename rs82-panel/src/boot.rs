//! Startup lamp test.
//!
//! Sweeps the program row, the preview row, then the two wings of the
//! auto/take/DSK row on and back off again, one lamp per tick at 16 ticks
//! a second. Purely a consumer of the lights interface; run once at
//! connect time as a visual self-test.

use std::thread;
use std::time::Duration;

use crate::event::{ButtonGroup, LightCmd, LightState};
use crate::lights::LightSender;

/// Interval between steps of the sequence.
pub const TICK: Duration = Duration::from_micros(1_000_000 / 16);

/// The full fixed script, in emission order: 46 single-lamp steps.
pub fn sequence() -> Vec<LightCmd> {
    let mut steps = sweep(LightState::On);
    steps.extend(sweep(LightState::Off));
    steps
}

/// One half of the script: all lamps to `state`, right to left.
fn sweep(state: LightState) -> Vec<LightCmd> {
    let mut steps = Vec::with_capacity(23);

    for index in (0..8u8).rev() {
        steps.push(step(ButtonGroup::Program, index, state));
    }
    for index in (0..8u8).rev() {
        steps.push(step(ButtonGroup::Preview, index, state));
    }
    // The auto/take/DSK row lights as two wings: the right four lamps
    // inward, then the left three outward. Bit 3 has no lamp.
    for index in (4..8u8).rev() {
        steps.push(step(ButtonGroup::Transition, index, state));
    }
    for index in 0..3u8 {
        steps.push(step(ButtonGroup::Transition, index, state));
    }

    steps
}

fn step(group: ButtonGroup, index: u8, state: LightState) -> LightCmd {
    LightCmd {
        group,
        index,
        state,
    }
}

/// Run the lamp test, blocking the caller for its full duration
/// (just under three seconds).
///
/// Each step goes out as its own single-command batch. Returns early
/// only if the lights worker is gone.
pub fn run(lights: &LightSender) {
    for cmd in sequence() {
        thread::sleep(TICK);
        if !lights.set(cmd.group, cmd.index, cmd.state) {
            return;
        }
    }
}
