//! Event and lamp-command types for the panel

use crate::frame::segment;

/// The three illuminated button rows, each tracked with independent
/// edge-detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonGroup {
    /// Program bus row (eight buttons)
    Program,
    /// Preview bus row (eight buttons)
    Preview,
    /// Auto/take/DSK row
    Transition,
}

impl ButtonGroup {
    /// All rows, in the order their wire updates are emitted.
    pub const ALL: [ButtonGroup; 3] = [
        ButtonGroup::Program,
        ButtonGroup::Preview,
        ButtonGroup::Transition,
    ];

    /// Wire segment code for this row.
    pub fn segment(self) -> u8 {
        match self {
            ButtonGroup::Program => segment::PROGRAM,
            ButtonGroup::Preview => segment::PREVIEW,
            ButtonGroup::Transition => segment::TRANSITION,
        }
    }

    /// Map a received segment code to its button row.
    pub fn from_segment(segment_code: u8) -> Option<Self> {
        match segment_code {
            segment::PROGRAM => Some(ButtonGroup::Program),
            segment::PREVIEW => Some(ButtonGroup::Preview),
            segment::TRANSITION => Some(ButtonGroup::Transition),
            _ => None,
        }
    }
}

/// Direction of a button transition.
///
/// The hardware reports active-low: a bit dropping to 0 is a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// Continuous controls reported as absolute 0-255 levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    /// Transition T-bar
    TBar,
    RotaryA,
    RotaryB,
    RotaryC,
}

impl AnalogChannel {
    /// Map a received segment code to its analog channel.
    pub fn from_segment(segment_code: u8) -> Option<Self> {
        match segment_code {
            segment::TBAR => Some(AnalogChannel::TBar),
            segment::ROTARY_A => Some(AnalogChannel::RotaryA),
            segment::ROTARY_B => Some(AnalogChannel::RotaryB),
            segment::ROTARY_C => Some(AnalogChannel::RotaryC),
            _ => None,
        }
    }
}

/// A decoded input event from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// One button changed state between two snapshots of its row.
    Button {
        group: ButtonGroup,
        /// Bit position 0-7, bit 0 being the leftmost button.
        index: u8,
        direction: Direction,
    },
    /// An absolute reading from the T-bar or a rotary control. Reported
    /// for every frame, changed or not.
    Analog { channel: AnalogChannel, value: u8 },
}

/// Desired state for a single lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    On,
    Off,
}

/// A request to set one lamp.
///
/// Submitted to the lights worker in batches; a batch is applied
/// atomically and produces at most one wire write per affected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightCmd {
    pub group: ButtonGroup,
    /// Bit position 0-7 within the row.
    pub index: u8,
    pub state: LightState,
}
