//! Stateful input decoding for the panel's inbound stream.
//!
//! The panel reports each button row as an absolute 8-bit snapshot rather
//! than as individual presses. The decoder keeps the last snapshot per
//! row and emits one edge event per bit that differs, so consumers see
//! discrete presses and releases. Analog frames pass straight through:
//! every T-bar and rotary reading is reported even when unchanged.

use std::io::{self, BufRead};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::PanelError;
use crate::event::{AnalogChannel, ButtonGroup, Direction, PanelEvent};
use crate::frame::{self, TERMINATOR};

/// Edge-detection state for the three button rows.
///
/// Masks start all-ones, the hardware's released polarity, so the first
/// snapshot after connect reports only buttons actually held down.
#[derive(Debug)]
pub struct InputDecoder {
    program: u8,
    preview: u8,
    transition: u8,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDecoder {
    pub fn new() -> Self {
        Self {
            program: 0xFF,
            preview: 0xFF,
            transition: 0xFF,
        }
    }

    /// Decode one frame into zero or more events, updating row state.
    ///
    /// Unknown segment codes decode to nothing; newer panel revisions may
    /// add segments and old drivers must keep working.
    pub fn handle_frame(&mut self, segment: u8, data: u8) -> Vec<PanelEvent> {
        if let Some(group) = ButtonGroup::from_segment(segment) {
            return self.diff_snapshot(group, data);
        }
        if let Some(channel) = AnalogChannel::from_segment(segment) {
            return vec![PanelEvent::Analog {
                channel,
                value: data,
            }];
        }
        debug!("ignoring frame for unknown segment 0x{:X}", segment);
        Vec::new()
    }

    /// Diff a row snapshot against the stored mask, lowest bit first.
    ///
    /// Each differing bit is flipped in the stored mask, which therefore
    /// always mirrors the most recent snapshot once the diff completes.
    fn diff_snapshot(&mut self, group: ButtonGroup, snapshot: u8) -> Vec<PanelEvent> {
        let last = self.mask_mut(group);
        let mut events = Vec::new();

        for index in 0..8u8 {
            let bit = 1u8 << index;
            if (snapshot ^ *last) & bit == 0 {
                continue;
            }
            *last ^= bit;

            let direction = if snapshot & bit == 0 {
                Direction::Down
            } else {
                Direction::Up
            };
            events.push(PanelEvent::Button {
                group,
                index,
                direction,
            });
        }

        events
    }

    fn mask_mut(&mut self, group: ButtonGroup) -> &mut u8 {
        match group {
            ButtonGroup::Program => &mut self.program,
            ButtonGroup::Preview => &mut self.preview,
            ButtonGroup::Transition => &mut self.transition,
        }
    }
}

/// Read frames until end of stream, feeding decoded events into `tx`.
///
/// Runs on the dedicated reader thread, which is the sole owner of the
/// port's read half. Malformed lines are reported and skipped without
/// touching decoder state. A read timeout just polls again so a closed
/// port is noticed; any other read error is logged and the read retried.
///
/// Returns `Err(PanelError::Disconnected)` when the stream ends, or
/// `Ok(())` if every event receiver is gone first. Either way the event
/// channel closes, which is how consumers observe the end of input.
pub fn run_reader_loop<R: BufRead>(
    mut reader: R,
    mut decoder: InputDecoder,
    tx: UnboundedSender<PanelEvent>,
) -> Result<(), PanelError> {
    debug!("panel reader started");
    let mut line: Vec<u8> = Vec::with_capacity(frame::FRAME_LEN);

    loop {
        match reader.read_until(TERMINATOR, &mut line) {
            Ok(_) => {
                if line.last().copied() != Some(TERMINATOR) {
                    // End of stream; any partial line is dropped.
                    return Err(PanelError::Disconnected);
                }

                match frame::decode(&line) {
                    Ok((segment, data)) => {
                        for event in decoder.handle_frame(segment, data) {
                            if tx.send(event).is_err() {
                                debug!("event receiver dropped, reader exiting");
                                return Ok(());
                            }
                        }
                    }
                    Err(err) => {
                        warn!("discarding line {:02X?}: {}", line, err);
                    }
                }
                line.clear();
            }
            // Timeout expiry mid-frame leaves the partial line buffered
            // for the next read.
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => {
                warn!("panel read error: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::segment;

    #[test]
    fn first_press_emits_single_down_event() {
        let mut decoder = InputDecoder::new();
        let events = decoder.handle_frame(segment::PROGRAM, 0xFE);
        assert_eq!(
            events,
            vec![PanelEvent::Button {
                group: ButtonGroup::Program,
                index: 0,
                direction: Direction::Down,
            }]
        );
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.handle_frame(segment::PREVIEW, 0xFE).len(), 1);
        assert!(decoder.handle_frame(segment::PREVIEW, 0xFE).is_empty());
    }

    #[test]
    fn release_emits_up_event() {
        let mut decoder = InputDecoder::new();
        decoder.handle_frame(segment::TRANSITION, 0xF7);
        let events = decoder.handle_frame(segment::TRANSITION, 0xFF);
        assert_eq!(
            events,
            vec![PanelEvent::Button {
                group: ButtonGroup::Transition,
                index: 3,
                direction: Direction::Up,
            }]
        );
    }

    #[test]
    fn multiple_changed_bits_emit_in_ascending_order() {
        let mut decoder = InputDecoder::new();
        let events = decoder.handle_frame(segment::PROGRAM, 0b0101_1010);
        let indices: Vec<u8> = events
            .iter()
            .map(|event| match event {
                PanelEvent::Button { index, .. } => *index,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(indices, vec![0, 2, 5, 7]);
    }

    #[test]
    fn event_count_matches_changed_bits() {
        let mut decoder = InputDecoder::new();
        decoder.handle_frame(segment::PROGRAM, 0x0F);
        // 0x0F -> 0xF0 flips all eight bits.
        assert_eq!(decoder.handle_frame(segment::PROGRAM, 0xF0).len(), 8);
    }

    #[test]
    fn rows_are_tracked_independently() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.handle_frame(segment::PROGRAM, 0xFE).len(), 1);
        // Same snapshot on another row is still a fresh diff there.
        assert_eq!(decoder.handle_frame(segment::PREVIEW, 0xFE).len(), 1);
    }

    #[test]
    fn analog_frames_always_emit() {
        let mut decoder = InputDecoder::new();
        for _ in 0..3 {
            let events = decoder.handle_frame(segment::TBAR, 0x80);
            assert_eq!(
                events,
                vec![PanelEvent::Analog {
                    channel: AnalogChannel::TBar,
                    value: 0x80,
                }]
            );
        }
    }

    #[test]
    fn rotaries_map_to_their_channels() {
        let mut decoder = InputDecoder::new();
        for (code, channel) in [
            (segment::ROTARY_A, AnalogChannel::RotaryA),
            (segment::ROTARY_B, AnalogChannel::RotaryB),
            (segment::ROTARY_C, AnalogChannel::RotaryC),
        ] {
            assert_eq!(
                decoder.handle_frame(code, 42),
                vec![PanelEvent::Analog { channel, value: 42 }]
            );
        }
    }

    #[test]
    fn unknown_segments_are_ignored() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.handle_frame(0x9, 0x00).is_empty());
        assert!(decoder.handle_frame(0xF, 0xFF).is_empty());
        // And they must not disturb row state.
        assert_eq!(decoder.handle_frame(segment::PROGRAM, 0xFF).len(), 0);
    }
}
