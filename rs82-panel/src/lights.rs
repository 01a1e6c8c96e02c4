//! Lamp state aggregation and the outbound write path.
//!
//! One worker exclusively owns the panel's lamp masks and the port's
//! write half. Callers submit batches of [`LightCmd`] through a
//! [`LightSender`]; the worker applies each batch to its masks and writes
//! one frame per row that actually changed, so a full redraw costs at
//! most three frames on the wire.

use std::io::Write;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::error::PanelError;
use crate::event::{ButtonGroup, LightCmd, LightState};
use crate::frame::{self, segment};

/// Handle for submitting lamp batches to the lights worker.
///
/// Cheap to clone; the worker stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct LightSender {
    tx: UnboundedSender<Vec<LightCmd>>,
}

impl LightSender {
    /// Submit one batch, applied atomically with respect to other
    /// batches. Returns `false` if the lights worker is gone.
    pub fn send_batch(&self, batch: Vec<LightCmd>) -> bool {
        self.tx.send(batch).is_ok()
    }

    /// Submit a single-lamp batch.
    pub fn set(&self, group: ButtonGroup, index: u8, state: LightState) -> bool {
        self.send_batch(vec![LightCmd {
            group,
            index,
            state,
        }])
    }
}

/// Create the batch channel for a lights worker.
pub fn channel() -> (LightSender, UnboundedReceiver<Vec<LightCmd>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LightSender { tx }, rx)
}

/// Authoritative on-panel lamp state plus the write half of the port.
///
/// The masks are the single source of truth for what the panel displays.
/// Same active-low polarity as input: a lamp is lit when its bit is 0,
/// so all-ones means every lamp off.
pub struct LightAggregator<W: Write> {
    writer: W,
    masks: [u8; 3],
}

impl<W: Write> LightAggregator<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            masks: [0xFF; 3],
        }
    }

    /// Apply one batch and flush the rows it changed.
    ///
    /// Each command diffs against the state left by the commands before
    /// it in the same batch and flips exactly the bit it names, so a
    /// batch that turns a lamp on and back off nets to no change. A row
    /// is written once per batch no matter how many of its lamps changed,
    /// carrying the row's full cumulative mask. A failed row write is
    /// reported and the remaining rows still go out.
    pub fn apply_batch(&mut self, batch: &[LightCmd]) {
        let mut dirty = [false; 3];

        for cmd in batch {
            if cmd.index > 7 {
                debug!("ignoring lamp command for out-of-range index {}", cmd.index);
                continue;
            }

            let row = group_index(cmd.group);
            let bit = 1u8 << cmd.index;
            let lit = self.masks[row] & bit == 0;
            let want_lit = cmd.state == LightState::On;

            if lit != want_lit {
                self.masks[row] ^= bit;
                dirty[row] = true;
            }
        }

        for group in ButtonGroup::ALL {
            let row = group_index(group);
            if !dirty[row] {
                continue;
            }

            if let Err(err) = self.write_row(group) {
                warn!(
                    "failed to update {} lamps: {}",
                    segment::name(group.segment()),
                    err
                );
            }
        }
    }

    /// Send one row's full current mask to the panel.
    fn write_row(&mut self, group: ButtonGroup) -> Result<(), PanelError> {
        let mask = self.masks[group_index(group)];
        let wire = frame::encode(group.segment(), mask);
        debug!("sending {} mask {:08b}", segment::name(group.segment()), mask);

        self.writer.write_all(&wire)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Current mask for a row.
    pub fn mask(&self, group: ButtonGroup) -> u8 {
        self.masks[group_index(group)]
    }
}

fn group_index(group: ButtonGroup) -> usize {
    match group {
        ButtonGroup::Program => 0,
        ButtonGroup::Preview => 1,
        ButtonGroup::Transition => 2,
    }
}

/// Drain lamp batches until every sender is dropped.
///
/// Runs on the dedicated lights thread, which is the sole owner of the
/// aggregator for the connection's lifetime.
pub fn run_lights_loop<W: Write>(
    mut aggregator: LightAggregator<W>,
    mut rx: UnboundedReceiver<Vec<LightCmd>>,
) {
    debug!("panel lights worker started");
    while let Some(batch) = rx.blocking_recv() {
        aggregator.apply_batch(&batch);
    }
    debug!("panel lights worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn on(group: ButtonGroup, index: u8) -> LightCmd {
        LightCmd {
            group,
            index,
            state: LightState::On,
        }
    }

    fn off(group: ButtonGroup, index: u8) -> LightCmd {
        LightCmd {
            group,
            index,
            state: LightState::Off,
        }
    }

    #[test]
    fn single_lamp_write_carries_full_mask() {
        let mut agg = LightAggregator::new(Vec::new());
        agg.apply_batch(&[on(ButtonGroup::Program, 3)]);
        assert_eq!(agg.mask(ButtonGroup::Program), 0xF7);
        assert_eq!(agg.writer, b"~2F7\r");
    }

    #[test]
    fn batch_for_one_row_coalesces_to_one_write() {
        let mut agg = LightAggregator::new(Vec::new());
        agg.apply_batch(&[
            on(ButtonGroup::Preview, 0),
            on(ButtonGroup::Preview, 1),
            on(ButtonGroup::Preview, 2),
            off(ButtonGroup::Preview, 1),
        ]);
        // One frame, reflecting the cumulative mask: bits 0 and 2 lit.
        assert_eq!(agg.writer, b"~1FA\r");
    }

    #[test]
    fn applying_same_batch_twice_writes_only_once() {
        let mut agg = LightAggregator::new(Vec::new());
        let batch = [on(ButtonGroup::Program, 5), on(ButtonGroup::Transition, 1)];

        agg.apply_batch(&batch);
        let after_first = agg.writer.clone();
        assert!(!after_first.is_empty());

        agg.apply_batch(&batch);
        assert_eq!(agg.writer, after_first);
    }

    #[test]
    fn on_then_off_same_batch_nets_to_nothing() {
        let mut agg = LightAggregator::new(Vec::new());
        // The common "refresh" pattern: each command diffs against the
        // state left by the previous one, so this cancels out entirely.
        agg.apply_batch(&[on(ButtonGroup::Program, 3), off(ButtonGroup::Program, 3)]);
        assert_eq!(agg.mask(ButtonGroup::Program), 0xFF);
        assert!(agg.writer.is_empty());
    }

    #[test]
    fn dirty_rows_emit_in_fixed_order() {
        let mut agg = LightAggregator::new(Vec::new());
        agg.apply_batch(&[
            on(ButtonGroup::Transition, 0),
            on(ButtonGroup::Program, 0),
            on(ButtonGroup::Preview, 0),
        ]);
        assert_eq!(agg.writer, b"~2FE\r~1FE\r~3FE\r");
    }

    #[test]
    fn redundant_commands_do_not_dirty_the_row() {
        let mut agg = LightAggregator::new(Vec::new());
        agg.apply_batch(&[on(ButtonGroup::Program, 2)]);
        agg.writer.clear();
        // Already lit; nothing to do.
        agg.apply_batch(&[on(ButtonGroup::Program, 2)]);
        assert!(agg.writer.is_empty());
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let mut agg = LightAggregator::new(Vec::new());
        agg.apply_batch(&[on(ButtonGroup::Program, 8)]);
        assert_eq!(agg.mask(ButtonGroup::Program), 0xFF);
        assert!(agg.writer.is_empty());
    }

    /// Writer that fails its first write, then recovers.
    struct FlakyWriter {
        failures_left: usize,
        written: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port gone"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_does_not_stop_other_rows() {
        let writer = FlakyWriter {
            failures_left: 1,
            written: Vec::new(),
        };
        let mut agg = LightAggregator::new(writer);
        agg.apply_batch(&[on(ButtonGroup::Program, 0), on(ButtonGroup::Preview, 0)]);

        // Program row write failed, preview row still went out, and the
        // masks reflect both changes regardless.
        assert_eq!(agg.writer.written, b"~1FE\r");
        assert_eq!(agg.mask(ButtonGroup::Program), 0xFE);
        assert_eq!(agg.mask(ButtonGroup::Preview), 0xFE);
    }
}
