//! Driver core for the RS8-2 switcher control surface.
//!
//! The panel speaks a compact line-framed hex protocol over a serial
//! link: inbound frames carry absolute button-row snapshots and analog
//! levels, outbound frames carry full lamp masks per row. This crate
//! turns the inbound stream into discrete [`PanelEvent`]s and turns
//! batches of [`LightCmd`] requests into the minimal set of outbound
//! frames needed to reach the requested lamp state.
//!
//! ```text
//! serial port ── reader thread ── InputDecoder ──▶ event channel ──▶ app
//! serial port ── lights thread ── LightAggregator ◀── batch channel ◀── app
//! ```
//!
//! The two threads never touch each other's state; the port is split so
//! each direction has exactly one owner, and everything else is message
//! passing.

pub mod boot;
pub mod decoder;
pub mod error;
pub mod event;
pub mod frame;
pub mod lights;
pub mod serial;

pub use decoder::InputDecoder;
pub use error::{FrameError, PanelError};
pub use event::{AnalogChannel, ButtonGroup, Direction, LightCmd, LightState, PanelEvent};
pub use lights::{LightAggregator, LightSender};

use std::io::BufReader;
use std::thread;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// An open panel connection.
///
/// Owns the event stream and the lamp-batch handle for the connection's
/// lifetime. The reader thread stops when the port reaches end of
/// stream; the lights thread stops once the connection and every cloned
/// [`LightSender`] are dropped.
pub struct Connection {
    events: Option<UnboundedReceiver<PanelEvent>>,
    lights: LightSender,
    lights_worker: Option<thread::JoinHandle<()>>,
}

impl Connection {
    /// Open the panel at `path` and start its reader and lights workers.
    ///
    /// Fails only if the serial port cannot be opened.
    pub fn open(path: &str) -> Result<Self, PanelError> {
        let (read_half, write_half) = serial::open(path)?;
        debug!("panel port {} open at {} baud", path, serial::BAUD_RATE);

        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let reader = BufReader::new(read_half);
        thread::Builder::new()
            .name("rs82-reader".into())
            .spawn(move || {
                if let Err(err) = decoder::run_reader_loop(reader, InputDecoder::new(), event_tx) {
                    info!("panel reader stopped: {}", err);
                }
            })
            .expect("Failed to spawn panel reader thread");

        let (light_tx, light_rx) = lights::channel();
        let aggregator = LightAggregator::new(write_half);
        let lights_worker = thread::Builder::new()
            .name("rs82-lights".into())
            .spawn(move || {
                lights::run_lights_loop(aggregator, light_rx);
            })
            .expect("Failed to spawn panel lights thread");

        Ok(Self {
            events: Some(event_rx),
            lights: light_tx,
            lights_worker: Some(lights_worker),
        })
    }

    /// Take the decoded event stream.
    ///
    /// The stream yields for the lifetime of the connection and closes
    /// when the reader sees end of stream. There is a single stream per
    /// connection; subsequent calls return `None`.
    pub fn events(&mut self) -> Option<UnboundedReceiver<PanelEvent>> {
        self.events.take()
    }

    /// Handle for submitting lamp batches.
    pub fn lights(&self) -> LightSender {
        self.lights.clone()
    }

    /// Run the startup lamp test, blocking until it finishes.
    pub fn run_boot_sequence(&self) {
        boot::run(&self.lights);
    }

    /// Stop the lights worker after it drains every queued batch.
    ///
    /// Blocks until the worker exits, so any [`LightSender`] clones must
    /// be dropped first. The reader thread is left to end on its own
    /// when the port closes.
    pub fn close(mut self) {
        let Some(worker) = self.lights_worker.take() else {
            return;
        };
        drop(self.lights);
        let _ = worker.join();
    }
}
