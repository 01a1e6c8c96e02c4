//! Command handlers for the CLI application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tracing::info;

use rs82_panel::{ButtonGroup, Connection, Direction, LightState, PanelEvent};

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Poll interval while waiting for panel events.
const EVENT_POLL: Duration = Duration::from_millis(10);

/// Set up a Ctrl-C handler that clears the given flag when triggered.
/// Returns the Arc<AtomicBool> for use in the main loop.
fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}

/// Open the panel, optionally run the lamp test, then print every
/// decoded event until the stream closes or Ctrl-C.
pub fn monitor(device: &str, blink: bool) -> CommandResult {
    let mut conn = Connection::open(device)?;
    info!("connected to panel at {}", device);

    if blink {
        conn.run_boot_sequence();
    }

    let mut events = conn.events().expect("event stream already taken");
    let running = setup_interrupt_handler();

    println!("Monitoring {device} - press Ctrl-C to stop");
    while running.load(Ordering::SeqCst) {
        match events.try_recv() {
            Ok(event) => print_event(event),
            Err(TryRecvError::Empty) => thread::sleep(EVENT_POLL),
            Err(TryRecvError::Disconnected) => {
                println!("Panel disconnected");
                break;
            }
        }
    }

    conn.close();
    Ok(())
}

/// Run only the startup lamp test.
pub fn blink(device: &str) -> CommandResult {
    let conn = Connection::open(device)?;
    conn.run_boot_sequence();
    conn.close();
    Ok(())
}

/// Set a single lamp on or off.
pub fn set_light(device: &str, row: ButtonGroup, index: u8, state: LightState) -> CommandResult {
    let conn = Connection::open(device)?;
    conn.lights().set(row, index, state);
    conn.close();
    Ok(())
}

fn print_event(event: PanelEvent) {
    match event {
        PanelEvent::Button {
            group,
            index,
            direction,
        } => {
            let dir = match direction {
                Direction::Down => "down",
                Direction::Up => "up",
            };
            println!("{} button {index} {dir}", row_name(group));
        }
        PanelEvent::Analog { channel, value } => {
            println!("{channel:?} {value:3}");
        }
    }
}

fn row_name(group: ButtonGroup) -> &'static str {
    match group {
        ButtonGroup::Program => "program",
        ButtonGroup::Preview => "preview",
        ButtonGroup::Transition => "transition",
    }
}
