// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};

use rs82_panel::{ButtonGroup, LightState};

#[derive(Parser)]
#[command(name = "rs82ctl")]
#[command(author, version, about = "RS8-2 switcher control surface driver")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the panel: print every button and control event
    #[command(visible_alias = "mon")]
    Monitor {
        /// Serial device the panel is attached to (e.g. /dev/ttyUSB0)
        device: String,

        /// Skip the startup lamp test
        #[arg(long)]
        no_blink: bool,
    },

    /// Run only the startup lamp test
    Blink {
        /// Serial device the panel is attached to
        device: String,
    },

    /// Set a single lamp on or off
    #[command(visible_alias = "light")]
    SetLight {
        /// Serial device the panel is attached to
        device: String,

        /// Button row the lamp belongs to
        #[arg(value_enum)]
        row: Row,

        /// Lamp position within the row (0-7)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=7))]
        index: u8,

        /// Desired lamp state
        #[arg(value_enum)]
        state: Lamp,
    },
}

/// Button rows addressable from the command line.
#[derive(Clone, Copy, ValueEnum)]
pub enum Row {
    Program,
    Preview,
    Transition,
}

impl From<Row> for ButtonGroup {
    fn from(row: Row) -> Self {
        match row {
            Row::Program => ButtonGroup::Program,
            Row::Preview => ButtonGroup::Preview,
            Row::Transition => ButtonGroup::Transition,
        }
    }
}

/// Lamp states addressable from the command line.
#[derive(Clone, Copy, ValueEnum)]
pub enum Lamp {
    On,
    Off,
}

impl From<Lamp> for LightState {
    fn from(lamp: Lamp) -> Self {
        match lamp {
            Lamp::On => LightState::On,
            Lamp::Off => LightState::Off,
        }
    }
}
