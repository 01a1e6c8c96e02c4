//! RS8-2 Switcher Panel Driver CLI
//!
//! A command-line interface for the RS8-2 broadcast switcher control
//! surface: event monitoring, the startup lamp test, and direct lamp
//! control.

use clap::Parser;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers (split from main.rs)
mod commands;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rs82_panel=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor { device, no_blink } => {
            commands::monitor(&device, !no_blink)?;
        }
        Commands::Blink { device } => {
            commands::blink(&device)?;
        }
        Commands::SetLight {
            device,
            row,
            index,
            state,
        } => {
            commands::set_light(&device, row.into(), index, state.into())?;
        }
    }

    Ok(())
}
