//! Logitech G110 backlight CLI tool
//!
//! The keyboard takes its backlight color as a 5 byte HID feature report, written through a
//! class-specific SET_REPORT control transfer on interface 0.

use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgMatches,
    Command,
};
use log::warn;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use crate::animator::{Animator, FADE_SPEED};
use crate::command::{CommandBuffer, ControlTransport};
use crate::controller::BacklightController;
use crate::error::SessionError;
use crate::logitech_g110::LogitechG110;
use crate::session::UsbSession;

mod animator;
mod command;
mod controller;
mod error;
mod locator;
mod logitech_g110;
mod session;

/// What to do with the backlight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Mode {
    /// Set a single color and exit.
    Static(u8),
    /// Fade through all colors until interrupted.
    Fade,
}

impl Mode {
    fn from_cli(matches: &ArgMatches) -> Self {
        match matches.get_one::<u8>("color") {
            Some(color) => Self::Static(*color),
            None => Self::Fade,
        }
    }
}

fn main() -> ExitCode {
    init_logger();

    println!("{}", usage_banner());

    let mode = Mode::from_cli(&cli().get_matches());
    let animator = Animator::new(FADE_SPEED);

    // Stop fading on SIGINT/SIGTERM, so the keyboard is released before exiting.
    if mode == Mode::Fade {
        let running = animator.stop_handle();
        if let Err(err) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            warn!("Unable to install signal handler: {err}");
        }
    }

    let result = run(mode, &LogitechG110, &animator);
    if let Err(err) = &result {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
    }

    ExitCode::from(exit_status(&result))
}

/// Open libusb and apply the requested mode to the keyboard.
fn run(
    mode: Mode,
    controller: &dyn BacklightController,
    animator: &Animator,
) -> Result<(), SessionError> {
    let usb = UsbSession::open()?;
    execute(mode, controller, animator, || {
        let device = usb.find_device(controller)?;
        usb.open_device(&device, controller)
    })
}

/// Acquire the keyboard and apply the requested mode.
///
/// Nothing is sent unless `acquire` succeeds. The transport is dropped, releasing the
/// keyboard, before this returns.
fn execute<T, F>(
    mode: Mode,
    controller: &dyn BacklightController,
    animator: &Animator,
    acquire: F,
) -> Result<(), SessionError>
where
    T: ControlTransport,
    F: FnOnce() -> Result<T, SessionError>,
{
    let transport = acquire()?;
    apply(mode, &transport, controller, animator);
    Ok(())
}

/// Send a single color or fade until stopped.
fn apply(
    mode: Mode,
    transport: &dyn ControlTransport,
    controller: &dyn BacklightController,
    animator: &Animator,
) {
    let mut buffer = CommandBuffer::new(controller);

    match mode {
        Mode::Static(color) => {
            buffer.set_color(color);

            // Transfer errors are reported by the sender and do not change the exit status.
            if command::send_color(transport, controller, &buffer).is_ok() {
                println!("\x1b[32mSuccessfully applied color {}.\x1b[0m", color);
            }
        },
        Mode::Fade => {
            animator.animate(transport, controller, &mut buffer);
        },
    }
}

/// Process exit status for the outcome of [`run`].
fn exit_status(result: &Result<(), SessionError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Banner printed on every invocation.
fn usage_banner() -> String {
    format!(
        "usage: {} [color 0-255]\nSets the color. If no color is given it loops them through.",
        crate_name!()
    )
}

/// Log diagnostics to STDERR.
fn init_logger() {
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let _ = TermLogger::init(LevelFilter::Info, config, TerminalMode::Stderr, ColorChoice::Auto);
}

/// Get clap CLI parameters.
fn cli() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .arg(
            Arg::new("color")
                .help("Backlight color, fading through all colors if omitted [0..=255]")
                .value_parser(value_parser!(u8)),
        )
}
