//! Color fade animation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::command::{self, CommandBuffer, ControlTransport};
use crate::controller::BacklightController;

/// Delay between two color steps.
pub const FADE_SPEED: Duration = Duration::from_millis(100);

/// Direction of the color sweep.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    /// 1 up to 254.
    Ascending,
    /// 255 down to 1.
    Descending,
}

/// Endless sweep through the color range and back.
#[derive(Debug, Clone)]
pub(crate) struct ColorSweep {
    phase: Phase,
    next: u8,
}

impl ColorSweep {
    pub fn new() -> Self {
        Self { phase: Phase::Ascending, next: 1 }
    }
}

impl Default for ColorSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for ColorSweep {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let color = self.next;

        match self.phase {
            Phase::Ascending if color == u8::MAX - 1 => {
                self.phase = Phase::Descending;
                self.next = u8::MAX;
            },
            Phase::Ascending => self.next += 1,
            Phase::Descending if color == 1 => {
                self.phase = Phase::Ascending;
                self.next = 1;
            },
            Phase::Descending => self.next -= 1,
        }

        Some(color)
    }
}

/// Fade animation, running until stopped.
pub(crate) struct Animator {
    cadence: Duration,
    running: Arc<AtomicBool>,
}

impl Animator {
    pub fn new(cadence: Duration) -> Self {
        Self { cadence, running: Arc::new(AtomicBool::new(true)) }
    }

    /// Flag which stops the animation once cleared.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Cycle through all colors until the stop handle is cleared.
    ///
    /// Failed transfers are skipped. Returns the number of steps performed.
    pub fn animate(
        &self,
        transport: &dyn ControlTransport,
        controller: &dyn BacklightController,
        buffer: &mut CommandBuffer,
    ) -> usize {
        let mut steps = 0;
        let mut failures = 0;

        for color in ColorSweep::new() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            buffer.set_color(color);
            if command::send_color(transport, controller, buffer).is_err() {
                failures += 1;
            }
            steps += 1;

            thread::sleep(self.cadence);
        }

        if failures > 0 {
            warn!("{} of {} color changes failed", failures, steps);
        }
        info!("Animation stopped after {} steps", steps);

        steps
    }
}
