//! Delta-aware interval timer.

/// Accumulates tick deltas and fires once a fixed interval has elapsed.
///
/// Leftover time is discarded on firing so a long frame never triggers a
/// burst of catch-up events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Interval {
    elapsed: f32,
}

impl Interval {
    /// Creates a timer with no accumulated time.
    #[must_use]
    pub const fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Advances the timer by `delta` ticks and returns true if `interval` ticks have passed.
    pub fn get(&mut self, interval: f32, delta: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed >= interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}
