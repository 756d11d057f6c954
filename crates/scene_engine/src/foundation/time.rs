//! Frame timing

use std::time::Instant;

/// Timing snapshot handed to every hook of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the timer started
    pub elapsed: f32,
    /// Index of this frame, starting at 1
    pub frame: u64,
}

/// Frame timer, either wall-clock driven or stepping by a fixed delta.
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    fixed_delta: Option<f32>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a wall-clock timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            fixed_delta: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Create a timer that advances by `delta` seconds per tick regardless of real time.
    pub fn fixed(delta: f32) -> Self {
        Self {
            fixed_delta: Some(delta),
            ..Self::new()
        }
    }

    /// Advance one frame and return its timing
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        self.delta_time = self
            .fixed_delta
            .unwrap_or_else(|| now.duration_since(self.last_frame).as_secs_f32());
        self.last_frame = now;
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.frame_time()
    }

    /// Timing of the most recent tick
    pub const fn frame_time(&self) -> FrameTime {
        FrameTime {
            delta: self.delta_time,
            elapsed: self.total_time,
            frame: self.frame_count,
        }
    }

    /// Get the current frame count
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Measures one span of work.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Start measuring now
    pub fn start_new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since start
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
