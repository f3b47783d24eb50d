//! Per-tree clock advanced by the driver.

/// Accumulated time and the last frame delta.
///
/// Deltas larger than `max_delta_time` are clamped so a stalled driver does
/// not make time-based tasks skip ahead arbitrarily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timepiece {
    time: f32,
    delta_time: f32,
    max_delta_time: f32,
}

impl Timepiece {
    pub fn new(max_delta_time: f32) -> Self {
        Self {
            time: 0.0,
            delta_time: 0.0,
            max_delta_time,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn max_delta_time(&self) -> f32 {
        self.max_delta_time
    }

    pub fn update(&mut self, delta_time: f32) {
        self.delta_time = delta_time.min(self.max_delta_time);
        self.time += self.delta_time;
    }
}

impl Default for Timepiece {
    fn default() -> Self {
        Self::new(f32::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_deltas() {
        let mut clock = Timepiece::default();
        clock.update(0.5);
        clock.update(0.25);
        assert_eq!(clock.time(), 0.75);
        assert_eq!(clock.delta_time(), 0.25);
    }

    #[test]
    fn clamps_large_deltas() {
        let mut clock = Timepiece::new(0.1);
        clock.update(3.0);
        assert_eq!(clock.delta_time(), 0.1);
        assert_eq!(clock.time(), 0.1);
    }
}
