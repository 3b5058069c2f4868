//! Playback transport state. All queries take a monotonic host timestamp in
//! nanoseconds so position math stays deterministic under test; the viewer
//! passes `Instant`-derived time, tests pass literals.

use std::time::Duration;

pub const SKIP_STEP: Duration = Duration::from_secs(10);
pub const DEFAULT_VOLUME: f32 = 0.7;
const VOLUME_STEP: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Transport {
    playing: bool,
    base_position: Duration,
    resumed_at_ns: Option<u64>,
    volume: f32,
    duration_hint: Option<Duration>,
}

/// Everything the control panel needs for one repaint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub playing: bool,
    pub progress: f32,
    pub elapsed: Duration,
    pub volume: f32,
}

impl Transport {
    pub fn new(duration_hint: Option<Duration>) -> Self {
        Self {
            playing: false,
            base_position: Duration::ZERO,
            resumed_at_ns: None,
            volume: DEFAULT_VOLUME,
            duration_hint,
        }
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn duration_hint(&self) -> Option<Duration> {
        self.duration_hint
    }

    pub fn position(&self, now_ns: u64) -> Duration {
        let mut position = self.base_position;
        if self.playing {
            if let Some(resumed) = self.resumed_at_ns {
                position += Duration::from_nanos(now_ns.saturating_sub(resumed));
            }
        }
        position
    }

    pub fn toggle(&mut self, now_ns: u64) {
        if self.playing {
            self.base_position = self.position(now_ns);
            self.resumed_at_ns = None;
            self.playing = false;
        } else {
            self.resumed_at_ns = Some(now_ns);
            self.playing = true;
        }
    }

    pub fn skip_back(&mut self, now_ns: u64) {
        self.skip(now_ns, -(SKIP_STEP.as_secs_f64()));
    }

    pub fn skip_forward(&mut self, now_ns: u64) {
        self.skip(now_ns, SKIP_STEP.as_secs_f64());
    }

    fn skip(&mut self, now_ns: u64, delta_seconds: f64) {
        let mut target = self.position(now_ns).as_secs_f64() + delta_seconds;
        target = target.max(0.0);
        if let Some(hint) = self.duration_hint {
            target = target.min(hint.as_secs_f64());
        }
        self.base_position = Duration::from_secs_f64(target);
        if self.playing {
            self.resumed_at_ns = Some(now_ns);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.volume + VOLUME_STEP);
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume - VOLUME_STEP);
    }

    /// Progress fraction against the duration hint; `None` when no hint was
    /// configured (the panel then shows an empty bar).
    pub fn progress(&self, now_ns: u64) -> Option<f32> {
        let hint = self.duration_hint?;
        if hint.is_zero() {
            return Some(0.0);
        }
        Some((self.position(now_ns).as_secs_f64() / hint.as_secs_f64()).min(1.0) as f32)
    }

    /// Restart position at zero without touching the play state. Invoked when
    /// the video stream wraps around at end-of-stream.
    pub fn rebase(&mut self, now_ns: u64) {
        self.base_position = Duration::ZERO;
        if self.playing {
            self.resumed_at_ns = Some(now_ns);
        }
    }

    pub fn snapshot(&self, now_ns: u64) -> TransportSnapshot {
        TransportSnapshot {
            playing: self.playing,
            progress: self.progress(now_ns).unwrap_or(0.0),
            elapsed: self.position(now_ns),
            volume: self.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: u64 = 1_000_000_000;

    #[test]
    fn volume_never_escapes_unit_range() {
        let mut transport = Transport::new(None);
        for value in [-5.0, -0.01, 0.0, 0.31, 1.0, 1.01, 42.0, f32::INFINITY] {
            transport.set_volume(value);
            assert!((0.0..=1.0).contains(&transport.volume()), "volume {value}");
        }
        transport.set_volume(0.95);
        transport.volume_up();
        assert_eq!(transport.volume(), 1.0);
        transport.set_volume(0.05);
        transport.volume_down();
        transport.volume_down();
        assert_eq!(transport.volume(), 0.0);
    }

    #[test]
    fn position_advances_only_while_playing() {
        let mut transport = Transport::new(None);
        assert_eq!(transport.position(5 * SECOND), Duration::ZERO);

        transport.toggle(10 * SECOND);
        assert!(transport.playing());
        assert_eq!(transport.position(13 * SECOND), Duration::from_secs(3));

        transport.toggle(13 * SECOND);
        assert!(!transport.playing());
        assert_eq!(transport.position(60 * SECOND), Duration::from_secs(3));
    }

    #[test]
    fn skip_clamps_to_zero_and_duration_hint() {
        let mut transport = Transport::new(Some(Duration::from_secs(25)));
        transport.skip_back(0);
        assert_eq!(transport.position(0), Duration::ZERO);

        transport.toggle(0);
        transport.skip_forward(2 * SECOND);
        // 2s elapsed + 10s skip = 12s.
        assert_eq!(transport.position(2 * SECOND), Duration::from_secs(12));
        transport.skip_forward(2 * SECOND);
        transport.skip_forward(2 * SECOND);
        assert_eq!(transport.position(2 * SECOND), Duration::from_secs(25));
    }

    #[test]
    fn progress_requires_a_duration_hint() {
        let mut without_hint = Transport::new(None);
        without_hint.toggle(0);
        assert_eq!(without_hint.progress(90 * SECOND), None);
        assert_eq!(without_hint.snapshot(90 * SECOND).progress, 0.0);

        let mut with_hint = Transport::new(Some(Duration::from_secs(100)));
        with_hint.toggle(0);
        let progress = with_hint.progress(40 * SECOND).unwrap();
        assert!((progress - 0.4).abs() < 1e-6);
        assert_eq!(with_hint.progress(500 * SECOND), Some(1.0));
    }

    #[test]
    fn rebase_restarts_position_and_keeps_play_state() {
        let mut transport = Transport::new(None);
        transport.toggle(0);
        assert_eq!(transport.position(30 * SECOND), Duration::from_secs(30));

        transport.rebase(30 * SECOND);
        assert!(transport.playing());
        assert_eq!(transport.position(30 * SECOND), Duration::ZERO);
        assert_eq!(transport.position(34 * SECOND), Duration::from_secs(4));

        transport.toggle(34 * SECOND);
        transport.rebase(40 * SECOND);
        assert!(!transport.playing());
        assert_eq!(transport.position(99 * SECOND), Duration::ZERO);
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let mut transport = Transport::new(Some(Duration::from_secs(120)));
        transport.toggle(0);
        transport.set_volume(0.25);
        let snapshot = transport.snapshot(60 * SECOND);
        assert!(snapshot.playing);
        assert_eq!(snapshot.elapsed, Duration::from_secs(60));
        assert!((snapshot.progress - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.volume, 0.25);
    }
}
