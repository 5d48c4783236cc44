use std::time::{Duration, Instant};

/// Camera position on the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            lat: 39.0,
            lng: 35.0,
            altitude: 2.5,
        }
    }
}

impl Camera {
    /// Interpolates towards `to`, taking the short way around in longitude.
    pub fn lerp(&self, to: &Camera, t: f64) -> Camera {
        let mut dlng = (to.lng - self.lng) % 360.0;
        if dlng > 180.0 {
            dlng -= 360.0;
        } else if dlng < -180.0 {
            dlng += 360.0;
        }
        Camera {
            lat: self.lat + (to.lat - self.lat) * t,
            lng: wrap_longitude(self.lng + dlng * t),
            altitude: self.altitude + (to.altitude - self.altitude) * t,
        }
    }
}

pub fn wrap_longitude(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

#[derive(Clone, Debug)]
pub struct CameraTransition {
    pub from: Camera,
    pub to: Camera,
    pub start_time: Instant,
    pub duration: Duration,
}

impl CameraTransition {
    pub fn new(from: Camera, to: Camera, duration: Duration) -> Self {
        Self {
            from,
            to,
            start_time: Instant::now(),
            duration,
        }
    }

    pub fn linear_progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start_time);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn eased_progress<F>(&self, now: Instant, easing: F) -> f32
    where
        F: Fn(f32) -> f32,
    {
        easing(self.linear_progress(now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.linear_progress(now) >= 1.0
    }

    /// Camera position at `now`.
    pub fn camera_at(&self, now: Instant) -> Camera {
        let t = self.eased_progress(now, ease_in_out_cubic) as f64;
        self.from.lerp(&self.to, t)
    }
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t.powi(3)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Dash offset of an animated arc at `elapsed`, as a fraction of one traversal.
pub fn dash_phase(elapsed: Duration, period_ms: u32) -> f32 {
    if period_ms == 0 {
        return 0.0;
    }
    let period = period_ms as f64 / 1000.0;
    ((elapsed.as_secs_f64() / period) % 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_transition_reaches_target() {
        let from = Camera::default();
        let to = Camera {
            lat: 10.0,
            lng: -20.0,
            altitude: 1.5,
        };
        let transition = CameraTransition::new(from, to, Duration::from_millis(1000));
        let start = transition.start_time;
        assert_eq!(transition.camera_at(start), from);
        let end = start + Duration::from_millis(1500);
        assert!(transition.is_finished(end));
        assert_eq!(transition.camera_at(end), to);
    }

    #[test]
    fn test_zero_duration_transition_is_immediate() {
        let transition =
            CameraTransition::new(Camera::default(), Camera::default(), Duration::ZERO);
        assert!(transition.is_finished(transition.start_time));
    }

    #[test]
    fn test_longitude_takes_short_way() {
        let from = Camera {
            lat: 0.0,
            lng: 170.0,
            altitude: 1.0,
        };
        let to = Camera {
            lat: 0.0,
            lng: -170.0,
            altitude: 1.0,
        };
        let mid = from.lerp(&to, 0.5);
        assert!((mid.lng.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_dash_phase_wraps() {
        assert_eq!(dash_phase(Duration::from_millis(0), 1000), 0.0);
        assert!((dash_phase(Duration::from_millis(1250), 1000) - 0.25).abs() < 1e-6);
        assert_eq!(dash_phase(Duration::from_millis(500), 0), 0.0);
    }
}
