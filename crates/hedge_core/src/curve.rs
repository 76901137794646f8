//! Keyframed 3D position curve, used by the fly-through camera.

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("curve has no keyframes")]
    Empty,
    #[error("keyframe times must strictly increase (got {next_ms} after {prev_ms})")]
    NotIncreasing { prev_ms: f64, next_ms: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveLoopType {
    /// Hold the last keyframe once time runs past the end.
    #[default]
    Constant,
    /// Wrap time back to the first keyframe.
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Keyframe {
    pub position: Vec3,
    pub time_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Curve3D {
    loop_type: CurveLoopType,
    keys: Vec<Keyframe>,
}

impl Curve3D {
    pub fn new(loop_type: CurveLoopType, keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        if keys.is_empty() {
            return Err(CurveError::Empty);
        }
        for pair in keys.windows(2) {
            if pair[1].time_ms <= pair[0].time_ms {
                return Err(CurveError::NotIncreasing {
                    prev_ms: pair[0].time_ms,
                    next_ms: pair[1].time_ms,
                });
            }
        }
        Ok(Self { loop_type, keys })
    }

    pub fn duration_ms(&self) -> f64 {
        let first = self.keys[0].time_ms;
        let last = self.keys[self.keys.len() - 1].time_ms;
        last - first
    }

    pub fn evaluate(&self, time_ms: f64) -> Vec3 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];
        let duration = self.duration_ms();
        if duration <= 0.0 {
            return first.position;
        }

        let t = match self.loop_type {
            CurveLoopType::Constant => time_ms.clamp(first.time_ms, last.time_ms),
            CurveLoopType::Cycle => first.time_ms + (time_ms - first.time_ms).rem_euclid(duration),
        };

        // keys is sorted, so the segment is the first key at or after t.
        let upper = self
            .keys
            .iter()
            .position(|k| k.time_ms >= t)
            .unwrap_or(self.keys.len() - 1);
        if upper == 0 {
            return first.position;
        }
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let s = ((t - a.time_ms) / (b.time_ms - a.time_ms)) as f32;
        a.position.lerp(b.position, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: f32, y: f32, z: f32, time_ms: f64) -> Keyframe {
        Keyframe {
            position: Vec3::new(x, y, z),
            time_ms,
        }
    }

    fn fly_through() -> Curve3D {
        Curve3D::new(
            CurveLoopType::Cycle,
            vec![
                key(0.0, 2.0, 10.0, 0.0),
                key(0.0, 8.0, 15.0, 1000.0),
                key(0.0, 8.0, 20.0, 2000.0),
                key(0.0, 6.0, 25.0, 3000.0),
                key(0.0, 4.0, 25.0, 4000.0),
                key(0.0, 2.0, 10.0, 6000.0),
            ],
        )
        .expect("valid curve")
    }

    #[test]
    fn hits_keyframes_exactly() {
        let curve = fly_through();
        assert_eq!(curve.evaluate(1000.0), Vec3::new(0.0, 8.0, 15.0));
        assert_eq!(curve.evaluate(3000.0), Vec3::new(0.0, 6.0, 25.0));
    }

    #[test]
    fn interpolates_between_keyframes() {
        let curve = fly_through();
        let mid = curve.evaluate(500.0);
        assert!((mid - Vec3::new(0.0, 5.0, 12.5)).length() < 1e-4);
    }

    #[test]
    fn cycle_wraps_past_the_end() {
        let curve = fly_through();
        let wrapped = curve.evaluate(6000.0 + 500.0);
        assert!((wrapped - curve.evaluate(500.0)).length() < 1e-4);
    }

    #[test]
    fn constant_holds_last_key() {
        let curve = Curve3D::new(
            CurveLoopType::Constant,
            vec![key(0.0, 0.0, 0.0, 0.0), key(10.0, 0.0, 0.0, 100.0)],
        )
        .expect("valid curve");
        assert_eq!(curve.evaluate(5000.0), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(curve.evaluate(-5.0), Vec3::ZERO);
    }

    #[test]
    fn rejects_empty_and_unordered_keys() {
        assert_eq!(
            Curve3D::new(CurveLoopType::Cycle, Vec::new()).unwrap_err(),
            CurveError::Empty
        );
        assert!(Curve3D::new(
            CurveLoopType::Cycle,
            vec![key(0.0, 0.0, 0.0, 10.0), key(0.0, 0.0, 0.0, 10.0)]
        )
        .is_err());
    }
}
