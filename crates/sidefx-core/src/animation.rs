use std::time::Duration;

use crate::executor::{delay, now};

/// Frame pacing for [`animate`].
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn interpolate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(300),
            easing: Easing::EaseInOut,
        }
    }
}

impl AnimationSpec {
    pub fn tween(duration: Duration, easing: Easing) -> Self {
        Self { duration, easing }
    }
}

pub trait Interpolate {
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// Drives a value from `from` to `to`, reporting each frame to `on_frame`.
///
/// Runs on the runtime clock: one frame every [`FRAME_INTERVAL`], the last
/// frame always reports exactly `to`. Dropping the future stops the
/// animation where it is.
pub async fn animate<T, F>(from: T, to: T, spec: AnimationSpec, mut on_frame: F)
where
    T: Interpolate + Clone,
    F: FnMut(T),
{
    if spec.duration.is_zero() {
        on_frame(to);
        return;
    }
    let start = now();
    loop {
        let elapsed = now().saturating_duration_since(start);
        if elapsed >= spec.duration {
            on_frame(to);
            return;
        }
        let t = elapsed.as_secs_f32() / spec.duration.as_secs_f32();
        on_frame(from.interpolate(&to, spec.easing.interpolate(t)));
        delay(FRAME_INTERVAL).await;
    }
}
