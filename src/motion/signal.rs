use crate::settings::{MotionSettings, TiltAxis};

/// One flow vector: per-feature displacement between two video frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Flow {
    pub dx: f32,
    pub dy: f32,
}

impl Flow {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    pub tilt_speed: f32,
    pub shake_speed: f32,
    pub tilt_smooth: f32,
    pub shake_smooth: f32,
    /// Net signed tilt-axis flow of the latest frame.
    pub tilt_dir: f32,
    pub last_timestamp: Option<u64>,
}

impl ControlState {
    /// Steady tilting with little side-to-side shake.
    pub fn movement_detected(&self) -> bool {
        self.shake_smooth < 1.0 && self.tilt_smooth > 1.0
    }
}

/// Turns raw per-frame flow into exponentially smoothed tilt and shake.
#[derive(Debug, Clone)]
pub struct SignalProcessor {
    tau_ms: f32,
    tilt_axis: TiltAxis,
    state: ControlState,
}

impl SignalProcessor {
    pub fn new(settings: &MotionSettings) -> Self {
        Self {
            tau_ms: settings.tau_ms.max(f32::EPSILON),
            tilt_axis: settings.tilt_axis,
            state: ControlState::default(),
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Feeds one camera frame. The first frame only establishes the clock.
    ///
    /// A frame without any flow vectors produces no valid magnitude; the
    /// previous smoothed values are kept as they are.
    pub fn on_frame(&mut self, flows: &[Flow], now_ms: u64) -> ControlState {
        let Some(last) = self.state.last_timestamp.replace(now_ms) else {
            return self.state;
        };

        let dt = now_ms.saturating_sub(last) as f32;
        let alpha = 1.0 - (-dt / self.tau_ms).exp();

        let mut tilt_sum = 0.0;
        let mut shake_sum = 0.0;
        let mut tilt_dir = 0.0;
        for flow in flows {
            let (tilt, shake) = match self.tilt_axis {
                TiltAxis::Y => (flow.dy, flow.dx),
                TiltAxis::X => (flow.dx, flow.dy),
            };
            tilt_sum += tilt.abs();
            shake_sum += shake.abs();
            tilt_dir += tilt;
        }

        let count = flows.len() as f32;
        let tilt_speed = tilt_sum / count;
        let shake_speed = shake_sum / count;
        if !tilt_speed.is_finite() || !shake_speed.is_finite() {
            tracing::trace!("degenerate flow frame, keeping previous state");
            return self.state;
        }

        let state = &mut self.state;
        state.tilt_speed = tilt_speed;
        state.shake_speed = shake_speed;
        state.tilt_dir = tilt_dir;
        state.tilt_smooth = alpha * tilt_speed + (1.0 - alpha) * state.tilt_smooth;
        state.shake_smooth = alpha * shake_speed + (1.0 - alpha) * state.shake_smooth;

        tracing::trace!(
            tilt = state.tilt_smooth,
            shake = state.shake_smooth,
            dir = state.tilt_dir,
            "motion"
        );

        *state
    }
}
