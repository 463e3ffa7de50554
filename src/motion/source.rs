use super::Flow;

/// One camera frame worth of flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFrame {
    pub flows: Vec<Flow>,
    pub timestamp_ms: u64,
}

/// Anything that can hand out optical-flow frames on the control tick.
///
/// `poll` returns `None` when no new frame has arrived since the last call.
pub trait MotionSource {
    fn poll(&mut self, now_ms: u64) -> Option<FlowFrame>;
}

/// Stands in for the camera: pointer motion accumulated between frame
/// boundaries becomes a single flow vector.
#[derive(Debug, Clone)]
pub struct PointerFlowSource {
    frame_interval_ms: u64,
    last_frame_ms: Option<u64>,
    dx: f32,
    dy: f32,
}

impl PointerFlowSource {
    pub fn new(frame_interval_ms: u64) -> Self {
        Self {
            frame_interval_ms: frame_interval_ms.max(1),
            last_frame_ms: None,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn push_delta(&mut self, dx: f32, dy: f32) {
        self.dx += dx;
        self.dy += dy;
    }
}

impl MotionSource for PointerFlowSource {
    fn poll(&mut self, now_ms: u64) -> Option<FlowFrame> {
        if let Some(last) = self.last_frame_ms {
            if now_ms.saturating_sub(last) < self.frame_interval_ms {
                return None;
            }
        }
        self.last_frame_ms = Some(now_ms);

        // Screen y grows downward; pulling up opens the bellows.
        let flow = Flow::new(self.dx, -self.dy);
        self.dx = 0.0;
        self.dy = 0.0;

        Some(FlowFrame {
            flows: vec![flow],
            timestamp_ms: now_ms,
        })
    }
}
