mod bellows;
mod signal;
mod source;

pub use bellows::{Bellows, KeyboardOverlay};
pub use signal::{ControlState, Flow, SignalProcessor};
pub use source::{FlowFrame, MotionSource, PointerFlowSource};
