use crate::settings::BellowsSettings;

const COMPRESS_MIN: f32 = 0.25;
const COMPRESS_RANGE: f32 = 0.25;

/// Eased one-dimensional bellows state driving the rendered baffle spacing.
#[derive(Debug, Clone)]
pub struct Bellows {
    k_expand: f32,
    k_contract: f32,
    position: f32,
}

impl Bellows {
    pub fn new(settings: &BellowsSettings) -> Self {
        Self {
            k_expand: settings.k_expand,
            k_contract: settings.k_contract,
            position: 0.0,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn compress(&self) -> f32 {
        self.position * COMPRESS_RANGE + COMPRESS_MIN
    }

    /// Runs every tick, with or without a fresh camera frame.
    /// Positive `tilt_dir` pulls the bellows open, anything else closes them,
    /// and closing is the faster of the two.
    pub fn tick(&mut self, tilt_smooth: f32, tilt_dir: f32) -> f32 {
        let tilt = if tilt_smooth.is_finite() {
            tilt_smooth.max(0.0)
        } else {
            0.0
        };

        if tilt_dir > 0.0 {
            let rate = (tilt * self.k_expand).min(1.0);
            self.position += (1.0 - self.position) * rate;
        } else {
            let rate = (tilt * self.k_contract).min(1.0);
            self.position -= self.position * rate;
        }
        self.position = self.position.clamp(0.0, 1.0);

        self.compress()
    }
}

/// Slide offset of the on-screen keyboard, `-1.0` fully hidden, `0.0` shown.
#[derive(Debug, Clone)]
pub struct KeyboardOverlay {
    shown: bool,
    offset: f32,
}

impl Default for KeyboardOverlay {
    fn default() -> Self {
        Self {
            shown: false,
            offset: -1.0,
        }
    }
}

impl KeyboardOverlay {
    pub fn toggle(&mut self) {
        self.shown = !self.shown;
    }

    pub fn tick(&mut self) -> f32 {
        if self.shown {
            self.offset *= 0.9;
        } else {
            self.offset += (-1.0 - self.offset) * 0.1;
        }
        self.offset
    }
}
