use crate::settings::VolumeSettings;

const MAX_VOLUME: f32 = 127.0;

/// Channel volume derived from the smoothed tilt, with attack/decay slew.
#[derive(Debug, Clone)]
pub struct VolumeGovernor {
    settings: VolumeSettings,
    synth_vol: u8,
    sounding: bool,
}

impl VolumeGovernor {
    pub fn new(settings: &VolumeSettings) -> Self {
        Self {
            settings: settings.clone(),
            synth_vol: 0,
            sounding: false,
        }
    }

    pub fn volume(&self) -> u8 {
        self.synth_vol
    }

    pub fn sounding(&self) -> bool {
        self.sounding
    }

    /// Unlimited target volume for a smoothed tilt, within `[floor, 127]`.
    pub fn target(&self, tilt_smooth: f32) -> u8 {
        let floor = self.settings.floor.clamp(0.0, MAX_VOLUME);
        let tilt = if tilt_smooth.is_nan() {
            0.0
        } else {
            tilt_smooth.max(0.0)
        };
        let ramp = tilt / self.settings.full_scale_tilt * (MAX_VOLUME - floor);
        (floor + ramp).min(MAX_VOLUME) as u8
    }

    pub fn max_step(&self, tilt_smooth: f32) -> u8 {
        if self.synth_vol == 0 || tilt_smooth <= self.settings.threshold {
            self.settings.slow_step
        } else {
            self.settings.fast_step
        }
    }

    /// Call once per new camera frame. Returns the controller value to send
    /// and whether the gesture is currently live.
    pub fn tick(&mut self, tilt_smooth: f32) -> (u8, bool) {
        let target = self.target(tilt_smooth) as i16;
        let step = self.max_step(tilt_smooth) as i16;
        let current = self.synth_vol as i16;

        self.synth_vol = (current + (target - current).clamp(-step, step)) as u8;
        self.sounding = tilt_smooth > self.settings.threshold;

        let value = if self.sounding { self.synth_vol } else { 0 };
        (value, self.sounding)
    }
}
