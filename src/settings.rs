use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "squeezebox.ron";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Which flow axis drives the bellows. The other axis is read as shake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TiltAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Decay constant of the moving average, milliseconds.
    pub tau_ms: f32,
    pub tilt_axis: TiltAxis,
    /// Frame period of the pointer flow simulator.
    pub frame_interval_ms: u64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            tau_ms: 200.0,
            tilt_axis: TiltAxis::Y,
            frame_interval_ms: 33,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BellowsSettings {
    pub k_expand: f32,
    pub k_contract: f32,
}

impl Default for BellowsSettings {
    fn default() -> Self {
        Self {
            k_expand: 0.05,
            k_contract: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSettings {
    pub floor: f32,
    /// Smoothed tilt at which the ramp above the floor reaches full range.
    pub full_scale_tilt: f32,
    pub threshold: f32,
    pub slow_step: u8,
    pub fast_step: u8,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            floor: 31.0,
            full_scale_tilt: 7.5,
            threshold: 1.5,
            slow_step: 5,
            fast_step: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    /// Zero based MIDI channel.
    pub channel: u8,
    pub program: u8,
    pub velocity: u8,
    /// Case-insensitive substring used to prefer an output port.
    pub port_hint: String,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            channel: 0,
            program: 21,
            velocity: 127,
            port_hint: "synth".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayThroughSettings {
    pub debounce_ms: u64,
    pub preview_len: usize,
    /// One key per lane, lane 0 first.
    pub lane_keys: Vec<char>,
    pub hard_mode: bool,
}

impl Default for PlayThroughSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 80,
            preview_len: 6,
            lane_keys: vec!['d', 'f', 'j', 'k'],
            hard_mode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreePlaySettings {
    /// Each character's index in this string is its offset above `base_note`.
    /// Dots are unused semitones.
    pub layout: String,
    pub base_note: u8,
}

impl Default for FreePlaySettings {
    fn default() -> Self {
        Self {
            layout: "q.wer..t.y..u.iop..a.s..d.fgh..j.k..l.zxc..v.b..n.m".to_string(),
            base_note: 35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion: MotionSettings,
    pub bellows: BellowsSettings,
    pub volume: VolumeSettings,
    pub synth: SynthSettings,
    pub play_through: PlayThroughSettings,
    pub free_play: FreePlaySettings,
    pub song_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion: MotionSettings::default(),
            bellows: BellowsSettings::default(),
            volume: VolumeSettings::default(),
            synth: SynthSettings::default(),
            play_through: PlayThroughSettings::default(),
            free_play: FreePlaySettings::default(),
            song_dir: PathBuf::from("songs"),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let ron_string = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = ron::from_str(&ron_string)?;

        Ok(settings)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings =
            ron::from_str("(play_through: (debounce_ms: 120), song_dir: \"tunes\")").unwrap();
        assert_eq!(settings.play_through.debounce_ms, 120);
        assert_eq!(settings.play_through.lane_keys, vec!['d', 'f', 'j', 'k']);
        assert_eq!(settings.motion.tau_ms, 200.0);
        assert_eq!(settings.song_dir, PathBuf::from("tunes"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let mut settings = Settings::default();
        settings.synth.program = 0;
        settings.motion.tilt_axis = TiltAxis::X;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.synth.program, 0);
        assert_eq!(loaded.motion.tilt_axis, TiltAxis::X);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("nope.ron")).unwrap();
        assert_eq!(settings.free_play.base_note, 35);
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "(motion: [").unwrap();
        assert!(matches!(Settings::load(&path), Err(SettingsError::Ron(_))));
    }
}
