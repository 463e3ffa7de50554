use crate::audio::{CC_VOLUME, Synth, VolumeGovernor};
use crate::events::{KeyEvent, KeyResponse, OVERLAY_KEY};
use crate::free_play::FreePlay;
use crate::motion::{Bellows, ControlState, FlowFrame, KeyboardOverlay, SignalProcessor};
use crate::settings::Settings;
use crate::song::{self, PlayState, PlayThrough, Song, SongError};
use std::path::Path;

/// Everything the front-end needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    pub control: ControlState,
    pub movement_detected: bool,
    pub compress: f32,
    pub overlay_offset: f32,
    pub volume: u8,
    pub sounding: bool,
    pub play_through: bool,
    pub finished: bool,
    pub hard_mode: bool,
    pub position: usize,
    pub song_len: usize,
    pub highlight: Option<usize>,
    pub preview: Vec<usize>,
    /// Key bound to each lane, lane 0 first.
    pub lane_keys: Vec<char>,
    pub live_keys: Vec<char>,
    pub pressed_keys: Vec<char>,
    pub free_notes: Vec<u8>,
}

/// Owns all per-tick state and the synth. Only one of free play and
/// play-through drives the synth channel at any time.
pub struct Controller<S: Synth> {
    synth: S,
    channel: u8,
    signal: SignalProcessor,
    bellows: Bellows,
    volume: VolumeGovernor,
    overlay: KeyboardOverlay,
    free_play: FreePlay,
    play_through: PlayThrough,
    compress: f32,
    overlay_offset: f32,
}

impl<S: Synth> Controller<S> {
    pub fn new(settings: &Settings, synth: S) -> Self {
        let channel = settings.synth.channel;
        let velocity = settings.synth.velocity;
        let bellows = Bellows::new(&settings.bellows);
        let compress = bellows.compress();
        let mut overlay = KeyboardOverlay::default();
        let overlay_offset = overlay.tick();

        Self {
            synth,
            channel,
            signal: SignalProcessor::new(&settings.motion),
            bellows,
            volume: VolumeGovernor::new(&settings.volume),
            overlay,
            free_play: FreePlay::new(&settings.free_play, channel, velocity),
            play_through: PlayThrough::new(&settings.play_through, channel, velocity),
            compress,
            overlay_offset,
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn control(&self) -> &ControlState {
        self.signal.state()
    }

    pub fn sounding(&self) -> bool {
        self.volume.sounding()
    }

    pub fn compress(&self) -> f32 {
        self.compress
    }

    pub fn play_through(&self) -> &PlayThrough {
        &self.play_through
    }

    /// One control tick. Motion and volume only move on a new camera frame;
    /// the bellows and overlay ease every tick.
    pub fn tick(&mut self, frame: Option<&FlowFrame>) {
        if let Some(frame) = frame {
            let control = self.signal.on_frame(&frame.flows, frame.timestamp_ms);
            let (value, _) = self.volume.tick(control.tilt_smooth);
            self.synth.control_change(self.channel, CC_VOLUME, value);
        }

        let control = self.signal.state();
        self.compress = self.bellows.tick(control.tilt_smooth, control.tilt_dir);
        self.overlay_offset = self.overlay.tick();
    }

    pub fn key(&mut self, event: KeyEvent, now_ms: u64) -> KeyResponse {
        match event {
            KeyEvent::Down(OVERLAY_KEY) => {
                self.overlay.toggle();
                KeyResponse::Overlay
            }
            KeyEvent::Up(OVERLAY_KEY) => KeyResponse::Ignored,
            KeyEvent::Down(key) if self.play_through.is_active() => {
                let sounding = self.volume.sounding();
                KeyResponse::PlayThrough(self.play_through.key_down(
                    key,
                    now_ms,
                    sounding,
                    &mut self.synth,
                ))
            }
            KeyEvent::Up(key) if self.play_through.is_active() => {
                if self.play_through.key_up(key, &mut self.synth) {
                    KeyResponse::Finished
                } else {
                    KeyResponse::Ignored
                }
            }
            KeyEvent::Down(key) => {
                KeyResponse::FreePlay(self.free_play.key_down(key, &mut self.synth))
            }
            KeyEvent::Up(key) => KeyResponse::FreePlay(self.free_play.key_up(key, &mut self.synth)),
        }
    }

    pub fn load_and_start(&mut self, path: &Path) -> Result<(), SongError> {
        let song = song::load_song(path)?;
        self.start_play_through(song)
    }

    /// Free-play notes are released before the song takes over the channel.
    pub fn start_play_through(&mut self, song: Song) -> Result<(), SongError> {
        if song.is_empty() {
            return Err(SongError::NoSong);
        }
        self.free_play.release_all(&mut self.synth);
        self.play_through.arm(song, &mut self.synth)
    }

    pub fn stop_play_through(&mut self) {
        self.play_through.stop(&mut self.synth);
    }

    pub fn set_hard_mode(&mut self, hard_mode: bool) {
        self.play_through.set_hard_mode(hard_mode);
    }

    /// Silences the channel outright, e.g. on shutdown.
    pub fn panic(&mut self) {
        self.play_through.stop(&mut self.synth);
        self.free_play.release_all(&mut self.synth);
        self.synth.all_notes_off(self.channel);
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let control = *self.signal.state();
        let pt = &self.play_through;
        let lane_keys = (0..song::LANE_COUNT)
            .filter_map(song::Lane::new)
            .filter_map(|lane| pt.lane_keys().key_for(lane))
            .collect();

        let mut live_keys: Vec<char> = pt.live_keys().collect();
        live_keys.sort_unstable();
        let mut pressed_keys: Vec<char> = pt.pressed_keys().collect();
        pressed_keys.sort_unstable();
        let mut free_notes: Vec<u8> = self.free_play.playing().collect();
        free_notes.sort_unstable();

        RenderSnapshot {
            control,
            movement_detected: control.movement_detected(),
            compress: self.compress,
            overlay_offset: self.overlay_offset,
            volume: self.volume.volume(),
            sounding: self.volume.sounding(),
            play_through: pt.is_active(),
            finished: pt.state() == PlayState::Finished,
            hard_mode: pt.hard_mode(),
            position: pt.position(),
            song_len: pt.song_len(),
            highlight: pt.highlight().map(|l| l.index()),
            preview: pt.preview().iter().map(|l| l.index()).collect(),
            lane_keys,
            live_keys,
            pressed_keys,
            free_notes,
        }
    }
}
