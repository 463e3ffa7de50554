use crate::audio::{self, Synth};
use crate::controller::{Controller, RenderSnapshot};
use crate::events::{KeyEvent, KeyResponse};
use crate::motion::FlowFrame;
use crate::settings::Settings;
use crate::song::{self, SONG_SUFFIX};
use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender};
use notify::RecommendedWatcher;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// One tick of the render clock, with a camera frame if one arrived.
    Tick { frame: Option<FlowFrame> },
    Key { event: KeyEvent, now_ms: u64 },
    SetSongDir(PathBuf),
    ScanSongs,
    StartSong(PathBuf),
    StopSong,
    SetHardMode(bool),
    /// Writes the current settings, including folder and mode changes.
    SaveSettings,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum EngineUpdate {
    Songs { songs: Vec<PathBuf> },
    SongStarted { path: PathBuf, chords: usize },
    SongFinished,
    SongStopped,
    SettingsSaved(PathBuf),
    Error { message: String },
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
    pub snapshot: Arc<ArcSwap<RenderSnapshot>>,
}

pub fn spawn_engine(settings: Settings, settings_path: PathBuf) -> EngineHandle {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();
    let snapshot = Arc::new(ArcSwap::from_pointee(RenderSnapshot::default()));

    let engine = Engine {
        controller: Controller::new(&settings, audio::open_synth(&settings.synth)),
        song_dir: settings.song_dir.clone(),
        settings,
        settings_path,
        watcher: None,
        command_tx: command_tx.clone(),
        update_tx,
        snapshot: snapshot.clone(),
    };

    std::thread::spawn(move || {
        engine.run(command_rx);
    });

    EngineHandle {
        command_tx,
        update_rx,
        snapshot,
    }
}

struct Engine<S: Synth> {
    controller: Controller<S>,
    song_dir: PathBuf,
    settings: Settings,
    settings_path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    command_tx: Sender<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
    snapshot: Arc<ArcSwap<RenderSnapshot>>,
}

impl<S: Synth> Engine<S> {
    fn run(mut self, command_rx: Receiver<EngineCommand>) {
        self.watch_song_dir();
        self.scan_songs();
        self.publish();

        loop {
            match command_rx.recv() {
                Ok(EngineCommand::Shutdown) | Err(crossbeam::channel::RecvError) => break,
                Ok(command) => {
                    self.handle(command);
                    self.publish();
                }
            }
        }

        self.controller.panic();
        tracing::info!("engine stopped");
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Tick { frame } => self.controller.tick(frame.as_ref()),
            EngineCommand::Key { event, now_ms } => {
                if self.controller.key(event, now_ms) == KeyResponse::Finished {
                    let _ = self.update_tx.send(EngineUpdate::SongFinished);
                }
            }
            EngineCommand::SetSongDir(dir) => {
                self.song_dir = dir;
                self.watch_song_dir();
                self.scan_songs();
            }
            EngineCommand::ScanSongs => self.scan_songs(),
            EngineCommand::StartSong(path) => match self.controller.load_and_start(&path) {
                Ok(()) => {
                    let chords = self.controller.play_through().song_len();
                    let _ = self.update_tx.send(EngineUpdate::SongStarted { path, chords });
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.report(format!("Failed to start song: {}", e));
                }
            },
            EngineCommand::StopSong => {
                self.controller.stop_play_through();
                let _ = self.update_tx.send(EngineUpdate::SongStopped);
            }
            EngineCommand::SetHardMode(hard_mode) => self.controller.set_hard_mode(hard_mode),
            EngineCommand::SaveSettings => self.save_settings(),
            EngineCommand::Shutdown => {}
        }
    }

    fn scan_songs(&mut self) {
        match song::list_files(&self.song_dir, SONG_SUFFIX) {
            Ok(songs) => {
                tracing::debug!("{} songs in {}", songs.len(), self.song_dir.display());
                let _ = self.update_tx.send(EngineUpdate::Songs { songs });
            }
            Err(e) => {
                let _ = self.update_tx.send(EngineUpdate::Songs { songs: Vec::new() });
                self.report(e.to_string());
            }
        }
    }

    fn watch_song_dir(&mut self) {
        self.watcher = None;
        let command_tx = self.command_tx.clone();
        match song::watch_dir(&self.song_dir, move || {
            let _ = command_tx.send(EngineCommand::ScanSongs);
        }) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => tracing::warn!("cannot watch {}: {}", self.song_dir.display(), e),
        }
    }

    fn save_settings(&mut self) {
        self.settings.song_dir = self.song_dir.clone();
        self.settings.play_through.hard_mode = self.controller.play_through().hard_mode();

        match self.settings.save(&self.settings_path) {
            Ok(()) => {
                tracing::info!("settings saved to {}", self.settings_path.display());
                let _ = self
                    .update_tx
                    .send(EngineUpdate::SettingsSaved(self.settings_path.clone()));
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.report(format!("Failed to save settings: {}", e));
            }
        }
    }

    fn report(&self, message: String) {
        let _ = self.update_tx.send(EngineUpdate::Error { message });
    }

    fn publish(&self) {
        self.snapshot.store(Arc::new(self.controller.snapshot()));
    }
}
