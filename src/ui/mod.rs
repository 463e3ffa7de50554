use crate::controller::RenderSnapshot;
use crate::engine::{EngineCommand, EngineHandle, EngineUpdate};
use crate::events::{KeyEvent, OVERLAY_KEY};
use crate::motion::{MotionSource, PointerFlowSource};
use crate::song::LANE_COUNT;
use eframe::egui;
use std::path::PathBuf;
use std::time::Instant;

const LANE_COLORS: [egui::Color32; LANE_COUNT as usize] = [
    egui::Color32::from_rgb(230, 80, 80),
    egui::Color32::from_rgb(80, 200, 120),
    egui::Color32::from_rgb(80, 140, 230),
    egui::Color32::from_rgb(255, 222, 23),
];

pub struct SqueezeboxApp {
    engine: EngineHandle,
    motion: PointerFlowSource,
    started: Instant,
    songs: Vec<PathBuf>,
    current_song: Option<PathBuf>,
    error_message: Option<String>,
    hard_mode: bool,
}

impl SqueezeboxApp {
    pub fn new(engine: EngineHandle, frame_interval_ms: u64, hard_mode: bool) -> Self {
        Self {
            engine,
            motion: PointerFlowSource::new(frame_interval_ms),
            started: Instant::now(),
            songs: Vec::new(),
            current_song: None,
            error_message: None,
            hard_mode,
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.engine.command_tx.send(command);
    }

    fn process_engine_updates(&mut self) {
        while let Ok(update) = self.engine.update_rx.try_recv() {
            match update {
                EngineUpdate::Songs { songs } => {
                    self.songs = songs;
                }
                EngineUpdate::SongStarted { path, chords } => {
                    tracing::debug!("{} armed with {} chords", path.display(), chords);
                    self.current_song = Some(path);
                    self.error_message = None;
                }
                EngineUpdate::SongFinished | EngineUpdate::SongStopped => {
                    self.current_song = None;
                }
                EngineUpdate::SettingsSaved(path) => {
                    tracing::debug!("settings written to {}", path.display());
                    self.error_message = None;
                }
                EngineUpdate::Error { message } => {
                    self.error_message = Some(message);
                }
            }
        }
    }

    /// Feeds pointer motion and keys to the engine and advances its clock.
    fn forward_input(&mut self, ctx: &egui::Context) {
        let now_ms = self.now_ms();
        let (delta, keys) = ctx.input(|i| {
            let keys: Vec<KeyEvent> = i
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed,
                        repeat: false,
                        ..
                    } => key_char(*key).map(|c| {
                        if *pressed {
                            KeyEvent::Down(c)
                        } else {
                            KeyEvent::Up(c)
                        }
                    }),
                    _ => None,
                })
                .collect();
            (i.pointer.delta(), keys)
        });

        self.motion.push_delta(delta.x, delta.y);
        for event in keys {
            self.send(EngineCommand::Key { event, now_ms });
        }
        let frame = self.motion.poll(now_ms);
        self.send(EngineCommand::Tick { frame });
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Song Folder...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("Choose a folder of MIDI files")
                        .pick_folder()
                    {
                        self.send(EngineCommand::SetSongDir(path));
                    }
                    ui.close();
                }

                if ui.button("Rescan").clicked() {
                    self.send(EngineCommand::ScanSongs);
                    ui.close();
                }

                if ui.button("Save Settings").clicked() {
                    self.send(EngineCommand::SaveSettings);
                    ui.close();
                }

                ui.separator();

                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn song_list(&mut self, ui: &mut egui::Ui, snapshot: &RenderSnapshot) {
        ui.heading("Songs");

        if ui.checkbox(&mut self.hard_mode, "Hard mode").changed() {
            self.send(EngineCommand::SetHardMode(self.hard_mode));
        }

        if snapshot.play_through && ui.button("⏹ Stop").clicked() {
            self.send(EngineCommand::StopSong);
        }

        ui.separator();

        if self.songs.is_empty() {
            ui.label("No songs found");
        }
        for path in &self.songs {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let selected = self.current_song.as_ref() == Some(path);
            if ui.selectable_label(selected, name).clicked() {
                self.send(EngineCommand::StartSong(path.clone()));
            }
        }
    }

    fn status(&self, ui: &mut egui::Ui, snapshot: &RenderSnapshot) {
        let control = &snapshot.control;
        ui.label(format!("Velocity: {:.3}", control.tilt_speed));
        ui.label(format!("Smoothed: {:.3}", control.tilt_smooth));
        ui.label(format!("Shake: {:.3}", control.shake_smooth));
        if snapshot.movement_detected {
            ui.label("Movement Detected!");
        }

        ui.add(
            egui::ProgressBar::new((snapshot.compress - 0.25) / 0.25)
                .text(format!("Bellows {:.2}", snapshot.compress)),
        );
        ui.add(
            egui::ProgressBar::new(snapshot.volume as f32 / 127.0)
                .text(format!("Volume {}", snapshot.volume)),
        );
        let gate = if snapshot.sounding { "sounding" } else { "quiet" };
        ui.label(gate);
    }

    fn lanes(&self, ui: &mut egui::Ui, snapshot: &RenderSnapshot) {
        ui.label(format!("Chord {} / {}", snapshot.position, snapshot.song_len));

        ui.horizontal(|ui| {
            for (lane, key) in snapshot.lane_keys.iter().enumerate() {
                let mut text = egui::RichText::new(key.to_ascii_uppercase().to_string())
                    .size(32.0)
                    .monospace();
                if snapshot.highlight == Some(lane) {
                    text = text.color(LANE_COLORS[lane]).strong();
                } else {
                    text = text.color(egui::Color32::GRAY);
                }
                if snapshot.live_keys.contains(key) {
                    text = text.underline();
                }
                ui.label(text);
            }
        });

        let upcoming: Vec<String> = snapshot
            .preview
            .iter()
            .filter_map(|&lane| snapshot.lane_keys.get(lane))
            .map(|key| key.to_ascii_uppercase().to_string())
            .collect();
        ui.label(format!("Next: {}", upcoming.join(" ")));
    }
}

fn key_char(key: egui::Key) -> Option<char> {
    if key == egui::Key::Tab {
        return Some(OVERLAY_KEY);
    }
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

impl eframe::App for SqueezeboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_engine_updates();
        self.forward_input(ctx);

        let snapshot = self.engine.snapshot.load_full();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ui);
        });

        if let Some(ref error) = self.error_message {
            egui::TopBottomPanel::top("error").show(ctx, |ui| {
                ui.colored_label(egui::Color32::RED, error);
            });
        }

        egui::SidePanel::left("songs")
            .min_width(200.0)
            .show(ctx, |ui| {
                self.song_list(ui, &snapshot);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.status(ui, &snapshot);
            ui.separator();

            if snapshot.play_through {
                self.lanes(ui, &snapshot);
            } else if snapshot.finished {
                ui.heading("Song complete");
            } else {
                ui.label("Free play");
                let notes: Vec<String> = snapshot.free_notes.iter().map(|n| n.to_string()).collect();
                ui.label(format!("Playing: {}", notes.join(" ")));
            }

            if snapshot.overlay_offset > -0.5 {
                ui.separator();
                for row in ["qwertyuiop", "asdfghjkl;", "zxcvbnm,./"] {
                    ui.monospace(row);
                }
            }
        });

        ctx.request_repaint();
    }
}

impl Drop for SqueezeboxApp {
    fn drop(&mut self) {
        self.send(EngineCommand::Shutdown);
    }
}
