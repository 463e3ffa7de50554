//! Gesture-driven accordion: optical flow from a camera squeezes the bellows
//! and sets the synth volume, while the keyboard plays notes freely or steps
//! through a MIDI song.

pub mod audio;
pub mod controller;
mod engine;
pub mod events;
mod free_play;
pub mod keymap;
pub mod motion;
pub mod settings;
pub mod song;
mod ui;

pub use controller::{Controller, RenderSnapshot};
pub use engine::{EngineCommand, EngineHandle, EngineUpdate, spawn_engine};
pub use free_play::FreePlay;
pub use settings::{SETTINGS_FILE, Settings};
pub use ui::SqueezeboxApp;
