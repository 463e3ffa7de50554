mod synth;
mod volume;

pub use synth::{CC_ALL_NOTES_OFF, CC_VOLUME, MidirSynth, NullSynth, Synth, SynthError, open_synth};
pub use volume::VolumeGovernor;

#[cfg(test)]
pub(crate) use synth::testing;
