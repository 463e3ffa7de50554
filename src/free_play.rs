use crate::audio::Synth;
use crate::keymap::NoteMap;
use crate::settings::FreePlaySettings;
use std::collections::HashSet;

/// Keys play pitches straight from the layout table while no song is running.
pub struct FreePlay {
    notes: NoteMap,
    playing: HashSet<u8>,
    channel: u8,
    velocity: u8,
}

impl FreePlay {
    pub fn new(settings: &FreePlaySettings, channel: u8, velocity: u8) -> Self {
        Self {
            notes: NoteMap::from_layout(&settings.layout, settings.base_note),
            playing: HashSet::new(),
            channel,
            velocity,
        }
    }

    /// Returns the pitch started, if any.
    pub fn key_down(&mut self, key: char, synth: &mut dyn Synth) -> Option<u8> {
        let note = self.notes.note(key)?;
        if !self.playing.insert(note) {
            return None;
        }
        synth.note_on(self.channel, note, self.velocity);
        Some(note)
    }

    pub fn key_up(&mut self, key: char, synth: &mut dyn Synth) -> Option<u8> {
        let note = self.notes.note(key)?;
        if !self.playing.remove(&note) {
            return None;
        }
        synth.note_off(self.channel, note);
        Some(note)
    }

    pub fn playing(&self) -> impl Iterator<Item = u8> + '_ {
        self.playing.iter().copied()
    }

    /// Releases everything still held.
    pub fn release_all(&mut self, synth: &mut dyn Synth) {
        for note in self.playing.drain() {
            synth.note_off(self.channel, note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingSynth};

    fn free_play() -> FreePlay {
        FreePlay::new(&FreePlaySettings::default(), 0, 127)
    }

    #[test]
    fn press_and_release() {
        let mut fp = free_play();
        let mut synth = RecordingSynth::default();
        assert_eq!(fp.key_down('q', &mut synth), Some(35));
        assert_eq!(fp.key_down('q', &mut synth), None);
        assert_eq!(fp.key_up('q', &mut synth), Some(35));
        assert_eq!(fp.key_up('q', &mut synth), None);
        assert_eq!(synth.calls, vec![Call::NoteOn(35, 127), Call::NoteOff(35)]);
    }

    #[test]
    fn unmapped_keys_are_silent() {
        let mut fp = free_play();
        let mut synth = RecordingSynth::default();
        assert_eq!(fp.key_down('1', &mut synth), None);
        assert!(synth.calls.is_empty());
    }

    #[test]
    fn release_all_stops_everything() {
        let mut fp = free_play();
        let mut synth = RecordingSynth::default();
        fp.key_down('a', &mut synth);
        fp.key_down('s', &mut synth);
        fp.release_all(&mut synth);
        assert!(synth.sounding_pitches().is_empty());
        assert_eq!(fp.playing().count(), 0);
    }
}
