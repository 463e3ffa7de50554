use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    /// Seconds
    pub duration: f32,
}

/// A note-on as delivered by the MIDI file reader: already merged across
/// tracks and sorted by tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteOnEvent {
    pub tick: u64,
    pub pitch: u8,
    pub duration_secs: f32,
}

/// Notes sharing one onset tick, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub notes: Vec<Note>,
}

impl Chord {
    /// Highest pitch; the earliest note wins a tie.
    pub fn top_note(&self) -> Option<Note> {
        let mut top: Option<Note> = None;
        for note in &self.notes {
            if top.is_none_or(|t| note.pitch > t.pitch) {
                top = Some(*note);
            }
        }
        top
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub chords: Vec<Chord>,
}

impl Song {
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn chord(&self, index: usize) -> Option<&Chord> {
        self.chords.get(index)
    }
}

/// Groups tick-sorted note-ons into chords. Only exactly equal ticks share a
/// chord.
pub fn build_song(events: &[NoteOnEvent]) -> Song {
    let mut chords: Vec<Chord> = Vec::new();
    let mut current_tick: Option<u64> = None;

    for event in events {
        if current_tick != Some(event.tick) {
            chords.push(Chord::default());
            current_tick = Some(event.tick);
        }
        if let Some(chord) = chords.last_mut() {
            chord.notes.push(Note {
                pitch: event.pitch,
                duration: event.duration_secs,
            });
        }
    }

    Song { chords }
}
