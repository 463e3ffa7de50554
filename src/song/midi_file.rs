use super::{NoteOnEvent, SongError};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

/// Microseconds per beat when a file never sets a tempo (120 BPM).
const DEFAULT_TEMPO: u32 = 500_000;

pub fn load_note_ons(path: &Path) -> Result<Vec<NoteOnEvent>, SongError> {
    let bytes = fs::read(path).map_err(|source| SongError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_note_ons(&bytes).map_err(|source| SongError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Joins all tracks into one tick-ordered note-on stream, with each note's
/// sounding time in seconds taken from its matching note-off.
pub fn read_note_ons(bytes: &[u8]) -> Result<Vec<NoteOnEvent>, midly::Error> {
    let smf = Smf::parse(bytes)?;

    let mut tempo_changes: Vec<(u64, u32)> = Vec::new();
    let mut notes: Vec<PendingNote> = Vec::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        let mut open: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();

        for (seq, event) in track.iter().enumerate() {
            tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    tempo_changes.push((tick, tempo.as_int()));
                }
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open.entry((channel, key.as_int()))
                                .or_default()
                                .push_back(notes.len());
                            notes.push(PendingNote {
                                tick,
                                track: track_idx,
                                seq,
                                pitch: key.as_int(),
                                end_tick: None,
                            });
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let started = open
                                .get_mut(&(channel, key.as_int()))
                                .and_then(|queue| queue.pop_front());
                            if let Some(idx) = started {
                                notes[idx].end_tick = Some(tick);
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    tempo_changes.sort_by_key(|&(tick, _)| tick);
    let clock = match smf.header.timing {
        Timing::Metrical(ticks_per_beat) => Clock::Metrical {
            ticks_per_beat: ticks_per_beat.as_int().max(1) as f64,
            tempo: tempo_changes,
        },
        Timing::Timecode(fps, subframes) => Clock::Timecode {
            ticks_per_second: (fps.as_f32() as f64 * subframes as f64).max(1.0),
        },
    };

    notes.sort_by_key(|n| (n.tick, n.track, n.seq));

    Ok(notes
        .into_iter()
        .map(|n| {
            let duration = match n.end_tick {
                Some(end) => clock.seconds_at(end) - clock.seconds_at(n.tick),
                None => 0.0,
            };
            NoteOnEvent {
                tick: n.tick,
                pitch: n.pitch,
                duration_secs: duration as f32,
            }
        })
        .collect())
}

struct PendingNote {
    tick: u64,
    track: usize,
    seq: usize,
    pitch: u8,
    end_tick: Option<u64>,
}

enum Clock {
    Metrical {
        ticks_per_beat: f64,
        tempo: Vec<(u64, u32)>,
    },
    Timecode {
        ticks_per_second: f64,
    },
}

impl Clock {
    fn seconds_at(&self, tick: u64) -> f64 {
        match self {
            Clock::Timecode { ticks_per_second } => tick as f64 / ticks_per_second,
            Clock::Metrical {
                ticks_per_beat,
                tempo,
            } => {
                let seconds_per_tick = |us: u32| us as f64 / 1_000_000.0 / ticks_per_beat;
                let mut seconds = 0.0;
                let mut last_tick = 0;
                let mut current = DEFAULT_TEMPO;
                for &(at, next) in tempo {
                    if at >= tick {
                        break;
                    }
                    seconds += (at - last_tick) as f64 * seconds_per_tick(current);
                    last_tick = at;
                    current = next;
                }
                seconds + (tick - last_tick) as f64 * seconds_per_tick(current)
            }
        }
    }
}
