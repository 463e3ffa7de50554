mod chord;
mod lanes;
mod library;
mod midi_file;
mod play_through;

use std::path::{Path, PathBuf};

pub use chord::{Chord, Note, NoteOnEvent, Song, build_song};
pub use lanes::{LANE_COUNT, Lane, LaneAssignment, assign_lanes, lane_shift};
pub use library::{SONG_SUFFIX, list_files, watch_dir};
pub use midi_file::{load_note_ons, read_note_ons};
pub use play_through::{KeyOutcome, PlayState, PlayThrough, Rejection};

#[derive(Debug, thiserror::Error)]
pub enum SongError {
    #[error("song directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse MIDI file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: midly::Error,
    },
    #[error("{0} contains no notes")]
    Empty(PathBuf),
    #[error("no song available")]
    NoSong,
}

/// Reads a MIDI file into chords. A file without any note is an error.
pub fn load_song(path: &Path) -> Result<Song, SongError> {
    let events = load_note_ons(path)?;
    let song = build_song(&events);
    if song.is_empty() {
        return Err(SongError::Empty(path.to_path_buf()));
    }
    tracing::info!("loaded {} ({} chords)", path.display(), song.len());

    Ok(song)
}
