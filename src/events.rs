use crate::song::KeyOutcome;

/// Key that slides the on-screen keyboard in and out.
pub const OVERLAY_KEY: char = '\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(char),
    Up(char),
}

/// What a key event ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    Overlay,
    /// Pitch started or stopped in free play, if any.
    FreePlay(Option<u8>),
    PlayThrough(KeyOutcome),
    /// Releasing this key ended the song.
    Finished,
    Ignored,
}
