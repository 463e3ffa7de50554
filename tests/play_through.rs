use midly::num::{u4, u7, u15, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use squeezebox::audio::Synth;
use squeezebox::events::{KeyEvent, KeyResponse};
use squeezebox::motion::{Flow, FlowFrame};
use squeezebox::song::{KeyOutcome, PlayState, Rejection, SongError};
use squeezebox::{Controller, Settings};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct TestSynth {
    sounding: HashSet<u8>,
    note_ons: usize,
}

impl Synth for TestSynth {
    fn note_on(&mut self, _channel: u8, pitch: u8, _velocity: u8) {
        self.sounding.insert(pitch);
        self.note_ons += 1;
    }

    fn note_off(&mut self, _channel: u8, pitch: u8) {
        self.sounding.remove(&pitch);
    }

    fn control_change(&mut self, _channel: u8, _controller: u8, _value: u8) {}

    fn program_change(&mut self, _channel: u8, _program: u8) {}
}

fn midi_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message,
        },
    }
}

/// Writes a file with a C major triad, then D, then F.
fn write_song(dir: &Path) -> PathBuf {
    let on = |delta, key| {
        midi_event(
            delta,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(100),
            },
        )
    };
    let off = |delta, key| {
        midi_event(
            delta,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    };

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(480)),
    ));
    smf.tracks.push(vec![
        on(0, 60),
        on(0, 64),
        on(0, 67),
        off(480, 60),
        off(0, 64),
        off(0, 67),
        on(0, 62),
        off(480, 62),
        on(0, 65),
        off(480, 65),
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let path = dir.join("scale.mid");
    smf.save(&path).unwrap();
    path
}

fn pump(controller: &mut Controller<TestSynth>, from_ms: u64) {
    for i in 0..30 {
        controller.tick(Some(&FlowFrame {
            flows: vec![Flow::new(0.5, 6.0), Flow::new(-0.5, 5.0)],
            timestamp_ms: from_ms + i * 33,
        }));
    }
}

fn press(controller: &mut Controller<TestSynth>, key: char, now_ms: u64) -> KeyResponse {
    controller.key(KeyEvent::Down(key), now_ms)
}

#[test]
fn hard_mode_song_plays_to_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_song(dir.path());

    let mut controller = Controller::new(&Settings::default(), TestSynth::default());
    controller.load_and_start(&path).unwrap();
    assert_eq!(controller.play_through().song_len(), 3);
    assert_eq!(controller.play_through().state(), PlayState::Armed);

    // Lanes for tops 67, 62, 65: 3, then -3 wraps to 0, then +2.
    assert_eq!(
        press(&mut controller, 'k', 0),
        KeyResponse::PlayThrough(KeyOutcome::Rejected(
            Rejection::NotSounding
        ))
    );
    controller.key(KeyEvent::Up('k'), 10);
    assert_eq!(controller.play_through().position(), 0);
    assert_eq!(controller.synth().note_ons, 0);

    pump(&mut controller, 100);
    assert!(controller.sounding());

    let mut now = 2000;
    for (key, position) in [('k', 0), ('d', 1), ('j', 2)] {
        assert_eq!(
            press(&mut controller, key, now),
            KeyResponse::PlayThrough(KeyOutcome::Accepted { position })
        );
        assert!(!controller.synth().sounding.is_empty());
        now += 200;
        let released = controller.key(KeyEvent::Up(key), now);
        assert_eq!(released == KeyResponse::Finished, position == 2);
        now += 200;
    }

    assert_eq!(controller.play_through().position(), 3);
    assert_eq!(controller.play_through().state(), PlayState::Finished);
    assert_eq!(controller.play_through().live_keys().count(), 0);
    assert!(controller.synth().sounding.is_empty());
    assert_eq!(controller.synth().note_ons, 5);
}

#[test]
fn chattering_key_advances_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_song(dir.path());
    let settings = Settings::default();

    let mut controller = Controller::new(&settings, TestSynth::default());
    controller.load_and_start(&path).unwrap();
    pump(&mut controller, 0);

    press(&mut controller, 'k', 5000);
    controller.key(KeyEvent::Up('k'), 5010);
    let response = press(&mut controller, 'd', 5000 + settings.play_through.debounce_ms / 2);

    assert!(matches!(
        response,
        KeyResponse::PlayThrough(KeyOutcome::Rejected(_))
    ));
    assert_eq!(controller.play_through().position(), 1);
}

#[test]
fn empty_directory_entry_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.mid");
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(96)),
    ));
    smf.tracks.push(vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }]);
    smf.save(&path).unwrap();

    let mut controller = Controller::new(&Settings::default(), TestSynth::default());
    assert!(matches!(
        controller.load_and_start(&path),
        Err(SongError::Empty(_))
    ));
    assert_eq!(controller.play_through().state(), PlayState::Idle);
    assert_eq!(
        press(&mut controller, 'q', 0),
        KeyResponse::FreePlay(Some(35))
    );
}
