use crate::settings::SynthSettings;

pub const CC_VOLUME: u8 = 7;
pub const CC_ALL_NOTES_OFF: u8 = 123;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("MIDI init error: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI output ports found")]
    NoPorts,
    #[error("failed to connect to MIDI port: {0}")]
    Connect(String),
}

/// The synthesizer voice as seen by the control loop.
pub trait Synth: Send {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, pitch: u8);
    fn control_change(&mut self, channel: u8, controller: u8, value: u8);
    fn program_change(&mut self, channel: u8, program: u8);

    fn all_notes_off(&mut self, channel: u8) {
        self.control_change(channel, CC_ALL_NOTES_OFF, 0);
    }
}

impl<S: Synth + ?Sized> Synth for Box<S> {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        (**self).note_on(channel, pitch, velocity);
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        (**self).note_off(channel, pitch);
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        (**self).control_change(channel, controller, value);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        (**self).program_change(channel, program);
    }

    fn all_notes_off(&mut self, channel: u8) {
        (**self).all_notes_off(channel);
    }
}

pub struct MidirSynth {
    conn: midir::MidiOutputConnection,
}

impl MidirSynth {
    /// Connects to the first output port whose name contains `port_hint`,
    /// or the first port when none matches.
    pub fn connect(port_hint: &str) -> Result<Self, SynthError> {
        let midi_out = midir::MidiOutput::new("squeezebox")?;
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(SynthError::NoPorts);
        }

        let hint = port_hint.to_lowercase();
        let port = ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.to_lowercase().contains(&hint))
                    .unwrap_or(false)
            })
            .unwrap_or(&ports[0]);

        let name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());
        tracing::info!("opening MIDI port: {}", name);

        let conn = midi_out
            .connect(port, "squeezebox-out")
            .map_err(|e| SynthError::Connect(e.to_string()))?;

        Ok(Self { conn })
    }

    fn send(&mut self, message: &[u8]) {
        if let Err(e) = self.conn.send(message) {
            tracing::warn!("MIDI send failed: {}", e);
        }
    }
}

impl Synth for MidirSynth {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F]);
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.send(&[0x80 | (channel & 0x0F), pitch & 0x7F, 0]);
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        self.send(&[0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
}

/// Used when no MIDI output is available.
pub struct NullSynth;

impl Synth for NullSynth {
    fn note_on(&mut self, _channel: u8, _pitch: u8, _velocity: u8) {}
    fn note_off(&mut self, _channel: u8, _pitch: u8) {}
    fn control_change(&mut self, _channel: u8, _controller: u8, _value: u8) {}
    fn program_change(&mut self, _channel: u8, _program: u8) {}
}

/// Opens the configured output and selects the instrument, falling back to
/// [`NullSynth`] so the instrument still runs without a MIDI device.
pub fn open_synth(settings: &SynthSettings) -> Box<dyn Synth> {
    let mut synth: Box<dyn Synth> = match MidirSynth::connect(&settings.port_hint) {
        Ok(synth) => Box::new(synth),
        Err(e) => {
            tracing::warn!("{}, using null output", e);
            Box::new(NullSynth)
        }
    };
    synth.program_change(settings.channel, settings.program);
    synth
}
