// src/event.rs

/// ===============================
/// Performance events
/// ===============================

/// Mod wheel: sets vibrato depth.
pub const CC_MOD_WHEEL: u8 = 1;
/// All Sound Off.
pub const CC_ALL_SOUND_OFF: u8 = 120;
/// All Notes Off.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Centre of the 14-bit pitch-bend range.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// An event delivered to the engine between render calls.
///
/// These events:
/// - take effect at the next block boundary
/// - carry raw 7-bit / 14-bit MIDI values
/// - are never rejected; out-of-range values are clamped by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NoteOn { note: u8, velocity: u8 },

    NoteOff { note: u8 },

    ControlChange { controller: u8, value: u8 },

    /// 0..=16383, 8192 is centre
    PitchBend { value: u16 },
}

impl Event {
    /// Decode a channel-voice MIDI message. The channel nibble is ignored.
    ///
    /// Returns `None` for messages shorter than two bytes or of a type the
    /// engine does not handle. A missing second data byte reads as 0, so a
    /// note-on with velocity 0 or without one is a note-off.
    pub fn from_midi(bytes: &[u8]) -> Option<Event> {
        let (&status, &data1) = (bytes.first()?, bytes.get(1)?);
        let data2 = bytes.get(2).copied().unwrap_or(0);
        let (data1, data2) = (data1 & 0x7F, data2 & 0x7F);

        match status & 0xF0 {
            0x90 if data2 > 0 => Some(Event::NoteOn {
                note: data1,
                velocity: data2,
            }),
            0x90 | 0x80 => Some(Event::NoteOff { note: data1 }),
            0xB0 => Some(Event::ControlChange {
                controller: data1,
                value: data2,
            }),
            0xE0 => Some(Event::PitchBend {
                value: ((data2 as u16) << 7) | data1 as u16,
            }),
            _ => None,
        }
    }
}
