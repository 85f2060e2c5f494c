// src/voice.rs

use crate::envelope::Envelope;
use crate::preset::Chip;

pub type VoiceId = usize;

/// Number of hardware channels on either chip.
pub const NUM_CHANNELS: usize = 4;

/// One of the four hardware channel slots.
///
/// Index 2 is the triangle on the NES and the wave channel on the GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ChannelIndex(u8);

impl ChannelIndex {
    pub const PULSE1: ChannelIndex = ChannelIndex(0);
    pub const PULSE2: ChannelIndex = ChannelIndex(1);
    pub const TRIANGLE: ChannelIndex = ChannelIndex(2);
    pub const NOISE: ChannelIndex = ChannelIndex(3);

    pub const ALL: [ChannelIndex; NUM_CHANNELS] = [
        Self::PULSE1,
        Self::PULSE2,
        Self::TRIANGLE,
        Self::NOISE,
    ];

    /// Clamp an arbitrary index into 0..=3.
    #[inline]
    pub fn new(index: u8) -> Self {
        ChannelIndex(index.min(NUM_CHANNELS as u8 - 1))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit for this channel in a channel mask.
    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.0
    }

    /// The other pulse channel (used for unison doubling).
    #[inline]
    pub fn pulse_partner(self) -> Option<ChannelIndex> {
        match self.0 {
            0 => Some(Self::PULSE2),
            1 => Some(Self::PULSE1),
            _ => None,
        }
    }
}

/// What kind of signal generator a channel index maps to on a given chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelKind {
    #[default]
    Pulse1,
    Pulse2,
    /// NES triangle
    Triangle,
    /// GB wave channel
    Wave,
    Noise,
}

impl ChannelKind {
    pub fn for_channel(channel: ChannelIndex, chip: Chip) -> Self {
        match (channel.index(), chip) {
            (0, _) => ChannelKind::Pulse1,
            (1, _) => ChannelKind::Pulse2,
            (2, Chip::Nes) => ChannelKind::Triangle,
            (2, Chip::Gb) => ChannelKind::Wave,
            _ => ChannelKind::Noise,
        }
    }
}

/// A voice is one polyphonic slot bound to one hardware channel.
///
/// Voices live in a fixed array owned by the voice pool and are addressed
/// by index. Deactivation is the only way a voice ends.
#[derive(Debug, Clone)]
pub struct Voice {
    pub id: VoiceId,
    pub active: bool,
    /// MIDI note after octave transpose
    pub note: u8,
    pub velocity: u8,
    pub channel: ChannelIndex,
    pub kind: ChannelKind,
    /// Allocation stamp; smaller is older
    pub age: u64,
    /// Whether the chip has already been triggered for this note
    pub triggered: bool,
    pub envelope: Envelope,
    /// Pitch-envelope offset in semitones, decays toward zero
    pub pitch_env: f32,
}

impl Voice {
    #[inline]
    pub fn new(id: VoiceId) -> Self {
        Self {
            id,
            active: false,
            note: 0,
            velocity: 0,
            channel: ChannelIndex::PULSE1,
            kind: ChannelKind::Pulse1,
            age: 0,
            triggered: false,
            envelope: Envelope::new(),
            pitch_env: 0.0,
        }
    }

    /// Silence immediately: no release tail, envelope back to idle.
    #[inline]
    pub fn kill(&mut self) {
        self.active = false;
        self.envelope.reset();
    }
}
