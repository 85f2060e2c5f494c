// src/preset.rs
//
// Chip selection and factory presets.

use std::fmt;

use crate::parameter::SynthParams;
use crate::voice_allocator::AllocMode;

/// Which emulated sound chip an instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Chip {
    /// NES 2A03: two pulses, triangle, noise
    #[default]
    Nes,
    /// Game Boy DMG: two squares, wave, noise
    Gb,
}

impl Chip {
    pub fn name(self) -> &'static str {
        match self {
            Chip::Nes => "NES",
            Chip::Gb => "GB",
        }
    }

    /// Accepts the display name or the numeric index.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NES" | "0" => Some(Chip::Nes),
            "GB" | "1" => Some(Chip::Gb),
            _ => None,
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named bundle of parameters plus the chip it targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub chip: Chip,
    pub params: SynthParams,
}

/// Field order: duty, attack, decay, sustain, release, sweep, vibrato depth,
/// vibrato rate, noise mode, wavetable, channel mask, detune, volume,
/// pitch-env depth, pitch-env speed.
const fn preset(name: &'static str, chip: Chip, alloc_mode: AllocMode, v: [u8; 15]) -> Preset {
    Preset {
        name,
        chip,
        params: SynthParams {
            duty: v[0],
            attack: v[1],
            decay: v[2],
            sustain: v[3],
            release: v[4],
            sweep: v[5],
            vibrato_depth: v[6],
            vibrato_rate: v[7],
            noise_mode: v[8],
            wavetable: v[9],
            channel_mask: v[10],
            detune: v[11],
            volume: v[12],
            octave_transpose: 0,
            alloc_mode,
            pitch_env_depth: v[13],
            pitch_env_speed: v[14],
        },
    }
}

pub const NUM_PRESETS: usize = 32;

// Duty: 0 = 12.5%, 1 = 25%, 2 = 50%, 3 = 75%
// Mask: bit0 pulse1, bit1 pulse2, bit2 triangle/wave, bit3 noise
// Detune > 0 with mask 0x03 doubles each note across both pulses
#[rustfmt::skip]
pub static FACTORY_PRESETS: [Preset; NUM_PRESETS] = [
    preset("NES Lead", Chip::Nes, AllocMode::Lead, [2, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 15, 0, 0]),
    preset("NES Bright", Chip::Nes, AllocMode::Lead, [1, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("NES Thin", Chip::Nes, AllocMode::Lead, [0, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("NES Pad", Chip::Nes, AllocMode::Lead, [2, 6, 5, 12, 8, 0, 3, 5, 0, 0, 0x01, 0, 12, 0, 0]),
    preset("NES Pluck", Chip::Nes, AllocMode::Lead, [1, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0x01, 0, 15, 0, 0]),
    preset("NES Stab", Chip::Nes, AllocMode::Lead, [0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0x01, 0, 15, 0, 0]),
    preset("NES Poly", Chip::Nes, AllocMode::Auto, [2, 0, 3, 15, 5, 0, 0, 0, 0, 0, 0x07, 0, 13, 0, 0]),
    preset("NES Poly Bright", Chip::Nes, AllocMode::Auto, [1, 0, 2, 12, 3, 0, 0, 0, 0, 0, 0x07, 0, 14, 0, 0]),
    preset("NES Unison", Chip::Nes, AllocMode::Auto, [2, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x03, 8, 13, 0, 0]),
    preset("NES Brass", Chip::Nes, AllocMode::Lead, [2, 4, 2, 15, 6, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("Tri Bass", Chip::Nes, AllocMode::Lead, [2, 0, 6, 10, 3, 0, 0, 0, 0, 0, 0x04, 0, 15, 0, 0]),
    preset("Tri Kick", Chip::Nes, AllocMode::Lead, [2, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0x04, 0, 15, 24, 1]),
    preset("NES Bell", Chip::Nes, AllocMode::Lead, [0, 0, 8, 4, 5, 0, 0, 0, 0, 0, 0x01, 0, 13, 0, 0]),
    preset("NES Hat", Chip::Nes, AllocMode::Lead, [0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0x08, 0, 15, 0, 0]),
    preset("NES Snare", Chip::Nes, AllocMode::Lead, [0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0x08, 0, 15, 0, 0]),
    preset("NES Zap", Chip::Nes, AllocMode::Lead, [0, 0, 3, 0, 0, 0, 0, 0, 1, 0, 0x08, 0, 15, 12, 2]),
    preset("GB Lead", Chip::Gb, AllocMode::Lead, [2, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("GB Bright", Chip::Gb, AllocMode::Lead, [1, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("GB Thin", Chip::Gb, AllocMode::Lead, [0, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("GB Poly", Chip::Gb, AllocMode::Auto, [2, 0, 3, 15, 5, 0, 0, 0, 0, 0, 0x07, 0, 13, 0, 0]),
    preset("GB Poly Bright", Chip::Gb, AllocMode::Auto, [1, 0, 2, 12, 3, 0, 0, 0, 0, 0, 0x07, 0, 14, 0, 0]),
    preset("GB Unison", Chip::Gb, AllocMode::Auto, [2, 0, 3, 15, 4, 0, 0, 0, 0, 0, 0x03, 8, 13, 0, 0]),
    preset("GB Vibrato", Chip::Gb, AllocMode::Lead, [2, 0, 3, 15, 5, 0, 4, 6, 0, 0, 0x01, 0, 13, 0, 0]),
    preset("GB Pluck", Chip::Gb, AllocMode::Lead, [0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0x01, 0, 15, 0, 0]),
    preset("GB Pad", Chip::Gb, AllocMode::Lead, [2, 6, 5, 12, 8, 0, 3, 5, 0, 0, 0x01, 0, 12, 0, 0]),
    preset("Wave Bass", Chip::Gb, AllocMode::Lead, [2, 0, 4, 12, 3, 0, 0, 0, 0, 0, 0x04, 0, 15, 0, 0]),
    preset("Wave Pad", Chip::Gb, AllocMode::Lead, [2, 6, 5, 12, 8, 0, 2, 4, 0, 3, 0x04, 0, 15, 0, 0]),
    preset("Wave Sub", Chip::Gb, AllocMode::Lead, [2, 0, 0, 15, 6, 0, 0, 0, 0, 2, 0x04, 0, 15, 0, 0]),
    preset("Wave Growl", Chip::Gb, AllocMode::Lead, [2, 0, 6, 0, 0, 0, 0, 0, 0, 6, 0x04, 0, 15, 0, 0]),
    preset("Wave Metal", Chip::Gb, AllocMode::Lead, [2, 0, 8, 0, 0, 0, 0, 0, 0, 7, 0x04, 0, 15, 0, 0]),
    preset("GB Brass", Chip::Gb, AllocMode::Lead, [2, 4, 2, 15, 6, 0, 0, 0, 0, 0, 0x01, 0, 14, 0, 0]),
    preset("GB Bell", Chip::Gb, AllocMode::Lead, [0, 0, 8, 4, 5, 0, 0, 0, 0, 0, 0x01, 0, 13, 0, 0]),
];

/// Look up a factory preset; out-of-range indices yield `None`.
#[inline]
pub fn factory_preset(index: usize) -> Option<&'static Preset> {
    FACTORY_PRESETS.get(index)
}
