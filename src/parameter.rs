// src/parameter.rs
//
// The enumerated synth parameters: ids, metadata, and the clamped value set
// the engine reads from every block.

use std::fmt;

use crate::voice_allocator::AllocMode;

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Hertz (vibrato rate)
    Hz,
    /// Semitones (vibrato and pitch-envelope depth)
    Semitones,
    /// Cents (detune)
    Cents,
    /// Octaves (transpose)
    Octaves,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Hz => write!(f, "Hz"),
            ParamUnit::Semitones => write!(f, "st"),
            ParamUnit::Cents => write!(f, "ct"),
            ParamUnit::Octaves => write!(f, "oct"),
        }
    }
}

/// Metadata describing a parameter.
///
/// Hosts use this to build controls and to validate ranges; the engine uses
/// it to clamp whatever it is given.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub id: Param,

    /// Key used by hosts to address the parameter
    pub key: &'static str,

    /// Human-readable name
    pub name: &'static str,

    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: ParamUnit,

    /// Step size for discrete parameters (0 = continuous)
    pub step: f32,
}

impl ParamInfo {
    pub const fn new(id: Param, key: &'static str, name: &'static str) -> Self {
        Self {
            id,
            key,
            name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            step: 1.0,
        }
    }

    pub const fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub const fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Clamp a value to the valid range, snapping to the step grid.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        let precision = if self.step > 0.0 { 0 } else { 2 };
        if self.unit == ParamUnit::None {
            format!("{:.prec$}", value, prec = precision)
        } else {
            format!("{:.prec$} {}", value, self.unit, prec = precision)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Parameter IDs
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Duty,
    Attack,
    Decay,
    Sustain,
    Release,
    Sweep,
    VibratoDepth,
    VibratoRate,
    NoiseMode,
    Wavetable,
    ChannelMask,
    Detune,
    Volume,
    OctaveTranspose,
    AllocMode,
    PitchEnvDepth,
    PitchEnvSpeed,
}

pub const PARAM_COUNT: usize = 17;

/// Metadata for every parameter, in host order.
pub static PARAM_INFO: [ParamInfo; PARAM_COUNT] = [
    ParamInfo::new(Param::Duty, "duty", "Duty Cycle")
        .range(0.0, 3.0)
        .default(2.0),
    ParamInfo::new(Param::Attack, "env_attack", "Attack")
        .range(0.0, 15.0),
    ParamInfo::new(Param::Decay, "env_decay", "Decay")
        .range(0.0, 15.0)
        .default(3.0),
    ParamInfo::new(Param::Sustain, "env_sustain", "Sustain")
        .range(0.0, 15.0)
        .default(15.0),
    ParamInfo::new(Param::Release, "env_release", "Release")
        .range(0.0, 15.0)
        .default(4.0),
    ParamInfo::new(Param::Sweep, "sweep", "Sweep")
        .range(0.0, 7.0),
    ParamInfo::new(Param::VibratoDepth, "vibrato_depth", "Vibrato Depth")
        .range(0.0, 12.0)
        .unit(ParamUnit::Semitones),
    ParamInfo::new(Param::VibratoRate, "vibrato_rate", "Vibrato Rate")
        .range(0.0, 10.0)
        .unit(ParamUnit::Hz),
    ParamInfo::new(Param::NoiseMode, "noise_mode", "Noise Mode")
        .range(0.0, 1.0),
    ParamInfo::new(Param::Wavetable, "wavetable", "Wavetable (GB)")
        .range(0.0, 7.0),
    ParamInfo::new(Param::ChannelMask, "channel_mask", "Channel Mask")
        .range(0.0, 15.0)
        .default(1.0),
    ParamInfo::new(Param::Detune, "detune", "Detune")
        .range(0.0, 50.0)
        .unit(ParamUnit::Cents),
    ParamInfo::new(Param::Volume, "volume", "Volume")
        .range(0.0, 15.0)
        .default(15.0),
    ParamInfo::new(Param::OctaveTranspose, "octave_transpose", "Octave")
        .range(-3.0, 3.0)
        .unit(ParamUnit::Octaves),
    ParamInfo::new(Param::AllocMode, "alloc_mode", "Voice Mode")
        .range(0.0, 2.0)
        .default(1.0),
    ParamInfo::new(Param::PitchEnvDepth, "pitch_env_depth", "PEnv Depth")
        .range(0.0, 24.0)
        .unit(ParamUnit::Semitones),
    ParamInfo::new(Param::PitchEnvSpeed, "pitch_env_speed", "PEnv Speed")
        .range(0.0, 15.0),
];

impl Param {
    pub const ALL: [Param; PARAM_COUNT] = [
        Param::Duty,
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::Sweep,
        Param::VibratoDepth,
        Param::VibratoRate,
        Param::NoiseMode,
        Param::Wavetable,
        Param::ChannelMask,
        Param::Detune,
        Param::Volume,
        Param::OctaveTranspose,
        Param::AllocMode,
        Param::PitchEnvDepth,
        Param::PitchEnvSpeed,
    ];

    #[inline]
    pub fn info(self) -> &'static ParamInfo {
        &PARAM_INFO[self as usize]
    }

    #[inline]
    pub fn key(self) -> &'static str {
        self.info().key
    }

    pub fn from_key(key: &str) -> Option<Param> {
        PARAM_INFO.iter().find(|info| info.key == key).map(|info| info.id)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Parameter set
// ═══════════════════════════════════════════════════════════════════

/// Current value of every parameter, already clamped to its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthParams {
    pub duty: u8,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub sweep: u8,
    pub vibrato_depth: u8,
    pub vibrato_rate: u8,
    /// 0 = long (15-bit) LFSR, 1 = short (7-bit) LFSR
    pub noise_mode: u8,
    pub wavetable: u8,
    /// bit0 pulse1, bit1 pulse2, bit2 triangle/wave, bit3 noise
    pub channel_mask: u8,
    pub detune: u8,
    pub volume: u8,
    pub octave_transpose: i8,
    pub alloc_mode: AllocMode,
    pub pitch_env_depth: u8,
    pub pitch_env_speed: u8,
}

impl Default for SynthParams {
    fn default() -> Self {
        let mut params = Self {
            duty: 0,
            attack: 0,
            decay: 0,
            sustain: 0,
            release: 0,
            sweep: 0,
            vibrato_depth: 0,
            vibrato_rate: 0,
            noise_mode: 0,
            wavetable: 0,
            channel_mask: 0,
            detune: 0,
            volume: 0,
            octave_transpose: 0,
            alloc_mode: AllocMode::Auto,
            pitch_env_depth: 0,
            pitch_env_speed: 0,
        };
        for info in PARAM_INFO.iter() {
            params.set(info.id, info.default);
        }
        params
    }
}

impl SynthParams {
    /// Read a parameter as a plain number.
    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Duty => self.duty as f32,
            Param::Attack => self.attack as f32,
            Param::Decay => self.decay as f32,
            Param::Sustain => self.sustain as f32,
            Param::Release => self.release as f32,
            Param::Sweep => self.sweep as f32,
            Param::VibratoDepth => self.vibrato_depth as f32,
            Param::VibratoRate => self.vibrato_rate as f32,
            Param::NoiseMode => self.noise_mode as f32,
            Param::Wavetable => self.wavetable as f32,
            Param::ChannelMask => self.channel_mask as f32,
            Param::Detune => self.detune as f32,
            Param::Volume => self.volume as f32,
            Param::OctaveTranspose => self.octave_transpose as f32,
            Param::AllocMode => self.alloc_mode as u8 as f32,
            Param::PitchEnvDepth => self.pitch_env_depth as f32,
            Param::PitchEnvSpeed => self.pitch_env_speed as f32,
        }
    }

    /// Set a parameter, clamping to its declared range.
    ///
    /// Returns the value actually stored.
    pub fn set(&mut self, param: Param, value: f32) -> f32 {
        let value = param.info().clamp(value);
        let as_u8 = value as u8;
        match param {
            Param::Duty => self.duty = as_u8,
            Param::Attack => self.attack = as_u8,
            Param::Decay => self.decay = as_u8,
            Param::Sustain => self.sustain = as_u8,
            Param::Release => self.release = as_u8,
            Param::Sweep => self.sweep = as_u8,
            Param::VibratoDepth => self.vibrato_depth = as_u8,
            Param::VibratoRate => self.vibrato_rate = as_u8,
            Param::NoiseMode => self.noise_mode = as_u8,
            Param::Wavetable => self.wavetable = as_u8,
            Param::ChannelMask => self.channel_mask = as_u8,
            Param::Detune => self.detune = as_u8,
            Param::Volume => self.volume = as_u8,
            Param::OctaveTranspose => self.octave_transpose = value as i8,
            Param::AllocMode => self.alloc_mode = AllocMode::from_index(as_u8),
            Param::PitchEnvDepth => self.pitch_env_depth = as_u8,
            Param::PitchEnvSpeed => self.pitch_env_speed = as_u8,
        }
        value
    }

    #[inline]
    pub fn noise_short(&self) -> bool {
        self.noise_mode != 0
    }
}
