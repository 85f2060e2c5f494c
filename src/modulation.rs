// src/modulation.rs
//
// Control-rate pitch modulation: vibrato LFO, pitch bend and the
// per-voice decaying pitch envelope.
//
// All of it runs once per block and ends up in a single frequency per
// voice, which the register sequencers turn into period registers.

use std::f32::consts::TAU;

use crate::voice::Voice;

/// Pitch-envelope offsets below this many semitones are treated as spent.
pub const PITCH_ENV_EPSILON: f32 = 0.01;

/// Maximum pitch-bend range in semitones (either direction).
pub const PITCH_BEND_RANGE: f32 = 2.0;

/// Pitch-envelope speed step duration: step n lasts n/60 s.
const PITCH_ENV_STEPS_PER_SECOND: f32 = 60.0;

/// Equal temperament, A4 = 440 Hz.
#[inline]
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0f32.powf(cents / 1200.0)
}

/// Convert a 14-bit pitch-bend value (0..=16383, centre 8192) to semitones.
#[inline]
pub fn pitch_bend_semitones(value: u16) -> f32 {
    let bend = value.min(0x3FFF) as i32 - 8192;
    bend as f32 / 8192.0 * PITCH_BEND_RANGE
}

// ═══════════════════════════════════════════════════════════════════
// Vibrato LFO
// ═══════════════════════════════════════════════════════════════════

/// Sine LFO shared by every voice of one engine instance.
///
/// The phase is advanced once per block rather than per sample; vibrato is
/// applied at block rate anyway.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f32, // 0.0 - 1.0
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current output in -1.0..=1.0.
    #[inline]
    pub fn value(&self) -> f32 {
        (self.phase * TAU).sin()
    }

    /// Advance by `frames` samples at `rate_hz`, wrapping into 0..1.
    pub fn advance(&mut self, rate_hz: f32, frames: usize, sample_rate: f32) {
        if rate_hz <= 0.0 || sample_rate <= 0.0 {
            return;
        }
        self.phase += rate_hz * frames as f32 / sample_rate;
        self.phase -= self.phase.floor();
    }
}

// ═══════════════════════════════════════════════════════════════════
// Pitch Modulator
// ═══════════════════════════════════════════════════════════════════

/// Block-wide modulation settings, read from the parameter set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchSettings {
    /// Vibrato depth in semitones (0-12)
    pub vibrato_depth: f32,
    /// Vibrato rate in Hz (0-10)
    pub vibrato_rate: f32,
    /// Pitch-envelope speed (0 = hold, 1 fast .. 15 slow)
    pub pitch_env_speed: f32,
    /// Detune in cents applied to pulse channel 2 (0-50)
    pub detune_cents: f32,
}

/// Combines base pitch, bend, pitch envelope and vibrato into one
/// frequency per voice per block.
#[derive(Debug, Clone, Default)]
pub struct PitchModulator {
    lfo: Lfo,
    bend_semitones: f32,
}

impl PitchModulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set_pitch_bend(&mut self, semitones: f32) {
        self.bend_semitones = semitones.clamp(-PITCH_BEND_RANGE, PITCH_BEND_RANGE);
    }

    #[inline]
    pub fn pitch_bend(&self) -> f32 {
        self.bend_semitones
    }

    /// Vibrato multiplier for the current LFO phase.
    #[inline]
    fn vibrato_ratio(&self, settings: &PitchSettings) -> f32 {
        if settings.vibrato_depth > 0.0 && settings.vibrato_rate > 0.0 {
            semitones_to_ratio(self.lfo.value() * settings.vibrato_depth)
        } else {
            1.0
        }
    }

    /// Frequency for `voice` this block.
    ///
    /// Consumes `frames` samples' worth of the voice's pitch envelope: the
    /// current offset is applied, then decayed toward zero.
    pub fn voice_frequency(
        &self,
        voice: &mut Voice,
        settings: &PitchSettings,
        frames: usize,
        sample_rate: f32,
    ) -> f32 {
        let mut freq = note_to_freq(voice.note) * semitones_to_ratio(self.bend_semitones);

        if voice.pitch_env > PITCH_ENV_EPSILON {
            freq *= semitones_to_ratio(voice.pitch_env);
            if settings.pitch_env_speed > 0.0 {
                let decay_samples =
                    settings.pitch_env_speed * (sample_rate / PITCH_ENV_STEPS_PER_SECOND);
                let per_sample = voice.pitch_env / decay_samples;
                voice.pitch_env = (voice.pitch_env - per_sample * frames as f32).max(0.0);
            }
        }

        freq *= self.vibrato_ratio(settings);

        if settings.detune_cents > 0.0 && voice.channel.index() == 1 {
            freq *= cents_to_ratio(settings.detune_cents);
        }

        freq
    }

    /// Advance the shared LFO past the block just rendered.
    #[inline]
    pub fn end_block(&mut self, settings: &PitchSettings, frames: usize, sample_rate: f32) {
        self.lfo.advance(settings.vibrato_rate, frames, sample_rate);
    }
}
