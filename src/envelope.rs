// src/envelope.rs
//
// Per-voice ADSR envelope, advanced one sample at a time.
//
// The envelope lives in the control plane: its level scales chip volume
// registers (NES) or the rendered output (GB). It never touches audio
// samples directly.

// ═══════════════════════════════════════════════════════════════════
// Rate table
// ═══════════════════════════════════════════════════════════════════

/// Highest value accepted for each of the four envelope parameters.
pub const ENV_PARAM_MAX: u8 = 15;

/// Attack step 15 lasts a quarter second; each step adds 1/60 s.
const ATTACK_STEPS_PER_SECOND: f32 = 60.0;

/// Decay and release step 15 last one second; each step adds 1/15 s.
const DECAY_STEPS_PER_SECOND: f32 = 15.0;

/// Per-sample delta for a rate parameter. Zero means "done in one sample".
#[inline]
fn rate_delta(param: u8, steps_per_second: f32, sample_rate: f32) -> f32 {
    if param == 0 {
        1.0
    } else {
        let samples = param.min(ENV_PARAM_MAX) as f32 * (sample_rate / steps_per_second);
        1.0 / samples
    }
}

// ═══════════════════════════════════════════════════════════════════
// ADSR Envelope
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Default)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,

    // Per-sample deltas, derived from the 0-15 parameters
    attack_inc: f32,
    decay_dec: f32,
    sustain: f32, // 0-1 level
    release_dec: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the per-sample deltas from integer 0-15 parameters.
    ///
    /// Level and stage are left alone so a reconfigured envelope can be
    /// retriggered without a click.
    pub fn configure(&mut self, attack: u8, decay: u8, sustain: u8, release: u8, sample_rate: f32) {
        self.attack_inc = rate_delta(attack, ATTACK_STEPS_PER_SECOND, sample_rate);
        self.decay_dec = rate_delta(decay, DECAY_STEPS_PER_SECOND, sample_rate);
        self.sustain = sustain.min(ENV_PARAM_MAX) as f32 / ENV_PARAM_MAX as f32;
        self.release_dec = rate_delta(release, DECAY_STEPS_PER_SECOND, sample_rate);
    }

    /// Start (or restart) the attack from the current level.
    #[inline]
    pub fn gate_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    #[inline]
    pub fn gate_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Drop straight to silence, bypassing release.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by one sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += self.attack_inc;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                self.level -= self.decay_dec;
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    // Zero sustain makes this a plain AD envelope
                    self.stage = if self.sustain > 0.0 {
                        EnvelopeStage::Sustain
                    } else {
                        EnvelopeStage::Idle
                    };
                }
            }

            EnvelopeStage::Sustain => {}

            EnvelopeStage::Release => {
                self.level -= self.release_dec;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        self.level
    }

    /// Advance by a whole block of samples.
    pub fn advance_block(&mut self, frames: usize) -> f32 {
        for _ in 0..frames {
            self.advance();
        }
        self.level
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }
}
