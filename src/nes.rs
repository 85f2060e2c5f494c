// src/nes.rs
//
// NES 2A03 register sequencing.
//
// Period and volume registers are rewritten every block. The registers
// that reload the length counter and high period bits ($4003, $4007,
// $400B, $400F) restart the channel's phase sequencer, so they are only
// written on a trigger.

use crate::backend::{ApuBackend, ChannelSettings, ChannelUpdate};
use crate::voice::{ChannelIndex, ChannelKind};

/// NTSC CPU clock in Hz.
pub const NES_CPU_CLOCK: u32 = 1_789_773;

const MAX_PERIOD: i32 = 0x7FF;

/// Pad notes 68..=99 spread over the 16 noise periods, two notes per period.
const NOISE_LOWEST_NOTE: i32 = 68;

// Register map
const REG_PULSE1: u16 = 0x4000;
const REG_PULSE2: u16 = 0x4004;
const REG_TRI_LINEAR: u16 = 0x4008;
const REG_TRI_LO: u16 = 0x400A;
const REG_TRI_HI: u16 = 0x400B;
const REG_NOISE_VOL: u16 = 0x400C;
const REG_NOISE_PERIOD: u16 = 0x400E;
const REG_NOISE_LENGTH: u16 = 0x400F;
const REG_STATUS: u16 = 0x4015;

/// Length-counter halt + constant volume.
const HALT_CONST_VOL: u8 = 0x30;
/// Maximum length-counter load, OR'ed with the period high bits.
const LENGTH_LOAD: u8 = 0xF8;
/// Enable pulse 1, pulse 2, triangle, noise.
const STATUS_ENABLE: u8 = 0x0F;

/// Write slots reserved per channel within a block.
const PULSE_SLOTS: u32 = 4;
const TRIANGLE_SLOTS: u32 = 3;
const NOISE_SLOTS: u32 = 3;
const SILENCE_SLOTS: u32 = 2;

#[inline]
fn period_from_freq(freq: f32, divider: f32) -> u16 {
    let freq = freq.max(1.0);
    let period = (NES_CPU_CLOCK as f32 / (divider * freq) - 1.0 + 0.5) as i32;
    period.clamp(0, MAX_PERIOD) as u16
}

/// Pulse timer period: clock / (16 f) - 1.
#[inline]
pub fn pulse_period(freq: f32) -> u16 {
    period_from_freq(freq, 16.0)
}

/// Triangle timer period: clock / (32 f) - 1.
#[inline]
pub fn triangle_period(freq: f32) -> u16 {
    period_from_freq(freq, 32.0)
}

/// Noise period index for a note: 0 is the highest pitch, 15 the lowest.
#[inline]
pub fn noise_period_index(note: u8) -> u8 {
    let idx = 15 - (note as i32 - NOISE_LOWEST_NOTE) / 2;
    idx.clamp(0, 15) as u8
}

/// Writes one block's worth of NES register traffic.
///
/// Each write is stamped with a cycle offset. Channels get consecutive,
/// non-overlapping ranges of offsets so writes from different channels never
/// share a cycle.
pub struct NesSequencer<'a, B: ApuBackend> {
    apu: &'a mut B,
    time: u32,
}

impl<'a, B: ApuBackend> NesSequencer<'a, B> {
    pub fn new(apu: &'a mut B) -> Self {
        Self { apu, time: 0 }
    }

    /// Enable all four channels once after power-on or reset.
    pub fn power_on(apu: &mut B) {
        apu.write_register(0, REG_STATUS, STATUS_ENABLE);
    }

    /// Cycle offset the next write will use.
    #[inline]
    pub fn time(&self) -> u32 {
        self.time
    }

    #[inline]
    fn write(&mut self, offset: u32, addr: u16, value: u8) {
        self.apu.write_register(self.time + offset, addr, value);
    }

    /// Re-enable the channels at the top of the block.
    pub fn begin_block(&mut self) {
        self.write(0, REG_STATUS, STATUS_ENABLE);
        self.time += 1;
    }

    pub fn write_channel(&mut self, update: &ChannelUpdate, settings: &ChannelSettings) {
        match update.kind {
            ChannelKind::Pulse1 | ChannelKind::Pulse2 => self.pulse(
                update.channel,
                settings.duty,
                update.volume,
                update.frequency,
                update.trigger,
            ),
            // The wave kind never occurs on this chip; treat it as the triangle slot
            ChannelKind::Triangle | ChannelKind::Wave => {
                self.triangle(update.volume > 0, update.frequency, update.trigger)
            }
            ChannelKind::Noise => self.noise(
                update.volume,
                update.note,
                settings.noise_short,
                update.trigger,
            ),
        }
    }

    pub fn pulse(&mut self, channel: ChannelIndex, duty: u8, volume: u8, freq: f32, trigger: bool) {
        let base = if channel == ChannelIndex::PULSE2 { REG_PULSE2 } else { REG_PULSE1 };
        let period = pulse_period(freq);

        self.write(0, base, ((duty & 0x03) << 6) | HALT_CONST_VOL | (volume & 0x0F));
        self.write(1, base + 2, (period & 0xFF) as u8);
        if trigger {
            // Sweep off, then length load + period high
            self.write(2, base + 1, 0x00);
            self.write(3, base + 3, LENGTH_LOAD | ((period >> 8) & 0x07) as u8);
        }
        self.time += PULSE_SLOTS;
    }

    /// The triangle has no volume; `gate` is all it gets.
    pub fn triangle(&mut self, gate: bool, freq: f32, trigger: bool) {
        let period = triangle_period(freq);

        // Control flag + linear counter reload (0x7F when gated)
        self.write(0, REG_TRI_LINEAR, if gate { 0xFF } else { 0x80 });
        self.write(1, REG_TRI_LO, (period & 0xFF) as u8);
        if trigger {
            self.write(2, REG_TRI_HI, LENGTH_LOAD | ((period >> 8) & 0x07) as u8);
        }
        self.time += TRIANGLE_SLOTS;
    }

    pub fn noise(&mut self, volume: u8, note: u8, short_mode: bool, trigger: bool) {
        let mode = if short_mode { 0x80 } else { 0x00 };

        self.write(0, REG_NOISE_VOL, HALT_CONST_VOL | (volume & 0x0F));
        self.write(1, REG_NOISE_PERIOD, mode | noise_period_index(note));
        if trigger {
            self.write(2, REG_NOISE_LENGTH, LENGTH_LOAD);
        }
        self.time += NOISE_SLOTS;
    }

    /// Zero volume (pulse, noise) or halted linear counter (triangle).
    pub fn silence(&mut self, channel: ChannelIndex) {
        let (addr, value) = match channel {
            ChannelIndex::PULSE1 => (REG_PULSE1, HALT_CONST_VOL),
            ChannelIndex::PULSE2 => (REG_PULSE2, HALT_CONST_VOL),
            ChannelIndex::TRIANGLE => (REG_TRI_LINEAR, 0x80),
            _ => (REG_NOISE_VOL, HALT_CONST_VOL),
        };
        self.write(0, addr, value);
        self.time += SILENCE_SLOTS;
    }
}
