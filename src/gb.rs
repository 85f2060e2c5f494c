// src/gb.rs
//
// Game Boy DMG register sequencing and wave-RAM tables.
//
// The GB channels are triggered once at the note's velocity-scaled volume and
// then left alone: rewriting NRx2 on a running channel retriggers its volume
// envelope, so later blocks only touch the frequency registers and the
// software envelope is applied to the mixed output instead.

use crate::backend::{ApuBackend, ChannelSettings, ChannelUpdate};
use crate::voice::{ChannelIndex, ChannelKind};

/// DMG master clock in Hz.
pub const GB_CPU_CLOCK: u32 = 4_194_304;

pub const NUM_WAVETABLES: usize = 8;
pub const WAVETABLE_LEN: usize = 16;

const MAX_FREQ_REG: i32 = 2047;

/// Pad notes from 68 up walk through the noise table two notes per entry.
const NOISE_LOWEST_NOTE: i32 = 68;

// Square 1
const NR10: u16 = 0xFF10;
const NR11: u16 = 0xFF11;
const NR12: u16 = 0xFF12;
const NR13: u16 = 0xFF13;
const NR14: u16 = 0xFF14;
// Square 2
const NR21: u16 = 0xFF16;
const NR22: u16 = 0xFF17;
const NR23: u16 = 0xFF18;
const NR24: u16 = 0xFF19;
// Wave
const NR30: u16 = 0xFF1A;
const NR32: u16 = 0xFF1C;
const NR33: u16 = 0xFF1D;
const NR34: u16 = 0xFF1E;
// Noise
const NR41: u16 = 0xFF20;
const NR42: u16 = 0xFF21;
const NR43: u16 = 0xFF22;
const NR44: u16 = 0xFF23;
// Control
const NR50: u16 = 0xFF24;
const NR51: u16 = 0xFF25;
const NR52: u16 = 0xFF26;
const WAVE_RAM: u16 = 0xFF30;

const TRIGGER: u8 = 0x80;
const DAC_ON: u8 = 0x80;

const SILENCE_SLOTS: u32 = 4;

/// Wave RAM contents, two 4-bit samples per byte, high nibble first.
pub static WAVETABLES: [[u8; WAVETABLE_LEN]; NUM_WAVETABLES] = [
    // Saw
    [
        0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11,
        0x00,
    ],
    // Square
    [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ],
    // Triangle
    [
        0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32,
        0x10,
    ],
    // Sine-ish
    [
        0x89, 0xBC, 0xDE, 0xEF, 0xFF, 0xFE, 0xED, 0xCB, 0xA8, 0x76, 0x43, 0x21, 0x10, 0x01, 0x12,
        0x34,
    ],
    // Pulse 12.5%
    [
        0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF,
        0x00,
    ],
    // Bass
    [
        0xFD, 0xEC, 0xDB, 0xCA, 0xB9, 0xA8, 0x97, 0x86, 0x75, 0x64, 0x53, 0x42, 0x31, 0x20, 0x10,
        0x00,
    ],
    // Growl
    [
        0xFF, 0xDD, 0xBB, 0x99, 0xFF, 0xDD, 0xBB, 0x99, 0x77, 0x55, 0x33, 0x11, 0x77, 0x55, 0x33,
        0x11,
    ],
    // Metallic
    [
        0xF0, 0xF0, 0x00, 0x00, 0xF0, 0xF0, 0x00, 0x00, 0xF0, 0x00, 0xF0, 0x00, 0x0F, 0x0F, 0x0F,
        0x0F,
    ],
];

/// (clock shift, divisor code) pairs from lowest to highest pitch.
const NOISE_TABLE: [(u8, u8); 16] = [
    (13, 1),
    (12, 1),
    (11, 1),
    (10, 1),
    (9, 1),
    (8, 1),
    (7, 1),
    (6, 1),
    (5, 1),
    (4, 1),
    (3, 1),
    (3, 0),
    (2, 1),
    (2, 0),
    (1, 1),
    (0, 1),
];

#[inline]
fn freq_reg(freq: f32, numerator: f32) -> u16 {
    let freq = freq.max(1.0);
    let reg = (2048.0 - numerator / freq + 0.5) as i32;
    reg.clamp(0, MAX_FREQ_REG) as u16
}

/// Square frequency register: 2048 - 131072 / f.
#[inline]
pub fn square_freq_reg(freq: f32) -> u16 {
    freq_reg(freq, 131_072.0)
}

/// Wave frequency register: 2048 - 65536 / f.
#[inline]
pub fn wave_freq_reg(freq: f32) -> u16 {
    freq_reg(freq, 65_536.0)
}

/// NR43 value for a note: shift in the high nibble, width bit 3, divisor bits 0-2.
#[inline]
pub fn noise_poly(note: u8, short_mode: bool) -> u8 {
    let idx = ((note as i32 - NOISE_LOWEST_NOTE) / 2).clamp(0, 15) as usize;
    let (shift, divisor) = NOISE_TABLE[idx];
    let width = if short_mode { 0x08 } else { 0x00 };
    (shift << 4) | width | (divisor & 0x07)
}

/// NR32 output level code: 1 = 100%, 2 = 50%, 3 = 25%, 0 = mute.
#[inline]
pub fn wave_level_code(volume: u8) -> u8 {
    match volume {
        12.. => 1,
        8..=11 => 2,
        4..=7 => 3,
        _ => 0,
    }
}

/// Writes one block's worth of GB register traffic.
pub struct GbSequencer<'a, B: ApuBackend> {
    apu: &'a mut B,
    time: u32,
}

impl<'a, B: ApuBackend> GbSequencer<'a, B> {
    pub fn new(apu: &'a mut B) -> Self {
        Self { apu, time: 0 }
    }

    /// APU on, master volume, every channel to both sides.
    pub fn power_on(apu: &mut B) {
        apu.write_register(0, NR52, 0x80);
        apu.write_register(0, NR50, 0x77);
        apu.write_register(0, NR51, 0xFF);
    }

    /// Copy a wavetable into wave RAM with the wave DAC off. Indices past the
    /// last table load table 0.
    pub fn load_wavetable(apu: &mut B, index: usize, time: u32) {
        let table = WAVETABLES.get(index).unwrap_or(&WAVETABLES[0]);
        apu.write_register(time, NR30, 0x00);
        for (i, &byte) in table.iter().enumerate() {
            apu.write_register(time, WAVE_RAM + i as u16, byte);
        }
        apu.write_register(time, NR30, DAC_ON);
    }

    #[inline]
    pub fn time(&self) -> u32 {
        self.time
    }

    #[inline]
    fn write(&mut self, offset: u32, addr: u16, value: u8) {
        self.apu.write_register(self.time + offset, addr, value);
    }

    pub fn write_channel(&mut self, update: &ChannelUpdate, settings: &ChannelSettings) {
        let ChannelUpdate {
            frequency,
            volume,
            trigger,
            ..
        } = *update;
        match update.kind {
            ChannelKind::Pulse1 => {
                self.square1(settings.duty, volume, frequency, settings.sweep, trigger)
            }
            ChannelKind::Pulse2 => self.square2(settings.duty, volume, frequency, trigger),
            ChannelKind::Wave | ChannelKind::Triangle => self.wave(volume, frequency, trigger),
            ChannelKind::Noise => self.noise(volume, update.note, settings.noise_short, trigger),
        }
    }

    pub fn square1(&mut self, duty: u8, volume: u8, freq: f32, sweep: u8, trigger: bool) {
        let reg = square_freq_reg(freq);
        if trigger {
            let sweep_reg = if sweep > 0 { ((sweep & 0x07) << 4) | 0x02 } else { 0x00 };
            self.write(0, NR12, (volume & 0x0F) << 4);
            self.write(1, NR13, (reg & 0xFF) as u8);
            self.write(2, NR10, sweep_reg);
            self.write(3, NR11, ((duty & 0x03) << 6) | 0x3F);
            self.write(4, NR14, TRIGGER | ((reg >> 8) & 0x07) as u8);
            self.time += 5;
        } else {
            self.write(0, NR13, (reg & 0xFF) as u8);
            self.write(1, NR14, ((reg >> 8) & 0x07) as u8);
            self.time += 2;
        }
    }

    pub fn square2(&mut self, duty: u8, volume: u8, freq: f32, trigger: bool) {
        let reg = square_freq_reg(freq);
        if trigger {
            self.write(0, NR22, (volume & 0x0F) << 4);
            self.write(1, NR23, (reg & 0xFF) as u8);
            self.write(2, NR21, ((duty & 0x03) << 6) | 0x3F);
            self.write(3, NR24, TRIGGER | ((reg >> 8) & 0x07) as u8);
            self.time += 4;
        } else {
            self.write(0, NR23, (reg & 0xFF) as u8);
            self.write(1, NR24, ((reg >> 8) & 0x07) as u8);
            self.time += 2;
        }
    }

    /// The wave level is coarse enough to rewrite every block without a retrigger.
    pub fn wave(&mut self, volume: u8, freq: f32, trigger: bool) {
        let reg = wave_freq_reg(freq);
        self.write(0, NR32, wave_level_code(volume) << 5);
        self.write(1, NR33, (reg & 0xFF) as u8);
        if trigger {
            self.write(2, NR30, DAC_ON);
            self.write(3, NR34, TRIGGER | ((reg >> 8) & 0x07) as u8);
        } else {
            self.write(2, NR34, ((reg >> 8) & 0x07) as u8);
        }
        self.time += 4;
    }

    pub fn noise(&mut self, volume: u8, note: u8, short_mode: bool, trigger: bool) {
        let poly = noise_poly(note, short_mode);
        if trigger {
            self.write(0, NR42, (volume & 0x0F) << 4);
            self.write(1, NR43, poly);
            self.write(2, NR41, 0x3F);
            self.write(3, NR44, TRIGGER);
            self.time += 4;
        } else {
            self.write(0, NR43, poly);
            self.time += 1;
        }
    }

    /// Zero the channel's volume. Squares and noise are retriggered so the
    /// zero takes effect immediately.
    pub fn silence(&mut self, channel: ChannelIndex) {
        match channel {
            ChannelIndex::PULSE1 => {
                self.write(0, NR12, 0x00);
                self.write(1, NR14, TRIGGER);
            }
            ChannelIndex::PULSE2 => {
                self.write(0, NR22, 0x00);
                self.write(1, NR24, TRIGGER);
            }
            ChannelIndex::TRIANGLE => self.write(0, NR32, 0x00),
            _ => {
                self.write(0, NR42, 0x00);
                self.write(1, NR44, TRIGGER);
            }
        }
        self.time += SILENCE_SLOTS;
    }
}
