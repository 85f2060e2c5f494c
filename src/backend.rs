// src/backend.rs
//
// Interface to the chip-emulation cores.
//
// The engine never synthesizes audio itself. It sequences register writes
// into a backend, tells it how many chip cycles the block spans, and drains
// the PCM it produced.

use crate::error::BackendError;
use crate::voice::{ChannelIndex, ChannelKind};

/// Common interface for APU emulation backends.
///
/// Register writes carry a cycle offset within the current frame. Offsets
/// must not decrease within a frame; `end_frame` closes the frame and makes
/// its samples available.
pub trait ApuBackend: Send {
    /// Create a backend clocked at `clock_rate` Hz resampling to `sample_rate` Hz.
    fn open(clock_rate: u32, sample_rate: u32) -> Result<Self, BackendError>
    where
        Self: Sized;

    /// Return the chip to its power-on state and drop buffered samples.
    fn reset(&mut self);

    /// Write `value` to register `addr` at cycle `time` of the current frame.
    fn write_register(&mut self, time: u32, addr: u16, value: u8);

    /// Run the chip for `cycles` cycles and end the frame.
    fn end_frame(&mut self, cycles: u32);

    /// Number of samples (not frames) ready to be read.
    fn samples_avail(&self) -> usize;

    /// Drain up to `out.len()` samples; returns how many were written.
    fn read_samples(&mut self, out: &mut [i16]) -> usize;

    /// 1 for mono output, 2 for interleaved stereo.
    fn output_channels(&self) -> usize {
        1
    }
}

/// One register write as seen by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub time: u32,
    pub addr: u16,
    pub value: u8,
}

// ═══════════════════════════════════════════════════════════════════
// Sequencer input
// ═══════════════════════════════════════════════════════════════════

/// Settings shared by every channel during one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Pulse duty 0-3
    pub duty: u8,
    /// GB square-1 sweep 0-7 (0 = off)
    pub sweep: u8,
    /// Short (7-bit) noise LFSR
    pub noise_short: bool,
}

/// What one voice wants its channel to do this block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelUpdate {
    pub channel: ChannelIndex,
    pub kind: ChannelKind,
    pub frequency: f32,
    /// 0-15
    pub volume: u8,
    /// Noise channels pick their period from the note, not the frequency
    pub note: u8,
    /// First block since the voice was allocated
    pub trigger: bool,
}

// ═══════════════════════════════════════════════════════════════════
// Recording backend
// ═══════════════════════════════════════════════════════════════════

/// A backend that records register traffic instead of emulating a chip.
///
/// Each frame yields the number of samples a real core would produce for
/// the cycles elapsed, all at a fixed level, so output scaling can be
/// observed. Used by the trace binary and the tests.
#[derive(Debug, Clone)]
pub struct RecordingBackend<const CHANNELS: usize> {
    clock_rate: u32,
    sample_rate: u32,
    level: i16,
    pending: usize,
    writes: Vec<RegisterWrite>,
    frame_marks: Vec<usize>,
    resets: usize,
}

pub type MonoRecorder = RecordingBackend<1>;
pub type StereoRecorder = RecordingBackend<2>;

impl<const CHANNELS: usize> RecordingBackend<CHANNELS> {
    /// Sample value produced for every output sample.
    pub fn set_level(&mut self, level: i16) {
        self.level = level;
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Writes issued between the end of frame `index - 1` and the end of
    /// frame `index`.
    pub fn frame_writes(&self, index: usize) -> &[RegisterWrite] {
        let end = self.frame_marks.get(index).copied().unwrap_or(self.writes.len());
        let start = match index {
            0 => 0,
            i => self.frame_marks.get(i - 1).copied().unwrap_or(end),
        };
        &self.writes[start.min(end)..end]
    }

    /// Writes issued since the last completed frame.
    pub fn pending_writes(&self) -> &[RegisterWrite] {
        let start = self.frame_marks.last().copied().unwrap_or(0);
        &self.writes[start..]
    }

    pub fn frames_completed(&self) -> usize {
        self.frame_marks.len()
    }

    pub fn reset_count(&self) -> usize {
        self.resets
    }
}

impl<const CHANNELS: usize> ApuBackend for RecordingBackend<CHANNELS> {
    fn open(clock_rate: u32, sample_rate: u32) -> Result<Self, BackendError> {
        if sample_rate == 0 || clock_rate < sample_rate {
            return Err(BackendError::UnsupportedSampleRate(sample_rate));
        }
        Ok(Self {
            clock_rate,
            sample_rate,
            level: 1000,
            pending: 0,
            writes: Vec::new(),
            frame_marks: Vec::new(),
            resets: 0,
        })
    }

    fn reset(&mut self) {
        self.pending = 0;
        self.resets += 1;
    }

    fn write_register(&mut self, time: u32, addr: u16, value: u8) {
        self.writes.push(RegisterWrite { time, addr, value });
    }

    fn end_frame(&mut self, cycles: u32) {
        let clock = self.clock_rate as u64;
        let frames = (cycles as u64 * self.sample_rate as u64 + clock / 2) / clock;
        self.pending += frames as usize * CHANNELS;
        self.frame_marks.push(self.writes.len());
    }

    fn samples_avail(&self) -> usize {
        self.pending
    }

    fn read_samples(&mut self, out: &mut [i16]) -> usize {
        let count = out.len().min(self.pending);
        out[..count].fill(self.level);
        self.pending -= count;
        count
    }

    fn output_channels(&self) -> usize {
        CHANNELS
    }
}
