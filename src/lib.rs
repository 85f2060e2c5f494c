// src/lib.rs
//
// Library entry point: voice allocation and register sequencing for the
// NES and Game Boy sound chips.

mod audio_buffer;
mod backend;
mod engine;
mod envelope;
mod error;
mod event;
mod gb;
mod modulation;
mod nes;
mod parameter;
mod preset;
mod voice;
mod voice_allocator;

#[cfg(test)]
mod test;

// Re-export key types for Rust consumers
pub use audio_buffer::AudioBuffer;
pub use backend::{
    ApuBackend, ChannelSettings, ChannelUpdate, MonoRecorder, RecordingBackend, RegisterWrite,
    StereoRecorder,
};
pub use engine::{Engine, EngineConfig, cycles_for_frames};
pub use envelope::{Envelope, EnvelopeStage};
pub use error::{BackendError, EngineError, Result};
pub use event::{CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF, CC_MOD_WHEEL, Event, PITCH_BEND_CENTER};
pub use gb::{GB_CPU_CLOCK, GbSequencer, NUM_WAVETABLES, WAVETABLES};
pub use modulation::{Lfo, PitchModulator, PitchSettings, note_to_freq};
pub use nes::{NES_CPU_CLOCK, NesSequencer};
pub use parameter::{PARAM_COUNT, PARAM_INFO, Param, ParamInfo, ParamUnit, SynthParams};
pub use preset::{Chip, FACTORY_PRESETS, NUM_PRESETS, Preset, factory_preset};
pub use voice::{ChannelIndex, ChannelKind, NUM_CHANNELS, Voice, VoiceId};
pub use voice_allocator::{AllocMode, MAX_VOICES, NoteOnConfig, VoicePool};
