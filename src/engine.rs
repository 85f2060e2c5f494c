// src/engine.rs

use crate::audio_buffer::AudioBuffer;
use crate::backend::{ApuBackend, ChannelSettings, ChannelUpdate};
use crate::error::{EngineError, Result};
use crate::event::{CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF, CC_MOD_WHEEL, Event};
use crate::gb::{GB_CPU_CLOCK, GbSequencer};
use crate::modulation::{PitchModulator, PitchSettings, pitch_bend_semitones};
use crate::nes::{NES_CPU_CLOCK, NesSequencer};
use crate::parameter::{PARAM_INFO, Param, ParamInfo, SynthParams};
use crate::preset::{Chip, FACTORY_PRESETS, NUM_PRESETS, factory_preset};
use crate::voice::Voice;
use crate::voice_allocator::{AllocMode, NoteOnConfig, VoicePool};

/// Both chips peak around 5000; this brings them near full scale.
const OUTPUT_GAIN: f32 = 6.0;

/// Scratch space per frame: interleaved stereo.
const MAX_BACKEND_CHANNELS: usize = 2;

/// Construction-time settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Frames per rendered block; longer renders are split
    pub block_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            block_frames: 128,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(EngineError::Config("sample rate must be nonzero".into()));
        }
        if self.block_frames == 0 {
            return Err(EngineError::Config("block size must be nonzero".into()));
        }
        Ok(())
    }
}

/// Chip cycles spanned by `frames` output frames, rounded to nearest.
#[inline]
pub fn cycles_for_frames(frames: usize, clock_rate: u32, sample_rate: u32) -> u32 {
    let sr = sample_rate as u64;
    ((frames as u64 * clock_rate as u64 + sr / 2) / sr) as u32
}

/// NES volume follows the envelope every block.
#[inline]
fn nes_volume(level: f32, volume: u8, velocity: u8) -> u8 {
    let vol = ((level * volume as f32 + 0.5) as i32).clamp(0, 15);
    (vol * velocity as i32 / 127).min(15) as u8
}

/// GB volume is fixed at trigger. Never 0: that turns the channel DAC off.
#[inline]
fn gb_volume(volume: u8, velocity: u8) -> u8 {
    ((volume as f32 * velocity as f32 / 127.0 + 0.5) as i32).clamp(1, 15) as u8
}

/// One voice after its envelope has run through the block.
struct VoiceStep {
    /// Envelope level at the start of the block
    level: f32,
    frequency: f32,
    trigger: bool,
}

/// Advance a voice's envelope across the block.
///
/// Returns `None` if the envelope ran out. The voice stays bound until
/// `VoicePool::retire_finished` runs at the end of the block.
fn step_voice(
    voice: &mut Voice,
    pitch: &PitchModulator,
    settings: &PitchSettings,
    frames: usize,
    sample_rate: f32,
) -> Option<VoiceStep> {
    let level = voice.envelope.level();
    voice.envelope.advance_block(frames);
    if voice.envelope.is_idle() {
        return None;
    }

    let frequency = pitch.voice_frequency(voice, settings, frames, sample_rate);
    let trigger = !voice.triggered;
    voice.triggered = true;

    Some(VoiceStep {
        level,
        frequency,
        trigger,
    })
}

/// Polyphonic chiptune engine driving an NES and a GB backend.
///
/// Only the selected chip is sequenced and rendered. The engine is
/// single-threaded: events and parameter changes must be serialized with
/// `render` by the caller. Nothing on the render path allocates.
pub struct Engine<N: ApuBackend, G: ApuBackend> {
    config: EngineConfig,

    nes: N,
    gb: G,
    chip: Chip,

    params: SynthParams,
    current_preset: usize,

    /// Voice slots and channel assignment
    voices: VoicePool,

    /// Pitch bend + shared vibrato LFO
    pitch: PitchModulator,

    /// Backend read buffer, one block of interleaved samples
    scratch: Vec<i16>,
}

impl<N: ApuBackend, G: ApuBackend> Engine<N, G> {
    /// Open both backends and load the first factory preset.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut nes = N::open(NES_CPU_CLOCK, config.sample_rate).map_err(|source| {
            log::error!("NES backend failed to open: {source}");
            EngineError::Backend {
                chip: Chip::Nes,
                source,
            }
        })?;
        let mut gb = G::open(GB_CPU_CLOCK, config.sample_rate).map_err(|source| {
            log::error!("GB backend failed to open: {source}");
            EngineError::Backend {
                chip: Chip::Gb,
                source,
            }
        })?;
        NesSequencer::power_on(&mut nes);
        GbSequencer::power_on(&mut gb);

        let mut engine = Self {
            config,
            nes,
            gb,
            chip: Chip::Nes,
            params: SynthParams::default(),
            current_preset: 0,
            voices: VoicePool::new(),
            pitch: PitchModulator::new(),
            scratch: vec![0; config.block_frames * MAX_BACKEND_CHANNELS],
        };
        engine.load_preset(0);

        log::info!(
            "engine created: {} Hz, {}-frame blocks, preset \"{}\"",
            config.sample_rate,
            config.block_frames,
            engine.preset_name()
        );
        Ok(engine)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════

    /// Apply a performance event. Takes effect at the next block.
    pub fn on_event(&mut self, event: Event) {
        match event {
            Event::NoteOn { note, velocity: 0 } => self.note_off(note),
            Event::NoteOn { note, velocity } => self.note_on(note, velocity),
            Event::NoteOff { note } => self.note_off(note),
            Event::ControlChange { controller, value } => self.control_change(controller, value),
            Event::PitchBend { value } => self.pitch.set_pitch_bend(pitch_bend_semitones(value)),
        }
    }

    /// Decode and apply a raw MIDI message. Returns false if it was ignored.
    pub fn on_midi(&mut self, bytes: &[u8]) -> bool {
        match Event::from_midi(bytes) {
            Some(event) => {
                self.on_event(event);
                true
            }
            None => false,
        }
    }

    #[inline]
    fn transpose(&self, note: u8) -> u8 {
        (note as i32 + self.params.octave_transpose as i32 * 12).clamp(0, 127) as u8
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let note = self.transpose(note);
        let config = self.note_on_config();
        self.voices.note_on(note, velocity.min(127), &config);
    }

    fn note_off(&mut self, note: u8) {
        let note = self.transpose(note);
        self.voices.note_off(note);
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        match controller {
            CC_MOD_WHEEL => {
                let depth = value.min(127) as u32 * 12 / 127;
                self.params.set(Param::VibratoDepth, depth as f32);
            }
            CC_ALL_SOUND_OFF | CC_ALL_NOTES_OFF => self.all_notes_off(),
            _ => {}
        }
    }

    fn note_on_config(&self) -> NoteOnConfig {
        let p = &self.params;
        NoteOnConfig {
            chip: self.chip,
            mode: p.alloc_mode,
            channel_mask: p.channel_mask,
            detune: p.detune,
            attack: p.attack,
            decay: p.decay,
            sustain: p.sustain,
            release: p.release,
            pitch_env_depth: p.pitch_env_depth as f32,
            sample_rate: self.config.sample_rate as f32,
        }
    }

    /// Hard-kill every voice, skipping release.
    pub fn all_notes_off(&mut self) {
        log::debug!("all notes off");
        self.voices.kill_all();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Parameters
    // ═══════════════════════════════════════════════════════════════════

    /// Set a parameter, clamped to its range. Returns the stored value.
    pub fn set_param(&mut self, param: Param, value: f32) -> f32 {
        let stored = self.params.set(param, value);
        log::debug!("{} = {}", param.key(), stored);

        if param == Param::Wavetable && self.chip == Chip::Gb {
            GbSequencer::load_wavetable(&mut self.gb, self.params.wavetable as usize, 0);
        }
        stored
    }

    /// Set a parameter from its host-facing key and textual value.
    ///
    /// Besides the parameter keys this accepts `chip` ("NES"/"GB" or 0/1),
    /// `preset` (index), `all_notes_off`, and mode names for `alloc_mode`.
    /// Returns false if the key or value was not understood.
    pub fn set_param_by_key(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        if key == Param::AllocMode.key()
            && let Some(mode) = AllocMode::from_name(value)
        {
            self.set_param(Param::AllocMode, mode as u8 as f32);
            return true;
        }

        match key {
            "chip" => match Chip::from_name(value) {
                Some(chip) => {
                    self.select_chip(chip);
                    true
                }
                None => {
                    log::warn!("unknown chip \"{value}\"");
                    false
                }
            },
            "preset" => match value.parse::<usize>() {
                Ok(index) => self.select_preset(index),
                Err(_) => {
                    log::warn!("invalid preset index \"{value}\"");
                    false
                }
            },
            "all_notes_off" => {
                self.all_notes_off();
                true
            }
            _ => {
                let Some(param) = Param::from_key(key) else {
                    log::warn!("unknown parameter \"{key}\"");
                    return false;
                };
                match value.parse::<f32>() {
                    Ok(v) => {
                        self.set_param(param, v);
                        true
                    }
                    Err(_) => {
                        log::warn!("invalid value \"{value}\" for {key}");
                        false
                    }
                }
            }
        }
    }

    #[inline]
    pub fn param(&self, param: Param) -> f32 {
        self.params.get(param)
    }

    #[inline]
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Metadata for every parameter, in `Param` order.
    #[inline]
    pub fn param_info(&self) -> &'static [ParamInfo] {
        &PARAM_INFO
    }

    // ═══════════════════════════════════════════════════════════════════
    // Chip & presets
    // ═══════════════════════════════════════════════════════════════════

    /// Switch the rendered chip. All voices are killed.
    pub fn select_chip(&mut self, chip: Chip) {
        self.chip = chip;
        if chip == Chip::Gb {
            GbSequencer::load_wavetable(&mut self.gb, self.params.wavetable as usize, 0);
        }
        self.voices.kill_all();
        log::info!("chip: {chip}");
    }

    #[inline]
    pub fn chip(&self) -> Chip {
        self.chip
    }

    /// Load a factory preset and its chip.
    ///
    /// Kills all voices and resets both backends. Reselecting the current
    /// preset changes nothing. Returns false for an out-of-range index.
    pub fn select_preset(&mut self, index: usize) -> bool {
        if index >= NUM_PRESETS {
            log::warn!("preset index {index} out of range (0..{NUM_PRESETS})");
            return false;
        }
        if index == self.current_preset {
            return true;
        }

        self.voices.kill_all();
        self.nes.reset();
        self.gb.reset();
        NesSequencer::power_on(&mut self.nes);
        GbSequencer::power_on(&mut self.gb);
        self.load_preset(index);

        log::info!("preset {index}: {} ({})", self.preset_name(), self.chip);
        true
    }

    fn load_preset(&mut self, index: usize) {
        let Some(preset) = factory_preset(index) else {
            return;
        };
        self.params = preset.params;
        self.params.octave_transpose = 0;
        self.chip = preset.chip;
        self.current_preset = index;

        if self.chip == Chip::Gb {
            GbSequencer::load_wavetable(&mut self.gb, self.params.wavetable as usize, 0);
        }
    }

    #[inline]
    pub fn current_preset(&self) -> usize {
        self.current_preset
    }

    pub fn preset_name(&self) -> &'static str {
        FACTORY_PRESETS[self.current_preset].name
    }

    #[inline]
    pub fn preset_count(&self) -> usize {
        NUM_PRESETS
    }

    // ═══════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════

    /// Render interleaved stereo into `out`.
    ///
    /// The output is processed in blocks of at most `block_frames` frames.
    /// A trailing odd sample is zeroed.
    pub fn render(&mut self, out: &mut [i16]) {
        let mut buffer = AudioBuffer::new(out);
        buffer.clear();

        let total = buffer.frames;
        let mut start = 0;
        while start < total {
            let len = (total - start).min(self.config.block_frames);
            self.render_block(&mut buffer.slice_mut(start, len));
            start += len;
        }
    }

    fn render_block(&mut self, out: &mut AudioBuffer) {
        match self.chip {
            Chip::Nes => self.render_nes(out),
            Chip::Gb => self.render_gb(out),
        }
    }

    #[inline]
    fn pitch_settings(&self) -> PitchSettings {
        let p = &self.params;
        PitchSettings {
            vibrato_depth: p.vibrato_depth as f32,
            vibrato_rate: p.vibrato_rate as f32,
            pitch_env_speed: p.pitch_env_speed as f32,
            detune_cents: p.detune as f32,
        }
    }

    #[inline]
    fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            duty: self.params.duty,
            sweep: self.params.sweep,
            noise_short: self.params.noise_short(),
        }
    }

    /// NES: volume registers track the envelope, output is passed through.
    fn render_nes(&mut self, out: &mut AudioBuffer) {
        let frames = out.frames;
        let sample_rate = self.config.sample_rate as f32;
        let settings = self.pitch_settings();
        let channel_settings = self.channel_settings();
        let volume = self.params.volume;

        let mut seq = NesSequencer::new(&mut self.nes);
        seq.begin_block();

        for voice in self.voices.voices_mut().iter_mut().filter(|v| v.active) {
            let Some(step) = step_voice(voice, &self.pitch, &settings, frames, sample_rate) else {
                seq.silence(voice.channel);
                continue;
            };
            let update = ChannelUpdate {
                channel: voice.channel,
                kind: voice.kind,
                frequency: step.frequency,
                volume: nes_volume(step.level, volume, voice.velocity),
                note: voice.note,
                trigger: step.trigger,
            };
            seq.write_channel(&update, &channel_settings);
        }

        self.voices.retire_finished();
        for channel in self.voices.idle_channels() {
            seq.silence(channel);
        }

        self.pitch.end_block(&settings, frames, sample_rate);
        self.nes
            .end_frame(cycles_for_frames(frames, NES_CPU_CLOCK, self.config.sample_rate));
        read_into(&mut self.nes, &mut self.scratch, out, OUTPUT_GAIN);
    }

    /// GB: volume is set once at trigger, output is scaled by the mean
    /// envelope level of the voices that sounded.
    fn render_gb(&mut self, out: &mut AudioBuffer) {
        let frames = out.frames;
        let sample_rate = self.config.sample_rate as f32;
        let settings = self.pitch_settings();
        let channel_settings = self.channel_settings();
        let volume = self.params.volume;

        let mut level_sum = 0.0;
        let mut sounding = 0;

        let mut seq = GbSequencer::new(&mut self.gb);

        for voice in self.voices.voices_mut().iter_mut().filter(|v| v.active) {
            let Some(step) = step_voice(voice, &self.pitch, &settings, frames, sample_rate) else {
                seq.silence(voice.channel);
                continue;
            };
            level_sum += step.level;
            sounding += 1;

            let update = ChannelUpdate {
                channel: voice.channel,
                kind: voice.kind,
                frequency: step.frequency,
                volume: gb_volume(volume, voice.velocity),
                note: voice.note,
                trigger: step.trigger,
            };
            seq.write_channel(&update, &channel_settings);
        }

        self.voices.retire_finished();
        for channel in self.voices.idle_channels() {
            seq.silence(channel);
        }

        self.pitch.end_block(&settings, frames, sample_rate);
        self.gb
            .end_frame(cycles_for_frames(frames, GB_CPU_CLOCK, self.config.sample_rate));

        let env_scale = if sounding > 0 {
            level_sum / sounding as f32
        } else {
            1.0
        };
        read_into(&mut self.gb, &mut self.scratch, out, OUTPUT_GAIN * env_scale);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    #[inline]
    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    /// Current pitch bend in semitones.
    #[inline]
    pub fn pitch_bend(&self) -> f32 {
        self.pitch.pitch_bend()
    }

    #[inline]
    pub fn nes_backend(&self) -> &N {
        &self.nes
    }

    #[inline]
    pub fn nes_backend_mut(&mut self) -> &mut N {
        &mut self.nes
    }

    #[inline]
    pub fn gb_backend(&self) -> &G {
        &self.gb
    }

    #[inline]
    pub fn gb_backend_mut(&mut self) -> &mut G {
        &mut self.gb
    }
}

/// Drain one block from `apu` into `out`, applying `gain` and clamping.
///
/// Mono backends are copied to both sides. Frames the backend did not
/// produce stay silent.
fn read_into<B: ApuBackend>(apu: &mut B, scratch: &mut [i16], out: &mut AudioBuffer, gain: f32) {
    let channels = apu.output_channels().max(1);
    let wanted = (out.frames * channels).min(scratch.len());
    let read = apu.read_samples(&mut scratch[..wanted]);

    let scale = |s: i16| (s as f32 * gain) as i32;
    for (frame, samples) in scratch[..read].chunks_exact(channels).enumerate() {
        let left = scale(samples[0]);
        let right = samples.get(1).map_or(left, |&s| scale(s));
        out.set_frame(frame, left, right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MonoRecorder, StereoRecorder};
    use crate::error::BackendError;

    type TestEngine = Engine<MonoRecorder, StereoRecorder>;

    fn engine() -> TestEngine {
        TestEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_cycles_per_block() {
        // 128 * 1789773 / 44100 = 5194.8
        assert_eq!(cycles_for_frames(128, NES_CPU_CLOCK, 44_100), 5195);
        // 128 * 4194304 / 44100 = 12173.9
        assert_eq!(cycles_for_frames(128, GB_CPU_CLOCK, 44_100), 12174);
    }

    #[test]
    fn test_volume_curves() {
        assert_eq!(nes_volume(1.0, 15, 127), 15);
        assert_eq!(nes_volume(0.5, 15, 127), 8);
        assert_eq!(nes_volume(1.0, 15, 64), 7);
        assert_eq!(nes_volume(0.0, 15, 127), 0);

        assert_eq!(gb_volume(15, 127), 15);
        assert_eq!(gb_volume(15, 64), 8);
        assert_eq!(gb_volume(15, 1), 1);
        assert_eq!(gb_volume(0, 127), 1);
    }

    #[test]
    fn test_new_starts_on_first_preset() {
        let e = engine();
        assert_eq!(e.current_preset(), 0);
        assert_eq!(e.chip(), Chip::Nes);
        assert_eq!(e.preset_name(), "NES Lead");
        assert_eq!(e.params(), &FACTORY_PRESETS[0].params);
    }

    #[test]
    fn test_power_on_writes() {
        let e = engine();
        assert_eq!(e.nes_backend().writes()[0].addr, 0x4015);
        let gb: Vec<u16> = e.gb_backend().writes().iter().map(|w| w.addr).collect();
        assert_eq!(gb, vec![0xFF26, 0xFF24, 0xFF25]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            sample_rate: 44_100,
            block_frames: 0,
        };
        assert!(matches!(TestEngine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_backend_open_failure() {
        // The recorder refuses sample rates above the chip clock
        let config = EngineConfig {
            sample_rate: 2_000_000,
            block_frames: 128,
        };
        match TestEngine::new(config) {
            Err(EngineError::Backend { chip, source }) => {
                assert_eq!(chip, Chip::Nes);
                assert_eq!(source, BackendError::UnsupportedSampleRate(2_000_000));
            }
            _ => panic!("expected backend error"),
        }
    }

    #[test]
    fn test_octave_transpose_applies_to_note_on_and_off() {
        let mut e = engine();
        e.set_param(Param::OctaveTranspose, 1.0);
        e.on_event(Event::NoteOn {
            note: 60,
            velocity: 100,
        });
        assert_eq!(e.voices().active_voices().next().map(|v| v.note), Some(72));

        e.on_event(Event::NoteOff { note: 60 });
        assert_eq!(e.active_voices(), 0);
    }

    #[test]
    fn test_transpose_clamps_note() {
        let mut e = engine();
        e.set_param(Param::OctaveTranspose, 3.0);
        e.on_event(Event::NoteOn {
            note: 120,
            velocity: 100,
        });
        assert_eq!(e.voices().active_voices().next().map(|v| v.note), Some(127));
    }

    #[test]
    fn test_mod_wheel_sets_vibrato_depth() {
        let mut e = engine();
        e.on_event(Event::ControlChange {
            controller: CC_MOD_WHEEL,
            value: 127,
        });
        assert_eq!(e.param(Param::VibratoDepth), 12.0);
        e.on_event(Event::ControlChange {
            controller: CC_MOD_WHEEL,
            value: 64,
        });
        assert_eq!(e.param(Param::VibratoDepth), 6.0);
    }

    #[test]
    fn test_all_sound_off_cc() {
        let mut e = engine();
        e.set_param(Param::AllocMode, AllocMode::Auto as u8 as f32);
        e.set_param(Param::ChannelMask, 15.0);
        e.on_event(Event::NoteOn { note: 60, velocity: 100 });
        e.on_event(Event::NoteOn { note: 64, velocity: 100 });
        assert_eq!(e.active_voices(), 2);

        e.on_event(Event::ControlChange {
            controller: CC_ALL_SOUND_OFF,
            value: 0,
        });
        assert_eq!(e.active_voices(), 0);
    }

    #[test]
    fn test_pitch_bend_event() {
        let mut e = engine();
        e.on_event(Event::PitchBend { value: 16383 });
        assert!(e.pitch_bend() > 1.99);
        e.on_event(Event::PitchBend { value: 8192 });
        assert_eq!(e.pitch_bend(), 0.0);
    }

    #[test]
    fn test_set_param_by_key() {
        let mut e = engine();
        assert!(e.set_param_by_key("duty", "3"));
        assert_eq!(e.params().duty, 3);
        assert!(e.set_param_by_key("alloc_mode", "Locked"));
        assert_eq!(e.params().alloc_mode, AllocMode::Locked);
        assert!(e.set_param_by_key("alloc_mode", "0"));
        assert_eq!(e.params().alloc_mode, AllocMode::Auto);
        assert!(e.set_param_by_key("chip", "GB"));
        assert_eq!(e.chip(), Chip::Gb);
        assert!(!e.set_param_by_key("no_such_key", "1"));
        assert!(!e.set_param_by_key("duty", "wide"));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut e = engine();
        assert_eq!(e.set_param(Param::Duty, 9.0), 3.0);
        assert_eq!(e.set_param(Param::Detune, -4.0), 0.0);
        assert_eq!(e.set_param(Param::OctaveTranspose, -7.0), -3.0);
    }

    #[test]
    fn test_wavetable_change_reloads_only_on_gb() {
        let mut e = engine();
        let before = e.gb_backend().writes().len();
        e.set_param(Param::Wavetable, 3.0);
        assert_eq!(e.gb_backend().writes().len(), before);

        e.select_chip(Chip::Gb);
        let after_switch = e.gb_backend().writes().len();
        assert_eq!(after_switch, before + 18);

        e.set_param(Param::Wavetable, 5.0);
        let writes = &e.gb_backend().writes()[after_switch..];
        assert_eq!(writes.len(), 18);
        assert_eq!(writes[1].value, crate::gb::WAVETABLES[5][0]);
    }

    #[test]
    fn test_render_splits_long_buffers() {
        let mut e = engine();
        let mut out = vec![0i16; 300 * 2];
        e.render(&mut out);
        // 128 + 128 + 44
        assert_eq!(e.nes_backend().frames_completed(), 3);
    }

    #[test]
    fn test_nes_output_is_scaled_and_duplicated() {
        let mut e = engine();
        e.nes_backend_mut().set_level(100);
        let mut out = vec![0i16; 128 * 2];
        e.render(&mut out);
        assert!(out.iter().all(|&s| s == 600));

        e.nes_backend_mut().set_level(10_000);
        e.render(&mut out);
        assert!(out.iter().all(|&s| s == i16::MAX));
    }

    #[test]
    fn test_odd_trailing_sample_zeroed() {
        let mut e = engine();
        let mut out = vec![5i16; 7];
        e.render(&mut out);
        assert_eq!(out[6], 0);
    }
}
