// src/test.rs
//
// End-to-end scenarios driving the engine through recording backends.

use crate::backend::{ApuBackend, MonoRecorder, RegisterWrite, StereoRecorder};
use crate::engine::{Engine, EngineConfig};
use crate::error::{BackendError, EngineError};
use crate::event::Event;
use crate::parameter::Param;
use crate::preset::{Chip, FACTORY_PRESETS, NUM_PRESETS};
use crate::voice_allocator::{AllocMode, MAX_VOICES};

type TestEngine = Engine<MonoRecorder, StereoRecorder>;

const BLOCK: usize = 128;

fn engine() -> TestEngine {
    TestEngine::new(EngineConfig::default()).unwrap()
}

fn note_on(engine: &mut TestEngine, note: u8, velocity: u8) {
    engine.on_event(Event::NoteOn { note, velocity });
}

/// Render one block and return the writes the active chip received.
fn render_block(engine: &mut TestEngine) -> Vec<RegisterWrite> {
    let nes_before = engine.nes_backend().writes().len();
    let gb_before = engine.gb_backend().writes().len();
    let mut out = vec![0i16; BLOCK * 2];
    engine.render(&mut out);
    match engine.chip() {
        Chip::Nes => engine.nes_backend().writes()[nes_before..].to_vec(),
        Chip::Gb => engine.gb_backend().writes()[gb_before..].to_vec(),
    }
}

fn writes_to(writes: &[RegisterWrite], addr: u16) -> Vec<u8> {
    writes.iter().filter(|w| w.addr == addr).map(|w| w.value).collect()
}

/// A backend whose emulator can never be opened.
struct FailingBackend;

impl ApuBackend for FailingBackend {
    fn open(_clock_rate: u32, _sample_rate: u32) -> Result<Self, BackendError> {
        Err(BackendError::Allocation("blip buffer".into()))
    }
    fn reset(&mut self) {}
    fn write_register(&mut self, _time: u32, _addr: u16, _value: u8) {}
    fn end_frame(&mut self, _cycles: u32) {}
    fn samples_avail(&self) -> usize {
        0
    }
    fn read_samples(&mut self, _out: &mut [i16]) -> usize {
        0
    }
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_backend_failure_fails_construction() {
    let result = Engine::<MonoRecorder, FailingBackend>::new(EngineConfig::default());
    match result {
        Err(EngineError::Backend { chip, source }) => {
            assert_eq!(chip, Chip::Gb);
            assert_eq!(source, BackendError::Allocation("blip buffer".into()));
        }
        _ => panic!("expected GB backend failure"),
    }

    assert!(Engine::<FailingBackend, StereoRecorder>::new(EngineConfig::default()).is_err());
}

// ═══════════════════════════════════════════════════════════════════
// Presets
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_preset_round_trip() {
    let mut e = engine();
    for (i, preset) in FACTORY_PRESETS.iter().enumerate() {
        assert!(e.select_preset(i));
        assert_eq!(e.chip(), preset.chip);
        assert_eq!(e.preset_name(), preset.name);
        for param in Param::ALL {
            assert_eq!(
                e.param(param),
                preset.params.get(param),
                "preset {} ({}) param {}",
                i,
                preset.name,
                param.key()
            );
        }
    }
}

#[test]
fn test_preset_select_resets_and_kills() {
    let mut e = engine();
    e.set_param(Param::OctaveTranspose, 2.0);
    note_on(&mut e, 60, 100);
    assert_eq!(e.active_voices(), 1);

    assert!(e.select_preset(6));
    assert_eq!(e.active_voices(), 0);
    assert_eq!(e.param(Param::OctaveTranspose), 0.0);
    assert_eq!(e.nes_backend().reset_count(), 1);
    assert_eq!(e.gb_backend().reset_count(), 1);
}

#[test]
fn test_reselecting_current_preset_is_noop() {
    let mut e = engine();
    e.set_param(Param::Duty, 0.0);
    note_on(&mut e, 60, 100);

    assert!(e.select_preset(0));
    assert_eq!(e.params().duty, 0);
    assert_eq!(e.active_voices(), 1);
    assert_eq!(e.nes_backend().reset_count(), 0);
}

#[test]
fn test_invalid_preset_rejected() {
    let mut e = engine();
    assert!(!e.select_preset(NUM_PRESETS));
    assert_eq!(e.current_preset(), 0);
    assert_eq!(e.preset_count(), 32);
}

#[test]
fn test_gb_preset_loads_wave_ram() {
    let mut e = engine();
    let before = e.gb_backend().writes().len();
    assert!(e.select_preset(25));
    let writes = &e.gb_backend().writes()[before..];
    // Power-on after reset, then the wavetable bracketed by DAC off/on
    assert_eq!(writes_to(writes, 0xFF26), vec![0x80]);
    assert_eq!(writes_to(writes, 0xFF1A), vec![0x00, 0x80]);
    assert_eq!(writes.iter().filter(|w| (0xFF30..=0xFF3F).contains(&w.addr)).count(), 16);
}

// ═══════════════════════════════════════════════════════════════════
// Allocation through the event surface
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_lead_mode_second_note_leaves_one_voice() {
    let mut e = engine();
    assert_eq!(e.params().alloc_mode, AllocMode::Lead);
    note_on(&mut e, 60, 100);
    note_on(&mut e, 67, 100);
    assert_eq!(e.active_voices(), 1);
    assert_eq!(e.voices().active_voices().next().map(|v| v.note), Some(67));
}

#[test]
fn test_locked_mode_five_notes() {
    let mut e = engine();
    e.set_param(Param::AllocMode, AllocMode::Locked as u8 as f32);
    e.set_param(Param::ChannelMask, 15.0);

    for note in [60, 62, 64, 65] {
        note_on(&mut e, note, 100);
    }
    assert_eq!(e.voices().channel_occupancy(), [1, 1, 1, 1]);

    // Fifth note takes the oldest voice's channel
    note_on(&mut e, 67, 100);
    assert_eq!(e.voices().channel_occupancy(), [1, 1, 1, 1]);
    let notes: Vec<u8> = e.voices().active_voices().map(|v| v.note).collect();
    assert!(!notes.contains(&60));
    assert!(notes.contains(&67));
    let newest = e.voices().active_voices().max_by_key(|v| v.age).map(|v| v.channel.index());
    assert_eq!(newest, Some(0));
}

#[test]
fn test_more_notes_than_voices_never_exceeds_pool() {
    let mut e = engine();
    e.set_param(Param::AllocMode, AllocMode::Auto as u8 as f32);
    e.set_param(Param::ChannelMask, 15.0);
    for note in 60..60 + MAX_VOICES as u8 + 3 {
        note_on(&mut e, note, 100);
    }
    assert!(e.active_voices() <= MAX_VOICES);
    assert!(e.voices().channel_occupancy().iter().all(|&n| n <= 1));
}

#[test]
fn test_note_off_unknown_note_is_noop() {
    let mut e = engine();
    note_on(&mut e, 60, 100);
    let snapshot: Vec<(u8, usize, u64)> = e
        .voices()
        .active_voices()
        .map(|v| (v.note, v.channel.index(), v.age))
        .collect();

    e.on_event(Event::NoteOff { note: 61 });

    let after: Vec<(u8, usize, u64)> = e
        .voices()
        .active_voices()
        .map(|v| (v.note, v.channel.index(), v.age))
        .collect();
    assert_eq!(snapshot, after);
}

// Note-off frees the slot at once; the release stage is not played out.
#[test]
fn test_note_off_silences_next_block() {
    let mut e = engine();
    note_on(&mut e, 60, 100);
    render_block(&mut e);

    e.on_event(Event::NoteOff { note: 60 });
    assert_eq!(e.active_voices(), 0);

    let writes = render_block(&mut e);
    assert_eq!(writes_to(&writes, 0x4000), vec![0x30]);
    assert!(writes_to(&writes, 0x4003).is_empty());
}

#[test]
fn test_unison_pair_detuned_and_released_together() {
    let mut e = engine();
    assert!(e.select_preset(8));
    assert_eq!(e.params().channel_mask, 0x03);
    assert!(e.params().detune > 0);

    note_on(&mut e, 64, 100);
    let channels: Vec<usize> = e.voices().active_voices().map(|v| v.channel.index()).collect();
    assert_eq!(channels.len(), 2);
    assert!(channels.contains(&0) && channels.contains(&1));
    assert!(e.voices().active_voices().all(|v| v.note == 64));

    // Pulse 2 sits a few cents above pulse 1
    let writes = render_block(&mut e);
    let lo1 = writes_to(&writes, 0x4002);
    let lo2 = writes_to(&writes, 0x4006);
    assert_eq!(lo1.len(), 1);
    assert_eq!(lo2.len(), 1);
    assert!(lo2[0] < lo1[0]);

    e.on_event(Event::NoteOff { note: 64 });
    assert_eq!(e.active_voices(), 0);
}

// ═══════════════════════════════════════════════════════════════════
// Register sequencing per block
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_lead_trigger_written_once_for_held_note() {
    let mut e = engine();
    assert_eq!(e.params().channel_mask, 0x01);

    note_on(&mut e, 60, 100);
    let voice = e.voices().active_voices().next().map(|v| (v.channel.index(), v.triggered));
    assert_eq!(voice, Some((0, false)));

    let first = render_block(&mut e);
    assert_eq!(writes_to(&first, 0x4003).len(), 1);
    assert!(e.voices().active_voices().all(|v| v.triggered));

    for _ in 0..4 {
        let held = render_block(&mut e);
        assert!(writes_to(&held, 0x4003).is_empty());
        assert!(writes_to(&held, 0x4001).is_empty());
        // Volume and period are refreshed every block
        assert_eq!(writes_to(&held, 0x4000).len(), 1);
        assert_eq!(writes_to(&held, 0x4002).len(), 1);
    }
}

#[test]
fn test_nes_block_layout() {
    let mut e = engine();
    note_on(&mut e, 60, 127);
    render_block(&mut e);
    let writes = render_block(&mut e);

    // Channel enable first, then pulse 1, then the three idle channels
    assert_eq!(writes[0], RegisterWrite { time: 0, addr: 0x4015, value: 0x0F });
    assert_eq!(writes[1].addr, 0x4000);
    assert_eq!(writes[1].value & 0x0F, 15);
    let idle: Vec<u16> = writes[3..].iter().map(|w| w.addr).collect();
    assert_eq!(idle, vec![0x4004, 0x4008, 0x400C]);
    assert!(writes.windows(2).all(|p| p[0].time < p[1].time));
}

#[test]
fn test_high_note_in_auto_mode_plays_noise() {
    let mut e = engine();
    e.set_param(Param::AllocMode, AllocMode::Auto as u8 as f32);
    e.set_param(Param::ChannelMask, 15.0);
    note_on(&mut e, 100, 100);

    let writes = render_block(&mut e);
    // (100 - 68) / 2 = 16 -> clamped to the highest noise period
    assert_eq!(writes_to(&writes, 0x400E), vec![0x00]);
    assert_eq!(writes_to(&writes, 0x400F), vec![0xF8]);
}

#[test]
fn test_envelope_completion_frees_voice() {
    let mut e = engine();
    // NES Pluck: instant attack, decay 3 to zero sustain
    assert!(e.select_preset(4));
    note_on(&mut e, 60, 100);

    let mut finished_at = None;
    for block in 0..80 {
        render_block(&mut e);
        if e.active_voices() == 0 {
            finished_at = Some(block);
            break;
        }
    }
    // Decay 3 lasts 0.2 s, about 69 blocks
    let block = finished_at.unwrap();
    assert!((60..75).contains(&block), "finished at block {block}");

    let writes = render_block(&mut e);
    assert_eq!(writes_to(&writes, 0x4000), vec![0x30]);
}

#[test]
fn test_gb_trigger_once_and_output_scaled_by_envelope() {
    let mut e = engine();
    assert!(e.select_preset(16));
    e.set_param(Param::Attack, 0.0);
    e.set_param(Param::Decay, 0.0);
    e.set_param(Param::Sustain, 15.0);

    note_on(&mut e, 69, 127);

    // First block: the envelope level sampled before advancing is zero
    let mut out = vec![0i16; BLOCK * 2];
    let before = e.gb_backend().writes().len();
    e.render(&mut out);
    assert!(out.iter().all(|&s| s == 0));
    let first = &e.gb_backend().writes()[before..];
    assert_eq!(writes_to(first, 0xFF14), vec![0x80 | 0x06]);
    assert_eq!(writes_to(first, 0xFF12), vec![0xE0]);

    // Held: full level, recorder output 1000 * 6
    let before = e.gb_backend().writes().len();
    e.render(&mut out);
    assert!(out.iter().all(|&s| s == 6000));
    let held = &e.gb_backend().writes()[before..];
    let nr14 = writes_to(held, 0xFF14);
    assert_eq!(nr14.len(), 1);
    assert_eq!(nr14[0] & 0x80, 0);
    assert!(writes_to(held, 0xFF12).is_empty());
}

#[test]
fn test_gb_silent_block_scale_is_unity() {
    let mut e = engine();
    assert!(e.select_preset(16));
    let mut out = vec![0i16; BLOCK * 2];
    e.render(&mut out);
    assert!(out.iter().all(|&s| s == 6000));
}

#[test]
fn test_chip_switch_kills_voices_and_routes_rendering() {
    let mut e = engine();
    note_on(&mut e, 60, 100);
    e.select_chip(Chip::Gb);
    assert_eq!(e.active_voices(), 0);

    note_on(&mut e, 60, 100);
    let nes_frames = e.nes_backend().frames_completed();
    let writes = render_block(&mut e);
    assert_eq!(e.nes_backend().frames_completed(), nes_frames);
    assert_eq!(e.gb_backend().frames_completed(), 1);
    assert!(writes.iter().any(|w| w.addr == 0xFF14 && w.value & 0x80 != 0));
}

#[test]
fn test_midi_bytes_drive_engine() {
    let mut e = engine();
    assert!(e.on_midi(&[0x91, 60, 100]));
    assert_eq!(e.active_voices(), 1);
    assert!(e.on_midi(&[0x91, 60, 0]));
    assert_eq!(e.active_voices(), 0);
    assert!(!e.on_midi(&[0xC0, 1]));
}

#[test]
fn test_two_byte_note_off_releases_voice() {
    let mut e = engine();
    assert!(e.on_midi(&[0x90, 60, 100]));
    assert!(e.on_midi(&[0x80, 60]));
    assert_eq!(e.active_voices(), 0);

    assert!(e.on_midi(&[0x90, 62, 100]));
    assert!(e.on_midi(&[0x90, 62]));
    assert_eq!(e.active_voices(), 0);
    assert!(!e.on_midi(&[0x80]));
}

#[test]
fn test_vibrato_moves_period_between_blocks() {
    let mut e = engine();
    e.set_param(Param::VibratoDepth, 2.0);
    e.set_param(Param::VibratoRate, 10.0);
    note_on(&mut e, 57, 127);

    let mut periods = Vec::new();
    for _ in 0..8 {
        let writes = render_block(&mut e);
        periods.extend(writes_to(&writes, 0x4002));
    }
    periods.dedup();
    assert!(periods.len() > 1);
}
