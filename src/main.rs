// src/main.rs

use chipvoice::{
    Chip, Engine, EngineConfig, Event, MonoRecorder, RegisterWrite, StereoRecorder,
};

type TraceEngine = Engine<MonoRecorder, StereoRecorder>;

/// ===============================
/// Helpers
/// ===============================

fn print_writes(writes: &[RegisterWrite]) {
    for w in writes {
        println!("  t={:<3} ${:04X} <- ${:02X}", w.time, w.addr, w.value);
    }
}

/// Render one block and dump the register traffic it produced.
fn trace_block(engine: &mut TraceEngine, out: &mut [i16], label: &str) {
    let (nes_before, gb_before) = (
        engine.nes_backend().writes().len(),
        engine.gb_backend().writes().len(),
    );
    engine.render(out);

    println!("--- {} ({} voices) ---", label, engine.active_voices());
    match engine.chip() {
        Chip::Nes => print_writes(&engine.nes_backend().writes()[nes_before..]),
        Chip::Gb => print_writes(&engine.gb_backend().writes()[gb_before..]),
    }
}

/// ===============================
/// Main
/// ===============================

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = EngineConfig::default();
    let mut engine = match TraceEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error creating engine: {e}");
            std::process::exit(1);
        }
    };

    let mut out = vec![0i16; config.block_frames * 2];

    println!("Starting register trace…");

    // NES Lead, NES Poly, NES Unison, GB Lead, Wave Bass
    for preset in [0, 6, 8, 16, 25] {
        engine.select_preset(preset);
        println!("=== Preset {}: {} ({}) ===", preset, engine.preset_name(), engine.chip());

        engine.on_event(Event::NoteOn {
            note: 60,
            velocity: 100,
        });
        trace_block(&mut engine, &mut out, "note on 60");

        engine.on_event(Event::NoteOn {
            note: 64,
            velocity: 90,
        });
        trace_block(&mut engine, &mut out, "note on 64");
        trace_block(&mut engine, &mut out, "held");

        engine.on_event(Event::NoteOff { note: 60 });
        engine.on_event(Event::NoteOff { note: 64 });
        trace_block(&mut engine, &mut out, "note off");
    }

    println!("Trace completed.");
}
