// src/voice_allocator.rs

use crate::envelope::Envelope;
use crate::preset::Chip;
use crate::voice::{ChannelIndex, ChannelKind, Voice, VoiceId, NUM_CHANNELS};

/// Number of polyphonic voice slots.
pub const MAX_VOICES: usize = 5;

/// Notes above this go straight to the noise channel in Auto mode.
pub const AUTO_NOISE_NOTE: u8 = 96;

/// How voices are mapped onto hardware channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocMode {
    /// Pulse first, then triangle/wave, then noise; steal the oldest voice.
    #[default]
    Auto = 0,
    /// Monophonic on the lowest channel in the mask.
    Lead = 1,
    /// First free channel in the mask, stealing the oldest in-mask voice.
    Locked = 2,
}

impl AllocMode {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => AllocMode::Auto,
            1 => AllocMode::Lead,
            _ => AllocMode::Locked,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AllocMode::Auto => "Auto",
            AllocMode::Lead => "Lead",
            AllocMode::Locked => "Locked",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Auto" => Some(AllocMode::Auto),
            "Lead" => Some(AllocMode::Lead),
            "Locked" => Some(AllocMode::Locked),
            _ => None,
        }
    }
}

/// Everything a note-on needs besides the note itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteOnConfig {
    pub chip: Chip,
    pub mode: AllocMode,
    pub channel_mask: u8,
    /// Nonzero enables unison doubling across both pulse channels
    pub detune: u8,
    /// Envelope parameters, 0-15 each
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    /// Starting pitch-envelope offset in semitones
    pub pitch_env_depth: f32,
    pub sample_rate: f32,
}

/// Lowest channel whose bit is set in `mask`, if any.
#[inline]
fn lowest_in_mask(mask: u8) -> Option<ChannelIndex> {
    ChannelIndex::ALL.into_iter().find(|ch| mask & ch.bit() != 0)
}

/// Owns the voice slots and decides which voice and channel a note gets.
///
/// Responsibilities:
/// - map notes to voices
/// - pick hardware channels per allocation mode
/// - manage voice lifetime
///
/// Does NOT:
/// - touch chip registers
/// - allocate after construction
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: [Voice; MAX_VOICES],
    age_counter: u64,
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePool {
    pub fn new() -> Self {
        Self {
            voices: std::array::from_fn(Voice::new),
            age_counter: 0,
        }
    }

    /// Index of the slot to use for a new note: the first inactive one,
    /// otherwise the one allocated longest ago.
    pub fn allocate(&self) -> VoiceId {
        if let Some(v) = self.voices.iter().find(|v| !v.active) {
            return v.id;
        }
        self.voices
            .iter()
            .min_by_key(|v| v.age)
            .map(|v| v.id)
            .unwrap_or(0)
    }

    #[inline]
    fn channel_in_use(&self, channel: ChannelIndex) -> bool {
        self.voices.iter().any(|v| v.active && v.channel == channel)
    }

    /// Oldest active voice, optionally restricted to channels in `mask`.
    fn oldest_active(&self, mask: Option<u8>) -> Option<&Voice> {
        self.voices
            .iter()
            .filter(|v| v.active)
            .filter(|v| mask.is_none_or(|m| m & v.channel.bit() != 0))
            .min_by_key(|v| v.age)
    }

    /// First channel among `candidates` that is in the mask and free.
    fn first_free(&self, mask: u8, candidates: &[ChannelIndex]) -> Option<ChannelIndex> {
        candidates
            .iter()
            .copied()
            .find(|&ch| mask & ch.bit() != 0 && !self.channel_in_use(ch))
    }

    /// Choose the hardware channel for `note` under `mode`.
    pub fn pick_channel(&self, note: u8, mask: u8, mode: AllocMode) -> ChannelIndex {
        let mask = mask & 0x0F;
        match mode {
            AllocMode::Locked => self
                .first_free(mask, &ChannelIndex::ALL)
                .or_else(|| self.oldest_active(Some(mask)).map(|v| v.channel))
                .or_else(|| lowest_in_mask(mask))
                .unwrap_or(ChannelIndex::PULSE1),

            AllocMode::Lead => lowest_in_mask(mask).unwrap_or(ChannelIndex::PULSE1),

            AllocMode::Auto => {
                if note > AUTO_NOISE_NOTE && mask & ChannelIndex::NOISE.bit() != 0 {
                    return ChannelIndex::NOISE;
                }
                self.first_free(mask, &ChannelIndex::ALL)
                    .or_else(|| self.oldest_active(None).map(|v| v.channel))
                    .unwrap_or(ChannelIndex::PULSE1)
            }
        }
    }

    /// Populate slot `id` for a fresh note and gate its envelope on.
    fn start_voice(
        &mut self,
        id: VoiceId,
        note: u8,
        velocity: u8,
        channel: ChannelIndex,
        config: &NoteOnConfig,
    ) {
        self.age_counter += 1;
        let age = self.age_counter;

        let v = &mut self.voices[id];
        v.active = true;
        v.note = note;
        v.velocity = velocity.min(127);
        v.channel = channel;
        v.kind = ChannelKind::for_channel(channel, config.chip);
        v.age = age;
        v.triggered = false;
        v.pitch_env = config.pitch_env_depth;
        v.envelope = Envelope::new();
        v.envelope.configure(
            config.attack,
            config.decay,
            config.sustain,
            config.release,
            config.sample_rate,
        );
        v.envelope.gate_on();
    }

    /// Start a note. Returns the primary voice's slot.
    pub fn note_on(&mut self, note: u8, velocity: u8, config: &NoteOnConfig) -> VoiceId {
        let note = note.min(127);

        if config.mode == AllocMode::Lead {
            self.kill_all();
        }

        let channel = self.pick_channel(note, config.channel_mask, config.mode);

        // A stolen channel loses its current occupant
        for v in self.voices.iter_mut().filter(|v| v.active && v.channel == channel) {
            log::debug!("stealing channel {} from note {}", channel.index(), v.note);
            v.kill();
        }

        let id = self.allocate();
        if self.voices[id].active {
            log::debug!("stealing voice {} (note {})", id, self.voices[id].note);
        }
        self.start_voice(id, note, velocity, channel, config);

        // Unison: double onto the other pulse channel when detune is on
        let both_pulses = ChannelIndex::PULSE1.bit() | ChannelIndex::PULSE2.bit();
        if config.detune > 0
            && config.channel_mask & both_pulses == both_pulses
            && let Some(partner) = channel.pulse_partner()
        {
            for v in self.voices.iter_mut().filter(|v| v.active && v.channel == partner) {
                v.kill();
            }
            let second = self.voices.iter().find(|v| v.id != id && !v.active).map(|v| v.id);
            if let Some(second) = second {
                self.start_voice(second, note, velocity, partner, config);
            }
        }

        id
    }

    /// Release every active voice bound to `note`.
    ///
    /// Slots free up immediately; the release stage is not played out.
    /// Returns how many voices were released.
    pub fn note_off(&mut self, note: u8) -> usize {
        let mut released = 0;
        for v in self.voices.iter_mut().filter(|v| v.active && v.note == note) {
            v.envelope.gate_off();
            v.active = false;
            released += 1;
        }
        released
    }

    /// Hard-kill every voice, bypassing release.
    pub fn kill_all(&mut self) {
        for v in &mut self.voices {
            v.kill();
        }
    }

    /// Free every active voice whose envelope has finished.
    /// Returns how many were retired.
    pub fn retire_finished(&mut self) -> usize {
        let mut retired = 0;
        for v in self.voices.iter_mut().filter(|v| v.active && v.envelope.is_idle()) {
            log::trace!("voice {} finished (note {})", v.id, v.note);
            v.active = false;
            retired += 1;
        }
        retired
    }

    /// Whether any active voice is bound to `channel`.
    #[inline]
    pub fn is_channel_active(&self, channel: ChannelIndex) -> bool {
        self.channel_in_use(channel)
    }

    /// Channels with no active voice bound to them.
    pub fn idle_channels(&self) -> impl Iterator<Item = ChannelIndex> + '_ {
        ChannelIndex::ALL
            .into_iter()
            .filter(move |&ch| !self.channel_in_use(ch))
    }

    /// Iterate over active voices.
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice> + '_ {
        self.voices.iter().filter(|v| v.active)
    }

    pub fn voices(&self) -> &[Voice; MAX_VOICES] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut [Voice; MAX_VOICES] {
        &mut self.voices
    }

    pub fn get_voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }

    /// Number of currently active voices.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    /// Active voices per channel, for invariant checks.
    pub fn channel_occupancy(&self) -> [usize; NUM_CHANNELS] {
        let mut counts = [0; NUM_CHANNELS];
        for v in self.active_voices() {
            counts[v.channel.index()] += 1;
        }
        counts
    }
}
