// The kit file format and the validated kit the engine runs from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize}; // serde does json

use crate::audio::{Narrowing, SampleBank, SampleId, Timing, VoiceSetup};
use crate::error::KitError;
use crate::loader::sample_loader;
use crate::pipeline::pattern::{Arrangement, Pattern};
use crate::shared::{
    DEFAULT_BEATS_PER_BAR, DEFAULT_BLOCK_SIZE, DEFAULT_BPM, DEFAULT_N_BLOCKS, DEFAULT_SAMPLE_RATE,
    DEFAULT_STEPS_PER_BAR, NUM_VOICES, PAN_FULL,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoConfig {
    pub sample_rate: u32,
    pub bpm: u32,
    pub beats_per_bar: u32,
    pub steps_per_bar: usize,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bpm: DEFAULT_BPM,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
            steps_per_bar: DEFAULT_STEPS_PER_BAR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    pub n_blocks: usize,
    pub block_size: usize, // frames per block
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            n_blocks: DEFAULT_N_BLOCKS,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl RingConfig {
    pub fn validate(self) -> Result<Self, KitError> {
        if self.n_blocks < 2 {
            return Err(KitError::RingTooSmall(self.n_blocks));
        }
        if self.block_size == 0 {
            return Err(KitError::ZeroBlockSize);
        }
        Ok(self)
    }

    /// Grow the blocks until everything but the block being drained holds at
    /// least `frames`, so one host callback never reaches an unfilled block.
    pub fn covering(self, frames: usize) -> Self {
        let spare = self.n_blocks.saturating_sub(1).max(1);
        Self {
            block_size: self.block_size.max(frames.div_ceil(spare)),
            ..self
        }
    }

    /// Seconds of audio a full ring holds.
    pub fn latency(&self, sample_rate: u32) -> f64 {
        (self.n_blocks * self.block_size) as f64 / sample_rate as f64
    }
}

// A waveform source. Without a path the name picks a built-in synthesized drum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub pan: u8,
    pub volume: u16,
    pub sample: Option<String>, // None leaves the voice on the idle sample
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    pub rows: Vec<String>, // one per voice; ' ' = rest, '1'..'9' = hit
}

impl From<&Pattern> for PatternConfig {
    fn from(pattern: &Pattern) -> Self {
        Self {
            name: pattern.name.clone(),
            rows: pattern.to_rows(),
        }
    }
}

/// What lives in `kit.json`. Immutable once the engine starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitConfig {
    pub tempo: TempoConfig,
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub narrowing: Narrowing,
    pub samples: Vec<SampleEntry>,
    pub voices: Vec<VoiceConfig>,
    pub patterns: Vec<PatternConfig>,
    pub arrangement: Vec<usize>,
}

/// Settings a caller can force on top of whatever the kit file says.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides {
    pub bpm: Option<u32>,
    pub n_blocks: Option<usize>,
    pub block_size: Option<usize>,
}

impl KitConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(bpm) = overrides.bpm {
            self.tempo.bpm = bpm;
        }
        if let Some(n) = overrides.n_blocks {
            self.ring.n_blocks = n;
        }
        if let Some(size) = overrides.block_size {
            self.ring.block_size = size;
        }
    }
}

/// A fully checked kit: every sample reference resolves, every pattern has the
/// right shape, and the timing is usable.
#[derive(Clone, Debug)]
pub struct Kit {
    pub sample_rate: u32,
    pub timing: Timing,
    pub ring: RingConfig,
    pub narrowing: Narrowing,
    pub bank: SampleBank,
    pub patterns: Vec<Pattern>,
    pub arrangement: Arrangement,
    pub voices: [VoiceSetup; NUM_VOICES],
}

impl Kit {
    /// Load the waveforms named by `config` (paths relative to `base_dir`) and validate.
    pub fn load(config: &KitConfig, base_dir: &Path) -> Result<Self, KitError> {
        let bank = sample_loader::load_bank(&config.samples, base_dir, config.tempo.sample_rate)?;
        Self::build(config, bank)
    }

    /// Validate `config` against an already populated bank.
    pub fn build(config: &KitConfig, bank: SampleBank) -> Result<Self, KitError> {
        let tempo = &config.tempo;
        let ring = config.ring.validate()?;

        let patterns = config
            .patterns
            .iter()
            .map(|p| Pattern::parse(&p.name, &p.rows, tempo.steps_per_bar))
            .collect::<Result<Vec<_>, _>>()?;
        let arrangement = Arrangement::new(config.arrangement.clone(), patterns.len())?;
        let timing = Timing::derive(
            tempo.sample_rate,
            tempo.bpm,
            tempo.beats_per_bar,
            tempo.steps_per_bar,
            arrangement.len(),
        )?;

        if config.voices.len() != NUM_VOICES {
            return Err(KitError::VoiceCount {
                expected: NUM_VOICES,
                found: config.voices.len(),
            });
        }
        let mut voices = [VoiceSetup {
            pan: PAN_FULL / 2,
            volume: 0,
            sample: SampleId::IDLE,
        }; NUM_VOICES];
        for (index, (voice, setup)) in config.voices.iter().zip(voices.iter_mut()).enumerate() {
            if voice.pan > PAN_FULL {
                return Err(KitError::PanOutOfRange { voice: index, pan: voice.pan });
            }
            let sample = match &voice.sample {
                Some(name) => bank.lookup(name).ok_or_else(|| KitError::UnknownSample {
                    voice: index,
                    name: name.clone(),
                })?,
                None => SampleId::IDLE,
            };
            *setup = VoiceSetup {
                pan: voice.pan,
                volume: voice.volume,
                sample,
            };
        }

        tracing::debug!(
            patterns = patterns.len(),
            bars = arrangement.len(),
            samples = bank.len() - 1,
            frames_per_step = timing.frames_per_step,
            "kit validated"
        );

        Ok(Self {
            sample_rate: tempo.sample_rate,
            timing,
            ring,
            narrowing: config.narrowing,
            bank,
            patterns,
            arrangement,
            voices,
        })
    }

    /// Output latency of a full ring, in seconds.
    pub fn ring_latency(&self) -> f64 {
        self.ring.latency(self.sample_rate)
    }
}

// The stock kit: five drums over six voices, three patterns, a ten bar loop.
const PATTERN_0: [&str; NUM_VOICES] = [
    "1        1                     1    1        1                          ",
    "                                                                        ",
    "                  1                                   1                 ",
    "                                                                        ",
    "1        1        1        1        1        1        1        1        ",
    "                                                                        ",
];

const PATTERN_1: [&str; NUM_VOICES] = [
    "9                                   1                                   ",
    "                                                                        ",
    "4        1        1        1        3        1        1        1        ",
    "                                                                        ",
    "                                                                        ",
    "                                                                        ",
];

const PATTERN_2: [&str; NUM_VOICES] = [
    "9                                   1                                   ",
    "         1                 1                 1                 1        ",
    "1                 1                 1                 1                 ",
    "5        1        1        1        1        1                 1        ",
    "5                          1                 1                          ",
    "         1                          4                          1        ",
];

impl Default for KitConfig {
    fn default() -> Self {
        let builtin = |name: &str| SampleEntry {
            name: name.to_string(),
            path: None,
        };
        let voice = |pan, volume, sample: &str| VoiceConfig {
            pan,
            volume,
            sample: Some(sample.to_string()),
        };
        let pattern = |name: &str, rows: &[&str]| PatternConfig {
            name: name.to_string(),
            rows: rows.iter().map(|r| r.to_string()).collect(),
        };
        Self {
            tempo: TempoConfig::default(),
            ring: RingConfig::default(),
            narrowing: Narrowing::default(),
            samples: ["kick", "clap", "snare", "hihat", "perc"]
                .into_iter()
                .map(builtin)
                .collect(),
            voices: vec![
                voice(16, 192, "kick"),
                voice(8, 0, "clap"),
                voice(16, 40, "snare"),
                voice(18, 80, "hihat"),
                voice(28, 30, "perc"),
                voice(4, 30, "kick"),
            ],
            patterns: vec![
                pattern("intro", &PATTERN_0),
                pattern("break", &PATTERN_1),
                pattern("groove", &PATTERN_2),
            ],
            arrangement: vec![0, 0, 0, 2, 2, 2, 2, 2, 1, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_bank() -> SampleBank {
        let mut bank = SampleBank::new();
        for name in ["kick", "clap", "snare", "hihat", "perc"] {
            bank.insert(name, &[1000, 2000, 3000]).unwrap();
        }
        bank
    }

    #[test]
    fn default_kit_is_valid() {
        let kit = Kit::build(&KitConfig::default(), small_bank()).unwrap();
        assert_eq!(kit.timing.frames_per_step, 949);
        assert_eq!(kit.arrangement.len(), 10);
        assert_eq!(kit.patterns.len(), 3);
        assert_eq!(kit.voices[5].sample, kit.voices[0].sample);
        assert_eq!(kit.voices[1].pan, 8);
    }

    #[test]
    fn voices_must_resolve_and_stay_in_pan_range() {
        let mut config = KitConfig::default();
        config.voices[2].sample = Some("cowbell".into());
        assert!(matches!(
            Kit::build(&config, small_bank()),
            Err(KitError::UnknownSample { voice: 2, .. })
        ));

        let mut config = KitConfig::default();
        config.voices[4].pan = 33;
        assert!(matches!(
            Kit::build(&config, small_bank()),
            Err(KitError::PanOutOfRange { voice: 4, pan: 33 })
        ));

        let mut config = KitConfig::default();
        config.voices.pop();
        assert!(matches!(
            Kit::build(&config, small_bank()),
            Err(KitError::VoiceCount { found: 5, .. })
        ));
    }

    #[test]
    fn unassigned_voice_uses_idle_sample() {
        let mut config = KitConfig::default();
        config.voices[3].sample = None;
        let kit = Kit::build(&config, small_bank()).unwrap();
        assert!(kit.voices[3].sample.is_idle());
    }

    #[test]
    fn overrides_reach_validation() {
        let mut config = KitConfig::default();
        config.apply(Overrides {
            n_blocks: Some(1),
            ..Overrides::default()
        });
        assert!(matches!(
            Kit::build(&config, small_bank()),
            Err(KitError::RingTooSmall(1))
        ));

        let mut config = KitConfig::default();
        config.apply(Overrides {
            bpm: Some(120),
            block_size: Some(256),
            ..Overrides::default()
        });
        let kit = Kit::build(&config, small_bank()).unwrap();
        assert_eq!(kit.ring.block_size, 256);
        assert_eq!(kit.timing.frames_per_beat, DEFAULT_SAMPLE_RATE * 60 / 120);
    }

    #[test]
    fn covering_grows_blocks_to_fit_a_host_callback() {
        let ring = RingConfig::default().covering(2048);
        assert_eq!(ring.n_blocks, 4);
        assert_eq!(ring.block_size, 683);
        assert!((ring.n_blocks - 1) * ring.block_size >= 2048);

        // already large enough: untouched
        assert_eq!(RingConfig::default().covering(100), RingConfig::default());
        let two = RingConfig { n_blocks: 2, block_size: 10 };
        assert_eq!(two.covering(512).block_size, 512);
    }

    #[test]
    fn pattern_shape_errors_surface() {
        let mut config = KitConfig::default();
        config.patterns[1].rows[3].push('1');
        assert!(matches!(
            Kit::build(&config, small_bank()),
            Err(KitError::TrackLength { voice: 3, found: 73, .. })
        ));
    }
}
