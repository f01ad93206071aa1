#![allow(dead_code)]

use std::sync::Arc;

use drummer::audio::SampleBank;
use drummer::pipeline::project::{PatternConfig, RingConfig, TempoConfig, VoiceConfig};
use drummer::shared::NUM_VOICES;
use drummer::{Kit, KitConfig};

pub const STEPS: usize = 8;

/// 800 Hz, 120 BPM, 4 beats over 8 steps: 200 frames per step, 1600 per bar.
/// Two patterns over a three bar loop, every voice busy.
pub fn test_config(n_blocks: usize, block_size: usize) -> KitConfig {
    let rows = |rows: [&str; NUM_VOICES]| rows.iter().map(|r| r.to_string()).collect();
    KitConfig {
        tempo: TempoConfig {
            sample_rate: 800,
            bpm: 120,
            beats_per_bar: 4,
            steps_per_bar: STEPS,
        },
        ring: RingConfig { n_blocks, block_size },
        narrowing: Default::default(),
        samples: vec![],
        voices: vec![
            voice(16, 192, Some("low")),
            voice(8, 40, Some("mid")),
            voice(24, 80, Some("high")),
            voice(0, 30, Some("mid")),
            voice(32, 30, Some("long")),
            voice(16, 10, None),
        ],
        patterns: vec![
            PatternConfig {
                name: "a".into(),
                rows: rows(["9   1   ", "  3   3 ", "11111111", "    5   ", "1       ", "1   1   "]),
            },
            PatternConfig {
                name: "b".into(),
                rows: rows(["1 1 1 1 ", "        ", " 2 2 2 2", "9       ", "        ", "        "]),
            },
        ],
        arrangement: vec![0, 1, 0],
    }
}

fn voice(pan: u8, volume: u16, sample: Option<&str>) -> VoiceConfig {
    VoiceConfig {
        pan,
        volume,
        sample: sample.map(str::to_string),
    }
}

pub fn test_bank() -> SampleBank {
    let mut bank = SampleBank::new();
    let ramp: Vec<i16> = (0..150).map(|i| (i * 200 - 15000) as i16).collect();
    bank.insert("low", &ramp).unwrap();
    bank.insert("mid", &[9000, -9000, 4500, -4500, 2000]).unwrap();
    bank.insert("high", &[3000; 40]).unwrap();
    // longer than a bar; still sounding when the loop wraps and retriggers it
    let long: Vec<i16> = (0..2000).map(|i| ((i % 50) * 400 - 10000) as i16).collect();
    bank.insert("long", &long).unwrap();
    bank
}

pub fn test_kit(n_blocks: usize, block_size: usize) -> Arc<Kit> {
    Arc::new(Kit::build(&test_config(n_blocks, block_size), test_bank()).unwrap())
}
