// Synthesized stand-ins for the drum recordings, so a kit works with no
// files on disk. Deterministic: same name and rate, same waveform.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::KitError;

pub const BUILTIN_NAMES: [&str; 5] = ["kick", "clap", "snare", "hihat", "perc"];

const PEAK: f32 = 24000.0;

pub fn waveform(name: &str, sample_rate: u32) -> Result<Vec<i16>, KitError> {
    let rate = sample_rate as f32;
    let wave = match name {
        "kick" => kick(rate),
        "clap" => clap(rate),
        "snare" => snare(rate),
        "hihat" => hihat(rate),
        "perc" => perc(rate),
        other => return Err(KitError::UnknownBuiltin(other.to_string())),
    };
    Ok(wave.into_iter().map(|s| (s.clamp(-1.0, 1.0) * PEAK) as i16).collect())
}

fn frames(rate: f32, seconds: f32) -> usize {
    ((rate * seconds) as usize).max(2)
}

fn decay(t: f32, time_constant: f32) -> f32 {
    (-t / time_constant).exp()
}

// pitch drops from 150 Hz to 50 Hz
fn kick(rate: f32) -> Vec<f32> {
    let mut phase = 0.0f32;
    (0..frames(rate, 0.35))
        .map(|i| {
            let t = i as f32 / rate;
            let freq = 50.0 + 100.0 * decay(t, 0.04);
            phase += TAU * freq / rate;
            phase.sin() * decay(t, 0.12)
        })
        .collect()
}

// three quick noise bursts, then a longer tail
fn clap(rate: f32) -> Vec<f32> {
    let mut noise = Pcg32::seed_from_u64(0x0C1A_9F00);
    (0..frames(rate, 0.25))
        .map(|i| {
            let t = i as f32 / rate;
            let burst = (t % 0.011) / 0.011;
            let env = if t < 0.033 {
                decay(burst * 0.011, 0.003)
            } else {
                decay(t - 0.033, 0.06)
            };
            white(&mut noise) * env * 0.8
        })
        .collect()
}

fn snare(rate: f32) -> Vec<f32> {
    let mut noise = Pcg32::seed_from_u64(0x5EA2_E001);
    (0..frames(rate, 0.2))
        .map(|i| {
            let t = i as f32 / rate;
            let body = (TAU * 185.0 * t).sin() * decay(t, 0.03);
            let rattle = white(&mut noise) * decay(t, 0.05);
            0.5 * body + 0.6 * rattle
        })
        .collect()
}

// first difference of noise is a crude high-pass
fn hihat(rate: f32) -> Vec<f32> {
    let mut noise = Pcg32::seed_from_u64(0x41_4A75);
    let mut prev = 0.0;
    (0..frames(rate, 0.06))
        .map(|i| {
            let t = i as f32 / rate;
            let n = white(&mut noise);
            let hp = (n - prev) * 0.5;
            prev = n;
            hp * decay(t, 0.015)
        })
        .collect()
}

fn perc(rate: f32) -> Vec<f32> {
    (0..frames(rate, 0.15))
        .map(|i| {
            let t = i as f32 / rate;
            ((TAU * 820.0 * t).sin() + 0.4 * (TAU * 1230.0 * t).sin()) * decay(t, 0.04) * 0.7
        })
        .collect()
}

// uniform in [-1, 1); each drum seeds its own generator
fn white(rng: &mut Pcg32) -> f32 {
    rng.random_range(-1.0f32..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_renders_and_is_deterministic() {
        for name in BUILTIN_NAMES {
            let a = waveform(name, 44100).unwrap();
            assert!(a.len() > 100, "{name} too short");
            assert!(a.iter().any(|&s| s != 0), "{name} is silent");
            assert_eq!(a, waveform(name, 44100).unwrap());
        }
    }

    #[test]
    fn seeded_noise_repeats_and_stays_in_range() {
        let mut a = Pcg32::seed_from_u64(7);
        let mut b = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            let n = white(&mut a);
            assert!((-1.0..1.0).contains(&n));
            assert_eq!(n, white(&mut b));
        }
    }

    #[test]
    fn length_follows_sample_rate() {
        let slow = waveform("kick", 8000).unwrap();
        let fast = waveform("kick", 48000).unwrap();
        assert!(fast.len() > slow.len() * 5);
        assert!(fast.len() <= slow.len() * 6 + 1);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(waveform("cowbell", 44100), Err(KitError::UnknownBuiltin(_))));
    }
}
