use std::path::Path;

use super::sample_id::SampleId;
use crate::error::KitError;

/// An immutable mono waveform. Position 0 is the idle value a voice rests on;
/// playback starts at position 1.
#[derive(Clone, Debug)]
pub struct Sample {
    pub name: String,
    data: Box<[i16]>, // the audio data, idle value first
}

impl Sample {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn amplitude(&self, cursor: usize) -> i16 {
        self.data.get(cursor).copied().unwrap_or(0)
    }

    pub fn data(&self) -> &[i16] {
        &self.data
    }
}

/// The fixed set of waveforms the voices play from. Read-only once the kit is built.
#[derive(Clone, Debug)]
pub struct SampleBank {
    samples: Vec<Sample>,
}

impl Default for SampleBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBank {
    pub const IDLE_NAME: &'static str = "idle";

    pub fn new() -> Self {
        Self {
            samples: vec![Sample {
                name: Self::IDLE_NAME.to_string(),
                data: Box::new([0]),
            }],
        }
    }

    /// Add a waveform. An idle value is put in front so cursor 1 is the first audible sample.
    pub fn insert(&mut self, name: &str, waveform: &[i16]) -> Result<SampleId, KitError> {
        if waveform.is_empty() {
            return Err(KitError::EmptySample(name.to_string()));
        }
        if self.lookup(name).is_some() {
            return Err(KitError::DuplicateSample(name.to_string()));
        }
        let mut data = Vec::with_capacity(waveform.len() + 1);
        data.push(0);
        data.extend_from_slice(waveform);
        self.samples.push(Sample {
            name: name.to_string(),
            data: data.into_boxed_slice(),
        });
        Ok(SampleId(self.samples.len() - 1))
    }

    pub fn lookup(&self, name: &str) -> Option<SampleId> {
        self.samples.iter().position(|s| s.name == name).map(SampleId)
    }

    /// Panics on an id this bank did not hand out; kits are validated before use.
    #[inline]
    pub fn get(&self, id: SampleId) -> &Sample {
        &self.samples[id.0]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SampleId, &Sample)> {
        self.samples.iter().enumerate().map(|(i, s)| (SampleId(i), s))
    }
}

/// Decode a WAV file into a mono i16 waveform at `target_rate`.
pub fn load_wav(path: &Path, target_rate: u32) -> Result<Vec<i16>, KitError> {
    let wav_err = |source| KitError::Wav {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    // Read the samples from the WAV file, scaled to the i16 range
    let samples: Vec<i32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|x| (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i32))
            .collect::<Result<Vec<_>, _>>()
            .map_err(wav_err)?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample as i32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| if bits > 16 { x >> (bits - 16) } else { x << (16 - bits) }))
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_err)?
        }
    };

    let mono: Vec<i16> = samples
        .chunks_exact(channels)
        .map(|c| (c.iter().sum::<i32>() / channels as i32) as i16) // downmix
        .collect();

    Ok(resample_linear(&mono, spec.sample_rate, target_rate))
}

fn resample_linear(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        // fractional position in the source buffer
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = src_pos - idx as f64;
        if idx >= samples.len() - 1 {
            out.push(samples[samples.len() - 1]);
        } else {
            let a = samples[idx] as f64;
            let b = samples[idx + 1] as f64;
            out.push((a * (1.0 - frac) + b * frac).round() as i16);
        }
    }
    out
}
