use super::sample_buffer::SampleBank;
use super::sample_id::SampleId;
use crate::pipeline::pattern::Intensity;
use crate::shared::PAN_FULL;

/// The fixed part of a voice: where it sits, how loud it is, what it plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceSetup {
    pub pan: u8, // 0..=32, share sent to the left channel
    pub volume: u16,
    pub sample: SampleId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voice {
    pub pan: u8,
    pub volume: u16,
    pub sample: SampleId,
    pub cursor: usize, // 0 = idle
    pub emphasis: i32,
}

impl Voice {
    pub fn new(setup: VoiceSetup) -> Self {
        Self {
            pan: setup.pan,
            volume: setup.volume,
            sample: setup.sample,
            cursor: 0,
            emphasis: 0,
        }
    }

    /// Restart from the first audible position; position 0 is the idle sample.
    pub fn trigger(&mut self, intensity: Intensity) {
        self.cursor = 1;
        self.emphasis = intensity.emphasis();
    }

    pub fn is_active(&self) -> bool {
        self.cursor != 0
    }

    #[inline]
    pub fn gain(&self) -> i64 {
        self.emphasis as i64 + self.volume as i64
    }

    #[inline]
    pub fn pan_weights(&self) -> (i64, i64) {
        (self.pan as i64, (PAN_FULL - self.pan) as i64)
    }

    /// Read the amplitude under the cursor, then move on. Reaching the end
    /// drops the voice back to idle; there is no looping.
    #[inline]
    pub fn advance(&mut self, bank: &SampleBank) -> i16 {
        if self.sample.is_idle() {
            // a trigger on a voice with nothing assigned still runs its cursor out
            self.cursor = 0;
            return 0;
        }
        let sample = bank.get(self.sample);
        let amplitude = sample.amplitude(self.cursor);
        if self.cursor != 0 {
            self.cursor += 1;
            if self.cursor >= sample.len() {
                self.cursor = 0;
            }
        }
        amplitude
    }
}
