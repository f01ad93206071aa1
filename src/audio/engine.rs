use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::frame::StereoFrame;
use super::transport::Transport;
use super::voice::Voice;
use crate::pipeline::project::Kit;
use crate::shared::{NUM_VOICES, OUTPUT_SHIFT};

/// How a mixed channel is squeezed into 16 bits after the output shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Narrowing {
    /// Clamp to the i16 range.
    #[default]
    Saturate,
    /// Keep the low 16 bits, wrapping on overflow like the historical firmware.
    Wrap,
}

impl Narrowing {
    #[inline]
    pub fn narrow(self, acc: i64) -> i16 {
        let shifted = acc >> OUTPUT_SHIFT;
        match self {
            Narrowing::Saturate => shifted.clamp(i16::MIN as i64, i16::MAX as i64) as i16,
            Narrowing::Wrap => shifted as i16,
        }
    }
}

/// Full-width channel sums before narrowing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mix {
    pub left: i64,
    pub right: i64,
}

impl Mix {
    #[inline]
    fn add(&mut self, voice: &Voice, amplitude: i16) {
        let weighted = voice.gain() * amplitude as i64;
        let (left, right) = voice.pan_weights();
        self.left += weighted * left;
        self.right += weighted * right;
    }

    #[inline]
    pub fn narrow(self, narrowing: Narrowing) -> StereoFrame {
        StereoFrame {
            left: narrowing.narrow(self.left),
            right: narrowing.narrow(self.right),
        }
    }
}

/// The sequencer and mixer. Owns the transport and the six voices; the kit
/// it plays from is shared and never changes.
pub struct Engine {
    kit: Arc<Kit>,
    transport: Transport,
    voices: [Voice; NUM_VOICES], // fixed pool of voices
}

impl Engine {
    pub fn new(kit: Arc<Kit>) -> Self {
        let voices = kit.voices.map(Voice::new);
        Self {
            kit,
            transport: Transport::default(),
            voices,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn voices(&self) -> &[Voice; NUM_VOICES] {
        &self.voices
    }

    /// Back to the top of the arrangement with every voice idle.
    pub fn reset(&mut self) {
        self.transport = Transport::default();
        self.voices = self.kit.voices.map(Voice::new);
    }

    /// Produce one frame: fire triggers on a step boundary, read and advance
    /// every voice, mix, then move the transport on.
    #[inline]
    pub fn next_frame(&mut self) -> StereoFrame {
        self.next_mix().narrow(self.kit.narrowing)
    }

    /// Same as `next_frame` but returns the full-width sums.
    pub fn next_mix(&mut self) -> Mix {
        if self.transport.is_step_start() {
            self.fire_triggers();
        }

        let mut mix = Mix::default();
        for voice in self.voices.iter_mut() {
            let amplitude = voice.advance(&self.kit.bank);
            mix.add(voice, amplitude);
        }

        self.transport.advance(&self.kit.timing);
        mix
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = self.next_frame();
        }
    }

    fn fire_triggers(&mut self) {
        let pattern = &self.kit.patterns[self.kit.arrangement.pattern_at(self.transport.bar)];
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if let Some(intensity) = pattern.cell(index, self.transport.step) {
                voice.trigger(intensity);
            }
        }
    }
}
