use crate::error::KitError;

/// Frame-level timing derived once from the tempo settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub frames_per_beat: u32,
    pub frames_per_step: u32,
    pub steps_per_bar: usize,
    pub bars: usize,
}

impl Timing {
    /// Integer derivation; truncation drift is accepted, a zero-length step is not.
    pub fn derive(
        sample_rate: u32,
        bpm: u32,
        beats_per_bar: u32,
        steps_per_bar: usize,
        bars: usize,
    ) -> Result<Self, KitError> {
        if bpm == 0 {
            return Err(KitError::ZeroTempo);
        }
        if steps_per_bar == 0 {
            return Err(KitError::ZeroStepsPerBar);
        }
        if bars == 0 {
            return Err(KitError::EmptyArrangement);
        }
        let frames_per_beat = sample_rate as u64 * 60 / bpm as u64;
        let frames_per_step = frames_per_beat * beats_per_bar as u64 / steps_per_bar as u64;
        if frames_per_beat > u32::MAX as u64 || frames_per_step > u32::MAX as u64 {
            return Err(KitError::TimingOverflow { sample_rate, bpm });
        }
        if frames_per_step == 0 {
            return Err(KitError::StepTooShort {
                sample_rate,
                bpm,
                beats_per_bar,
                steps_per_bar,
            });
        }
        Ok(Self {
            frames_per_beat: frames_per_beat as u32,
            frames_per_step: frames_per_step as u32,
            steps_per_bar,
            bars,
        })
    }

    pub fn frames_per_bar(&self) -> u64 {
        self.frames_per_step as u64 * self.steps_per_bar as u64
    }

    pub fn frames_per_loop(&self) -> u64 {
        self.frames_per_bar() * self.bars as u64
    }
}

/// Playback position. The only source of truth for where the sequencer is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transport {
    pub bar: usize,
    pub step: usize,
    pub frame: u32, // frame within step
}

impl Transport {
    pub fn is_step_start(&self) -> bool {
        self.frame == 0
    }

    /// Move one frame forward, wrapping step, bar and the whole arrangement.
    #[inline]
    pub fn advance(&mut self, timing: &Timing) {
        self.frame += 1;
        if self.frame == timing.frames_per_step {
            self.frame = 0;
            self.step += 1;
            if self.step == timing.steps_per_bar {
                self.step = 0;
                self.bar += 1;
                if self.bar == timing.bars {
                    self.bar = 0;
                }
            }
        }
    }
}
