// Fixed constants of the machine and the defaults of the built-in kit.

/// Number of concurrent playback voices; also the number of rows in every pattern.
pub const NUM_VOICES: usize = 6;

/// Pan weights split 32 ways: `pan` to the left channel, `PAN_FULL - pan` to the right.
pub const PAN_FULL: u8 = 32;

/// Volume boost per intensity level above 1.
pub const EMPHASIS_UNIT: i32 = 12;

/// Mixed accumulators are shifted down by this many bits before narrowing to i16.
pub const OUTPUT_SHIFT: u32 = 15;

// The stock I2S clock: 125 MHz / 44.25 / 32 bits / 2 channels.
pub const DEFAULT_SAMPLE_RATE: u32 = 44138;
pub const DEFAULT_BPM: u32 = 155;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const DEFAULT_STEPS_PER_BAR: usize = 72;
pub const DEFAULT_N_BLOCKS: usize = 4;
pub const DEFAULT_BLOCK_SIZE: usize = 49;

/// Host callback size `play` plans the ring around when the device does not say.
pub const HOST_CALLBACK_FRAMES: u32 = 1024;
