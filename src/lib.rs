//! A fixed-function drum machine: a step sequencer replays short percussion
//! waveforms on six voices, mixes them into 16-bit stereo frames, and hands
//! finished blocks to a consumer through a lock-free block ring.

pub mod audio;
pub mod audio_api;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod shared;

pub use audio::{BlockConsumer, BlockProducer, BlockRing, Engine, StereoFrame};
pub use error::KitError;
pub use pipeline::project::{Kit, KitConfig, Overrides};
