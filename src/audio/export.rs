use std::path::Path;
use std::sync::Arc;

use super::engine::Engine;
use super::frame::StereoFrame;
use super::ring::{BlockRing, FrameReader};
use crate::pipeline::project::Kit;

/// Render `frame_count` frames through the block ring, draining blocks in
/// order and refilling after every release, exactly like a live consumer.
pub fn render_frames(kit: Arc<Kit>, frame_count: usize) -> Vec<StereoFrame> {
    let ring = BlockRing::for_kit(&kit);
    let (mut producer, consumer) = ring.prime(Engine::new(kit));
    let mut reader = FrameReader::new(consumer);

    let mut frames = Vec::with_capacity(frame_count);
    while frames.len() < frame_count {
        let (frame, released) = reader.next_frame();
        frames.push(frame);
        if released {
            producer.fill_next_block();
        }
    }
    frames
}

/// Number of frames in `bars` bars of this kit.
pub fn frames_for_bars(kit: &Kit, bars: usize) -> usize {
    (kit.timing.frames_per_bar() * bars as u64) as usize
}

/// Write 16-bit stereo PCM.
pub fn write_wav(path: &Path, frames: &[StereoFrame], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for frame in frames {
        writer.write_sample(frame.left)?;
        writer.write_sample(frame.right)?;
    }
    writer.finalize()
}
