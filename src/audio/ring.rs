//! The block ring between the sequencer and whatever drains the audio.
//!
//! A fixed arena of `n_blocks` blocks, each `block_size` packed stereo frames.
//! Two running block counts, each with a single writer:
//!
//! - `filled`: blocks written so far. Written only by [`BlockProducer`];
//!   `fill_index` is `filled % n_blocks`.
//! - `consumed`: blocks released so far. Written only by
//!   [`BlockConsumer::on_block_consumed`], which may run preemptively on
//!   another thread; `play_index` is `consumed % n_blocks`.
//!
//! The producer never writes the block the consumer is draining, and the
//! consumer never enters a block the producer has not finished. Filling
//! happens in two phases: [`BlockRing::prime`] fills every block before
//! playback starts, then [`BlockProducer::fill_next_block`] tops up one block
//! at a time and is a no-op whenever the ring is full.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::engine::Engine;
use super::frame::StereoFrame;
use crate::pipeline::project::{Kit, RingConfig};

struct Shared {
    blocks: Box<[Box<[AtomicU32]>]>,
    filled: AtomicU64,
    consumed: AtomicU64,
}

impl Shared {
    fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn index(&self, count: u64) -> usize {
        (count % self.blocks.len() as u64) as usize
    }

    fn block(&self, index: usize) -> BlockView<'_> {
        BlockView {
            words: &self.blocks[index],
        }
    }
}

/// A ring that has not been primed yet. Nothing can be consumed from it.
pub struct BlockRing {
    shared: Arc<Shared>,
}

impl BlockRing {
    /// `config` must already be validated: at least two blocks, non-empty blocks.
    pub fn new(config: RingConfig) -> Self {
        assert!(config.n_blocks >= 2, "block ring needs at least two blocks");
        assert!(config.block_size > 0, "blocks must hold at least one frame");
        let blocks: Box<[Box<[AtomicU32]>]> = (0..config.n_blocks)
            .map(|_| {
                (0..config.block_size)
                    .map(|_| AtomicU32::new(0))
                    .collect::<Box<[_]>>()
            })
            .collect();
        Self {
            shared: Arc::new(Shared {
                blocks,
                filled: AtomicU64::new(0),
                consumed: AtomicU64::new(0),
            }),
        }
    }

    pub fn for_kit(kit: &Kit) -> Self {
        Self::new(kit.ring)
    }

    pub fn n_blocks(&self) -> usize {
        self.shared.n_blocks()
    }

    /// Fill every block in playback order, starting at the consumer's block,
    /// and split the ring into its two halves. `fill_index` ends up back on
    /// `play_index`, so the producer waits for the first release.
    pub fn prime(self, mut engine: Engine) -> (BlockProducer, BlockConsumer) {
        let shared = self.shared;
        let n = shared.n_blocks();
        let start = shared.consumed.load(Ordering::Acquire);
        let mut scratch = vec![StereoFrame::zero(); shared.blocks[0].len()];
        for offset in 0..n as u64 {
            write_block(&shared.blocks[shared.index(start + offset)], &mut engine, &mut scratch);
        }
        shared.filled.store(start + n as u64, Ordering::Release);
        tracing::debug!(
            blocks = n,
            block_size = scratch.len(),
            start = shared.index(start),
            "block ring primed"
        );

        let producer = BlockProducer {
            shared: Arc::clone(&shared),
            engine,
            scratch,
        };
        let consumer = BlockConsumer { shared };
        (producer, consumer)
    }

    /// Take both halves back, rewinding the cursors and the engine to the top.
    /// The returned ring must be primed again before playback.
    pub fn reclaim(producer: BlockProducer, consumer: BlockConsumer) -> (BlockRing, Engine) {
        assert!(
            Arc::ptr_eq(&producer.shared, &consumer.shared),
            "producer and consumer belong to different rings"
        );
        let BlockProducer { shared, mut engine, .. } = producer;
        drop(consumer);
        shared.filled.store(0, Ordering::Release);
        shared.consumed.store(0, Ordering::Release);
        engine.reset();
        tracing::debug!("block ring reclaimed");
        (BlockRing { shared }, engine)
    }
}

#[inline]
fn write_block(block: &[AtomicU32], engine: &mut Engine, scratch: &mut [StereoFrame]) {
    engine.render_block(scratch);
    for (slot, frame) in block.iter().zip(scratch.iter()) {
        slot.store(frame.pack(), Ordering::Relaxed);
    }
}

/// The filling half. Owns the engine.
pub struct BlockProducer {
    shared: Arc<Shared>,
    engine: Engine,
    scratch: Vec<StereoFrame>, // one block, rendered before it is published
}

impl BlockProducer {
    /// Synthesize the next block unless the ring is full. Returns whether a
    /// block was written; safe to call as often as you like.
    pub fn fill_next_block(&mut self) -> bool {
        let filled = self.shared.filled.load(Ordering::Relaxed);
        let consumed = self.shared.consumed.load(Ordering::Acquire);
        // n outstanding means the next slot is the block being drained
        if filled - consumed >= self.shared.n_blocks() as u64 {
            return false;
        }
        let index = self.shared.index(filled);
        write_block(&self.shared.blocks[index], &mut self.engine, &mut self.scratch);
        self.shared.filled.store(filled + 1, Ordering::Release);
        true
    }

    /// Fill until the ring is full; returns how many blocks were written.
    pub fn fill_available(&mut self) -> usize {
        let mut filled = 0;
        while self.fill_next_block() {
            filled += 1;
        }
        filled
    }

    pub fn fill_index(&self) -> usize {
        self.shared.index(self.shared.filled.load(Ordering::Relaxed))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// The draining half, handed to the transport.
pub struct BlockConsumer {
    shared: Arc<Shared>,
}

impl BlockConsumer {
    pub fn play_index(&self) -> usize {
        self.shared.index(self.shared.consumed.load(Ordering::Relaxed))
    }

    pub fn fill_index(&self) -> usize {
        self.shared.index(self.shared.filled.load(Ordering::Acquire))
    }

    pub fn n_blocks(&self) -> usize {
        self.shared.n_blocks()
    }

    pub fn block_size(&self) -> usize {
        self.shared.blocks[0].len()
    }

    /// Whether the block at `play_index` has been written since it was last
    /// released. Frames of a block that is not ready are stale.
    #[inline]
    pub fn is_ready(&self) -> bool {
        let consumed = self.shared.consumed.load(Ordering::Relaxed);
        self.shared.filled.load(Ordering::Acquire) > consumed
    }

    /// The block being drained right now.
    pub fn current_block(&self) -> BlockView<'_> {
        self.shared.block(self.play_index())
    }

    pub fn block(&self, index: usize) -> BlockView<'_> {
        self.shared.block(index)
    }

    /// Call exactly once per fully drained block, in order. Releasing a block
    /// that was never filled does nothing and returns false.
    pub fn on_block_consumed(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let consumed = self.shared.consumed.load(Ordering::Relaxed);
        self.shared.consumed.store(consumed + 1, Ordering::Release);
        true
    }
}

/// Read access to one block.
#[derive(Clone, Copy)]
pub struct BlockView<'a> {
    words: &'a [AtomicU32],
}

impl<'a> BlockView<'a> {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn frame(&self, index: usize) -> StereoFrame {
        StereoFrame::unpack(self.words[index].load(Ordering::Relaxed))
    }

    pub fn iter(&self) -> impl Iterator<Item = StereoFrame> + 'a {
        self.words
            .iter()
            .map(|w| StereoFrame::unpack(w.load(Ordering::Relaxed)))
    }

    pub fn to_frames(&self) -> Vec<StereoFrame> {
        self.iter().collect()
    }

    /// Contiguous little-endian left/right i16 pairs.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(StereoFrame::to_le_bytes).collect()
    }
}

/// Streams frames out of the ring one at a time and releases each block as
/// soon as its last frame has been read. When the producer has fallen behind
/// it plays silence instead of a stale block and waits on the same block.
pub struct FrameReader {
    consumer: BlockConsumer,
    pos: usize,
    underruns: u64,
}

impl FrameReader {
    pub fn new(consumer: BlockConsumer) -> Self {
        Self {
            consumer,
            pos: 0,
            underruns: 0,
        }
    }

    /// Next frame, plus whether reading it released a block back to the producer.
    #[inline]
    pub fn next_frame(&mut self) -> (StereoFrame, bool) {
        if self.pos == 0 && !self.consumer.is_ready() {
            self.underruns += 1;
            return (StereoFrame::zero(), false);
        }
        let frame = self.consumer.current_block().frame(self.pos);
        self.pos += 1;
        if self.pos == self.consumer.block_size() {
            self.pos = 0;
            self.consumer.on_block_consumed();
            return (frame, true);
        }
        (frame, false)
    }

    /// Silent frames played so far because the next block was not ready.
    pub fn underruns(&self) -> u64 {
        self.underruns
    }
}
