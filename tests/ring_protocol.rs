//! Block ring hand-off: priming, the caught-up no-op, in-order release,
//! and a producer and consumer on separate threads.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use drummer::audio::{BlockRing, Engine, FrameReader, StereoFrame, Transport, render_frames};
use drummer::pipeline::project::RingConfig;
use drummer::{Kit, KitConfig};

const CALLBACK: usize = 512;

fn reference_frames(kit: &Arc<drummer::Kit>, count: usize) -> Vec<StereoFrame> {
    let mut engine = Engine::new(Arc::clone(kit));
    (0..count).map(|_| engine.next_frame()).collect()
}

fn snapshot(consumer: &drummer::BlockConsumer) -> Vec<Vec<StereoFrame>> {
    (0..consumer.n_blocks())
        .map(|i| consumer.block(i).to_frames())
        .collect()
}

#[test]
fn prime_fills_every_block_in_playback_order() {
    let kit = common::test_kit(4, 49);
    let (producer, consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));

    let expected = reference_frames(&kit, 4 * 49);
    for (i, chunk) in expected.chunks(49).enumerate() {
        assert_eq!(consumer.block(i).to_frames(), chunk, "block {i}");
    }
    // last write was block 3, fill wrapped back onto the consumer's block
    assert_eq!(consumer.play_index(), 0);
    assert_eq!(producer.fill_index(), 0);
    assert_eq!(producer.engine().transport().frame, (4 * 49) as u32);
}

#[test]
fn fill_is_a_noop_while_caught_up() {
    let kit = common::test_kit(4, 49);
    let (mut producer, consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));
    let before = snapshot(&consumer);
    let transport = producer.engine().transport();

    for _ in 0..10 {
        assert!(!producer.fill_next_block());
    }
    assert_eq!(producer.fill_available(), 0);
    assert_eq!(producer.fill_index(), 0);
    assert_eq!(producer.engine().transport(), transport);
    assert_eq!(snapshot(&consumer), before);
}

#[test]
fn each_release_frees_exactly_one_block() {
    let kit = common::test_kit(3, 10);
    let (mut producer, mut consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));
    let expected = reference_frames(&kit, 6 * 10);

    consumer.on_block_consumed();
    assert_eq!(consumer.play_index(), 1);
    assert!(producer.fill_next_block());
    assert_eq!(producer.fill_index(), 1);
    assert!(!producer.fill_next_block());
    // block 0 now holds the fourth block's worth of audio; the rest are untouched
    assert_eq!(consumer.block(0).to_frames(), &expected[30..40]);
    assert_eq!(consumer.block(1).to_frames(), &expected[10..20]);

    consumer.on_block_consumed();
    consumer.on_block_consumed();
    assert_eq!(consumer.play_index(), 0);
    assert_eq!(producer.fill_available(), 2);
    assert_eq!(producer.fill_index(), 0);
    assert_eq!(consumer.block(1).to_frames(), &expected[40..50]);
    assert_eq!(consumer.block(2).to_frames(), &expected[50..60]);
}

#[test]
fn never_more_than_n_minus_one_blocks_outstanding() {
    let kit = common::test_kit(5, 16);
    let (mut producer, mut consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));
    for _ in 0..20 {
        consumer.on_block_consumed();
        assert_eq!(producer.fill_available(), 1);
        // after topping up, the producer sits right on the consumer's block
        assert_eq!(producer.fill_index(), consumer.play_index());
    }
}

#[test]
fn offline_render_matches_the_engine_across_loops() {
    // 7-frame blocks don't divide the 1600-frame bar
    let kit = common::test_kit(3, 7);
    let count = kit.timing.frames_per_loop() as usize * 2 + 5;
    assert_eq!(render_frames(Arc::clone(&kit), count), reference_frames(&kit, count));
}

#[test]
fn block_bytes_are_left_then_right_pairs() {
    let kit = common::test_kit(2, 32);
    let (_producer, consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));
    let block = consumer.current_block();
    let bytes = block.to_le_bytes();
    assert_eq!(bytes.len(), 32 * 4);
    for (i, pair) in bytes.chunks_exact(4).enumerate() {
        let frame = block.frame(i);
        assert_eq!(i16::from_le_bytes([pair[0], pair[1]]), frame.left);
        assert_eq!(i16::from_le_bytes([pair[2], pair[3]]), frame.right);
    }
}

#[test]
fn reclaim_rewinds_to_the_top() {
    let kit = common::test_kit(3, 20);
    let (mut producer, mut consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));
    for _ in 0..7 {
        consumer.on_block_consumed();
        producer.fill_available();
    }
    let (ring, engine) = BlockRing::reclaim(producer, consumer);
    assert_eq!(engine.transport(), Transport::default());

    let (producer, consumer) = ring.prime(engine);
    assert_eq!(producer.fill_index(), 0);
    assert_eq!(consumer.play_index(), 0);
    assert_eq!(consumer.block(0).to_frames(), &reference_frames(&kit, 20)[..]);
}

#[test]
fn threaded_consumer_hears_the_same_stream() {
    let kit = common::test_kit(4, 33);
    let total_blocks = 200;
    let (mut producer, consumer) = BlockRing::for_kit(&kit).prime(Engine::new(Arc::clone(&kit)));

    let (filled_tx, filled_rx) = crossbeam_channel::unbounded::<()>();
    let (wake_tx, wake_rx) = crossbeam_channel::unbounded::<()>();
    let block_size = consumer.block_size();

    let drain = thread::spawn(move || {
        let mut reader = FrameReader::new(consumer);
        let mut ready = 4; // primed
        let mut heard = Vec::with_capacity(total_blocks * block_size);
        for consumed in 0..total_blocks {
            // only drain a block the producer has announced
            while ready <= consumed {
                filled_rx.recv().unwrap();
                ready += 1;
            }
            loop {
                let (frame, released) = reader.next_frame();
                heard.push(frame);
                if released {
                    break;
                }
            }
            wake_tx.send(()).unwrap();
        }
        heard
    });

    let mut filled = 4;
    while filled < total_blocks {
        while producer.fill_next_block() {
            filled += 1;
            filled_tx.send(()).unwrap();
        }
        let _ = wake_rx.recv_timeout(Duration::from_millis(10));
    }

    let heard = drain.join().unwrap();
    assert_eq!(heard, reference_frames(&kit, total_blocks * block_size));
}

/// Read `CALLBACK` frames at a time like a host audio callback, topping the
/// ring up only between callbacks. Returns the frames and which were silence
/// played for an unfilled block.
fn drain_like_a_host(kit: &Arc<Kit>, ring: RingConfig, callbacks: usize) -> (Vec<StereoFrame>, Vec<bool>) {
    let (mut producer, consumer) = BlockRing::new(ring).prime(Engine::new(Arc::clone(kit)));
    let mut reader = FrameReader::new(consumer);
    let mut frames = Vec::with_capacity(callbacks * CALLBACK);
    let mut silent = Vec::with_capacity(callbacks * CALLBACK);
    for _ in 0..callbacks {
        for _ in 0..CALLBACK {
            let before = reader.underruns();
            let (frame, _) = reader.next_frame();
            frames.push(frame);
            silent.push(reader.underruns() > before);
        }
        producer.fill_available();
    }
    (frames, silent)
}

fn stock_kit() -> Arc<Kit> {
    Arc::new(Kit::load(&KitConfig::default(), std::path::Path::new(".")).unwrap())
}

#[test]
fn ring_covering_the_callback_plays_the_engine_stream_unbroken() {
    let kit = stock_kit();
    let ring = kit.ring.covering(2 * CALLBACK);
    let (frames, silent) = drain_like_a_host(&kit, ring, 8);
    assert!(silent.iter().all(|s| !s));
    assert_eq!(frames, reference_frames(&kit, 8 * CALLBACK));
}

#[test]
fn short_ring_plays_silence_instead_of_stale_blocks() {
    // 4 x 49 frames is far less than one callback
    let kit = stock_kit();
    let (frames, silent) = drain_like_a_host(&kit, kit.ring, 8);

    let gaps = silent.iter().filter(|s| **s).count();
    assert_eq!(gaps, 8 * (CALLBACK - 4 * 49));
    for (frame, _) in frames.iter().zip(&silent).filter(|(_, s)| **s) {
        assert_eq!(*frame, StereoFrame::zero());
    }
    // what did play is the engine stream in order, nothing repeated
    let heard: Vec<StereoFrame> = frames
        .iter()
        .zip(&silent)
        .filter(|(_, s)| !**s)
        .map(|(f, _)| *f)
        .collect();
    assert_eq!(heard, reference_frames(&kit, heard.len()));
}
