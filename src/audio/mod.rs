use std::time::Duration;

use anyhow::Context;
use cpal::Sample as CpalSample;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::PlaybackEvent;
use crate::shared::HOST_CALLBACK_FRAMES;

mod engine;
mod export;
mod frame;
mod ring;
mod sample_buffer;
mod sample_id;
mod transport;
mod voice;

pub use engine::{Engine, Mix, Narrowing};
pub use export::{frames_for_bars, render_frames, write_wav};
pub use frame::StereoFrame;
pub use ring::{BlockConsumer, BlockProducer, BlockRing, BlockView, FrameReader};
pub use sample_buffer::{Sample, SampleBank, load_wav};
pub use sample_id::SampleId;
pub use transport::{Timing, Transport};
pub use voice::{Voice, VoiceSetup};

/// A running host output stream draining the block ring.
pub struct PlaybackHandle {
    events: Receiver<PlaybackEvent>,
    _output_stream: cpal::Stream,
}

impl PlaybackHandle {
    /// Block until the stream reports something or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Option<PlaybackEvent> {
        self.events.recv_timeout(timeout).ok()
    }
}

/// The callback size to ask the default output device for, when it reports a
/// range. `None` means the host picks and we can only guess.
pub fn output_callback_frames() -> anyhow::Result<Option<u32>> {
    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;
    Ok(match *supported.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } => {
            Some(HOST_CALLBACK_FRAMES.clamp(min, max.max(min)))
        }
        cpal::SupportedBufferSize::Unknown => None,
    })
}

/// Open the default output device at `sample_rate` and start draining `consumer`.
/// `callback_frames` pins the host buffer size; `None` leaves it to the host.
pub fn start_playback(
    consumer: BlockConsumer,
    sample_rate: u32,
    callback_frames: Option<u32>,
) -> anyhow::Result<PlaybackHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<PlaybackEvent>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;

    let channels = supported.channels() as usize;
    let sample_format = supported.sample_format();
    let mut config: cpal::StreamConfig = supported.into();
    config.sample_rate = sample_rate;
    if let Some(frames) = callback_frames {
        config.buffer_size = cpal::BufferSize::Fixed(frames);
    }

    let output_stream = match sample_format {
        cpal::SampleFormat::F32 => build_output_stream::<f32>(&device, &config, consumer, tx, channels)?,
        cpal::SampleFormat::I16 => build_output_stream::<i16>(&device, &config, consumer, tx, channels)?,
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 and i16 supported for now)"),
    };
    output_stream.play().context("failed to play output stream")?;
    tracing::info!(sample_rate, channels, ?sample_format, "output stream started");

    Ok(PlaybackHandle {
        events: rx,
        _output_stream: output_stream,
    })
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    consumer: BlockConsumer,
    tx: Sender<PlaybackEvent>,
    channels: usize,
) -> anyhow::Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let mut reader = FrameReader::new(consumer);
    let err_tx = tx.clone();

    let err_fn = move |err: cpal::StreamError| {
        tracing::warn!("audio output stream error: {err}");
        let _ = err_tx.try_send(PlaybackEvent::StreamError(err.to_string()));
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
            let underruns = reader.underruns();
            for out in data.chunks_mut(channels) {
                let (frame, released) = reader.next_frame();
                if released {
                    // wake the producer; a full channel just means it is already awake
                    let _ = tx.try_send(PlaybackEvent::BlockConsumed);
                }
                write_frame(out, frame);
            }
            let silent = reader.underruns() - underruns;
            if silent > 0 {
                let _ = tx.try_send(PlaybackEvent::Underrun { frames: silent });
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn write_frame<T: CpalSample + cpal::FromSample<i16>>(out: &mut [T], frame: StereoFrame) {
    match out {
        [mono] => {
            let mid = (frame.left as i32 + frame.right as i32) / 2;
            *mono = T::from_sample(mid as i16);
        }
        [left, right, rest @ ..] => {
            *left = T::from_sample(frame.left);
            *right = T::from_sample(frame.right);
            for s in rest {
                *s = T::EQUILIBRIUM;
            }
        }
        [] => {}
    }
}
