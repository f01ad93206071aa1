// What the host playback side reports back to the producer loop.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    // A block was fully drained and handed back; there is room to fill.
    BlockConsumed,

    // The callback ran ahead of the producer and played this many silent frames.
    Underrun { frames: u64 },

    // The device reported a problem. Playback may continue, but the
    // producer loop should know about it.
    StreamError(String),
}
