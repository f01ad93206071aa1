// The smallest unit of audio; one stereo frame
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StereoFrame {
    pub left: i16,
    pub right: i16,
}

impl StereoFrame {
    /// Silence, played when the ring has nothing ready.
    pub const fn zero() -> Self {
        Self { left: 0, right: 0 }
    }

    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    // One 32-bit word per frame. Left sits in the low half so the little-endian
    // byte order is left then right, same as the i16 pairs the transport expects.
    pub fn pack(self) -> u32 {
        (self.left as u16 as u32) | ((self.right as u16 as u32) << 16)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            left: word as u16 as i16,
            right: (word >> 16) as u16 as i16,
        }
    }

    /// Stable wire layout: left then right, each a little-endian i16.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.pack().to_le_bytes()
    }
}
