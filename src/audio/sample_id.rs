/// Index into the `SampleBank`. Slot 0 is always the reserved idle sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SampleId(pub usize);

impl SampleId {
    pub const IDLE: SampleId = SampleId(0);

    pub fn is_idle(self) -> bool {
        self == Self::IDLE
    }
}
