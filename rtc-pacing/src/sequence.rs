//! Transport-wide sequence number allocation.

/// Wrapping 16-bit counter shared by every packet carrying a transport-wide
/// sequence number.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct SequenceNumberAllocator {
    current: u16,
}

impl SequenceNumberAllocator {
    pub(crate) fn new(current: u16) -> Self {
        Self { current }
    }

    /// Set the counter so that the next allocation returns `value + 1`.
    pub(crate) fn set(&mut self, value: u16) {
        self.current = value;
    }

    pub(crate) fn current(&self) -> u16 {
        self.current
    }

    pub(crate) fn allocate(&mut self) -> u16 {
        self.current = self.current.wrapping_add(1);
        self.current
    }
}
