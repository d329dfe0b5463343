use portable_atomic::{AtomicBool, Ordering};

/// Edge flag shared between the edge interrupt and the stepping loop
///
/// The interrupt side calls [`set`](Self::set); the poller reads and clears
/// with [`take`](Self::take). Only one latch exists per switch.
#[derive(Debug, Default)]
pub struct EdgeLatch {
    fired: AtomicBool,
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Record an edge
    pub fn set(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Read and clear
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears() {
        let latch = EdgeLatch::new();
        assert!(!latch.take());
        latch.set();
        latch.set();
        assert!(latch.take());
        assert!(!latch.take());
    }
}
