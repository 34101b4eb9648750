//! Opaque port handles.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

/// Largest handle value; keeps every handle representable as a positive `i32`.
pub const MAX_HANDLE: u32 = i32::MAX as u32;

/// Integer handle to an open port session.
///
/// Always positive. Zero and negative values are reserved as failure
/// sentinels by the integer facade and never name a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PortHandle(NonZeroU32);

impl PortHandle {
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The handle as the integer callers pass around.
    pub fn raw(self) -> i32 {
        // Allocation never exceeds MAX_HANDLE.
        self.0.get() as i32
    }

    /// Rebuild a handle from its integer form. Zero and negatives are rejected.
    pub fn from_raw(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().and_then(NonZeroU32::new).map(Self)
    }
}

impl fmt::Display for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing handles starting at 1. Values are never reused.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: AtomicU32,
}

impl HandleAllocator {
    pub(crate) fn new() -> Self {
        Self::starting_at(1)
    }

    pub(crate) fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first.max(1)),
        }
    }

    /// `None` once the handle space is exhausted.
    pub(crate) fn allocate(&self) -> Option<PortHandle> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n <= MAX_HANDLE).then_some(n + 1)
            })
            .ok()
            .and_then(NonZeroU32::new)
            .map(PortHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip_rejects_sentinels() {
        assert!(PortHandle::from_raw(0).is_none());
        assert!(PortHandle::from_raw(-1).is_none());
        let h = PortHandle::from_raw(42).unwrap();
        assert_eq!(h.raw(), 42);
        assert_eq!(h.to_string(), "#42");
    }

    #[test]
    fn test_allocation_is_strictly_increasing() {
        let alloc = HandleAllocator::new();
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        assert_eq!(a.get(), 1);
        assert!(b > a);
    }

    #[test]
    fn test_exhaustion() {
        let alloc = HandleAllocator::starting_at(MAX_HANDLE);
        let last = alloc.allocate().unwrap();
        assert_eq!(last.raw(), i32::MAX);
        assert!(alloc.allocate().is_none());
        assert!(alloc.allocate().is_none());
    }
}
