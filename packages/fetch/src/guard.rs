//! Single-flight export guard.
//!
//! At most one fetch session may run at a time in a given caller context.
//! Acquisition hands out an RAII [`ExportPermit`] so release happens on
//! every exit path, including early returns and panics.

use std::sync::atomic::{AtomicBool, Ordering};

/// A second export was requested while one is already in flight.
#[derive(Debug, thiserror::Error)]
#[error("an export is already in progress")]
pub struct GuardBusy;

/// Mutual-exclusion flag preventing concurrent fetch sessions.
#[derive(Debug, Default)]
pub struct ExportGuard {
    in_flight: AtomicBool,
}

impl ExportGuard {
    /// Creates a released guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Attempts to claim the guard for one fetch session.
    ///
    /// # Errors
    ///
    /// Returns [`GuardBusy`] without changing any state if the guard is
    /// already held.
    pub fn try_acquire(&self) -> Result<ExportPermit<'_>, GuardBusy> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(ExportPermit { guard: self })
        } else {
            Err(GuardBusy)
        }
    }

    /// Returns `true` while a session holds the guard.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof of exclusive export access. Dropping it releases the guard.
#[derive(Debug)]
pub struct ExportPermit<'a> {
    guard: &'a ExportGuard,
}

impl Drop for ExportPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_held() {
        let guard = ExportGuard::new();
        let permit = guard.try_acquire().unwrap();
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_err());
        drop(permit);
    }

    #[test]
    fn dropping_the_permit_releases_the_guard() {
        let guard = ExportGuard::new();
        drop(guard.try_acquire().unwrap());
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_ok());
    }
}
