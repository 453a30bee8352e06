//! Scoped release of exclusively-owned capabilities.
//!
//! The video source and the landmark tracker hold external resources. The
//! session driver wraps them in a [`ReleaseGuard`] so `release()` runs
//! exactly once on every exit path: normal completion, `?` early return, or
//! unwinding.

use std::ops::{Deref, DerefMut};

/// A capability that owns an external resource.
pub trait Release {
    /// Free the underlying resource. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Borrowing guard that releases the wrapped capability when dropped.
pub struct ReleaseGuard<'a, T: Release + ?Sized> {
    inner: &'a mut T,
    name: &'static str,
}

impl<'a, T: Release + ?Sized> ReleaseGuard<'a, T> {
    pub fn new(inner: &'a mut T, name: &'static str) -> Self {
        Self { inner, name }
    }
}

impl<T: Release + ?Sized> Deref for ReleaseGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner
    }
}

impl<T: Release + ?Sized> DerefMut for ReleaseGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner
    }
}

impl<T: Release + ?Sized> Drop for ReleaseGuard<'_, T> {
    fn drop(&mut self) {
        tracing::debug!(resource = self.name, "Releasing");
        self.inner.release();
    }
}
