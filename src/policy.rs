//! Delete and copy policies.
//!
//! A [`ValueBox`](crate::ValueBox) carries one value of each policy inline.
//! The pair travels with the container on copy, move, and swap; a stateless
//! pair is zero-sized and keeps the container pointer-sized. Policies with
//! state (counters, arena handles) grow the container by exactly that state.
//!
//! The container never invokes a policy while empty, so implementations do
//! not need to handle a null resource.

use core::ptr::NonNull;

use crate::poly_clone::{clone_boxed, PolyClone};

/// Destroys and frees an owned resource.
///
/// # Safety
///
/// Implementors must release exactly the pointers the paired container can
/// hand them:
///
/// - allocations produced by this crate's safe constructors and value-based
///   mutators, which are `Box` allocations from the global allocator;
/// - allocations produced by the paired [`CopyPolicy::copy`];
/// - pointers adopted through the `unsafe` raw constructors, whose callers
///   vouch for compatibility.
///
/// `delete` is called at most once per resource and must not access the
/// pointee afterwards.
pub unsafe trait DeletePolicy<T: ?Sized> {
    /// Destroys the resource and releases its storage.
    ///
    /// # Safety
    ///
    /// `ptr` must be exclusively owned by the caller, valid, and never used
    /// again after this call.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// Produces a deep, independent copy of a resource.
///
/// # Safety
///
/// Implementors must return a pointer to a newly allocated value that is
/// uniquely owned, valid for reads and writes, observably equal to the
/// source at the time of the call, and releasable by the paired
/// [`DeletePolicy`].
pub unsafe trait CopyPolicy<T: ?Sized> {
    /// Allocates and returns a deep copy of `value`.
    fn copy(&self, value: &T) -> NonNull<T>;
}

/// The default deleter: frees through the global allocator, like dropping a
/// `Box`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultDelete;

// SAFETY: default-policy containers only ever adopt `Box` allocations
// (safe constructors, `DefaultCopy`, or raw callers vouching for the same),
// and `Box::from_raw` + drop releases those exactly once.
unsafe impl<T: ?Sized> DeletePolicy<T> for DefaultDelete {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // SAFETY: ownership and validity guaranteed by the caller.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// The default copier: clones through the [`PolyClone`] capability.
///
/// For a sized `T: Clone` this is an ordinary clone; for a trait object it
/// dispatches to the concrete type behind the reference and therefore
/// preserves the dynamic subtype. The choice is made entirely by trait
/// resolution, there is no runtime branch.
///
/// Types without the capability cannot be stored behind a default-copier
/// container at all, which is what turns the slicing hazard into a compile
/// error (see [`ValueBox`](crate::ValueBox)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultCopy;

// SAFETY: `clone_boxed` returns a fresh `Box` allocation of the same dynamic
// type, which `DefaultDelete` (or any deleter accepting global-allocator
// boxes per its own contract) can release.
unsafe impl<T: ?Sized + PolyClone> CopyPolicy<T> for DefaultCopy {
    fn copy(&self, value: &T) -> NonNull<T> {
        let raw = Box::into_raw(clone_boxed(value));
        // SAFETY: `Box::into_raw` never returns null.
        unsafe { NonNull::new_unchecked(raw) }
    }
}
