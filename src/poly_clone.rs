//! Polymorphic clone capability.
//!
//! [`PolyClone`] is the compile-time fact "this type knows how to produce a
//! deep copy of its *dynamic* self". Every `T: Clone` gets it for free through
//! a blanket implementation; a trait object gets it by listing `PolyClone` as
//! a supertrait, which routes [`clone_boxed`] through the vtable of the
//! concrete type behind the reference. That is what lets a base-typed handle
//! be copied without truncating derived state.

use core::ptr::{self, NonNull};

/// Capability to deep-clone a value through a possibly type-erased reference.
///
/// Implemented automatically for every `T: Clone`. Object-safe, so a trait
/// that wants its trait objects to be clonable declares it as a supertrait:
///
/// ```
/// use valuebox::PolyClone;
///
/// trait Strategy: PolyClone {
///     fn run(&self) -> u32;
/// }
/// ```
///
/// # Safety
///
/// Implementors must return a pointer obtained from `Box::into_raw(Box::new(v))`
/// where `v` has exactly the dynamic type of `self`. [`clone_boxed`] splices
/// the returned address together with the metadata of the source reference,
/// so returning an allocation of any other type is undefined behavior.
pub unsafe trait PolyClone {
    /// Deep-clones `self` into a fresh global-allocator allocation and
    /// returns the type-erased address.
    fn clone_into_raw(&self) -> NonNull<()>;
}

// SAFETY: the allocation holds `self.clone()`, which has the same dynamic
// type as `self` (`Self` is concrete here).
unsafe impl<T: Clone> PolyClone for T {
    fn clone_into_raw(&self) -> NonNull<()> {
        let raw = Box::into_raw(Box::new(self.clone()));
        // SAFETY: `Box::into_raw` never returns null.
        unsafe { NonNull::new_unchecked(raw.cast::<()>()) }
    }
}

/// Deep-clones a (possibly unsized) value into a new `Box`, preserving the
/// dynamic type behind a trait object.
///
/// ```
/// use valuebox::{clone_boxed, PolyClone};
///
/// trait Strategy: PolyClone {
///     fn run(&self) -> u32;
/// }
///
/// #[derive(Clone)]
/// struct Doubler(u32);
///
/// impl Strategy for Doubler {
///     fn run(&self) -> u32 {
///         self.0 * 2
///     }
/// }
///
/// let original: Box<dyn Strategy> = Box::new(Doubler(21));
/// let copy = clone_boxed(&*original);
/// assert_eq!(copy.run(), 42);
/// ```
pub fn clone_boxed<T: ?Sized + PolyClone>(value: &T) -> Box<T> {
    let data = value.clone_into_raw();
    let mut fat: *const T = value;
    // SAFETY: a pointer to an unsized type stores its address in the first
    // word; overwriting that word with the cloned allocation's address while
    // keeping the original metadata yields a pointer to the clone with the
    // same dynamic type. For sized `T` the write replaces the whole pointer.
    unsafe {
        ptr::write(
            core::ptr::addr_of_mut!(fat).cast::<*mut ()>(),
            data.as_ptr(),
        );
        Box::from_raw(fat.cast_mut())
    }
}
