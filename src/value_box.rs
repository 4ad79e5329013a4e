//! The owning value pointer container.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::policy::{CopyPolicy, DefaultCopy, DefaultDelete, DeletePolicy};
use crate::poly_clone::PolyClone;

/// An exclusively owning smart pointer whose `Clone` deep-copies the owned
/// resource instead of sharing or forbidding it.
///
/// `ValueBox` is to `Box` what a value is to a borrow: aggregates holding one
/// get copy semantics for polymorphic or hidden-implementation members
/// without hand-written duplication logic. It is either *empty* or *owning*;
/// with the default (stateless) policies it is exactly one pointer wide.
///
/// # Copying and slice protection
///
/// Cloning an owning container routes through the active [`CopyPolicy`]. The
/// default copier requires the [`PolyClone`] capability, so copying through a
/// trait-object-typed container preserves the dynamic subtype, and a trait
/// object *without* the capability is rejected at compile time rather than
/// silently truncated:
///
/// ```compile_fail
/// use valuebox::ValueBox;
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(Clone)]
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Shape for Circle {
///     fn area(&self) -> f64 {
///         core::f64::consts::PI * self.radius * self.radius
///     }
/// }
///
/// // `Shape` does not opt into `PolyClone` and no custom copier is given:
/// // copying would lose the concrete type, so this does not compile.
/// let handle: ValueBox<dyn Shape> =
///     ValueBox::from(Box::new(Circle { radius: 1.0 }) as Box<dyn Shape>);
/// ```
///
/// With the capability the same handle works and copies keep derived state:
///
/// ```
/// use valuebox::{PolyClone, ValueBox};
///
/// trait Shape: PolyClone {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(Clone)]
/// struct Square {
///     side: f64,
/// }
///
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.side * self.side
///     }
/// }
///
/// let handle: ValueBox<dyn Shape> =
///     ValueBox::from(Box::new(Square { side: 2.0 }) as Box<dyn Shape>);
/// let copy = handle.clone();
/// assert!((copy.area() - 4.0).abs() < f64::EPSILON);
/// ```
///
/// # Comparisons
///
/// Equality and ordering compare the owned resource *addresses* under the
/// platform pointer order, mirroring unique-ownership pointers; an empty
/// container compares as the null address. Use [`ValueBox::get`] to compare
/// values.
///
/// # Panics
///
/// Dereferencing an empty container panics with
/// `"dereferenced an empty ValueBox"`. Use [`ValueBox::get`] /
/// [`ValueBox::get_mut`] for checked access.
pub struct ValueBox<T: ?Sized, D: DeletePolicy<T> = DefaultDelete, C = DefaultCopy> {
    ptr: Option<NonNull<T>>,
    deleter: D,
    copier: C,
    _owns: PhantomData<T>,
}

impl<T: ?Sized, D: DeletePolicy<T> + Default, C: Default> ValueBox<T, D, C> {
    /// Creates an empty container with default-constructed policies.
    pub fn empty() -> Self {
        ValueBox {
            ptr: None,
            deleter: D::default(),
            copier: C::default(),
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized + PolyClone> ValueBox<T> {
    /// Takes ownership of an already boxed resource, with the default
    /// policies.
    pub fn from_boxed(boxed: Box<T>) -> Self {
        let raw = Box::into_raw(boxed);
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        ValueBox {
            ptr: Some(ptr),
            deleter: DefaultDelete,
            copier: DefaultCopy,
            _owns: PhantomData,
        }
    }
}

impl<T: PolyClone> ValueBox<T> {
    /// Allocates `value` and wraps it in a default-policy owning container,
    /// the `make_unique` analogue of this crate.
    ///
    /// ```
    /// use valuebox::ValueBox;
    ///
    /// let b = ValueBox::new(vec![1, 2, 3]);
    /// assert_eq!(b.get().map(Vec::len), Some(3));
    /// ```
    pub fn new(value: T) -> Self {
        Self::from_boxed(Box::new(value))
    }
}

impl<T, D: DeletePolicy<T>, C: CopyPolicy<T>> ValueBox<T, D, C> {
    /// Allocates `value` and wraps it together with explicit policies.
    pub fn with_policies(value: T, deleter: D, copier: C) -> Self {
        let raw = Box::into_raw(Box::new(value));
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        ValueBox {
            ptr: Some(ptr),
            deleter,
            copier,
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C: CopyPolicy<T>> ValueBox<T, D, C> {
    /// Adopts a raw resource pointer together with explicit policies. A null
    /// pointer yields an empty container.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must point to a valid, exclusively owned resource
    /// that `deleter` can release and that remains valid until the container
    /// releases or deletes it.
    pub unsafe fn from_raw_parts(ptr: *mut T, deleter: D, copier: C) -> Self {
        ValueBox {
            ptr: NonNull::new(ptr),
            deleter,
            copier,
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized + PolyClone> ValueBox<T> {
    /// Adopts a raw resource pointer with the default policies. A null
    /// pointer yields an empty container.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must come from `Box::into_raw` (global allocator)
    /// and be exclusively owned by the caller.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        // SAFETY: forwarded caller contract; `DefaultDelete` releases global
        // allocator boxes.
        unsafe { Self::from_raw_parts(ptr, DefaultDelete, DefaultCopy) }
    }
}

impl<T: ?Sized, C: CopyPolicy<T>> ValueBox<T, DefaultDelete, C> {
    /// Takes ownership of a boxed resource, pairing it with a caller-chosen
    /// copier. The deleter is the box's own (the global allocator).
    pub fn from_boxed_with_copier(boxed: Box<T>, copier: C) -> Self {
        let raw = Box::into_raw(boxed);
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        ValueBox {
            ptr: Some(ptr),
            deleter: DefaultDelete,
            copier,
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> ValueBox<T, D, C> {
    /// Returns a shared reference to the owned resource, or `None` when
    /// empty.
    pub fn get(&self) -> Option<&T> {
        // SAFETY: an owning container holds a valid, exclusively owned
        // resource for as long as it is borrowed.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    /// Returns a mutable reference to the owned resource, or `None` when
    /// empty.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as in `get`, plus `&mut self` guarantees exclusivity.
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    /// Returns the raw resource pointer without giving up ownership; null
    /// when empty.
    pub fn as_ptr(&self) -> *const T
    where
        T: Sized,
    {
        self.ptr
            .map_or(core::ptr::null(), |p| p.as_ptr().cast_const())
    }

    /// Returns `true` when no resource is owned.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Deletes the owned resource (if any) through the current deleter and
    /// leaves the container empty. A no-op on an empty container.
    pub fn reset(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: the pointer was adopted by a constructor or mutator
            // upholding the policy pairing contract, and ownership ends here.
            unsafe { self.deleter.delete(ptr) };
        }
    }

    /// Deletes the owned resource (if any), then adopts an already boxed
    /// replacement, keeping the current policies.
    pub fn reset_boxed(&mut self, boxed: Box<T>)
    where
        C: CopyPolicy<T>,
    {
        self.reset();
        let raw = Box::into_raw(boxed);
        // SAFETY: `Box::into_raw` never returns null.
        self.ptr = Some(unsafe { NonNull::new_unchecked(raw) });
    }

    /// Deletes the owned resource (if any), then allocates and adopts
    /// `value`, keeping the current policies.
    pub fn reset_value(&mut self, value: T)
    where
        T: Sized,
        C: CopyPolicy<T>,
    {
        self.reset_boxed(Box::new(value));
    }

    /// Relinquishes ownership of the resource without deleting it and leaves
    /// the container empty. The caller becomes responsible for releasing the
    /// pointer the way the active deleter would have.
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Moves the contents out, leaving an empty container with fresh default
    /// policies behind. The Rust rendition of a moved-from source.
    pub fn take(&mut self) -> Self
    where
        D: Default,
        C: Default,
    {
        mem::replace(
            self,
            ValueBox {
                ptr: None,
                deleter: D::default(),
                copier: C::default(),
                _owns: PhantomData,
            },
        )
    }

    /// Exchanges resources *and* policy state with `other` in one step; no
    /// intermediate state is observable through either container.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Read-only view of the active deleter.
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Mutable view of the active deleter.
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Read-only view of the active copier.
    pub fn copier(&self) -> &C {
        &self.copier
    }

    /// Mutable view of the active copier.
    pub fn copier_mut(&mut self) -> &mut C {
        &mut self.copier
    }

    /// Address of the owned resource for identity comparisons; 0 when empty.
    fn addr(&self) -> usize {
        self.ptr.map_or(0, |p| p.as_ptr().cast::<u8>() as usize)
    }
}

impl<T: ?Sized, C> ValueBox<T, DefaultDelete, C> {
    /// Converts into a plain `Box`, or `None` when empty.
    ///
    /// Only available for default-deleter containers: a `Box` cannot carry a
    /// foreign deleter, so handing it a foreign allocation would free it the
    /// wrong way.
    pub fn into_boxed(mut self) -> Option<Box<T>> {
        // SAFETY: default-deleter resources are global-allocator boxes, and
        // taking the pointer disarms this container's drop.
        self.ptr.take().map(|p| unsafe { Box::from_raw(p.as_ptr()) })
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> Drop for ValueBox<T, D, C> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: the container exclusively owns the resource and this is
            // the single point where that ownership ends.
            unsafe { self.deleter.delete(ptr) };
        }
    }
}

impl<T: ?Sized, D: DeletePolicy<T> + Clone, C: CopyPolicy<T> + Clone> Clone
    for ValueBox<T, D, C>
{
    /// Deep-copies the owned resource through the active copier; an empty
    /// container clones to an empty container. The policies are cloned
    /// alongside the resource.
    fn clone(&self) -> Self {
        let ptr = self.ptr.map(|p| {
            // SAFETY: the source resource is valid for the duration of the
            // call; the copier returns a fresh allocation it owns.
            self.copier.copy(unsafe { &*p.as_ptr() })
        });
        ValueBox {
            ptr,
            deleter: self.deleter.clone(),
            copier: self.copier.clone(),
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, D: DeletePolicy<T> + Default, C: Default> Default for ValueBox<T, D, C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized + PolyClone> From<Box<T>> for ValueBox<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_boxed(boxed)
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> Deref for ValueBox<T, D, C> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get().expect("dereferenced an empty ValueBox")
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> DerefMut for ValueBox<T, D, C> {
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut().expect("dereferenced an empty ValueBox")
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> PartialEq for ValueBox<T, D, C> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> Eq for ValueBox<T, D, C> {}

impl<T: ?Sized, D: DeletePolicy<T>, C> PartialOrd for ValueBox<T, D, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> Ord for ValueBox<T, D, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T: ?Sized + fmt::Debug, D: DeletePolicy<T>, C> fmt::Debug for ValueBox<T, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("ValueBox").field(&value).finish(),
            None => f.write_str("ValueBox(<empty>)"),
        }
    }
}

impl<T: ?Sized, D: DeletePolicy<T>, C> fmt::Pointer for ValueBox<T, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(p) => fmt::Pointer::fmt(&p.as_ptr(), f),
            None => f.write_str("0x0"),
        }
    }
}

// SAFETY: the container owns its resource like a `Box`; transferring it to
// another thread transfers the resource and the policies, so all three must
// be `Send`.
unsafe impl<T: ?Sized + Send, D: DeletePolicy<T> + Send, C: Send> Send for ValueBox<T, D, C> {}

// SAFETY: shared access only exposes `&T` plus shared policy views.
unsafe impl<T: ?Sized + Sync, D: DeletePolicy<T> + Sync, C: Sync> Sync for ValueBox<T, D, C> {}
