//! Type-erased owning value pointer for hidden implementation members.
//!
//! The classic pointer-to-implementation layout wants a struct field that
//! owns, deletes, and deep-copies a resource whose concrete type the field's
//! declaration never names. [`ErasedValueBox`] does that by erasing the type
//! at the declaration site and deferring the real delete/copy operations
//! behind two *dispatch cells*: plain function pointers that are only
//! monomorphized at the call site that names the concrete type (the defining
//! module), via [`ErasedValueBox::set`].
//!
//! An empty container carries *unbound* cells that panic if ever reached; by
//! construction the container never invokes a cell while empty, so those are
//! purely defensive. Binding a value installs *live* cells for the concrete
//! type and records its `TypeId`, which makes the downcasting accessors safe.
//!
//! Unlike its sized sibling [`ValueBox`](crate::ValueBox), this container
//! pays for the erasure: two function pointers plus a `TypeId` per instance.
//! It works just as well for types that are perfectly visible, which is
//! occasionally useful to decouple a field's layout from its pointee.

use core::any::TypeId;
use core::cmp::Ordering;
use core::fmt;
use core::mem;
use core::ptr::NonNull;

use crate::policy::{CopyPolicy, DefaultCopy, DefaultDelete, DeletePolicy};

/// Dispatch cell for deletion: monomorphized per bound type.
type DeleteCell<D> = unsafe fn(&mut D, NonNull<()>);

/// Dispatch cell for deep copy: monomorphized per bound type.
type CopyCell<C> = unsafe fn(&C, NonNull<()>) -> NonNull<()>;

/// Marker recorded as the bound type of a container that never had one.
struct Unbound;

unsafe fn unbound_delete<D>(_: &mut D, _: NonNull<()>) {
    panic!("ErasedValueBox: delete dispatch invoked before a type was bound");
}

unsafe fn unbound_copy<C>(_: &C, _: NonNull<()>) -> NonNull<()> {
    panic!("ErasedValueBox: copy dispatch invoked before a type was bound");
}

unsafe fn delete_cell_for<T: 'static, D: DeletePolicy<T>>(deleter: &mut D, ptr: NonNull<()>) {
    // SAFETY: the cell is installed only by `set::<T>`, which guarantees the
    // erased pointer holds a `T`; ownership is handed over by the caller.
    unsafe { deleter.delete(ptr.cast::<T>()) }
}

unsafe fn copy_cell_for<T: 'static, C: CopyPolicy<T>>(copier: &C, ptr: NonNull<()>) -> NonNull<()> {
    // SAFETY: as in `delete_cell_for`; the source stays borrowed only for
    // the duration of the copy.
    let value = unsafe { ptr.cast::<T>().as_ref() };
    copier.copy(value).cast::<()>()
}

/// An owning value pointer whose resource type is erased at the declaration
/// site.
///
/// ```
/// use valuebox::ErasedValueBox;
///
/// // The declaring layer never names the hidden type.
/// struct Facade {
///     inner: ErasedValueBox,
/// }
///
/// // The defining layer does, and binds the operations here.
/// #[derive(Clone)]
/// struct Hidden {
///     value: u32,
/// }
///
/// let mut facade = Facade {
///     inner: ErasedValueBox::empty(),
/// };
/// facade.inner.set(Hidden { value: 7 });
///
/// let copy = facade.inner.clone(); // deep copy of the hidden state
/// assert_eq!(copy.downcast_ref::<Hidden>().map(|h| h.value), Some(7));
/// ```
pub struct ErasedValueBox<D = DefaultDelete, C = DefaultCopy> {
    ptr: Option<NonNull<()>>,
    bound: TypeId,
    delete_cell: DeleteCell<D>,
    copy_cell: CopyCell<C>,
    deleter: D,
    copier: C,
}

impl ErasedValueBox {
    /// Creates an empty, unbound container with the default policies.
    pub fn empty() -> Self {
        Self::with_policies(DefaultDelete, DefaultCopy)
    }
}

impl<D, C> ErasedValueBox<D, C> {
    /// Creates an empty, unbound container carrying explicit policy values.
    /// The policies start participating once a type is bound with
    /// [`set`](Self::set).
    pub fn with_policies(deleter: D, copier: C) -> Self {
        ErasedValueBox {
            ptr: None,
            bound: TypeId::of::<Unbound>(),
            delete_cell: unbound_delete::<D>,
            copy_cell: unbound_copy::<C>,
            deleter,
            copier,
        }
    }

    /// Destroys any previous resource (through its own binding), then
    /// allocates `value` and binds the delete/copy operations for `T`.
    ///
    /// This is the live-binding point: the dispatch cells for `T` are
    /// instantiated here, so only the code that can name the hidden type
    /// pays for knowing it.
    pub fn set<T>(&mut self, value: T)
    where
        T: 'static,
        D: DeletePolicy<T>,
        C: CopyPolicy<T>,
    {
        self.clear();
        let raw = Box::into_raw(Box::new(value));
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        self.ptr = Some(ptr.cast::<()>());
        self.bound = TypeId::of::<T>();
        self.delete_cell = delete_cell_for::<T, D>;
        self.copy_cell = copy_cell_for::<T, C>;
    }

    /// Deletes the owned resource (if any) through the bound deleter and
    /// leaves the container empty. A no-op on an empty container. The
    /// binding is retained, ready for a later [`set`](Self::set).
    pub fn clear(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: a non-null pointer implies a live binding whose cell
            // matches the pointee type; ownership ends here.
            unsafe { (self.delete_cell)(&mut self.deleter, ptr) };
        }
    }

    /// Returns `true` when no resource is owned.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns `true` when the container owns a resource of type `T`.
    pub fn holds<T: 'static>(&self) -> bool {
        self.ptr.is_some() && self.bound == TypeId::of::<T>()
    }

    /// Returns a shared reference to the resource if it has type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.holds::<T>() {
            // SAFETY: the `TypeId` check proves the erased pointer holds a
            // live `T` owned by this container.
            self.ptr.map(|p| unsafe { &*p.cast::<T>().as_ptr() })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the resource if it has type `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.holds::<T>() {
            // SAFETY: as in `downcast_ref`, plus `&mut self` guarantees
            // exclusivity.
            self.ptr.map(|p| unsafe { &mut *p.cast::<T>().as_ptr() })
        } else {
            None
        }
    }

    /// Relinquishes ownership of the erased resource without deleting it and
    /// leaves the container empty. The caller becomes responsible for
    /// releasing the pointer the way the bound deleter would have.
    pub fn release(&mut self) -> Option<NonNull<()>> {
        self.ptr.take()
    }

    /// Exchanges resources, bindings, and policy state with `other` in one
    /// step; no intermediate state is observable through either container.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Read-only view of the carried deleter.
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Mutable view of the carried deleter.
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Read-only view of the carried copier.
    pub fn copier(&self) -> &C {
        &self.copier
    }

    /// Mutable view of the carried copier.
    pub fn copier_mut(&mut self) -> &mut C {
        &mut self.copier
    }

    /// Address of the owned resource for identity comparisons; 0 when empty.
    fn addr(&self) -> usize {
        self.ptr.map_or(0, |p| p.as_ptr() as usize)
    }
}

impl<C> ErasedValueBox<DefaultDelete, C> {
    /// Converts the resource back into a `Box<T>` if it has type `T`,
    /// leaving the container empty.
    ///
    /// Only available for default-deleter containers, whose resources are
    /// global-allocator boxes by construction.
    pub fn take_boxed<T: 'static>(&mut self) -> Option<Box<T>> {
        if self.holds::<T>() {
            // SAFETY: the `TypeId` check proves the pointee type, and taking
            // the pointer disarms this container's drop.
            self.ptr
                .take()
                .map(|p| unsafe { Box::from_raw(p.cast::<T>().as_ptr()) })
        } else {
            None
        }
    }
}

impl<D, C> Drop for ErasedValueBox<D, C> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: a non-null pointer implies a live binding; this is the
            // single point where ownership ends.
            unsafe { (self.delete_cell)(&mut self.deleter, ptr) };
        }
    }
}

impl<D: Clone, C: Clone> Clone for ErasedValueBox<D, C> {
    /// Deep-copies the hidden resource through the bound copy cell,
    /// preserving the concrete type (and anything polymorphic it owns in
    /// turn). An empty container clones to an empty one with the same
    /// binding.
    fn clone(&self) -> Self {
        let ptr = self.ptr.map(|p| {
            // SAFETY: a non-null pointer implies a live binding whose cell
            // matches the pointee type.
            unsafe { (self.copy_cell)(&self.copier, p) }
        });
        ErasedValueBox {
            ptr,
            bound: self.bound,
            delete_cell: self.delete_cell,
            copy_cell: self.copy_cell,
            deleter: self.deleter.clone(),
            copier: self.copier.clone(),
        }
    }
}

impl<D: Default, C: Default> Default for ErasedValueBox<D, C> {
    fn default() -> Self {
        Self::with_policies(D::default(), C::default())
    }
}

impl<D, C> PartialEq for ErasedValueBox<D, C> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<D, C> Eq for ErasedValueBox<D, C> {}

impl<D, C> PartialOrd for ErasedValueBox<D, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D, C> Ord for ErasedValueBox<D, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<D, C> fmt::Debug for ErasedValueBox<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValueBox")
            .field("empty", &self.is_empty())
            .field("addr", &(self.addr() as *const ()))
            .finish()
    }
}

impl<D, C> fmt::Pointer for ErasedValueBox<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(p) => fmt::Pointer::fmt(&p.as_ptr(), f),
            None => f.write_str("0x0"),
        }
    }
}
