//! # `valuebox` - Owning Value Pointers
//!
//! An owning value pointer is a smart pointer that owns a single heap
//! resource *exclusively*, like `Box`, but whose `Clone` performs a deep
//! copy of the resource instead of being forbidden or sharing ownership.
//! That combination lets value-semantics aggregates hold polymorphic or
//! hidden-implementation members without hand-written copy/move/destroy
//! plumbing.
//!
//! ## Core Abstractions
//!
//! 1. **[`ValueBox<T, D, C>`]**: the container itself. Empty or owning,
//!    move transfers ownership, clone deep-copies, and with the stateless
//!    default policies it is exactly one pointer wide.
//!
//! 2. **Policies** ([`DeletePolicy`], [`CopyPolicy`]): two substitutable
//!    value-typed operations stored inline in the container. The defaults
//!    ([`DefaultDelete`], [`DefaultCopy`]) free through the global allocator
//!    and clone through the [`PolyClone`] capability.
//!
//! 3. **[`PolyClone`]**: the compile-time clone capability. Free for every
//!    `T: Clone`; a trait lists it as a supertrait to make its trait objects
//!    deep-clonable with the dynamic type preserved.
//!
//! 4. **[`ErasedValueBox<D, C>`]**: the same ownership contract for a field
//!    whose concrete type is hidden from the declaring layer (the
//!    pointer-to-implementation pattern), with delete/copy dispatch bound
//!    only where the type is actually named.
//!
//! ## Safety Guarantees
//!
//! - **Exclusive ownership**: at most one live container owns a given
//!   resource; copies always allocate a new one, moves empty the source.
//! - **Slice protection**: copying through a trait-object-typed container
//!   with the default copier requires the [`PolyClone`] capability, so a
//!   copy that would truncate the dynamic type is a *compile error*, never
//!   a silent truncation.
//! - **No unsafe in the public surface** except the raw-pointer adoption
//!   constructors, which spell out their contracts.
//!
//! ## Example
//!
//! ```rust
//! use valuebox::ValueBox;
//!
//! let a = ValueBox::new(vec![1, 2, 3]);
//! let mut b = a.clone(); // deep copy, independent allocation
//!
//! b.get_mut().unwrap().push(4);
//! assert_eq!(a.get().map(Vec::len), Some(3));
//! assert_eq!(b.get().map(Vec::len), Some(4));
//! ```
//!
//! Polymorphic members keep their dynamic type across copies:
//!
//! ```rust
//! use valuebox::{PolyClone, ValueBox};
//!
//! trait Animal: PolyClone {
//!     fn speak(&self) -> String;
//! }
//!
//! #[derive(Clone)]
//! struct Dog {
//!     name: String,
//! }
//!
//! impl Animal for Dog {
//!     fn speak(&self) -> String {
//!         format!("{}: woof", self.name)
//!     }
//! }
//!
//! let pet: ValueBox<dyn Animal> =
//!     ValueBox::from(Box::new(Dog { name: "Rex".into() }) as Box<dyn Animal>);
//! let copy = pet.clone();
//! assert_eq!(copy.speak(), "Rex: woof");
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod erased_box;
pub mod policy;
pub mod poly_clone;
pub mod value_box;

#[cfg(feature = "serde")]
mod serde_impls;

pub use erased_box::ErasedValueBox;
pub use policy::{CopyPolicy, DefaultCopy, DefaultDelete, DeletePolicy};
pub use poly_clone::{clone_boxed, PolyClone};
pub use value_box::ValueBox;

// Compile-time layout claims.
const _: () = {
    use core::mem;
    use core::ptr::NonNull;

    // Stateless-policy zero overhead: the container is exactly one
    // (nullable) pointer.
    assert!(mem::size_of::<ValueBox<u64>>() == mem::size_of::<usize>());
    assert!(mem::size_of::<ValueBox<u64>>() == mem::size_of::<Option<NonNull<u64>>>());
    assert!(mem::align_of::<ValueBox<u64>>() == mem::align_of::<*const u64>());

    // The erased container pays for its dispatch cells and type tag, but
    // must stay small; loose upper bound to avoid platform brittleness.
    assert!(mem::size_of::<ErasedValueBox>() <= mem::size_of::<usize>() * 6);
};
