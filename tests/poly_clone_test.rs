//! Polymorphic copying through base-typed handles: the dynamic subtype and
//! its extra state must survive, and the escape hatches (custom copier)
//! must work without the clone capability.

use std::ptr::NonNull;

use valuebox::{clone_boxed, CopyPolicy, PolyClone, ValueBox};

trait Node: PolyClone {
    fn foo(&self) -> i32;
    fn bar(&self) -> Option<i32>;
}

#[derive(Clone)]
struct BaseNode {
    foo: i32,
}

impl Node for BaseNode {
    fn foo(&self) -> i32 {
        self.foo
    }

    fn bar(&self) -> Option<i32> {
        None
    }
}

#[derive(Clone)]
struct DerivedNode {
    foo: i32,
    bar: i32,
}

impl Node for DerivedNode {
    fn foo(&self) -> i32 {
        self.foo
    }

    fn bar(&self) -> Option<i32> {
        Some(self.bar)
    }
}

#[test]
fn test_copy_through_base_handle_preserves_derived_state() {
    let handle: ValueBox<dyn Node> =
        ValueBox::from(Box::new(DerivedNode { foo: 1, bar: 2 }) as Box<dyn Node>);

    let copy = handle.clone();

    // Distinct allocations...
    let original = (handle.get().unwrap() as *const dyn Node).cast::<u8>();
    let copied = (copy.get().unwrap() as *const dyn Node).cast::<u8>();
    assert_ne!(original, copied);

    // ...and no truncation: both fields survive the base-typed copy.
    assert_eq!(copy.foo(), 1);
    assert_eq!(copy.bar(), Some(2));
}

#[test]
fn test_base_and_derived_coexist_behind_one_handle_type() {
    let mut handle: ValueBox<dyn Node> =
        ValueBox::from(Box::new(BaseNode { foo: 10 }) as Box<dyn Node>);
    assert_eq!(handle.bar(), None);

    handle.reset_boxed(Box::new(DerivedNode { foo: 10, bar: 20 }) as Box<dyn Node>);
    assert_eq!(handle.clone().bar(), Some(20));
}

#[test]
fn test_clone_boxed_standalone() {
    let original: Box<dyn Node> = Box::new(DerivedNode { foo: 3, bar: 4 });
    let copy = clone_boxed(&*original);
    assert_eq!(copy.foo(), 3);
    assert_eq!(copy.bar(), Some(4));

    // Sized types get the capability from the Clone blanket impl.
    let n = clone_boxed(&BaseNode { foo: 8 });
    assert_eq!(n.foo, 8);
}

// A trait with no clone capability: a custom copier takes over the
// polymorphism duty, which is exactly what lifts the compile-time slice
// check.
trait Shape {
    fn area(&self) -> f64;
}

#[derive(Clone)]
struct Square {
    side: f64,
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

#[derive(Clone, Copy, Default)]
struct SquareCopy;

// SAFETY: returns a fresh `Box` allocation; this copier is only paired with
// square-holding containers by the tests below.
unsafe impl CopyPolicy<dyn Shape> for SquareCopy {
    fn copy(&self, value: &dyn Shape) -> NonNull<dyn Shape> {
        let copy: Box<dyn Shape> = Box::new(Square {
            side: value.area().sqrt(),
        });
        let raw = Box::into_raw(copy);
        // SAFETY: `Box::into_raw` never returns null.
        unsafe { NonNull::new_unchecked(raw) }
    }
}

#[test]
fn test_custom_copier_without_clone_capability() {
    let b = ValueBox::from_boxed_with_copier(
        Box::new(Square { side: 3.0 }) as Box<dyn Shape>,
        SquareCopy,
    );
    let copy = b.clone();
    assert!((copy.area() - 9.0).abs() < f64::EPSILON);
}
