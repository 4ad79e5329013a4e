//! A full pointer-to-implementation exercise: a public `Widget` whose state
//! lives behind erased members, including a polymorphic hidden variant and a
//! member with counting policies. Copying a widget must deep-copy all hidden
//! state without truncating the polymorphic part.

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use valuebox::{CopyPolicy, DeletePolicy};

mod widget {
    use super::{CountingCopy, CountingDelete};
    use std::cell::Cell;
    use std::rc::Rc;
    use valuebox::{ErasedValueBox, ValueBox};

    /// Everything in here is invisible to `Widget`'s field declarations.
    mod detail {
        use valuebox::PolyClone;

        pub(super) trait Meaning: PolyClone {
            fn meaning_of_life(&self) -> i32;
            fn is_clone(&self) -> bool;
        }

        #[derive(Clone)]
        pub(super) struct Plain {
            pub(super) answer: i32,
        }

        impl Meaning for Plain {
            fn meaning_of_life(&self) -> i32 {
                self.answer
            }

            fn is_clone(&self) -> bool {
                false
            }
        }

        pub(super) struct Scaled {
            pub(super) answer: i32,
            pub(super) factor: i32,
            pub(super) is_clone: bool,
        }

        // Clones are marked so tests can prove the polymorphic path ran.
        impl Clone for Scaled {
            fn clone(&self) -> Self {
                Scaled {
                    answer: self.answer,
                    factor: self.factor,
                    is_clone: true,
                }
            }
        }

        impl Meaning for Scaled {
            fn meaning_of_life(&self) -> i32 {
                self.answer * self.factor
            }

            fn is_clone(&self) -> bool {
                self.is_clone
            }
        }
    }

    /// The facade: three hidden members, none of whose concrete types appear
    /// in the struct layout.
    #[derive(Clone)]
    pub struct Widget {
        plain: ErasedValueBox,
        derived: ErasedValueBox,
        custom: ErasedValueBox<CountingDelete, CountingCopy>,
    }

    impl Widget {
        pub fn new(deletions: &Rc<Cell<usize>>, copies: &Rc<Cell<usize>>) -> Self {
            let mut plain = ErasedValueBox::empty();
            plain.set(detail::Plain { answer: 42 });

            let mut derived = ErasedValueBox::empty();
            derived.set::<ValueBox<dyn detail::Meaning>>(ValueBox::from(Box::new(
                detail::Scaled {
                    answer: 42,
                    factor: 10,
                    is_clone: false,
                },
            )
                as Box<dyn detail::Meaning>));

            let mut custom = ErasedValueBox::with_policies(
                CountingDelete {
                    deletions: Rc::clone(deletions),
                },
                CountingCopy {
                    copies: Rc::clone(copies),
                },
            );
            custom.set(detail::Plain { answer: 33 });

            Widget {
                plain,
                derived,
                custom,
            }
        }

        pub fn meaning_of_life(&self) -> i32 {
            self.plain
                .downcast_ref::<detail::Plain>()
                .map_or(0, |p| p.answer)
        }

        pub fn meaning_of_life_derived(&self) -> i32 {
            self.derived
                .downcast_ref::<ValueBox<dyn detail::Meaning>>()
                .and_then(|b| b.get())
                .map_or(0, detail::Meaning::meaning_of_life)
        }

        pub fn is_clone_derived(&self) -> bool {
            self.derived
                .downcast_ref::<ValueBox<dyn detail::Meaning>>()
                .and_then(|b| b.get())
                .is_some_and(detail::Meaning::is_clone)
        }

        pub fn custom_answer(&self) -> i32 {
            self.custom
                .downcast_ref::<detail::Plain>()
                .map_or(0, |p| p.answer)
        }

        pub fn set_answer(&mut self, answer: i32) {
            if let Some(p) = self.plain.downcast_mut::<detail::Plain>() {
                p.answer = answer;
            }
        }
    }
}

#[derive(Clone)]
pub struct CountingDelete {
    deletions: Rc<Cell<usize>>,
}

// SAFETY: only paired with `Box`-allocated resources here.
unsafe impl<T> DeletePolicy<T> for CountingDelete {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self.deletions.set(self.deletions.get() + 1);
        // SAFETY: ownership and validity guaranteed by the caller.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

#[derive(Clone)]
pub struct CountingCopy {
    copies: Rc<Cell<usize>>,
}

// SAFETY: returns a fresh, uniquely owned `Box` allocation.
unsafe impl<T: Clone> CopyPolicy<T> for CountingCopy {
    fn copy(&self, value: &T) -> NonNull<T> {
        self.copies.set(self.copies.get() + 1);
        let raw = Box::into_raw(Box::new(value.clone()));
        // SAFETY: `Box::into_raw` never returns null.
        unsafe { NonNull::new_unchecked(raw) }
    }
}

fn fixture() -> (widget::Widget, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let deletions = Rc::new(Cell::new(0));
    let copies = Rc::new(Cell::new(0));
    let w = widget::Widget::new(&deletions, &copies);
    (w, deletions, copies)
}

#[test]
fn test_widget_observables() {
    let (w, _deletions, _copies) = fixture();
    assert_eq!(w.meaning_of_life(), 42);
    assert_eq!(w.meaning_of_life_derived(), 420);
    assert_eq!(w.custom_answer(), 33);
    assert!(!w.is_clone_derived());
}

#[test]
fn test_widget_copy_is_deep_and_polymorphic() {
    let (w, _deletions, copies) = fixture();

    let mut copy = w.clone();

    // The polymorphic hidden member went through its own clone, not a
    // truncating copy.
    assert!(copy.is_clone_derived());
    assert!(!w.is_clone_derived());
    assert_eq!(copy.meaning_of_life_derived(), 420);

    // The custom-policy member ticked its copier exactly once.
    assert_eq!(copies.get(), 1);

    // Mutating the copy's hidden state leaves the original alone.
    copy.set_answer(7);
    assert_eq!(copy.meaning_of_life(), 7);
    assert_eq!(w.meaning_of_life(), 42);
}

#[test]
fn test_widget_drop_releases_custom_member() {
    let (w, deletions, _copies) = fixture();
    let copy = w.clone();

    drop(w);
    assert_eq!(deletions.get(), 1);
    drop(copy);
    assert_eq!(deletions.get(), 2);
}
