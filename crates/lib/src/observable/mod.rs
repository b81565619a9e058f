//! Push-based streams.
//!
//! [`Observable`] is a cold stream: nothing happens until it is subscribed,
//! and every subscription runs the producer again. [`Subject`] is the hot,
//! multicast counterpart used by shared containers to fan out mutation
//! events. Every subscription hands back a [`Subscription`] disposer.
//!
//! Execution is single-threaded; values are delivered synchronously from
//! whichever call produced them.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

mod subject;
mod subscription;

pub use subject::Subject;
pub use subscription::Subscription;

/// Callback receiving the values of a stream.
pub type Observer<T> = Rc<dyn Fn(T)>;

/// A cold, push-based stream of `T`.
pub struct Observable<T> {
    producer: Rc<dyn Fn(Observer<T>) -> Subscription>,
}

impl<T: Clone + 'static> Observable<T> {
    /// Creates a stream from a producer. The producer is invoked once per
    /// subscription and returns the teardown for that subscription.
    pub fn new(producer: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// A constant stream: emits `value` once on subscription, then nothing.
    pub fn of(value: T) -> Self {
        Self::new(move |observer| {
            observer(value.clone());
            Subscription::empty()
        })
    }

    /// Subscribes `observer`. Values produced after the returned handle is
    /// disposed are dropped.
    pub fn subscribe(&self, observer: impl Fn(T) + 'static) -> Subscription {
        let closed = Rc::new(Cell::new(false));
        let guard = closed.clone();
        let guarded: Observer<T> = Rc::new(move |value: T| {
            if !guard.get() {
                observer(value);
            }
        });
        let inner = (self.producer)(guarded);

        Subscription::new(move || {
            closed.set(true);
            drop(inner);
        })
    }

    /// Applies `f` to every value.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(T) -> U + 'static) -> Observable<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |observer: Observer<U>| {
            let f = f.clone();
            source.subscribe(move |value| observer(f(value)))
        })
    }

    /// Suppresses values equal to the previously emitted one.
    pub fn distinct_until_changed(&self) -> Self
    where
        T: PartialEq,
    {
        let source = self.clone();
        Observable::new(move |observer: Observer<T>| {
            let last: RefCell<Option<T>> = RefCell::new(None);
            source.subscribe(move |value| {
                {
                    let mut last = last.borrow_mut();
                    if last.as_ref() == Some(&value) {
                        return;
                    }
                    *last = Some(value.clone());
                }
                observer(value);
            })
        })
    }

    /// Maps every value to an inner stream and forwards the latest one.
    ///
    /// When the source emits, the previous inner subscription is disposed
    /// before the next is created, so at most one inner subscription is ever
    /// active.
    pub fn switch_map<U: Clone + 'static>(
        &self,
        f: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |observer: Observer<U>| {
            let current: Rc<RefCell<Option<Subscription>>> = Rc::default();
            let generation = Rc::new(Cell::new(0u64));

            let outer = {
                let (current, generation, f) = (current.clone(), generation.clone(), f.clone());
                source.subscribe(move |value| {
                    let previous = current.borrow_mut().take();
                    drop(previous);

                    let ticket = generation.get() + 1;
                    generation.set(ticket);
                    let inner = f(value).subscribe({
                        let observer = observer.clone();
                        move |item| observer(item)
                    });

                    // A re-entrant emission may already have switched past us.
                    if generation.get() == ticket {
                        *current.borrow_mut() = Some(inner);
                    }
                })
            };

            Subscription::new(move || {
                drop(outer);
                let inner = current.borrow_mut().take();
                drop(inner);
            })
        })
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}
