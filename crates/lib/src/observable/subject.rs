//! Multicast subject.

use std::{cell::RefCell, fmt, rc::Rc};

use super::{Observable, Subscription};

type Callback<T> = Rc<dyn Fn(T)>;

struct Observers<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A hot, multicast source. Each subscriber is an independent callback with
/// its own disposer; subscribers never share mutable state.
pub struct Subject<T> {
    observers: Rc<RefCell<Observers<T>>>,
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            observers: Rc::new(RefCell::new(Observers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `observer` for every future [`Subject::next`] call.
    pub fn subscribe(&self, observer: impl Fn(T) + 'static) -> Subscription {
        let id = {
            let mut observers = self.observers.borrow_mut();
            let id = observers.next_id;
            observers.next_id += 1;
            observers.entries.push((id, Rc::new(observer)));
            id
        };

        let weak = Rc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(observers) = weak.upgrade() {
                observers.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Delivers `value` to every current subscriber.
    ///
    /// Subscribers added during delivery do not see this value; subscribers
    /// removed during delivery are skipped.
    pub fn next(&self, value: T) {
        let snapshot: Vec<(u64, Callback<T>)> = self.observers.borrow().entries.clone();
        for (id, observer) in snapshot {
            if self.is_registered(id) {
                observer(value.clone());
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().entries.len()
    }

    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    /// Cold view of this subject: each subscription attaches a new observer.
    pub fn as_observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable::new(move |observer| subject.subscribe(move |value| observer(value)))
    }

    fn is_registered(&self, id: u64) -> bool {
        self.observers
            .borrow()
            .entries
            .iter()
            .any(|(entry, _)| *entry == id)
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.observers.borrow().entries.len())
            .finish()
    }
}
