//! Container-level streams: the container itself, re-emitted on change.

use crate::{
    crdt::Container,
    observable::{Observable, Observer},
};

/// Emits `container` on subscription and after every transaction that
/// mutated it directly.
pub fn observe(container: &Container) -> Observable<Container> {
    let container = container.clone();
    Observable::new(move |observer: Observer<Container>| {
        observer(container.clone());
        let weak = container.downgrade();
        container.observe(move |_| {
            if let Some(container) = weak.upgrade() {
                observer(container);
            }
        })
    })
}

/// Emits `container` on subscription and after every transaction that
/// mutated it or anything nested in it.
pub fn observe_deep(container: &Container) -> Observable<Container> {
    let container = container.clone();
    Observable::new(move |observer: Observer<Container>| {
        observer(container.clone());
        let weak = container.downgrade();
        container.observe_deep(move |_| {
            if let Some(container) = weak.upgrade() {
                observer(container);
            }
        })
    })
}
