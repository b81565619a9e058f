use std::{cell::Cell, rc::Rc};

use treewatch::observable::{Observable, Observer, Subject, Subscription};

use crate::helpers::*;

#[test]
fn test_subject_multicasts_independently() {
    let subject: Subject<i32> = Subject::new();
    let mut first = record(&subject.as_observable());
    let second = record(&subject.as_observable());

    subject.next(1);
    first.unsubscribe();
    subject.next(2);

    assert_eq!(first.values(), vec![1]);
    assert_eq!(second.values(), vec![1, 2]);
    assert_eq!(subject.observer_count(), 1);
}

#[test]
fn test_switch_map_keeps_one_inner_subscription() {
    let outer: Subject<u32> = Subject::new();
    let inners: Vec<Subject<String>> = (0..3).map(|_| Subject::new()).collect();
    let inners = Rc::new(inners);

    let lookup = inners.clone();
    let stream = outer
        .as_observable()
        .switch_map(move |i| lookup[i as usize].as_observable());
    let recorder = record(&stream);

    outer.next(0);
    inners[0].next("a".into());
    outer.next(1);
    inners[0].next("stale".into());
    inners[1].next("b".into());

    assert_eq!(recorder.values(), vec!["a".to_string(), "b".to_string()]);
    assert!(!inners[0].has_observers());
    assert_eq!(inners[1].observer_count(), 1);
}

#[test]
fn test_distinct_then_map() {
    let subject: Subject<i32> = Subject::new();
    let stream = subject.as_observable().distinct_until_changed().map(|v| v * 10);
    let recorder = record(&stream);
    for v in [1, 1, 2, 2, 1] {
        subject.next(v);
    }
    assert_eq!(recorder.values(), vec![10, 20, 10]);
}

#[test]
fn test_cold_streams_rerun_producer() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let stream = Observable::new(move |observer: Observer<i32>| {
        counter.set(counter.get() + 1);
        observer(counter.get());
        Subscription::empty()
    });

    let a = record(&stream);
    let b = record(&stream);
    assert_eq!(runs.get(), 2);
    assert_eq!((a.values(), b.values()), (vec![1], vec![2]));
}

#[test]
fn test_dropping_subscription_runs_teardown() {
    let torn_down = Rc::new(Cell::new(false));
    let flag = torn_down.clone();
    {
        let _sub = Subscription::new(move || flag.set(true));
        assert!(!torn_down.get());
    }
    assert!(torn_down.get());
}
