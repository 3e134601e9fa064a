//! Outcome rules of the scoped block, exercised end to end with probes.

use std::cell::RefCell;
use std::rc::Rc;
use warden_core::{Cause, Failure, FailureKind, WardenError};
use warden_resource::{Behavior, Probe, ProbeHandle, Release};
use warden_scope::Scope;

fn probe(name: &str, on_release: Behavior) -> (Probe, ProbeHandle) {
    let probe = Probe::open(name, Behavior::Succeed, on_release).unwrap();
    let handle = probe.handle();
    (probe, handle)
}

fn messages(failure: &Failure) -> Vec<String> {
    failure.secondary().iter().map(|d| d.message()).collect()
}

fn scripted(message: &str) -> WardenError {
    WardenError::Scripted(message.into())
}

#[test]
fn all_succeed() {
    let (p1, h1) = probe("r1", Behavior::Succeed);
    let (p2, h2) = probe("r2", Behavior::Succeed);

    let value = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(move || Ok::<_, Cause>(p2))
        .run(|(r1, r2)| {
            r1.work(&Behavior::Succeed)?;
            r2.work(&Behavior::Succeed)?;
            Ok::<_, Cause>(42)
        })
        .unwrap();

    assert_eq!(value, 42);
    for h in [h1, h2] {
        let state = h.state();
        assert!(state.acquired && state.used);
        assert_eq!(state.release_count, 1);
    }
}

#[test]
fn body_failure_with_clean_releases() {
    let (p, h) = probe("r", Behavior::Succeed);

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p))
        .run(|r| r.work(&Behavior::fail("doSomething")))
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Body);
    assert_eq!(failure.message(), "doSomething");
    assert!(failure.secondary().is_empty());
    assert!(h.state().is_released());
}

#[test]
fn release_failure_after_clean_body_is_primary() {
    let (p, h) = probe("r", Behavior::fail("close"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p))
        .run(|r| r.work(&Behavior::Succeed))
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Release);
    assert_eq!(failure.message(), "close");
    assert_eq!(failure.primary().resource.as_deref(), Some("r"));
    assert!(failure.secondary().is_empty());
    assert!(h.state().used);
}

#[test]
fn two_release_failures_after_clean_body() {
    let (p1, h1) = probe("r1", Behavior::fail("close r1"));
    let (p2, h2) = probe("r2", Behavior::fail("close r2"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(move || Ok::<_, Cause>(p2))
        .run(|_| Ok::<_, Cause>(()))
        .unwrap_err();

    // r2 is released first, so its failure is primary.
    assert_eq!(failure.message(), "close r2");
    assert_eq!(messages(&failure), ["close r1"]);
    assert!(h1.state().is_released() && h2.state().is_released());
}

#[test]
fn body_failure_suppresses_every_release_failure_in_reverse_order() {
    let (p1, _) = probe("r1", Behavior::fail("G3"));
    let (p2, _) = probe("r2", Behavior::fail("G2"));
    let (p3, _) = probe("r3", Behavior::fail("G1"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(move || Ok::<_, Cause>(p2))
        .acquire(move || Ok::<_, Cause>(p3))
        .run(|((_, _), _)| Err::<(), _>(scripted("F")))
        .unwrap_err();

    assert_eq!(failure.message(), "F");
    assert_eq!(failure.kind(), FailureKind::Body);
    assert_eq!(messages(&failure), ["G1", "G2", "G3"]);
    let resources: Vec<_> = failure
        .secondary()
        .iter()
        .map(|d| d.resource.clone().unwrap())
        .collect();
    assert_eq!(resources, ["r3", "r2", "r1"]);
}

#[test]
fn second_acquisition_failure_releases_first() {
    let (p1, h1) = probe("r1", Behavior::Succeed);
    let ran = Rc::new(RefCell::new(false));
    let ran_in_body = Rc::clone(&ran);

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(|| Probe::open("r2", Behavior::fail("H"), Behavior::Succeed))
        .run(move |_| {
            *ran_in_body.borrow_mut() = true;
            Ok::<_, Cause>(())
        })
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Acquisition);
    assert_eq!(failure.message(), "H");
    assert!(failure.secondary().is_empty());
    assert!(!*ran.borrow());
    let state = h1.state();
    assert!(!state.used);
    assert_eq!(state.release_count, 1);
}

#[test]
fn panicking_second_constructor_still_releases_first() {
    let (p1, h1) = probe("r1", Behavior::Succeed);
    let (h2, _never_opened) = Probe::opener("r2", Behavior::Succeed, Behavior::Succeed);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        Scope::new()
            .acquire(move || Ok::<_, Cause>(p1))
            .acquire(|| -> Result<Probe, Cause> { panic!("unchecked constructor failure") })
            .run(|_| Ok::<_, Cause>(()))
    }));

    assert!(result.is_err());
    let state = h1.state();
    assert!(!state.used);
    assert_eq!(state.release_count, 1);
    assert!(!h2.state().acquired);
}

#[test]
fn acquisition_unwind_failures_are_secondary() {
    let (p1, _) = probe("r1", Behavior::fail("close r1"));
    let (p2, _) = probe("r2", Behavior::fail("close r2"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(move || Ok::<_, Cause>(p2))
        .acquire(|| Probe::open("r3", Behavior::fail("H"), Behavior::Succeed))
        .run(|_| Ok::<_, Cause>(()))
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Acquisition);
    assert_eq!(failure.message(), "H");
    assert_eq!(messages(&failure), ["close r2", "close r1"]);
}

#[test]
fn nested_failure_propagates_unchanged_with_outer_releases_appended() {
    let (outer, outer_h) = probe("outer", Behavior::fail("close outer"));
    let (inner, inner_h) = probe("inner", Behavior::fail("close inner"));
    let observed_inner = Rc::new(RefCell::new(None::<(usize, bool)>));
    let seen = Rc::clone(&observed_inner);

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(outer))
        .run(move |_| {
            let inner_result = Scope::new()
                .acquire(move || Ok::<_, Cause>(inner))
                .run(|_| Err::<(), _>(scripted("try failed")));
            if let Err(f) = &inner_result {
                *seen.borrow_mut() = Some((f.secondary().len(), outer_h.state().is_released()));
            }
            inner_result
        })
        .unwrap_err();

    // Inside the outer body: one suppressed (inner close), outer still open.
    assert_eq!(*observed_inner.borrow(), Some((1, false)));

    assert_eq!(failure.kind(), FailureKind::Body);
    assert_eq!(failure.message(), "try failed");
    assert_eq!(messages(&failure), ["close inner", "close outer"]);
    assert!(inner_h.state().is_released());
}

#[test]
fn nested_inner_release_failure_keeps_its_kind() {
    let (outer, _) = probe("outer", Behavior::Succeed);
    let (inner, _) = probe("inner", Behavior::fail("close inner"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(outer))
        .run(move |_| {
            Scope::new()
                .acquire(move || Ok::<_, Cause>(inner))
                .run(|_| Ok::<_, Cause>(()))
        })
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Release);
    assert_eq!(failure.primary().resource.as_deref(), Some("inner"));
    assert!(failure.secondary().is_empty());
}

#[test]
fn identical_release_failure_is_not_self_suppressed() {
    let shared = Cause::new(scripted("same object"));
    let (p1, _) = probe("r1", Behavior::Raise(shared.clone()));
    let (p2, _) = probe("r2", Behavior::fail("distinct"));

    let body_cause = shared.clone();
    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p1))
        .acquire(move || Ok::<_, Cause>(p2))
        .run(move |_| Err::<(), _>(body_cause))
        .unwrap_err();

    assert!(failure.cause().same_instance(&shared));
    assert_eq!(messages(&failure), ["distinct"]);
}

#[test]
fn equal_but_distinct_failures_are_both_kept() {
    let (p, _) = probe("r", Behavior::fail("boom"));

    let failure = Scope::new()
        .acquire(move || Ok::<_, Cause>(p))
        .run(|_| Err::<(), _>(scripted("boom")))
        .unwrap_err();

    assert_eq!(failure.message(), "boom");
    assert_eq!(messages(&failure), ["boom"]);
}

#[test]
fn same_resource_in_two_slots_is_released_twice() {
    let shared = Rc::new(RefCell::new(Probe::new("shared")));
    let handle = shared.borrow().handle();
    let (a, b) = (Rc::clone(&shared), Rc::clone(&shared));

    Scope::new()
        .acquire(move || Ok::<_, Cause>(a))
        .acquire(move || Ok::<_, Cause>(b))
        .run(|(r1, r2)| {
            r1.borrow_mut().work(&Behavior::Succeed)?;
            r2.borrow_mut().work(&Behavior::Succeed)
        })
        .unwrap();

    assert_eq!(handle.state().release_count, 2);
}

#[test]
fn release_order_is_reverse_of_acquisition() {
    let order = Rc::new(RefCell::new(Vec::new()));

    struct Tagged(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl Release for Tagged {
        fn release(&mut self) -> Result<(), Cause> {
            self.1.borrow_mut().push(self.0);
            Ok(())
        }
    }

    let (a, b, c) = (Rc::clone(&order), Rc::clone(&order), Rc::clone(&order));
    Scope::new()
        .named("ordering")
        .acquire(move || Ok::<_, Cause>(Tagged("a", a)))
        .acquire(move || Ok::<_, Cause>(Tagged("b", b)))
        .acquire(move || Ok::<_, Cause>(Tagged("c", c)))
        .run(|_| Ok::<_, Cause>(()))
        .unwrap();

    assert_eq!(*order.borrow(), ["c", "b", "a"]);
}

#[test]
fn failure_converts_into_boxed_error() {
    fn caller() -> Result<(), Box<dyn std::error::Error>> {
        let (p, _) = probe("r", Behavior::fail("close"));
        Scope::new()
            .acquire(move || Ok::<_, Cause>(p))
            .run(|_| Err::<(), _>(scripted("try failed")))?;
        Ok(())
    }

    let err = caller().unwrap_err();
    assert!(err.to_string().starts_with("body failure: try failed"));
    assert!(err.to_string().contains("suppressed[0]: release failure on r: close"));
}
