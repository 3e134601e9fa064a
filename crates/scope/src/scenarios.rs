//! Canned probe scenarios covering every outcome of a scoped block.
//!
//! Each scenario builds its probes, runs one (or two nested) scopes, and
//! returns the outcome together with what happened to every probe.

use crate::scope::Scope;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use warden_core::{Cause, Failure, ResourceState, WardenError};
use warden_resource::{Behavior, Probe, ProbeHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Clean,
    BodyFails,
    ReleaseFails,
    BodyAndReleasesFail,
    SecondAcquireFails,
    FirstAcquireFails,
    Nested,
    SameResource,
}

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::Clean,
        Scenario::BodyFails,
        Scenario::ReleaseFails,
        Scenario::BodyAndReleasesFail,
        Scenario::SecondAcquireFails,
        Scenario::FirstAcquireFails,
        Scenario::Nested,
        Scenario::SameResource,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Scenario::Clean => "clean",
            Scenario::BodyFails => "body-fails",
            Scenario::ReleaseFails => "release-fails",
            Scenario::BodyAndReleasesFail => "body-and-releases-fail",
            Scenario::SecondAcquireFails => "second-acquire-fails",
            Scenario::FirstAcquireFails => "first-acquire-fails",
            Scenario::Nested => "nested",
            Scenario::SameResource => "same-resource",
        }
    }

    pub fn run(self) -> ScenarioOutcome {
        let probes = Probes::default();
        let result = match self {
            Scenario::Clean => clean(&probes),
            Scenario::BodyFails => body_fails(&probes),
            Scenario::ReleaseFails => release_fails(&probes),
            Scenario::BodyAndReleasesFail => body_and_releases_fail(&probes),
            Scenario::SecondAcquireFails => second_acquire_fails(&probes),
            Scenario::FirstAcquireFails => first_acquire_fails(&probes),
            Scenario::Nested => nested(&probes),
            Scenario::SameResource => same_resource(&probes),
        };
        tracing::debug!(scenario = self.as_str(), ok = result.is_ok(), "scenario finished");
        ScenarioOutcome {
            scenario: self,
            result,
            resources: probes.snapshot(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Scenario::ALL.iter().map(|sc| sc.as_str()).collect();
                WardenError::InvalidInput(format!(
                    "unknown scenario `{s}` (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Result of one scenario run.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub result: Result<String, Failure>,
    /// Every declared probe, in declaration order. Probes whose open failed
    /// or never ran report `acquired == false`.
    pub resources: Vec<(String, ResourceState)>,
}

// ---------------------------------------------------------------------------
// Probe bookkeeping
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Probes {
    handles: Rc<RefCell<Vec<(String, ProbeHandle)>>>,
}

impl Probes {
    /// Acquisition step whose probe is tracked whether or not it opens.
    fn open(
        &self,
        name: &'static str,
        on_open: Behavior,
        on_release: Behavior,
    ) -> impl FnOnce() -> Result<Probe, Cause> {
        let (handle, open) = Probe::opener(name, on_open, on_release);
        self.handles.borrow_mut().push((name.to_string(), handle));
        open
    }

    fn snapshot(&self) -> Vec<(String, ResourceState)> {
        self.handles
            .borrow()
            .iter()
            .map(|(name, handle)| (name.clone(), handle.state()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn clean(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("clean")
        .acquire(p.open("resource1", Behavior::Succeed, Behavior::Succeed))
        .acquire(p.open("resource2", Behavior::Succeed, Behavior::Succeed))
        .run(|(r1, r2)| {
            r1.work(&Behavior::Succeed)?;
            r2.work(&Behavior::Succeed)?;
            Ok::<_, Cause>("both resources used".to_string())
        })
}

fn body_fails(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("body_fails")
        .acquire(p.open("resource", Behavior::Succeed, Behavior::Succeed))
        .run(|r| {
            r.work(&Behavior::fail("doSomething"))?;
            Ok::<_, Cause>("unreachable".to_string())
        })
}

fn release_fails(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("release_fails")
        .acquire(p.open("resource1", Behavior::Succeed, Behavior::fail("close resource1")))
        .acquire(p.open("resource2", Behavior::Succeed, Behavior::fail("close resource2")))
        .run(|(r1, r2)| {
            r1.work(&Behavior::Succeed)?;
            r2.work(&Behavior::Succeed)?;
            Ok::<_, Cause>("body finished".to_string())
        })
}

fn body_and_releases_fail(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("body_and_releases_fail")
        .acquire(p.open("resource1", Behavior::Succeed, Behavior::fail("close resource1")))
        .acquire(p.open("resource2", Behavior::Succeed, Behavior::fail("close resource2")))
        .run(|_| Err::<String, _>(WardenError::Scripted("try failed".into())))
}

fn second_acquire_fails(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("second_acquire_fails")
        .acquire(p.open("resource1", Behavior::Succeed, Behavior::Succeed))
        .acquire(p.open("resource2", Behavior::fail("constructor"), Behavior::Succeed))
        .run(|_| Ok::<_, Cause>("unreachable".to_string()))
}

fn first_acquire_fails(p: &Probes) -> Result<String, Failure> {
    Scope::new()
        .named("first_acquire_fails")
        .acquire(p.open("resource1", Behavior::fail("constructor"), Behavior::Succeed))
        .acquire(p.open("resource2", Behavior::fail("never opened"), Behavior::Succeed))
        .run(|_| Ok::<_, Cause>("unreachable".to_string()))
}

fn nested(p: &Probes) -> Result<String, Failure> {
    let outer_step = p.open("outer", Behavior::Succeed, Behavior::fail("close outer"));
    let inner_step = p.open("inner", Behavior::Succeed, Behavior::fail("close inner"));
    Scope::new()
        .named("outer")
        .acquire(outer_step)
        .run(move |_outer| {
            Scope::new()
                .named("inner")
                .acquire(inner_step)
                .run(|_inner| Err::<String, _>(WardenError::Scripted("try failed".into())))
        })
}

fn same_resource(p: &Probes) -> Result<String, Failure> {
    let shared = Rc::new(RefCell::new(Probe::new("shared")));
    p.handles
        .borrow_mut()
        .push(("shared".to_string(), shared.borrow().handle()));

    let (slot1, slot2) = (Rc::clone(&shared), Rc::clone(&shared));
    Scope::new()
        .named("same_resource")
        .acquire(move || Ok::<_, Cause>(slot1))
        .acquire(move || Ok::<_, Cause>(slot2))
        .run(|(r1, r2)| {
            r1.borrow_mut().work(&Behavior::Succeed)?;
            r2.borrow_mut().work(&Behavior::Succeed)?;
            Ok::<_, Cause>("shared resource used through two slots".to_string())
        })
}
