//! Scripted resource for exercising scoped-block semantics.
//!
//! A [`Probe`] can be told to fail on open, on use, or on release, and it
//! records what happened to it in a [`ResourceState`] that stays readable
//! through a [`ProbeHandle`] after the block has consumed the probe.

use crate::Release;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use warden_core::{Cause, ResourceState, WardenError};

/// What a probe does at one point of its lifecycle.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    /// Fail with a fresh [`WardenError::Scripted`] each time.
    Fail(String),
    /// Fail with exactly this cause instance.
    Raise(Cause),
}

impl Behavior {
    pub fn fail(message: impl Into<String>) -> Self {
        Behavior::Fail(message.into())
    }

    fn act(&self, probe: &str, context: &str) -> Result<(), Cause> {
        tracing::debug!(probe, context, behavior = ?self, "behave");
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(WardenError::Scripted(message.clone()).into()),
            Behavior::Raise(cause) => Err(cause.clone()),
        }
    }
}

/// Read-only view of a probe's lifecycle.
#[derive(Debug, Clone)]
pub struct ProbeHandle(Rc<RefCell<ResourceState>>);

impl ProbeHandle {
    pub fn state(&self) -> ResourceState {
        *self.0.borrow()
    }
}

#[derive(Debug)]
pub struct Probe {
    name: String,
    on_release: Behavior,
    state: Rc<RefCell<ResourceState>>,
}

impl Probe {
    /// A probe that opens and releases cleanly.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_release: Behavior::Succeed,
            state: Rc::new(RefCell::new(ResourceState {
                acquired: true,
                ..ResourceState::default()
            })),
        }
    }

    /// Acquisition step: fails with the `on_open` behavior, otherwise yields
    /// a probe that will apply `on_release` when released.
    pub fn open(
        name: impl Into<String>,
        on_open: Behavior,
        on_release: Behavior,
    ) -> Result<Self, Cause> {
        let (_, open) = Self::opener(name, on_open, on_release);
        open()
    }

    /// Like [`Probe::open`], but deferred, with the handle available up
    /// front. The handle reports `acquired == false` until the step runs and
    /// succeeds, so a failed or never-attempted open stays observable.
    pub fn opener(
        name: impl Into<String>,
        on_open: Behavior,
        on_release: Behavior,
    ) -> (ProbeHandle, impl FnOnce() -> Result<Self, Cause>) {
        let name = name.into();
        let state = Rc::new(RefCell::new(ResourceState::default()));
        let handle = ProbeHandle(Rc::clone(&state));
        let open = move || {
            on_open.act(&name, "open")?;
            state.borrow_mut().acquired = true;
            Ok(Self {
                name,
                on_release,
                state,
            })
        };
        (handle, open)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ProbeHandle {
        ProbeHandle(Rc::clone(&self.state))
    }

    /// Marks the probe as used, then applies `behavior`.
    pub fn work(&mut self, behavior: &Behavior) -> Result<(), Cause> {
        self.state.borrow_mut().used = true;
        behavior.act(&self.name, "work")
    }
}

impl Release for Probe {
    fn release(&mut self) -> Result<(), Cause> {
        self.state.borrow_mut().release_count += 1;
        self.on_release.act(&self.name, "release")
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}
