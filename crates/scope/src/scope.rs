//! Scoped multi-resource block.
//!
//! Resources are declared left to right and acquired lazily inside
//! [`Scope::run`]. Acquired resources reach the body as a left-nested tuple:
//!
//! ```ignore
//! let copied = Scope::new()
//!     .acquire(|| FileReader::open(from))
//!     .acquire(|| FileWriter::create(to))
//!     .run(|(reader, writer)| {
//!         let line = reader.read_line()?.unwrap_or_default();
//!         writer.write_line(&line)
//!     })?;
//! ```
//!
//! Three resources arrive as `((a, b), c)`; an empty scope passes `()`.
//! Every acquired resource is released in reverse order on every exit path,
//! including a panicking body.

use crate::unwind::Unwind;
use std::borrow::Cow;
use warden_core::{Failure, FailureKind, IntoFailure};
use warden_resource::Release;

// ---------------------------------------------------------------------------
// Acquisition chain
// ---------------------------------------------------------------------------

/// An ordered list of acquisition steps.
///
/// `acquire_all` either yields every resource or none: when step *k* fails,
/// steps `1..k-1` have already been released (in reverse) and their release
/// failures are attached to the acquisition failure.
pub trait Acquire {
    type Resources;

    fn acquire_all(self) -> Result<Self::Resources, Failure>;

    /// Releases every resource, last acquired first.
    fn release_all<T>(resources: &mut Self::Resources, unwind: &mut Unwind<T>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// No resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

/// A single acquisition step.
pub struct First<F> {
    step: F,
}

/// Everything in `prev`, then one more step.
pub struct Then<P, F> {
    prev: P,
    step: F,
}

impl Acquire for Empty {
    type Resources = ();

    fn acquire_all(self) -> Result<(), Failure> {
        Ok(())
    }

    fn release_all<T>(_resources: &mut (), _unwind: &mut Unwind<T>) {}

    fn len(&self) -> usize {
        0
    }
}

impl<F, R, E> Acquire for First<F>
where
    F: FnOnce() -> Result<R, E>,
    R: Release,
    E: IntoFailure,
{
    type Resources = R;

    fn acquire_all(self) -> Result<R, Failure> {
        let resource = (self.step)().map_err(|e| e.into_failure(FailureKind::Acquisition))?;
        tracing::debug!(resource = %resource.label(), position = 0, "acquired");
        Ok(resource)
    }

    fn release_all<T>(resource: &mut R, unwind: &mut Unwind<T>) {
        unwind.release(resource);
    }

    fn len(&self) -> usize {
        1
    }
}

impl<P, F, R, E> Acquire for Then<P, F>
where
    P: Acquire,
    F: FnOnce() -> Result<R, E>,
    R: Release,
    E: IntoFailure,
{
    type Resources = (P::Resources, R);

    fn acquire_all(self) -> Result<Self::Resources, Failure> {
        let position = self.prev.len();
        let mut held = self.prev.acquire_all()?;

        let acquired = {
            let guard = PanicGuard::<P> {
                resources: &mut held,
            };
            let acquired = (self.step)();
            guard.disarm();
            acquired
        };

        match acquired {
            Ok(resource) => {
                tracing::debug!(resource = %resource.label(), position, "acquired");
                Ok((held, resource))
            }
            Err(err) => {
                let failure = err.into_failure(FailureKind::Acquisition);
                tracing::debug!(position, error = %failure, "acquisition failed, unwinding");
                let mut unwind = Unwind::new(Err(failure));
                P::release_all(&mut held, &mut unwind);
                tracing::debug!(released = unwind.released(), "acquisition unwound");
                unwind.finish()
            }
        }
    }

    fn release_all<T>(resources: &mut Self::Resources, unwind: &mut Unwind<T>) {
        unwind.release(&mut resources.1);
        P::release_all(&mut resources.0, unwind);
    }

    fn len(&self) -> usize {
        self.prev.len() + 1
    }
}

// ---------------------------------------------------------------------------
// Scope builder
// ---------------------------------------------------------------------------

/// Builder for one scoped block.
pub struct Scope<A> {
    steps: A,
    name: Option<Cow<'static, str>>,
}

impl Scope<Empty> {
    pub fn new() -> Self {
        Self {
            steps: Empty,
            name: None,
        }
    }

    /// Declares the first resource.
    pub fn acquire<F, R, E>(self, step: F) -> Scope<First<F>>
    where
        F: FnOnce() -> Result<R, E>,
        R: Release,
        E: IntoFailure,
    {
        Scope {
            steps: First { step },
            name: self.name,
        }
    }
}

impl Default for Scope<Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Scope<First<F>> {
    /// Declares the second resource; the body receives `(first, second)`.
    pub fn acquire<G, R, E>(self, step: G) -> Scope<Then<First<F>, G>>
    where
        G: FnOnce() -> Result<R, E>,
        R: Release,
        E: IntoFailure,
    {
        Scope {
            steps: Then {
                prev: self.steps,
                step,
            },
            name: self.name,
        }
    }
}

impl<P, F> Scope<Then<P, F>> {
    /// Declares one more resource; the body receives `(previous, next)`.
    pub fn acquire<G, R, E>(self, step: G) -> Scope<Then<Then<P, F>, G>>
    where
        G: FnOnce() -> Result<R, E>,
        R: Release,
        E: IntoFailure,
    {
        Scope {
            steps: Then {
                prev: self.steps,
                step,
            },
            name: self.name,
        }
    }
}

impl<A: Acquire> Scope<A> {
    /// Names the block in tracing output.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Acquires, runs `body`, releases, and reports one outcome.
    ///
    /// - body ok, releases ok: `Ok(value)`
    /// - body ok, a release fails: first release failure, later ones secondary
    /// - body fails: body failure, every release failure secondary
    ///
    /// A body returning a [`Failure`] (e.g. from a nested scope) keeps its
    /// primary and secondaries; this block only appends its own.
    pub fn run<T, E, B>(self, body: B) -> Result<T, Failure>
    where
        B: FnOnce(&mut A::Resources) -> Result<T, E>,
        E: IntoFailure,
    {
        let span = tracing::debug_span!(
            "scope",
            name = self.name.as_deref().unwrap_or("anonymous"),
            resources = self.steps.len()
        );
        let _entered = span.enter();

        let mut resources = self.steps.acquire_all()?;

        let outcome = {
            let mut guard = PanicGuard::<A> {
                resources: &mut resources,
            };
            let outcome =
                body(&mut *guard.resources).map_err(|e| e.into_failure(FailureKind::Body));
            guard.disarm();
            outcome
        };

        if let Err(failure) = &outcome {
            tracing::debug!(error = %failure, "body failed, releasing");
        }

        let mut unwind = Unwind::new(outcome);
        A::release_all(&mut resources, &mut unwind);
        tracing::debug!(
            released = unwind.released(),
            release_panicked = unwind.panicked(),
            "scope finished"
        );
        unwind.finish()
    }
}

/// Single-resource shorthand for `Scope::new().acquire(step).run(body)`.
pub fn with<F, R, E, B, T, E2>(step: F, body: B) -> Result<T, Failure>
where
    F: FnOnce() -> Result<R, E>,
    R: Release,
    E: IntoFailure,
    B: FnOnce(&mut R) -> Result<T, E2>,
    E2: IntoFailure,
{
    Scope::new().acquire(step).run(body)
}

// ---------------------------------------------------------------------------
// Panic path
// ---------------------------------------------------------------------------

/// Releases everything it holds if a panic unwinds through it: the body, or
/// an acquisition step with earlier resources already held. Normal exits
/// call [`PanicGuard::disarm`], so `Drop` only ever runs on unwind.
struct PanicGuard<'a, A: Acquire> {
    resources: &'a mut A::Resources,
}

impl<A: Acquire> PanicGuard<'_, A> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl<A: Acquire> Drop for PanicGuard<'_, A> {
    fn drop(&mut self) {
        let mut unwind = Unwind::new(Ok(()));
        A::release_all(&mut *self.resources, &mut unwind);
        if let Err(failure) = unwind.into_outcome() {
            tracing::warn!(error = %format!("{failure:#}"), "release failed while unwinding a panic");
        }
    }
}
