//! Release recorder shared by every exit path of a scoped block.
//!
//! An [`Unwind`] starts from the outcome reached so far (a value, or the
//! body/acquisition failure) and folds in each release result:
//!
//!   - outcome `Ok`, release fails  -> that release failure becomes primary
//!   - outcome `Err`, release fails -> appended as secondary, unless it is
//!     the primary's own cause instance
//!
//! A release that panics does not stop the pass. The first panic is held and
//! resumed by [`Unwind::finish`] once every resource has been released.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use warden_core::{Failure, FailureDetail, FailureKind};
use warden_resource::Release;

pub struct Unwind<T> {
    outcome: Result<T, Failure>,
    released: usize,
    panic: Option<Box<dyn Any + Send>>,
}

impl<T> Unwind<T> {
    pub fn new(outcome: Result<T, Failure>) -> Self {
        Self {
            outcome,
            released: 0,
            panic: None,
        }
    }

    /// Releases one resource and records the result. Never short-circuits:
    /// the caller keeps releasing regardless of what happened here.
    pub fn release<R: Release + ?Sized>(&mut self, resource: &mut R) {
        let label = resource.label().into_owned();
        self.released += 1;

        let cause = match panic::catch_unwind(AssertUnwindSafe(|| resource.release())) {
            Ok(Ok(())) => {
                tracing::debug!(resource = %label, "released");
                return;
            }
            Ok(Err(cause)) => cause,
            Err(payload) => {
                tracing::warn!(resource = %label, "release panicked, continuing");
                self.panic.get_or_insert(payload);
                return;
            }
        };

        let detail = FailureDetail::new(FailureKind::Release, cause).with_resource(label);
        match &mut self.outcome {
            Err(failure) => {
                let error = detail.message();
                let resource = detail.resource.clone().unwrap_or_default();
                let attached = failure.suppress(detail);
                tracing::warn!(%resource, %error, suppressed = attached, "release failed");
            }
            Ok(_) => {
                tracing::warn!(resource = ?detail.resource, error = %detail.cause, "release failed");
                self.outcome = Err(Failure::new(detail));
            }
        }
    }

    /// Number of release attempts recorded so far.
    pub fn released(&self) -> usize {
        self.released
    }

    /// Whether a release panicked during this pass.
    pub fn panicked(&self) -> bool {
        self.panic.is_some()
    }

    /// The folded outcome. Resumes the first release panic, if any.
    pub fn finish(self) -> Result<T, Failure> {
        if let Some(payload) = self.panic {
            panic::resume_unwind(payload);
        }
        self.outcome
    }

    /// The folded outcome, dropping any caught release panic. Used while a
    /// panic is already unwinding, where resuming a second one would abort.
    pub(crate) fn into_outcome(self) -> Result<T, Failure> {
        self.outcome
    }
}
