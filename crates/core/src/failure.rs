//! Aggregated failure model for scoped blocks.
//!
//! A [`Failure`] is one primary [`FailureDetail`] plus an ordered list of
//! secondary (suppressed) details. Error objects are held as [`Cause`], a
//! reference-counted handle, so "the same failure" means the same allocation
//! rather than an equal message.

use crate::types::FailureKind;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

type DynError = dyn Error + Send + Sync + 'static;

// ---------------------------------------------------------------------------
// Cause
// ---------------------------------------------------------------------------

/// Shared handle to an error object.
///
/// Cloning is cheap and preserves identity: a resource that stores a clone
/// and returns it from `release` hands back the very instance the body saw.
#[derive(Clone)]
pub struct Cause(Arc<DynError>);

impl Cause {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    pub fn from_boxed(error: Box<DynError>) -> Self {
        Self(Arc::from(error))
    }

    /// Identity comparison. Two causes with equal messages are still distinct
    /// unless they share an allocation.
    pub fn same_instance(&self, other: &Cause) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_error(&self) -> &DynError {
        &*self.0
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Messages from this error down through its `source()` chain.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.0.to_string()];
        let mut next = self.0.source();
        while let Some(err) = next {
            messages.push(err.to_string());
            next = err.source();
        }
        messages
    }
}

impl<E> From<E> for Cause
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

// ---------------------------------------------------------------------------
// FailureDetail
// ---------------------------------------------------------------------------

/// One failure, tagged with the stage that raised it and, for acquisition and
/// release failures, the label of the resource involved.
#[derive(Debug, Clone)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub resource: Option<String>,
    pub cause: Cause,
}

impl FailureDetail {
    pub fn new(kind: FailureKind, cause: impl Into<Cause>) -> Self {
        Self {
            kind,
            resource: None,
            cause: cause.into(),
        }
    }

    pub fn with_resource(mut self, label: impl Into<String>) -> Self {
        self.resource = Some(label.into());
        self
    }

    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(label) => write!(f, "{} failure on {}: {}", self.kind, label, self.cause),
            None => write!(f, "{} failure: {}", self.kind, self.cause),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Outcome of a failed scoped block: exactly one primary failure and zero or
/// more secondary failures in the order they occurred.
///
/// `Failure` deliberately does not implement [`std::error::Error`]; that is
/// what allows `?` to lift any error into it. Use [`Failure::into_error`] or
/// the `Box<dyn Error>` conversions when a trait object is needed.
#[derive(Debug, Clone)]
pub struct Failure {
    primary: FailureDetail,
    secondary: SmallVec<[FailureDetail; 4]>,
}

impl Failure {
    pub fn new(primary: FailureDetail) -> Self {
        Self {
            primary,
            secondary: SmallVec::new(),
        }
    }

    pub fn primary(&self) -> &FailureDetail {
        &self.primary
    }

    pub fn secondary(&self) -> &[FailureDetail] {
        &self.secondary
    }

    pub fn kind(&self) -> FailureKind {
        self.primary.kind
    }

    pub fn cause(&self) -> &Cause {
        &self.primary.cause
    }

    pub fn message(&self) -> String {
        self.primary.message()
    }

    /// Attaches `detail` as a secondary failure.
    ///
    /// Returns `false` and drops the detail when it carries the primary's own
    /// cause instance; a failure is never suppressed by itself.
    pub fn suppress(&mut self, detail: FailureDetail) -> bool {
        if detail.cause.same_instance(&self.primary.cause) {
            return false;
        }
        self.secondary.push(detail);
        true
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.primary.cause.downcast_ref::<E>()
    }

    pub fn into_parts(self) -> (FailureDetail, Vec<FailureDetail>) {
        (self.primary, self.secondary.into_vec())
    }

    pub fn into_error(self) -> Box<DynError> {
        Box::new(Reported(self))
    }
}

impl fmt::Display for Failure {
    /// `{}` prints the primary only; `{:#}` also lists secondaries.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if self.secondary.is_empty() {
            return Ok(());
        }
        if f.alternate() {
            for (i, detail) in self.secondary.iter().enumerate() {
                write!(f, "\n  suppressed[{i}]: {detail}")?;
            }
            Ok(())
        } else {
            write!(f, " (+{} suppressed)", self.secondary.len())
        }
    }
}

impl<E> From<E> for Failure
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(FailureDetail::new(FailureKind::Body, error))
    }
}

impl From<Cause> for Failure {
    fn from(cause: Cause) -> Self {
        Self::new(FailureDetail::new(FailureKind::Body, cause))
    }
}

impl From<Failure> for Box<dyn Error + Send + Sync + 'static> {
    fn from(failure: Failure) -> Self {
        failure.into_error()
    }
}

impl From<Failure> for Box<dyn Error + 'static> {
    fn from(failure: Failure) -> Self {
        Box::new(Reported(failure))
    }
}

/// `Error` view of a [`Failure`]; `source()` is the primary cause.
struct Reported(Failure);

impl fmt::Debug for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl Error for Reported {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.0.primary.cause.as_error())
    }
}

// ---------------------------------------------------------------------------
// IntoFailure
// ---------------------------------------------------------------------------

/// Conversion applied where a scoped block receives an error from user code.
///
/// Plain errors become a new [`Failure`] tagged with `kind`. An existing
/// `Failure` passes through untouched, which is how an inner block's outcome
/// (secondaries included) propagates through an outer block.
pub trait IntoFailure {
    fn into_failure(self, kind: FailureKind) -> Failure;
}

impl<E> IntoFailure for E
where
    E: Error + Send + Sync + 'static,
{
    fn into_failure(self, kind: FailureKind) -> Failure {
        Failure::new(FailureDetail::new(kind, self))
    }
}

impl IntoFailure for Cause {
    fn into_failure(self, kind: FailureKind) -> Failure {
        Failure::new(FailureDetail::new(kind, self))
    }
}

impl IntoFailure for Failure {
    fn into_failure(self, _kind: FailureKind) -> Failure {
        self
    }
}
