//! Releasable resource abstraction for Warden.
//!
//! A scoped block only needs one thing from a resource: a way to release it
//! that may fail. Everything here is an implementation of [`Release`].

pub mod file;
pub mod probe;
pub mod quiet;

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use warden_core::Cause;

pub use file::{FileReader, FileWriter};
pub use probe::{Behavior, Probe, ProbeHandle};
pub use quiet::Quiet;

/// A resource that a scoped block releases on exit.
///
/// `release` is called at most once per slot by a block, but a resource may
/// be bound to more than one slot; implementations decide whether a second
/// release is a no-op.
pub trait Release {
    fn release(&mut self) -> Result<(), Cause>;

    /// Name used in logs and failure reports.
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }
}

impl<R: Release + ?Sized> Release for &mut R {
    fn release(&mut self) -> Result<(), Cause> {
        (**self).release()
    }

    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }
}

impl<R: Release + ?Sized> Release for Box<R> {
    fn release(&mut self) -> Result<(), Cause> {
        (**self).release()
    }

    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }
}

/// Shared slot: several block slots (or code outside the block) may hold the
/// same underlying resource. Each slot releases it independently.
impl<R: Release> Release for Rc<RefCell<R>> {
    fn release(&mut self) -> Result<(), Cause> {
        self.try_borrow_mut()?.release()
    }

    fn label(&self) -> Cow<'_, str> {
        match self.try_borrow() {
            Ok(inner) => Cow::Owned(inner.label().into_owned()),
            Err(_) => Cow::Borrowed("<borrowed>"),
        }
    }
}

/// `None` releases trivially.
impl<R: Release> Release for Option<R> {
    fn release(&mut self) -> Result<(), Cause> {
        match self {
            Some(inner) => inner.release(),
            None => Ok(()),
        }
    }

    fn label(&self) -> Cow<'_, str> {
        match self {
            Some(inner) => inner.label(),
            None => Cow::Borrowed("None"),
        }
    }
}

/// `warden_resource::file::FileReader` -> `FileReader`, keeping generics.
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
