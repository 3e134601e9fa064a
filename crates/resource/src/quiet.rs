//! Release adapter that logs release failures instead of reporting them.
//!
//! Only wrap resources whose release failure is genuinely ignorable, e.g. a
//! read-only file whose contents were already consumed.
//!
//! ```ignore
//! let reader = Quiet::new(FileReader::open(path)?).with_level(Level::WARN);
//! ```

use crate::Release;
use std::borrow::Cow;
use tracing::Level;
use warden_core::Cause;

pub struct Quiet<R> {
    inner: R,
    level: Level,
    message: Option<String>,
}

impl<R: Release> Quiet<R> {
    /// Logs swallowed failures at `DEBUG` with the cause's own message.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            level: Level::DEBUG,
            message: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Fixed log message used in place of the cause's message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn get(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn log(&self, cause: &Cause) {
        let resource = self.inner.label();
        let message = match &self.message {
            Some(m) => m.clone(),
            None => cause.to_string(),
        };

        if self.level == Level::ERROR {
            tracing::error!(%resource, error = %cause, "{message}");
        } else if self.level == Level::WARN {
            tracing::warn!(%resource, error = %cause, "{message}");
        } else if self.level == Level::INFO {
            tracing::info!(%resource, error = %cause, "{message}");
        } else if self.level == Level::DEBUG {
            tracing::debug!(%resource, error = %cause, "{message}");
        } else {
            tracing::trace!(%resource, error = %cause, "{message}");
        }
    }
}

impl<R: Release> Release for Quiet<R> {
    fn release(&mut self) -> Result<(), Cause> {
        if let Err(cause) = self.inner.release() {
            self.log(&cause);
        }
        Ok(())
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("Quiet({})", self.inner.label()))
    }
}
