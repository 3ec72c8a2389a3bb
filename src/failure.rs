//! Process-wide failure channel
//!
//! Storage failures during checkpointing must not break the streaming path,
//! so `load`/`save` never return them. They are handed to a [`FailureHandler`]
//! instead. The default handler logs through `tracing`; an embedding process
//! can install its own with [`set_failure_handler`] (e.g. to bump a metric or
//! mark the task unhealthy).

use crate::error::Error;
use std::sync::{Arc, LazyLock, RwLock};

/// Receiver for failures that are not propagated to the caller
pub trait FailureHandler: Send + Sync {
    /// Handle a failure raised while touching a snapshot location
    fn handle(&self, error: &Error);
}

/// Default handler: logs the failure at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureHandler;

impl FailureHandler for LogFailureHandler {
    fn handle(&self, error: &Error) {
        tracing::error!(error = %error, "snapshot persistence failure");
    }
}

impl<F> FailureHandler for F
where
    F: Fn(&Error) + Send + Sync,
{
    fn handle(&self, error: &Error) {
        self(error);
    }
}

static GLOBAL_HANDLER: LazyLock<RwLock<Arc<dyn FailureHandler>>> =
    LazyLock::new(|| RwLock::new(Arc::new(LogFailureHandler)));

/// Replace the process-wide failure handler, returning the previous one
pub fn set_failure_handler(handler: Arc<dyn FailureHandler>) -> Arc<dyn FailureHandler> {
    let mut slot = GLOBAL_HANDLER
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    std::mem::replace(&mut *slot, handler)
}

/// Current process-wide failure handler
pub fn global_handler() -> Arc<dyn FailureHandler> {
    let slot = GLOBAL_HANDLER
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Arc::clone(&slot)
}

/// Report a failure to the process-wide handler
pub fn report_failure(error: &Error) {
    global_handler().handle(error);
}
