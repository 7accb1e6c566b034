//! Error handling strategies for phases.
//!
//! Every failure inside a phase run, whether raised by a pre-hook, execute or
//! a post-hook, is passed to the phase's `ErrorHandler` and the handler's
//! return value becomes the result of the run. The default `PassThrough`
//! handler performs no recovery. Custom handlers can release resources, emit
//! telemetry, substitute a fallback value or replace the error.

use crate::errors::PhaseError;

/// Decides what a failed phase run returns.
pub trait ErrorHandler<T>: Send + Sync {
    /// `Err` surfaces an error to the caller of `run`, `Ok` recovers with a
    /// substitute value.
    fn handle_error(&self, err: PhaseError) -> Result<T, PhaseError>;
}

/// Default handler: discards the in-flight value and returns the error as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl<T> ErrorHandler<T> for PassThrough {
    fn handle_error(&self, err: PhaseError) -> Result<T, PhaseError> {
        Err(err)
    }
}

impl<T, F> ErrorHandler<T> for F
where
    F: Fn(PhaseError) -> Result<T, PhaseError> + Send + Sync,
{
    fn handle_error(&self, err: PhaseError) -> Result<T, PhaseError> {
        self(err)
    }
}
