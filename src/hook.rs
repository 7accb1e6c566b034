//! Hooks and ordered hook chains.
//!
//! A `Hook<T>` is a unary transform that may fail. A `HookChain<T>` keeps
//! hooks in insertion order and applies them one after another, feeding each
//! hook's output to the next. The first failing hook stops the chain and its
//! error is routed through the owner's `ErrorHandler`.

use crate::errors::PhaseError;
use crate::handler::ErrorHandler;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The stages of a phase run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Hooks run before execute; validate or preprocess the input
    Pre,
    /// The phase's core function
    Execute,
    /// Hooks run after execute; validate or postprocess the output
    Post,
}

impl Stage {
    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pre => "pre",
            Stage::Execute => "execute",
            Stage::Post => "post",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shared, fallible transform over a phase value.
///
/// Cloning a hook is cheap and yields the same function value, so one hook
/// may be attached several times or to several phases.
pub struct Hook<T> {
    func: Arc<dyn Fn(T) -> anyhow::Result<T> + Send + Sync>,
}

impl<T> Hook<T> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Invoke the hook on a value.
    pub fn call(&self, value: T) -> anyhow::Result<T> {
        (self.func)(value)
    }

    /// Whether both hooks wrap the same function value.
    pub fn ptr_eq(&self, other: &Hook<T>) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

/// An ordered sequence of hooks for one stage.
///
/// Order is execution order. `prepend` always inserts at index 0 and
/// `append` always at the end, however the two are interleaved. The chain
/// has no internal synchronization; mutation needs `&mut self`.
pub struct HookChain<T> {
    stage: Stage,
    hooks: VecDeque<Hook<T>>,
}

impl<T> HookChain<T> {
    /// Create an empty chain for the given stage.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            hooks: VecDeque::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Insert a hook ahead of every hook currently in the chain.
    pub fn prepend(&mut self, hook: Hook<T>) {
        self.hooks.push_front(hook);
    }

    /// Insert a hook after every hook currently in the chain.
    pub fn append(&mut self, hook: Hook<T>) {
        self.hooks.push_back(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Hook<T>> {
        self.hooks.get(index)
    }

    /// Iterate over hooks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Hook<T>> {
        self.hooks.iter()
    }

    /// Apply every hook in order, threading the value through.
    ///
    /// Stops at the first failing hook: later hooks are never invoked and the
    /// result is whatever `handler` returns for the wrapped error. An empty
    /// chain returns `value` unchanged.
    pub fn apply<H>(&self, value: T, handler: &H) -> Result<T, PhaseError>
    where
        H: ErrorHandler<T> + ?Sized,
    {
        self.try_apply(value).or_else(|err| handler.handle_error(err))
    }

    /// Like `apply`, but returns the failing hook's error without consulting
    /// any handler.
    pub fn try_apply(&self, mut value: T) -> Result<T, PhaseError> {
        for (index, hook) in self.hooks.iter().enumerate() {
            trace!(stage = %self.stage, index, "applying hook");
            match hook.call(value) {
                Ok(next) => value = next,
                Err(source) => {
                    debug!(
                        stage = %self.stage,
                        index,
                        skipped = self.hooks.len() - index - 1,
                        "hook failed, stopping chain"
                    );
                    return Err(PhaseError::Hook {
                        stage: self.stage,
                        index,
                        source,
                    });
                }
            }
        }
        Ok(value)
    }
}

impl<T> Clone for HookChain<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage,
            hooks: self.hooks.clone(),
        }
    }
}

impl<T> fmt::Debug for HookChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("stage", &self.stage)
            .field("len", &self.hooks.len())
            .finish()
    }
}
