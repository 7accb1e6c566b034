//! Phase definition and run semantics.
//!
//! A `Phase` wraps a pre-hook chain and a post-hook chain around a single
//! execute function:
//!
//! ```text
//! value -> [pre hooks] -> execute -> [post hooks] -> value
//! ```
//!
//! Any failure stops the run and is routed through the phase's
//! `ErrorHandler`. A phase with no execute function is misconfigured, and
//! running it panics instead of returning an error.

use crate::errors::PhaseError;
use crate::handler::{ErrorHandler, PassThrough};
use crate::hook::{Hook, HookChain, Stage};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type ExecuteFn<T> = Arc<dyn Fn(T) -> anyhow::Result<T> + Send + Sync>;

/// A named unit of work: pre-hooks, execute, post-hooks.
///
/// Configure with `&mut self` methods, then call `run` any number of times.
/// The phase keeps no per-run state, so a fully configured phase can be
/// shared behind an `Arc` and run concurrently as long as its hooks and
/// execute function tolerate that.
pub struct Phase<T> {
    /// Identifier of the phase. Expected to be unique within a manager,
    /// which is where uniqueness is enforced.
    pub name: String,
    pre_hooks: HookChain<T>,
    execute: Option<ExecuteFn<T>>,
    post_hooks: HookChain<T>,
    error_handler: Arc<dyn ErrorHandler<T>>,
}

impl<T> Phase<T> {
    /// Create an unconfigured phase: empty chains, no execute function and
    /// the `PassThrough` error handler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pre_hooks: HookChain::new(Stage::Pre),
            execute: None,
            post_hooks: HookChain::new(Stage::Post),
            error_handler: Arc::new(PassThrough),
        }
    }

    /// Builder form of `set_execute`.
    pub fn with_execute<F>(mut self, execute: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.set_execute(execute);
        self
    }

    /// Builder form of `set_error_handler`.
    pub fn with_error_handler<H>(mut self, handler: H) -> Self
    where
        H: ErrorHandler<T> + 'static,
    {
        self.set_error_handler(handler);
        self
    }

    /// Assign the core function, replacing any previous one.
    pub fn set_execute<F>(&mut self, execute: F)
    where
        F: Fn(T) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(execute));
    }

    /// Replace the error handler used by every stage of the run.
    pub fn set_error_handler<H>(&mut self, handler: H)
    where
        H: ErrorHandler<T> + 'static,
    {
        self.error_handler = Arc::new(handler);
    }

    /// Whether an execute function has been assigned.
    pub fn is_implemented(&self) -> bool {
        self.execute.is_some()
    }

    pub fn pre_hooks(&self) -> &HookChain<T> {
        &self.pre_hooks
    }

    pub fn post_hooks(&self) -> &HookChain<T> {
        &self.post_hooks
    }

    pub fn prepend_pre_hook(&mut self, hook: Hook<T>) {
        self.pre_hooks.prepend(hook);
    }

    pub fn append_pre_hook(&mut self, hook: Hook<T>) {
        self.pre_hooks.append(hook);
    }

    pub fn prepend_post_hook(&mut self, hook: Hook<T>) {
        self.post_hooks.prepend(hook);
    }

    pub fn append_post_hook(&mut self, hook: Hook<T>) {
        self.post_hooks.append(hook);
    }

    /// Invoke the execute function directly, bypassing hooks and the error
    /// handler.
    ///
    /// # Panics
    ///
    /// Panics if no execute function has been assigned.
    pub fn execute(&self, value: T) -> anyhow::Result<T> {
        match &self.execute {
            Some(execute) => execute(value),
            None => panic!("phase {} not implemented", self.name),
        }
    }

    /// Pass an error to the phase's error handler.
    pub fn handle_error(&self, err: PhaseError) -> Result<T, PhaseError> {
        self.error_handler.handle_error(err)
    }

    /// Run pre-hooks, execute and post-hooks over `value`.
    ///
    /// The first failure in any stage ends the run with the error handler's
    /// result; later stages never see the value.
    ///
    /// # Panics
    ///
    /// Panics if the pre-hooks succeed and no execute function has been
    /// assigned.
    pub fn run(&self, value: T) -> Result<T, PhaseError> {
        debug!(
            phase = %self.name,
            stage = %Stage::Pre,
            hooks = self.pre_hooks.len(),
            "running stage"
        );
        let value = match self.pre_hooks.try_apply(value) {
            Ok(value) => value,
            Err(err) => return self.fail(err),
        };

        debug!(phase = %self.name, stage = %Stage::Execute, "running stage");
        let value = match self.execute(value) {
            Ok(value) => value,
            Err(source) => {
                return self.fail(PhaseError::Execute {
                    phase: self.name.clone(),
                    source,
                });
            }
        };

        debug!(
            phase = %self.name,
            stage = %Stage::Post,
            hooks = self.post_hooks.len(),
            "running stage"
        );
        match self.post_hooks.try_apply(value) {
            Ok(value) => {
                debug!(phase = %self.name, "phase complete");
                Ok(value)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: PhaseError) -> Result<T, PhaseError> {
        debug!(phase = %self.name, error = %err, "phase failed, invoking error handler");
        self.handle_error(err)
    }
}

impl<T> Default for Phase<T> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<T> Clone for Phase<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pre_hooks: self.pre_hooks.clone(),
            execute: self.execute.clone(),
            post_hooks: self.post_hooks.clone(),
            error_handler: Arc::clone(&self.error_handler),
        }
    }
}

impl<T> fmt::Debug for Phase<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("pre_hooks", &self.pre_hooks)
            .field("implemented", &self.execute.is_some())
            .field("post_hooks", &self.post_hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn constant(n: i32) -> Hook<i32> {
        Hook::new(move |_| Ok(n))
    }

    fn failing(message: &'static str) -> Hook<i32> {
        Hook::new(move |_| Err(anyhow::anyhow!(message)))
    }

    fn expect(expected: i32) -> Hook<i32> {
        Hook::new(move |v: i32| {
            anyhow::ensure!(v == expected, "expected {expected}, got {v}");
            Ok(v)
        })
    }

    fn counter() -> (Arc<AtomicUsize>, Hook<i32>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = {
            let calls = Arc::clone(&calls);
            Hook::new(move |v: i32| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            })
        };
        (calls, hook)
    }

    fn identity(name: &str) -> Phase<i32> {
        Phase::new(name).with_execute(Ok)
    }

    #[test]
    #[should_panic(expected = "phase  not implemented")]
    fn test_default_execute_panics() {
        let phase: Phase<()> = Phase::default();
        let _ = phase.execute(());
    }

    #[test]
    #[should_panic(expected = "phase build not implemented")]
    fn test_default_run_panics() {
        let phase: Phase<()> = Phase::new("build");
        let _ = phase.run(());
    }

    #[test]
    fn test_unimplemented_phase_reports_itself() {
        let phase: Phase<i32> = Phase::new("x");
        assert!(!phase.is_implemented());
        assert!(identity("x").is_implemented());
    }

    #[test]
    fn test_pre_hook_failure_precedes_missing_execute() {
        let mut phase: Phase<i32> = Phase::new("unset");
        phase.append_pre_hook(failing("invalid input"));
        let err = phase.run(1).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Pre));
    }

    #[test]
    fn test_add_pre_hooks() {
        let mut phase: Phase<i32> = Phase::default();
        assert_eq!(phase.pre_hooks().len(), 0);

        phase.append_pre_hook(constant(1));
        phase.prepend_pre_hook(constant(0));
        phase.append_pre_hook(constant(2));

        assert_eq!(phase.pre_hooks().len(), 3);
        for (i, hook) in phase.pre_hooks().iter().enumerate() {
            assert_eq!(hook.call(0).unwrap(), i as i32);
        }
        assert!(phase.post_hooks().is_empty());
    }

    #[test]
    fn test_add_post_hooks() {
        let mut phase: Phase<i32> = Phase::default();
        assert_eq!(phase.post_hooks().len(), 0);

        phase.append_post_hook(constant(1));
        phase.prepend_post_hook(constant(0));
        phase.append_post_hook(constant(2));

        assert_eq!(phase.post_hooks().len(), 3);
        for (i, hook) in phase.post_hooks().iter().enumerate() {
            assert_eq!(hook.call(0).unwrap(), i as i32);
        }
        assert!(phase.pre_hooks().is_empty());
    }

    #[test]
    fn test_execute_directly() {
        let phase = identity("echo");
        assert_eq!(phase.execute(1).unwrap(), 1);
    }

    #[test]
    fn test_run_round_trip() {
        let val = 1;
        let mut phase = Phase::new("double-then-halve").with_execute(move |v: i32| {
            anyhow::ensure!(v == val * 2, "execute saw {v}");
            Ok(v)
        });
        phase.append_pre_hook(Hook::new(|v: i32| Ok(v * 2)));
        phase.append_pre_hook(expect(val * 2));
        phase.append_post_hook(expect(val * 2));
        phase.append_post_hook(Hook::new(|v: i32| Ok(v / 2)));
        phase.append_post_hook(expect(val));

        assert_eq!(phase.run(val).unwrap(), val);
    }

    #[test]
    fn test_run_with_no_hooks_is_execute() {
        let phase = Phase::new("inc").with_execute(|v: i32| Ok(v + 1));
        assert_eq!(phase.run(41).unwrap(), 42);
    }

    #[test]
    fn test_pre_hook_failure_skips_execute_and_post_hooks() {
        let executed = Arc::new(AtomicUsize::new(0));
        let (post_calls, post_hook) = counter();
        let mut phase = {
            let executed = Arc::clone(&executed);
            Phase::new("guarded").with_execute(move |v: i32| {
                executed.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            })
        };
        phase.append_pre_hook(failing("schema check failed"));
        phase.append_post_hook(post_hook);

        let err = phase.run(0).unwrap_err();
        assert!(matches!(err, PhaseError::Hook { stage: Stage::Pre, index: 0, .. }));
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_execute_failure_skips_post_hooks() {
        let (post_calls, post_hook) = counter();
        let mut phase =
            Phase::new("compile").with_execute(|_: i32| Err(anyhow::anyhow!("compiler crashed")));
        phase.append_post_hook(post_hook);

        let err = phase.run(3).unwrap_err();
        match err {
            PhaseError::Execute { phase, source } => {
                assert_eq!(phase, "compile");
                assert_eq!(source.to_string(), "compiler crashed");
            }
            other => panic!("Expected Execute error, got {other:?}"),
        }
        assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_post_hook_failure_stops_remaining_post_hooks() {
        let (calls, tail) = counter();
        let mut phase = identity("post");
        phase.append_post_hook(constant(5));
        phase.append_post_hook(failing("output too large"));
        phase.append_post_hook(tail);

        let err = phase.run(0).unwrap_err();
        assert!(matches!(err, PhaseError::Hook { stage: Stage::Post, index: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_handle_error_is_pass_through() {
        let phase = identity("p");
        let err = phase
            .handle_error(PhaseError::Other(anyhow::anyhow!("boom")))
            .unwrap_err();
        assert!(matches!(err, PhaseError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_custom_handler_sees_every_stage() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let handler = {
            let stages = Arc::clone(&stages);
            move |err: PhaseError| -> Result<i32, PhaseError> {
                stages.lock().unwrap().push(err.stage());
                Err(err)
            }
        };

        let mut pre = identity("a").with_error_handler(handler.clone());
        pre.append_pre_hook(failing("pre"));
        let exec = Phase::new("b")
            .with_execute(|_: i32| Err(anyhow::anyhow!("exec")))
            .with_error_handler(handler.clone());
        let mut post = identity("c").with_error_handler(handler);
        post.append_post_hook(failing("post"));

        assert!(pre.run(0).is_err());
        assert!(exec.run(0).is_err());
        assert!(post.run(0).is_err());
        assert_eq!(
            stages.lock().unwrap().as_slice(),
            [Some(Stage::Pre), Some(Stage::Execute), Some(Stage::Post)]
        );
    }

    #[test]
    fn test_fallback_from_pre_hook_failure_ends_run() {
        let (post_calls, post_hook) = counter();
        let mut phase = Phase::new("fallback")
            .with_execute(|v: i32| Ok(v * 100))
            .with_error_handler(|_: PhaseError| -> Result<i32, PhaseError> { Ok(-1) });
        phase.append_pre_hook(failing("rejected"));
        phase.append_post_hook(post_hook);

        // The substitute value is the run's result; execute never sees it.
        assert_eq!(phase.run(7).unwrap(), -1);
        assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_phase_is_reusable_across_runs() {
        let mut phase = Phase::new("inc").with_execute(|v: i32| Ok(v + 1));
        phase.append_pre_hook(Hook::new(|v: i32| Ok(v * 10)));
        assert_eq!(phase.run(1).unwrap(), 11);
        assert_eq!(phase.run(2).unwrap(), 21);

        phase.append_post_hook(Hook::new(|v: i32| Ok(-v)));
        assert_eq!(phase.run(1).unwrap(), -11);
    }

    #[test]
    fn test_clone_has_independent_chains() {
        let mut original = identity("orig");
        original.append_pre_hook(constant(1));
        let mut copy = original.clone();
        copy.append_pre_hook(constant(2));

        assert_eq!(original.pre_hooks().len(), 1);
        assert_eq!(copy.pre_hooks().len(), 2);
        assert!(
            original
                .pre_hooks()
                .get(0)
                .unwrap()
                .ptr_eq(copy.pre_hooks().get(0).unwrap())
        );
    }

    #[test]
    fn test_concurrent_runs_share_phase() {
        let mut phase = Phase::new("square").with_execute(|v: u64| Ok(v * v));
        phase.append_post_hook(Hook::new(|v: u64| Ok(v + 1)));
        let phase = Arc::new(phase);

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let phase = Arc::clone(&phase);
                std::thread::spawn(move || phase.run(i).unwrap())
            })
            .collect();
        let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, (0..8u64).map(|i| i * i + 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_debug_output() {
        let phase = identity("dbg");
        let out = format!("{phase:?}");
        assert!(out.contains("dbg"));
        assert!(out.contains("implemented: true"));
    }
}
