//! Phase registration and hook routing.
//!
//! `PhaseManager` is the capability an orchestrator uses to own named phases
//! and attach hooks to them by name. `PhaseRegistry` is the in-memory
//! implementation shipped with this crate:
//!
//! - Hooks attached through the manager are appended, exactly like calling
//!   `append_pre_hook` / `append_post_hook` on the phase itself.
//! - Attaching a hook to an unknown name is an error.
//! - Registering a name twice follows `RegistryConfig::on_duplicate`.
//!
//! Registration order is remembered for listing only. Phases are independent
//! of each other; the registry does not sequence them.

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::errors::ManagerError;
use crate::hook::Hook;
use crate::phase::Phase;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Owns named phases and routes hook attachment to them.
pub trait PhaseManager<T> {
    /// Register `phase` under `name`.
    fn add_phase(&mut self, name: &str, phase: Phase<T>) -> Result<(), ManagerError>;

    /// Attach a hook to the end of the named phase's pre-hook chain.
    fn add_pre_hook(&mut self, name: &str, hook: Hook<T>) -> Result<(), ManagerError>;

    /// Attach a hook to the end of the named phase's post-hook chain.
    fn add_post_hook(&mut self, name: &str, hook: Hook<T>) -> Result<(), ManagerError>;
}

/// In-memory `PhaseManager`.
pub struct PhaseRegistry<T> {
    config: RegistryConfig,
    phases: HashMap<String, Phase<T>>,
    /// Names in registration order
    order: Vec<String>,
}

impl<T> PhaseRegistry<T> {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            phases: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn get(&self, name: &str) -> Option<&Phase<T>> {
        self.phases.get(name)
    }

    /// Mutable access for configuration beyond appending hooks (prepending,
    /// swapping the error handler).
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Phase<T>> {
        self.phases.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phases.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Remove a phase, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<Phase<T>> {
        let phase = self.phases.remove(name)?;
        self.order.retain(|n| n != name);
        Some(phase)
    }

    /// Run the named phase.
    ///
    /// # Panics
    ///
    /// Panics if the phase has no execute function (see `Phase::run`).
    pub fn run(&self, name: &str, value: T) -> Result<T, ManagerError> {
        let phase = self.lookup(name)?;
        Ok(phase.run(value)?)
    }

    fn lookup(&self, name: &str) -> Result<&Phase<T>, ManagerError> {
        self.phases
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPhase {
                name: name.to_string(),
            })
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Phase<T>, ManagerError> {
        self.phases
            .get_mut(name)
            .ok_or_else(|| ManagerError::UnknownPhase {
                name: name.to_string(),
            })
    }
}

impl<T> Default for PhaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PhaseManager<T> for PhaseRegistry<T> {
    fn add_phase(&mut self, name: &str, phase: Phase<T>) -> Result<(), ManagerError> {
        if self.phases.contains_key(name) {
            match self.config.on_duplicate {
                DuplicatePolicy::Reject => {
                    return Err(ManagerError::DuplicatePhase {
                        name: name.to_string(),
                    });
                }
                DuplicatePolicy::Replace => {
                    warn!(phase = name, "replacing registered phase");
                    self.phases.insert(name.to_string(), phase);
                    return Ok(());
                }
            }
        }

        debug!(phase = name, "registering phase");
        self.phases.insert(name.to_string(), phase);
        self.order.push(name.to_string());
        Ok(())
    }

    fn add_pre_hook(&mut self, name: &str, hook: Hook<T>) -> Result<(), ManagerError> {
        let phase = self.lookup_mut(name)?;
        phase.append_pre_hook(hook);
        debug!(phase = name, hooks = phase.pre_hooks().len(), "attached pre hook");
        Ok(())
    }

    fn add_post_hook(&mut self, name: &str, hook: Hook<T>) -> Result<(), ManagerError> {
        let phase = self.lookup_mut(name)?;
        phase.append_post_hook(hook);
        debug!(phase = name, hooks = phase.post_hooks().len(), "attached post hook");
        Ok(())
    }
}

impl<T> std::fmt::Debug for PhaseRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseRegistry")
            .field("config", &self.config)
            .field("phases", &self.order)
            .finish()
    }
}
