//! Minimal phase-execution pipeline.
//!
//! A [`Phase`] threads one value through an ordered pre-hook chain, a core
//! execute function and an ordered post-hook chain, stopping at the first
//! error and routing it through a pluggable [`ErrorHandler`].
//!
//! ```
//! use phaser::{Hook, Phase};
//!
//! let mut phase = Phase::new("double").with_execute(|v: i32| Ok(v * 2));
//! phase.append_pre_hook(Hook::new(|v: i32| {
//!     anyhow::ensure!(v >= 0, "negative input");
//!     Ok(v)
//! }));
//!
//! assert_eq!(phase.run(21).unwrap(), 42);
//! assert!(phase.run(-1).is_err());
//! ```

pub mod config;
pub mod errors;
pub mod handler;
pub mod hook;
pub mod logging;
pub mod manager;
pub mod phase;

pub use config::{DuplicatePolicy, RegistryConfig};
pub use errors::{ManagerError, PhaseError};
pub use handler::{ErrorHandler, PassThrough};
pub use hook::{Hook, HookChain, Stage};
pub use manager::{PhaseManager, PhaseRegistry};
pub use phase::Phase;
