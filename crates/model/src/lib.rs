//! The face restoration model as an external collaborator.
//!
//! [`Restorer`] is the seam the service depends on. [`CommandRestorer`]
//! implements it by driving a model adapter process (by default a Python
//! GFPGAN wrapper) over a small JSON protocol.

pub mod command;
pub mod restorer;
pub mod settings;
pub mod subprocess;

pub use command::{CommandConfig, CommandRestorer};
pub use restorer::{Enhancement, RestoreError, RestoreOptions, Restorer};
pub use settings::ModelSettings;
