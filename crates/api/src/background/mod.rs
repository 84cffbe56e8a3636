//! Background restoration work.
//!
//! Each submission spawns one short-lived task via [`Restorations::spawn`].
//! A semaphore bounds how many restorations run at once and the
//! [`JobRegistry`] tracks the outcome of the latest task per hash.

pub mod registry;
pub mod restoration;

pub use registry::JobRegistry;
pub use restoration::{RestoreJob, Restorations};
