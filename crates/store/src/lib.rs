//! Filesystem content store for original images and restoration results.
//!
//! One directory per [`ContentHash`](restora_core::content_hash::ContentHash)
//! under a configurable root. See [`restora_core::layout`] for the layout.

pub mod codec;
pub mod error;
pub mod locks;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use locks::{HashGuard, HashLocks};
pub use store::{ContentStore, StoredOriginal};
