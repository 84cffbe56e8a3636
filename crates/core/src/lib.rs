//! Pure domain logic for the face restoration service.
//!
//! Content hashing, the on-disk result layout, result records and request
//! option parsing. Nothing in this crate touches the filesystem or the
//! network so it can be tested in isolation.

pub mod content_hash;
pub mod error;
pub mod hide_faces;
pub mod layout;
pub mod record;
