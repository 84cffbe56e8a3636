pub mod files;
pub mod restore;
