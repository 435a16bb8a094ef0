//! Version history module

pub mod store;

pub use store::{Direction, FileUpload, NewVersion, VersionStore};
