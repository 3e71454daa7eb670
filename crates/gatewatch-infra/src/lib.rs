//! Infrastructure layer - file-backed collaborators for the checkpoint core

pub mod persistence;
pub mod registry_loader;
pub mod source;
