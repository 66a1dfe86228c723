//! Release automation for the mobile editor and the apps that ship it.
//!
//! The crate drives a multi-repo release train: it cuts a frozen release
//! branch in the editor repo, pins the wrapper repo's submodule to it,
//! publishes the GitHub release, and opens integration pull requests in
//! the consuming apps. The [`gh::Remote`] trait is the seam between the
//! workflow logic and the GitHub REST API, so every workflow is testable
//! against an in-memory remote.

pub mod config;
pub mod console;
pub mod error;
pub mod gh;
pub mod release;
pub mod render;
pub mod shell;
pub mod version;
pub mod workspace;
pub mod yamledit;

pub use error::{ReleaseError, Result};
pub use version::Version;
