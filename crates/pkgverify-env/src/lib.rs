//! pkgverify-env: isolated install environments for pkgverify
//!
//! This crate is the environment layer of the verifier. It owns two concerns:
//!
//! - [`process`]: spawning external commands with captured output and a
//!   wall-clock bound, so a hanging installer is reported instead of waited on.
//! - [`venv`]: provisioning a throwaway Python virtual environment per
//!   repository and attempting `pip` installs inside it.
//!
//! The [`InstallEnvironment`] and [`EnvironmentProvisioner`] traits are the
//! seam the check runner talks to; tests substitute in-memory fakes.

pub mod environment;
pub mod error;
pub mod process;
pub mod venv;

pub use environment::{
    classify_install, EnvironmentProvisioner, InstallEnvironment, InstallResult, Installed,
};
pub use error::{InstallError, InstallErrorKind, ProcessError};
pub use process::{run_bounded, CommandSpec, ProcessOutput};
pub use venv::{venv_python, VenvConfig, VenvEnvironment, VenvProvisioner};
