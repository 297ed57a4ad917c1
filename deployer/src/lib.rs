//! Prism Deployer Library
//!
//! Idempotent bootstrap and redeploy orchestration for a single Prism
//! host: probe the OS, install the container runtime, provision a
//! deploy key, synchronize the application source, and converge the
//! running container set.

pub mod credentials;
pub mod deploy;
pub mod deploylog;
pub mod errors;
pub mod exec;
pub mod host;
pub mod installer;
pub mod layout;
pub mod lockfile;
pub mod logs;
pub mod netinfo;
pub mod orchestrator;
pub mod outcome;
pub mod settings;
pub mod supervisor;
pub mod utils;
