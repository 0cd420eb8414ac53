//! # subtake common models
//!
//! Types shared by every crate of the workspace:
//!
//! * **[`domain`]**: validated domain names and the hostname grammar used to vet
//!   discovered subdomains before they are probed.
//! * **[`signatures`]**: the takeover fingerprint table.
//! * **[`takeover`]**: verdicts and findings produced by the matcher.
//! * **[`config`]**: run configuration assembled by the CLI.

pub mod config;
pub mod domain;
pub mod signatures;
pub mod takeover;
