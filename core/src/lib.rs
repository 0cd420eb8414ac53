//! # subtake core
//!
//! The enumeration and takeover-detection engine.
//!
//! * **[`source`]**: discovery tool adapters behind the [`source::SubdomainSource`] trait.
//! * **[`parser`]**: per-format hostname extraction from raw tool output.
//! * **[`aggregator`]**: the deduplicated subdomain set of one domain.
//! * **[`repository`]**: durable storage of raw logs and final lists.
//! * **[`matcher`]**: fingerprint matching over fetched pages.
//! * **[`pipeline`]**: the per-domain workflow tying everything together.

pub mod aggregator;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod repository;
pub mod source;
