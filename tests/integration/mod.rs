//! Integration test suite for aznaming
//!
//! End-to-end tests over the public API and the `aznaming` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: the binary, driven with `assert_cmd`
//! - **invoke**: JSON-in, JSON-out invocations and configuration layering
//! - **naming**: name synthesis over a complete configuration
//! - **sections**: configuration sources on disk, manifests and references

mod cli;
mod invoke;
mod naming;
mod sections;
