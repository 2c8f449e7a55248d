//! Shared utilities for the guest list backend.
//!
//! This crate provides functionality used across the other crates:
//! - Required-field validation for registration input
//! - Input normalization (trimming, handle cleanup)

pub mod validation;
