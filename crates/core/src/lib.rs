//! Haneul Market Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront service and its
//! tests:
//! - type-safe UUID identifiers for every backend entity
//! - KRW prices, email addresses and review ratings
//! - status enums with their display tables (label, tone, icon)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no caching.
//! Every status enum carries an `Unknown` fallback variant so values the
//! backend adds later render as a generic status instead of failing to parse.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
