//! Core types for Haneul Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod display;
pub mod email;
pub mod id;
pub mod price;
pub mod rating;
pub mod status;

pub use display::{Icon, StatusDisplay, Tone};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use rating::{Rating, RatingError};
pub use status::*;
