//! # Aetheria Development Tools
//!
//! Command-line tools for development:
//! - Data validators
//! - Zone generation reports
//! - Headless simulation runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod report;
pub mod validate;
