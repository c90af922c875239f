//! Shared vocabulary for the Magik toolchain crates.
//!
//! - [`span`]: byte spans and source locations
//! - [`token`]: the token vocabulary produced by `magik-lexer`

pub mod span;
pub mod token;
