//! Melodia CLI library.
//!
//! This crate provides the functionality behind the `melodia` binary:
//! configuration loading, logging, and the `generate`, `validate` and
//! `verify` commands.

pub mod commands;
pub mod input;
pub mod logger;
