//! Noteblocks CLI Library
//!
//! This library provides reusable components for the noteblocks CLI tool.

pub mod input;
