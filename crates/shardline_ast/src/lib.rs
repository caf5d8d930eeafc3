//! Statement trees as produced by the upstream SQL parser.
//!
//! A raw tree has every `bound` slot set to `None`. The binder produces a new
//! tree of the same shape with those slots filled in.

pub mod ast;
pub mod builder;
pub mod statement;
