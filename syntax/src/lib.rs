#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]
#![allow(clippy::unneeded_field_pattern)]

//! The syntax tree handed from the parser to the semantic analysis.
//!
//! Names arrive as unresolved identifier chains and types as unresolved
//! names. The analysis fills the `resolved`/`ty` slots, replaces name chains
//! by concrete accesses and adds compiler generated members, after which the
//! tree is ready for code generation.
#[macro_use]
extern crate derive_more;

pub mod ast;
pub mod build;
pub mod types;
#[macro_use]
pub mod visitor;

pub use crate::{
    ast::*,
    types::{ClassId, ClassRef, DeferredId, FieldRef, MethodRef, PrimitiveKind, Type},
};
