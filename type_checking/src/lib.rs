#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]
#![allow(clippy::unneeded_field_pattern)]

//! Semantic analysis of Java compilation units.
//!
//! An `Analyzer` takes a parsed unit, resolves every type and name in it,
//! selects overloads, checks conversions, access and exception flow, and
//! lowers nested classes. The unit is mutated in place; classes stay in the
//! analyzer's class table for the units checked after it.
#[macro_use]
extern crate derive_more;

pub mod access;
pub mod checker;
pub mod class_loader;
pub mod conversion;
pub mod deferred;
mod expr_typechecker;
mod flow;
mod layout;
pub mod lints;
pub mod members;
mod method_body_type_checker;
mod name_resolution;
mod nesting;
pub mod options;
mod registration;
pub mod semantics;
pub mod type_system;

pub use crate::{
    checker::{Analyzer, CastEmitter, CheckError, DefaultCastEmitter, SemanticContext},
    class_loader::{ClassLoader, ExternalClass, ExternalField, ExternalMethod, StubLoader},
    options::{CheckOptions, OptionsError},
    semantics::SemanticError,
    type_system::ClassTable,
};
