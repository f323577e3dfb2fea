//! State shared by the analysis phases: the `Context` a unit is checked in
//! and the phase timer.
#![warn(
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::doc_markdown,
    clippy::match_same_arms,
    clippy::use_self
)]

pub mod context;

#[macro_use]
pub mod timing;
