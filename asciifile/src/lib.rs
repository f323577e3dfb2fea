//! Represents an input file that may only contain ASCII characters. `Span`
//! is a plain byte range into such a file and travels with every node of the
//! syntax tree; `Position` is the row/column view of a byte offset used when
//! rendering messages.
pub mod file;
pub mod maybe_spanned;
pub mod position;
pub mod span;
pub mod spanned;

pub use self::{
    file::{AsciiFile, EncodingError, LineTruncation},
    maybe_spanned::MaybeSpanned,
    position::Position,
    span::Span,
    spanned::Spanned,
};
