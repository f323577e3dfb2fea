use crate::{MaybeSpanned, Span};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub span: Span,
    pub data: T,
}

impl<T> Eq for Spanned<T> where T: Eq {}
impl<T> PartialEq for Spanned<T>
where
    T: PartialEq,
{
    /// This only compares the `data`! I.e. two `Spanned`s are equal even if
    /// they point to two different spans in the source file, as long as the
    /// content is the same.
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for Spanned<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<T> fmt::Display for Spanned<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.data, self.span)
    }
}

impl<T> Spanned<T> {
    pub fn new(span: Span, value: T) -> Self {
        Spanned { span, data: value }
    }

    pub fn map<U, F>(&self, f: F) -> Spanned<U>
    where
        F: FnOnce(&T) -> U,
    {
        Spanned {
            span: self.span,
            data: f(&self.data),
        }
    }
}

impl<T> From<Spanned<T>> for MaybeSpanned<T> {
    fn from(spanned: Spanned<T>) -> Self {
        MaybeSpanned::WithSpan(spanned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_span() {
        assert_eq!(Spanned::new(Span::at(1), 'x'), Spanned::new(Span::at(9), 'x'));
        assert_ne!(Spanned::new(Span::at(1), 'x'), Spanned::new(Span::at(1), 'y'));
    }

    #[test]
    fn map_keeps_span() {
        let spanned = Spanned::new(Span::new(2, 5), 21);
        let doubled = spanned.map(|n| n * 2);
        assert_eq!(42, doubled.data);
        assert_eq!(Span::new(2, 5), doubled.span);
    }
}
