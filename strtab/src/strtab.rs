#![warn(
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::use_self,
    clippy::use_debug
)]

//! Interned identifiers.
//!
//! A `Symbol` is a cheap to clone, reference counted string. Symbols handed
//! out by one `StringTable` share their allocation, so comparisons between
//! them are pointer comparisons; symbols created elsewhere (e.g. compiler
//! synthesized names like `this$0`) still compare by content.

use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Unrelated,
    Related { distance: usize },
}

impl Relation {
    pub fn is_related(self) -> bool {
        match self {
            Relation::Unrelated => false,
            _ => true,
        }
    }
}

impl std::cmp::Ord for Relation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use self::Relation::*;
        match (self, other) {
            (Unrelated, Unrelated) => std::cmp::Ordering::Equal,
            (Unrelated, _) => std::cmp::Ordering::Greater,
            (_, Unrelated) => std::cmp::Ordering::Less,
            (Related { distance: d1 }, Related { distance: d2 }) => d1.cmp(d2),
        }
    }
}

impl std::cmp::PartialOrd for Relation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub trait Relational {
    fn relation(&self, other: &Self) -> Relation;
}

#[derive(Debug, Clone, Eq, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_raw(&self) -> *const u8 {
        self.0.as_ptr()
    }
}

impl Relational for Symbol {
    fn relation(&self, other: &Symbol) -> Relation {
        let distance = levenshtein::levenshtein(&self.0, &other.0);
        if distance <= 2 {
            Relation::Related { distance }
        } else {
            Relation::Unrelated
        }
    }
}

/// The closest related candidate, used for "did you mean" hints.
pub fn most_related<'a, I>(needle: &Symbol, candidates: I) -> Option<&'a Symbol>
where
    I: IntoIterator<Item = &'a Symbol>,
{
    candidates
        .into_iter()
        .filter(|candidate| *candidate != needle)
        .map(|candidate| (needle.relation(candidate), candidate))
        .filter(|(relation, _)| relation.is_related())
        .min_by_key(|(relation, _)| *relation)
        .map(|(_, candidate)| candidate)
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl<'a> PartialEq<&'a str> for Symbol {
    fn eq(&self, other: &&'a str) -> bool {
        &*self.0 == *other
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(Rc::from(value))
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol(Rc::from(value))
    }
}

impl std::borrow::Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
pub struct StringTable {
    entries: RefCell<HashSet<Rc<str>>>,
}

const STRING_TABLE_THIS_SYMBOL: &str = "this";

impl StringTable {
    pub fn new() -> Self {
        let st = StringTable::default();
        st.intern(STRING_TABLE_THIS_SYMBOL);
        st
    }

    pub fn intern(&self, value: &str) -> Symbol {
        let mut entries = self.entries.borrow_mut();
        if let Some(existing) = entries.get(value) {
            return Symbol(Rc::clone(existing));
        }
        let entry: Rc<str> = Rc::from(value);
        entries.insert(Rc::clone(&entry));
        Symbol(entry)
    }

    pub fn this_symbol(&self) -> Symbol {
        self.intern(STRING_TABLE_THIS_SYMBOL)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
