//! Block structured symbol tables for local variables and parameters.
use failure::Fail;
use std::{collections::HashMap, hash::Hash};

/// SymbolTable associates a Symbol `S` with a stored value `T`.
pub type SymbolTable<S, T> = HashMap<S, T>;

#[derive(Debug, Clone, Copy)]
enum ScopeIdx {
    Root,
    Dynamic(usize),
}

/// Scoped implements scoping for SymbolTable.
/// The generic type `S` is the Symbol and `T` is the value stored for that
/// symbol.
///
/// A definition is visible in the scope it was made in and in every scope
/// entered after it, until that scope is left. Definitions may not shadow a
/// visible definition of an enclosing scope.
#[derive(Debug)]
pub struct Scoped<S, T>
where
    S: Hash + Eq + Clone,
{
    root: SymbolTable<S, T>,
    scopes: Vec<SymbolTable<S, T>>,
    visible_defs: HashMap<S, ScopeIdx>,
}

#[derive(Debug, Fail)]
#[fail(display = "cannot leave the root scope")]
pub struct CannotLeaveRootScopeError;

#[derive(Debug, Fail)]
#[fail(display = "symbol is already defined in a visible scope")]
pub struct RedefinitionError;

impl<S, T> Default for Scoped<S, T>
where
    S: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Scoped<S, T>
where
    S: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Scoped {
            root: SymbolTable::new(),
            scopes: Vec::new(),
            visible_defs: HashMap::new(),
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(SymbolTable::new())
    }

    pub fn leave_scope(&mut self) -> Result<(), CannotLeaveRootScopeError> {
        let popped = self.scopes.pop().ok_or(CannotLeaveRootScopeError)?;
        for sym in popped.keys() {
            let removed = self.visible_defs.remove(sym);
            debug_assert!(removed.is_some(), "scopes inconsistent with visible_defs");
        }
        Ok(())
    }

    /// Number of scopes entered on top of the root scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn define(&mut self, sym: S, val: T) -> Result<(), RedefinitionError> {
        // amortized O(1) lookup in visible_defs
        if self.visible_defs.contains_key(&sym) {
            return Err(RedefinitionError);
        }
        let (current_scope, scope_idx) = self.current_scope();
        let insert_res = current_scope.insert(sym.clone(), val);
        debug_assert!(
            insert_res.is_none(),
            "current_scope must be consistent with visible_defs"
        );
        self.visible_defs.insert(sym, scope_idx);
        Ok(())
    }

    pub fn visible_definition(&self, sym: &S) -> Option<&T> {
        // amortized O(1) lookup to get sym's scope, then of sym in that scope
        let idx = *self.visible_defs.get(sym)?;
        self.get_scope(idx).get(sym)
    }

    pub fn visible_definition_mut(&mut self, sym: &S) -> Option<&mut T> {
        let idx = *self.visible_defs.get(sym)?;
        match idx {
            ScopeIdx::Root => self.root.get_mut(sym),
            ScopeIdx::Dynamic(idx) => self.scopes[idx].get_mut(sym),
        }
    }

    /// All symbols currently visible, in no particular order.
    pub fn visible_symbols(&self) -> impl Iterator<Item = &S> {
        self.visible_defs.keys()
    }

    fn current_scope(&mut self) -> (&mut SymbolTable<S, T>, ScopeIdx) {
        if !self.scopes.is_empty() {
            let idx = self.scopes.len() - 1;
            (&mut self.scopes[idx], ScopeIdx::Dynamic(idx))
        } else {
            (&mut self.root, ScopeIdx::Root)
        }
    }

    fn get_scope(&self, scope_idx: ScopeIdx) -> &SymbolTable<S, T> {
        match scope_idx {
            ScopeIdx::Root => &self.root,
            ScopeIdx::Dynamic(idx) => &self.scopes[idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::assert_matches;

    macro_rules! def {
        ($scoped:expr, $s:expr) => {
            $scoped.define($s, ()).unwrap();
            $scoped
                .visible_definition(&$s)
                .expect("just defined successfully, should be visible");
        };
        ($scoped:expr, $s:expr, $t:expr) => {{
            $scoped.define($s, $t).unwrap();
            let vis = $scoped
                .visible_definition(&$s)
                .expect("just defined successfully, should be visible");
            assert_eq!(&$t, vis);
        }};
    }

    macro_rules! assert_def {
        ($scoped:expr, $s:expr) => {
            $scoped
                .visible_definition(&$s)
                .expect(&format!("expecting visible definition for {:?}", $s));
        };
    }

    macro_rules! assert_no_def {
        ($scoped:expr, $s:expr) => {
            let def = $scoped.visible_definition(&$s);
            assert_matches!(def, None);
        };
    }

    #[test]
    fn definition_inheritance_works() {
        let mut scoped = Scoped::new();
        def!(scoped, "root");
        scoped.enter_scope();
        def!(scoped, "l1");
        scoped.enter_scope();
        def!(scoped, "l2");

        // at l2
        assert_def!(scoped, "root");
        assert_def!(scoped, "l1");
        assert_def!(scoped, "l2");
        scoped.leave_scope().expect("not in root scope");
        // at l1
        assert_def!(scoped, "root");
        assert_def!(scoped, "l1");
        assert_no_def!(scoped, "l2");
        scoped.leave_scope().expect("not in root scope");
        // at root scope
        assert_def!(scoped, "root");
        assert_no_def!(scoped, "l1");
        assert_no_def!(scoped, "l2");
    }

    #[test]
    fn neighboring_scopes() {
        let mut scoped = Scoped::new();
        def!(scoped, "inroot");
        scoped.enter_scope();
        def!(scoped, "v", 1);
        scoped.leave_scope().expect("not in root scope");
        scoped.enter_scope();
        def!(scoped, "v", 2);
        scoped.leave_scope().expect("not in root scope");
    }

    #[test]
    fn no_shadowing() {
        let mut scoped = Scoped::new();
        def!(scoped, "23");
        scoped.enter_scope();
        let redef = scoped.define("23", ());
        assert_matches!(redef, Err(RedefinitionError));
    }

    #[test]
    fn over_leaves_returns_err() {
        let mut scoped: Scoped<(), ()> = Scoped::new();
        scoped.enter_scope();
        scoped.enter_scope();
        scoped.leave_scope().unwrap();
        scoped.leave_scope().unwrap();
        let ret = scoped.leave_scope();
        assert_matches!(ret, Err(CannotLeaveRootScopeError));
    }

    #[test]
    fn definitions_can_be_updated_in_place() {
        let mut scoped = Scoped::new();
        scoped.define("x", false).unwrap();
        scoped.enter_scope();
        *scoped.visible_definition_mut(&"x").unwrap() = true;
        assert_eq!(Some(&true), scoped.visible_definition(&"x"));
        assert_eq!(vec![&"x"], scoped.visible_symbols().collect::<Vec<_>>());
    }
}
