//! Statements, assertions, and substitutions.

use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display};
use fnv::FnvHashMap;

/// A constant or a variable.
pub type Symbol = String;

/// A sequence of symbols, such as `|- ( ph -> ph )`.
pub type Statement = Vec<Symbol>;

/// An unordered pair of variables, stored as `(min, max)`.
pub type Pair = (Symbol, Symbol);

/// Construct the canonical representation of an unordered pair.
pub fn pair(x: &str, y: &str) -> Pair {
    if x <= y {
        (x.into(), y.into())
    } else {
        (y.into(), x.into())
    }
}

/// An axiom or theorem, restricted to its mandatory variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    /// disjoint variable conditions
    pub dvs: Vec<Pair>,
    /// floating hypotheses as `(typecode, variable)`
    pub floating: Vec<(Symbol, Symbol)>,
    /// essential hypotheses
    pub essential: Vec<Statement>,
    pub conclusion: Statement,
}

/// Map from variables to the expressions replacing them.
///
/// Iteration yields variables in the order of their first insertion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subst {
    order: Vec<Symbol>,
    map: FnvHashMap<Symbol, Statement>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any previous binding.
    pub fn insert(&mut self, var: Symbol, expr: Statement) -> Option<Statement> {
        if !self.map.contains_key(&var) {
            self.order.push(var.clone());
        }
        self.map.insert(var, expr)
    }

    pub fn get(&self, var: &str) -> Option<&Statement> {
        self.map.get(var)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Statement)> {
        self.order.iter().filter_map(|v| self.map.get_key_value(v))
    }

    /// Replace every bound variable in a statement by its expression.
    ///
    /// ~~~
    /// # use mmko::Subst;
    /// let mut subst = Subst::new();
    /// subst.insert("ph".into(), vec!["(".into(), "ps".into(), ")".into()]);
    /// let stmt: Vec<String> = ["|-", "ph", "ch"].iter().map(|s| s.to_string()).collect();
    /// assert_eq!(subst.apply(&stmt).join(" "), "|- ( ps ) ch");
    /// ~~~
    pub fn apply(&self, stmt: &[Symbol]) -> Statement {
        let mut result = Vec::with_capacity(stmt.len());
        for tok in stmt {
            match self.map.get(tok) {
                Some(expr) => result.extend(expr.iter().cloned()),
                None => result.push(tok.clone()),
            }
        }
        result
    }
}

/// Display a sequence of symbols separated by spaces.
pub struct Show<'a>(pub &'a [Symbol]);

impl<'a> Display for Show<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
            iter.try_for_each(|tok| write!(f, " {}", tok))?;
        }
        Ok(())
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[[")?;
        self.essential
            .iter()
            .try_for_each(|hyp| write!(f, " {}", Show(hyp)))?;
        write!(f, " ]] {}", Show(&self.conclusion))
    }
}
