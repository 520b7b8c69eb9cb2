//! Frames of active variables and hypotheses.

use crate::assertion::{pair, Assertion, Pair, Statement, Symbol};
use alloc::vec::Vec;
use core::fmt::{self, Display};
use fnv::{FnvBuildHasher, FnvHashSet};

/// Persistent sets and maps for fast snapshots of the environment.
type ImSet<A> = im::hashset::HashSet<A, FnvBuildHasher>;
type ImMap<K, V> = im::hashmap::HashMap<K, V, FnvBuildHasher>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    ConstantRedeclared(Symbol),
    VariableRedeclared(Symbol),
    /// a constant is declared with the name of an active variable
    VariableAsConstant(Symbol),
    /// a variable is declared with the name of a constant
    ConstantAsVariable(Symbol),
    InactiveVariable(Symbol),
    UndeclaredTypecode(Symbol),
    /// the variable is already typed by an active `$f`
    AlreadyTyped(Symbol),
    /// neither a constant nor an active variable
    UndeclaredSymbol(Symbol),
    /// an active variable without active `$f`
    UntypedVariable(Symbol),
    NotAVariable(Symbol),
    NoScope,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConstantRedeclared(c) => write!(f, "constant already declared: {}", c),
            Self::VariableRedeclared(v) => write!(f, "variable already declared and active: {}", v),
            Self::VariableAsConstant(c) => {
                write!(f, "trying to declare an active variable as constant: {}", c)
            }
            Self::ConstantAsVariable(v) => write!(f, "variable already declared as constant: {}", v),
            Self::InactiveVariable(v) => write!(f, "variable in $f not declared: {}", v),
            Self::UndeclaredTypecode(c) => write!(f, "typecode in $f not declared: {}", c),
            Self::AlreadyTyped(v) => write!(f, "variable already typed by an active $f: {}", v),
            Self::UndeclaredSymbol(s) => write!(f, "token {} is not an active symbol", s),
            Self::UntypedVariable(v) => write!(f, "variable {} is not typed by an active $f", v),
            Self::NotAVariable(s) => write!(f, "token {} is not an active variable", s),
            Self::NoScope => write!(f, "no open scope"),
        }
    }
}

/// Everything that is active at some point of a database.
///
/// Every frame carries the environment of all frames below it,
/// so cloning an environment is cheap and
/// yields a snapshot that stays valid after the frame is closed.
#[derive(Clone, Debug, Default)]
pub struct Env {
    vars: ImSet<Symbol>,
    dvs: ImSet<Pair>,
    /// variable to label of its `$f`
    floating: ImMap<Symbol, Symbol>,
    /// statement to label of its earliest `$e`
    essential: ImMap<Statement, Symbol>,
    /// labels of all active hypotheses
    hyps: ImSet<Symbol>,
}

impl Env {
    pub fn is_active_variable(&self, tok: &str) -> bool {
        self.vars.contains(tok)
    }

    pub fn is_disjoint(&self, x: &str, y: &str) -> bool {
        self.dvs.contains(&pair(x, y))
    }

    pub fn floating_label_of(&self, var: &str) -> Option<&Symbol> {
        self.floating.get(var)
    }

    pub fn essential_label_of(&self, stmt: &[Symbol]) -> Option<&Symbol> {
        self.essential.get(stmt)
    }

    pub fn is_active_hypothesis(&self, label: &str) -> bool {
        self.hyps.contains(label)
    }

    /// Return the set of active variables in a statement.
    pub fn variables_in<'a>(&self, stmt: &'a [Symbol]) -> FnvHashSet<&'a str> {
        let vars = stmt.iter().filter(|tok| self.is_active_variable(tok));
        vars.map(|tok| tok.as_str()).collect()
    }
}

#[derive(Default)]
struct Frame {
    env: Env,
    floating: Vec<(Symbol, Symbol)>,
    essential: Vec<Statement>,
}

/// Stack of frames, together with the (global) constants.
#[derive(Default)]
pub struct Scopes {
    constants: FnvHashSet<Symbol>,
    frames: Vec<Frame>,
    base: Env,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a new frame.
    pub fn push(&mut self) {
        let env = self.env().clone();
        self.frames.push(Frame {
            env,
            ..Default::default()
        })
    }

    /// Close the topmost frame.
    pub fn pop(&mut self) -> Result<(), Error> {
        self.frames.pop().map(|_| ()).ok_or(Error::NoScope)
    }

    /// Close frames until only `depth` frames remain.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth)
    }

    /// Return the environment of the topmost frame.
    pub fn env(&self) -> &Env {
        self.frames.last().map_or(&self.base, |fr| &fr.env)
    }

    fn top_mut(&mut self) -> Result<&mut Frame, Error> {
        self.frames.last_mut().ok_or(Error::NoScope)
    }

    pub fn is_constant(&self, tok: &str) -> bool {
        self.constants.contains(tok)
    }

    pub fn is_active_variable(&self, tok: &str) -> bool {
        self.env().is_active_variable(tok)
    }

    pub fn is_disjoint(&self, x: &str, y: &str) -> bool {
        self.env().is_disjoint(x, y)
    }

    pub fn floating_label_of(&self, var: &str) -> Option<&Symbol> {
        self.env().floating_label_of(var)
    }

    pub fn essential_label_of(&self, stmt: &[Symbol]) -> Option<&Symbol> {
        self.env().essential_label_of(stmt)
    }

    pub fn variables_in<'a>(&self, stmt: &'a [Symbol]) -> FnvHashSet<&'a str> {
        self.env().variables_in(stmt)
    }

    pub fn declare_constant(&mut self, tok: Symbol) -> Result<(), Error> {
        if self.is_constant(&tok) {
            return Err(Error::ConstantRedeclared(tok));
        }
        if self.is_active_variable(&tok) {
            return Err(Error::VariableAsConstant(tok));
        }
        self.constants.insert(tok);
        Ok(())
    }

    pub fn declare_variable(&mut self, tok: Symbol) -> Result<(), Error> {
        if self.is_active_variable(&tok) {
            return Err(Error::VariableRedeclared(tok));
        }
        if self.is_constant(&tok) {
            return Err(Error::ConstantAsVariable(tok));
        }
        self.top_mut()?.env.vars.insert(tok);
        Ok(())
    }

    pub fn add_floating(&mut self, typecode: Symbol, var: Symbol, label: Symbol) -> Result<(), Error> {
        if !self.is_active_variable(&var) {
            return Err(Error::InactiveVariable(var));
        }
        if !self.is_constant(&typecode) {
            return Err(Error::UndeclaredTypecode(typecode));
        }
        if self.floating_label_of(&var).is_some() {
            return Err(Error::AlreadyTyped(var));
        }
        let frame = self.top_mut()?;
        frame.env.hyps.insert(label.clone());
        frame.env.floating.insert(var.clone(), label);
        frame.floating.push((typecode, var));
        Ok(())
    }

    pub fn add_essential(&mut self, stmt: Statement, label: Symbol) -> Result<(), Error> {
        let frame = self.top_mut()?;
        frame.env.hyps.insert(label.clone());
        if !frame.env.essential.contains_key(&stmt) {
            frame.env.essential.insert(stmt.clone(), label);
        }
        frame.essential.push(stmt);
        Ok(())
    }

    /// Make every two distinct variables of the list disjoint.
    pub fn add_disjoint(&mut self, vars: &[Symbol]) -> Result<(), Error> {
        let frame = self.top_mut()?;
        for x in vars {
            for y in vars.iter().filter(|y| *y != x) {
                frame.env.dvs.insert(pair(x, y));
            }
        }
        Ok(())
    }

    /// Describe an assertion with the given conclusion in the current scope.
    pub fn make_assertion(&self, conclusion: Statement) -> Assertion {
        let essential: Vec<Statement> = self
            .frames
            .iter()
            .flat_map(|fr| fr.essential.iter().cloned())
            .collect();

        let env = self.env();
        let stmts = essential.iter().chain(core::iter::once(&conclusion));
        let mut mandatory: FnvHashSet<&str> = stmts
            .flat_map(|stmt| env.variables_in(stmt))
            .collect();

        let mut dvs: Vec<Pair> = env
            .dvs
            .iter()
            .filter(|(x, y)| mandatory.contains(x.as_str()) && mandatory.contains(y.as_str()))
            .cloned()
            .collect();
        dvs.sort();

        let mut floating = Vec::new();
        for (typecode, var) in self.frames.iter().flat_map(|fr| fr.floating.iter()) {
            if mandatory.remove(var.as_str()) {
                floating.push((typecode.clone(), var.clone()));
            }
        }

        Assertion {
            dvs,
            floating,
            essential,
            conclusion,
        }
    }
}
