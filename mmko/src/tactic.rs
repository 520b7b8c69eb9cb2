//! Textual goals and tactics.
//!
//! A goal has the shape `[[ |- p1 ... |- pn ]] c`, and
//! a tactic has the shape `[[ |- p1 ... |- pn ]] c {{ v1 : e1 }} ... {{ vm : em }}`.
//! Tokens are separated by arbitrary whitespace.

use crate::assertion::{Show, Statement, Subst};
use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// syntax error in a tactic
    Tactic(String),
    /// syntax error in a tactic state
    TacticState(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tactic(s) => write!(f, "syntax error for tactic: {}", s),
            Self::TacticState(s) => write!(f, "syntax error for tactic state: {}", s),
        }
    }
}

/// Premises and conclusion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    pub premises: Vec<Statement>,
    pub conclusion: Statement,
}

/// A goal together with a substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tactic {
    pub goal: Goal,
    pub subst: Subst,
}

/// Split tokens into premises and the remaining tokens.
///
/// Return `None` if the tokens do not start with `[[ |- ... ]]`.
fn premises<'a, 's>(toks: &'a [&'s str]) -> Option<(Vec<Statement>, &'a [&'s str])> {
    let (open, toks) = toks.split_first()?;
    let close = toks.iter().position(|tok| *tok == "]]")?;
    if *open != "[[" {
        return None;
    }
    let (prems, rest) = (&toks[..close], &toks[close + 1..]);

    let mut premises: Vec<Statement> = Vec::new();
    for tok in prems {
        if *tok == "|-" {
            premises.push(Vec::from([String::from(*tok)]));
        } else {
            // premises must start with `|-`
            premises.last_mut()?.push(String::from(*tok));
        }
    }
    Some((premises, rest))
}

fn statement(toks: &[&str]) -> Statement {
    toks.iter().map(|tok| String::from(*tok)).collect()
}

/// Parse substitutions of the shape `{{ v : e }} ...`.
fn substitution(mut toks: &[&str]) -> Option<Subst> {
    let mut subst = Subst::new();
    while !toks.is_empty() {
        match toks {
            ["{{", var, ":", rest @ ..] if *var != "}}" => {
                let close = rest.iter().position(|tok| *tok == "}}")?;
                let (expr, rest) = (&rest[..close], &rest[close + 1..]);
                if expr.is_empty() {
                    return None;
                }
                subst.insert(String::from(*var), statement(expr));
                toks = rest;
            }
            _ => return None,
        }
    }
    Some(subst)
}

impl Goal {
    /// Parse a tactic state.
    ///
    /// ~~~
    /// # use mmko::Goal;
    /// let goal = Goal::parse("[[ |- ph |- ( ph -> ps ) ]] |- ps")?;
    /// assert_eq!(goal.premises.len(), 2);
    /// assert_eq!(goal.to_string(), "[[ |- ph |- ( ph -> ps ) ]] |- ps");
    /// # Ok::<_, mmko::tactic::Error>(())
    /// ~~~
    pub fn parse(s: &str) -> Result<Self, Error> {
        let toks: Vec<&str> = s.split_whitespace().collect();
        let err = || Error::TacticState(String::from(s.trim()));
        let (premises, rest) = premises(&toks).ok_or_else(err)?;
        if rest.is_empty() {
            return Err(err());
        }
        let conclusion = statement(rest);
        Ok(Self {
            premises,
            conclusion,
        })
    }

    /// Return the concatenation of all premises.
    pub fn flat_premises(&self) -> Statement {
        self.premises.iter().flatten().cloned().collect()
    }
}

impl Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[[")?;
        for premise in &self.premises {
            write!(f, " {}", Show(premise))?;
        }
        write!(f, " ]] {}", Show(&self.conclusion))
    }
}

impl Tactic {
    /// Parse a tactic.
    ///
    /// ~~~
    /// # use mmko::Tactic;
    /// let tac = Tactic::parse("[[ |- ph |- ( ph -> ps ) ]] |- ps {{ ph : ch }} {{ ps : ps }}")?;
    /// assert_eq!(tac.goal.conclusion, ["|-", "ps"]);
    /// assert_eq!(tac.subst.len(), 2);
    /// # Ok::<_, mmko::tactic::Error>(())
    /// ~~~
    pub fn parse(s: &str) -> Result<Self, Error> {
        let toks: Vec<&str> = s.split_whitespace().collect();
        let err = || Error::Tactic(String::from(s.trim()));
        let (premises, rest) = premises(&toks).ok_or_else(err)?;
        let split = rest.iter().position(|tok| *tok == "{{").unwrap_or(rest.len());
        let (conclusion, rest) = rest.split_at(split);
        if conclusion.is_empty() {
            return Err(err());
        }
        let subst = substitution(rest).ok_or_else(err)?;
        let conclusion = statement(conclusion);
        let goal = Goal {
            premises,
            conclusion,
        };
        Ok(Self { goal, subst })
    }
}
