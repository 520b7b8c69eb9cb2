#![forbid(unsafe_code)]

//! Verification and interactive proving for Metamath databases.
//!
//! This is the library underlying the `mmcheck` proof checker.
//!
//! # Usage
//!
//! A Metamath database is a sequence of *statements*.
//! Some statements declare constants and variables,
//! some introduce hypotheses that are active inside the current scope, and
//! some introduce assertions, namely axioms and theorems.
//! Every theorem comes with a proof,
//! which is a sequence of labels referring to previous statements.
//!
//! How is a database processed?
//! The [`mm_parse`] crate splits the input into tokens,
//! removing comments along the way.
//! The [`Includer`] splices the tokens of included files into this stream.
//! The [`Builder`] then reads statements from the tokens,
//! maintaining the active declarations in [`Scopes`] and
//! recording every labelled statement in [`Labels`].
//! For every theorem, the builder yields a [`Check`],
//! which captures everything that is required to verify the theorem's proof.
//! The [`Verifier`] replays the proof on a [`Stack`] and
//! compares the result with the theorem's conclusion.
//! Because checks own snapshots of their environment,
//! they can be verified in parallel while the builder continues to read.
//!
//! The following example reads a small database and verifies its theorem:
//!
//! ~~~
//! # use mmko::{Builder, Config};
//! let src = "
//!     $c wff |- ( ) -> $.
//!     $v ph ps $.
//!     wph $f wff ph $.
//!     wps $f wff ps $.
//!     wi $a wff ( ph -> ps ) $.
//!     ax-1 $a |- ( ph -> ( ps -> ph ) ) $.
//!     th $p |- ( ph -> ( ph -> ph ) ) $= wph wph ax-1 $.
//! ";
//! let tokens = mmko::Includer::from_source(src, ".");
//! let mut builder = Builder::new(Config::default());
//! let mut checked = Vec::new();
//! builder.read(tokens, |check| {
//!     check.run()?;
//!     checked.push(check.label);
//!     Ok::<_, mmko::Error>(())
//! })?;
//! assert_eq!(checked, vec!["th".to_string()]);
//! assert_eq!(builder.finish().labels().len(), 5);
//! # Ok::<_, mmko::Error>(())
//! ~~~
//!
//! Once all proofs of a database are verified,
//! the theorems can be re-proved interactively with a [`Server`].
//! Every search starts from the conclusion of a theorem, and
//! every tactic replaces the first open goal with the hypotheses of
//! a known assertion instantiated by a substitution.
//! See the [`session`] module for details.

extern crate alloc;

#[macro_use]
extern crate log;

mod assertion;
pub mod database;
pub mod error;
pub mod include;
pub mod labels;
pub mod scope;
pub mod session;
mod stack;
pub mod tactic;
pub mod verify;

pub use assertion::{pair, Assertion, Pair, Show, Statement, Subst, Symbol};
pub use database::{Builder, Check, Config, Database, Facts, Keyword};
pub use error::Error;
pub use include::Includer;
pub use labels::{Entry, Labels};
pub use scope::{Env, Scopes};
pub use session::{Request, Response, Server, Session, Status};
pub use stack::Stack;
pub use tactic::{Goal, Tactic};
pub use verify::{Step, Verifier};
