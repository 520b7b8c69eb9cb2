//! Common error type.

use crate::assertion::Symbol;
use crate::database::{Error as DatabaseError, Keyword};
use crate::include::Error as IncludeError;
use crate::scope::Error as ScopeError;
use crate::session::Error as SessionError;
use crate::tactic::Error as TacticError;
use crate::verify::Error as VerifyError;
use alloc::boxed::Box;
use core::fmt::{self, Display};

/// Common error type.
#[derive(Debug)]
pub enum Error {
    Parse(mm_parse::Error),
    Include(IncludeError),
    Scope(ScopeError),
    Database(DatabaseError),
    Verify(VerifyError),
    Tactic(TacticError),
    Session(SessionError),
    /// error in a statement
    In {
        keyword: Keyword,
        label: Option<Symbol>,
        error: Box<Error>,
    },
}

impl Error {
    pub(crate) fn within(self, keyword: Keyword, label: Option<Symbol>) -> Self {
        let error = Box::new(self);
        Self::In {
            keyword,
            label,
            error,
        }
    }

    /// Return the error without the statement that caused it.
    pub fn innermost(self) -> Self {
        match self {
            Self::In { error, .. } => error.innermost(),
            e => e,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parse(e) => e.fmt(f),
            Self::Include(e) => e.fmt(f),
            Self::Scope(e) => e.fmt(f),
            Self::Database(e) => e.fmt(f),
            Self::Verify(e) => e.fmt(f),
            Self::Tactic(e) => e.fmt(f),
            Self::Session(e) => e.fmt(f),
            Self::In {
                keyword,
                label: Some(label),
                error,
            } => write!(f, "in {} statement {}: {}", keyword, label, error),
            Self::In {
                keyword,
                label: None,
                error,
            } => write!(f, "in {} statement: {}", keyword, error),
        }
    }
}

impl std::error::Error for Error {}

impl From<mm_parse::Error> for Error {
    fn from(err: mm_parse::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<IncludeError> for Error {
    fn from(err: IncludeError) -> Self {
        Self::Include(err)
    }
}

impl From<ScopeError> for Error {
    fn from(err: ScopeError) -> Self {
        Self::Scope(err)
    }
}

impl From<DatabaseError> for Error {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err)
    }
}

impl From<VerifyError> for Error {
    fn from(err: VerifyError) -> Self {
        Self::Verify(err)
    }
}

impl From<TacticError> for Error {
    fn from(err: TacticError) -> Self {
        Self::Tactic(err)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

#[test]
fn display() {
    let err = Error::from(VerifyError::EmptyProof).within(Keyword::Prov, Some("th1".into()));
    assert_eq!(err.to_string(), "in $p statement th1: empty proof");
    let err = Error::from(ScopeError::NotAVariable("0".into())).within(Keyword::Disj, None);
    assert_eq!(err.to_string(), "in $d statement: token 0 is not an active variable");
    assert!(matches!(err.innermost(), Error::Scope(_)));
}
