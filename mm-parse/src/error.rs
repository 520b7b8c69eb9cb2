use alloc::string::String;
use core::fmt::{self, Display};

/// A block construct that must be closed before the end of its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Block {
    /// `$( ... $)`
    Comment,
    /// `$[ ... $]`
    Inclusion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// input at the given byte offset could not be lexed
    Unlexable(usize),
    /// end of input inside an open block
    Unclosed(Block),
    /// comment-delimiting token inside a comment
    NestedComment(String),
}

impl Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment => "comment".fmt(f),
            Self::Inclusion => "inclusion statement".fmt(f),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlexable(pos) => write!(f, "unlexable input at byte {}", pos),
            Self::Unclosed(block) => write!(f, "unclosed {} at end of file", block),
            Self::NestedComment(tok) => write!(
                f,
                "encountered token '{}' while reading a comment; comments do not nest",
                tok
            ),
        }
    }
}
