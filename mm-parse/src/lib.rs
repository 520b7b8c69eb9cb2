//! Lexer for the Metamath file format
//!
//! Example usage:
//!
//! ~~~
//! use mm_parse::{tokens, Error, Token};
//!
//! let src = "$( constants $) $c wff |- $. $v ph $.";
//! let toks: Result<Vec<_>, _> = tokens(src).collect();
//! let toks = toks?;
//! assert_eq!(toks.len(), 7);
//! assert_eq!(toks[0], Token::Const);
//! assert_eq!(toks[1], Token::Word("wff"));
//! # Ok::<_, Error>(())
//! ~~~
#![no_std]

extern crate alloc;

mod error;
pub mod lex;
mod uncomment;

pub use error::{Block, Error};
pub use lex::{lex, lex_at, Lexer, Token};
pub use uncomment::Uncomment;

/// Lex a source string and drop its comments.
pub fn tokens(s: &str) -> Uncomment<Lexer> {
    Uncomment::new(lex(s))
}
