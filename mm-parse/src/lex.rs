//! Splitting of Metamath sources into tokens.

use crate::Error;
use core::fmt::{self, Display};
use logos::Logos;

/// Tokens of a Metamath source, parametrised by the type of words.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token<S> {
    /// `$c`
    Const,
    /// `$v`
    Var,
    /// `$f`
    Float,
    /// `$e`
    Ess,
    /// `$a`
    Axiom,
    /// `$p`
    Prov,
    /// `$d`
    Disj,
    /// `${`
    Open,
    /// `$}`
    Close,
    /// `$=`
    Eq,
    /// `$.`
    End,
    /// `$[`
    IncludeOpen,
    /// `$]`
    IncludeClose,
    /// `$(`
    CommentOpen,
    /// `$)`
    CommentClose,
    /// label, math symbol, file name, or proof step
    Word(S),
}

impl<S> Token<S> {
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Token<T> {
        match self {
            Self::Const => Token::Const,
            Self::Var => Token::Var,
            Self::Float => Token::Float,
            Self::Ess => Token::Ess,
            Self::Axiom => Token::Axiom,
            Self::Prov => Token::Prov,
            Self::Disj => Token::Disj,
            Self::Open => Token::Open,
            Self::Close => Token::Close,
            Self::Eq => Token::Eq,
            Self::End => Token::End,
            Self::IncludeOpen => Token::IncludeOpen,
            Self::IncludeClose => Token::IncludeClose,
            Self::CommentOpen => Token::CommentOpen,
            Self::CommentClose => Token::CommentClose,
            Self::Word(s) => Token::Word(f(s)),
        }
    }
}

impl<S: Display> Display for Token<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Const => "$c",
            Self::Var => "$v",
            Self::Float => "$f",
            Self::Ess => "$e",
            Self::Axiom => "$a",
            Self::Prov => "$p",
            Self::Disj => "$d",
            Self::Open => "${",
            Self::Close => "$}",
            Self::Eq => "$=",
            Self::End => "$.",
            Self::IncludeOpen => "$[",
            Self::IncludeClose => "$]",
            Self::CommentOpen => "$(",
            Self::CommentClose => "$)",
            Self::Word(s) => return s.fmt(f),
        };
        s.fmt(f)
    }
}

#[derive(Logos, Debug, PartialEq)]
enum Lexeme<'s> {
    #[token("$c")]
    Const,
    #[token("$v")]
    Var,
    #[token("$f")]
    Float,
    #[token("$e")]
    Ess,
    #[token("$a")]
    Axiom,
    #[token("$p")]
    Prov,
    #[token("$d")]
    Disj,
    #[token("${")]
    Open,
    #[token("$}")]
    Close,
    #[token("$=")]
    Eq,
    #[token("$.")]
    End,
    #[token("$[")]
    IncludeOpen,
    #[token("$]")]
    IncludeClose,
    #[token("$(")]
    CommentOpen,
    #[token("$)")]
    CommentClose,

    #[regex(r"[^ \t\n\r\f]+", |lex| lex.slice())]
    Word(&'s str),

    #[error]
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    Error,
}

/// Iterator over the tokens of a string, comments included.
pub struct Lexer<'s>(logos::Lexer<'s, Lexeme<'s>>);

/// Lex a string into tokens.
///
/// ~~~
/// use mm_parse::{lex, Token};
/// let toks: Vec<_> = lex("ax-mp $a |- ps $.").collect();
/// assert_eq!(toks[1], Ok(Token::Axiom));
/// assert_eq!(toks[3], Ok(Token::Word("ps")));
/// ~~~
pub fn lex(s: &str) -> Lexer {
    Lexer(Lexeme::lexer(s))
}

/// Lex a string into tokens, starting at the given byte offset.
///
/// The offset must be the end of a previously lexed token, as
/// returned by [`Lexer::offset`].
///
/// ~~~
/// use mm_parse::{lex, lex_at, Token};
/// let src = "$c wff $.";
/// let mut toks = lex(src);
/// toks.next();
/// let mut rest = lex_at(src, toks.offset());
/// assert_eq!(rest.next(), Some(Ok(Token::Word("wff"))));
/// assert_eq!(rest.offset(), 6);
/// ~~~
pub fn lex_at(s: &str, offset: usize) -> Lexer {
    let mut lexer = Lexeme::lexer(s);
    lexer.bump(offset);
    Lexer(lexer)
}

impl<'s> Lexer<'s> {
    /// Return the byte offset after the last lexed token.
    pub fn offset(&self) -> usize {
        self.0.span().end
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Result<Token<&'s str>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = match self.0.next()? {
            Lexeme::Const => Token::Const,
            Lexeme::Var => Token::Var,
            Lexeme::Float => Token::Float,
            Lexeme::Ess => Token::Ess,
            Lexeme::Axiom => Token::Axiom,
            Lexeme::Prov => Token::Prov,
            Lexeme::Disj => Token::Disj,
            Lexeme::Open => Token::Open,
            Lexeme::Close => Token::Close,
            Lexeme::Eq => Token::Eq,
            Lexeme::End => Token::End,
            Lexeme::IncludeOpen => Token::IncludeOpen,
            Lexeme::IncludeClose => Token::IncludeClose,
            Lexeme::CommentOpen => Token::CommentOpen,
            Lexeme::CommentClose => Token::CommentClose,
            Lexeme::Word(w) => Token::Word(w),
            Lexeme::Error => return Some(Err(Error::Unlexable(self.0.span().start))),
        };
        Some(Ok(token))
    }
}

#[test]
fn keywords() {
    use alloc::vec::Vec;
    let toks: Result<Vec<_>, _> = lex("$c $v $f $e $a $p $d ${ $} $= $. $[ $] $( $)").collect();
    let expected = [
        Token::Const,
        Token::Var,
        Token::Float,
        Token::Ess,
        Token::Axiom,
        Token::Prov,
        Token::Disj,
        Token::Open,
        Token::Close,
        Token::Eq,
        Token::End,
        Token::IncludeOpen,
        Token::IncludeClose,
        Token::CommentOpen,
        Token::CommentClose,
    ];
    assert_eq!(toks.unwrap(), expected);
}

#[test]
fn words() {
    use alloc::vec::Vec;
    let toks: Vec<_> = lex("  $cx\t|-\n( ph -> ps )\r\n$.x ").map(Result::unwrap).collect();
    let words = ["$cx", "|-", "(", "ph", "->", "ps", ")", "$.x"];
    let expected: Vec<_> = words.iter().map(|w| Token::Word(*w)).collect();
    assert_eq!(toks, expected);
}
