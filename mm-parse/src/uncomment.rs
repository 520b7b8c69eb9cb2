use crate::{Block, Error, Token};
use alloc::string::String;

/// Remove `$( ... $)` comments from a stream of tokens.
///
/// Comments do not nest: a token containing `$(` or `$)` inside a comment
/// (except for the closing `$)`) is an error, as is the end of input
/// before the comment is closed.
pub struct Uncomment<I> {
    iter: I,
}

impl<I> Uncomment<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }

    /// Return the underlying iterator.
    pub fn get_ref(&self) -> &I {
        &self.iter
    }
}

impl<S: AsRef<str>, I: Iterator<Item = Result<Token<S>, Error>>> Uncomment<I> {
    fn skip(&mut self) -> Result<(), Error> {
        loop {
            match self.iter.next() {
                None => return Err(Error::Unclosed(Block::Comment)),
                Some(Ok(Token::CommentClose)) => return Ok(()),
                Some(Ok(Token::CommentOpen)) => return Err(Error::NestedComment("$(".into())),
                Some(Ok(Token::Word(w))) if w.as_ref().contains("$(") || w.as_ref().contains("$)") => {
                    return Err(Error::NestedComment(String::from(w.as_ref())))
                }
                Some(Ok(_)) => (),
                Some(Err(e)) => return Err(e),
            }
        }
    }
}

impl<S: AsRef<str>, I: Iterator<Item = Result<Token<S>, Error>>> Iterator for Uncomment<I> {
    type Item = Result<Token<S>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.iter.next()? {
                Ok(Token::CommentOpen) => {
                    if let Err(e) = self.skip() {
                        return Some(Err(e));
                    }
                }
                other => return Some(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{tokens, Block, Error, Token};
    use alloc::vec::Vec;

    fn words(s: &str) -> Result<Vec<Token<&str>>, Error> {
        tokens(s).collect()
    }

    #[test]
    fn skipped() {
        let toks = words("$( a $c comment $[ x.mm $] $) $c a $. $( $)").unwrap();
        assert_eq!(toks, [Token::Const, Token::Word("a"), Token::End]);
    }

    #[test]
    fn unclosed() {
        assert_eq!(words("$c a $. $( oops"), Err(Error::Unclosed(Block::Comment)));
    }

    #[test]
    fn nested() {
        assert_eq!(
            words("$( outer $( inner $) $)"),
            Err(Error::NestedComment("$(".into()))
        );
        assert_eq!(
            words("$( sneaky$) $)"),
            Err(Error::NestedComment("sneaky$)".into()))
        );
    }

    #[test]
    fn close_outside_comment_is_kept() {
        // rejecting a stray `$)` is the job of the statement reader
        assert_eq!(words("$)").unwrap(), [Token::CommentClose]);
    }
}
