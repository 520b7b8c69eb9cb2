//! Reading of files with inclusions.

use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display};
use fnv::FnvHashSet;
use mm_parse::{Block, Token, Uncomment};
use std::path::{Path, PathBuf};
use std::{fs, io};

#[derive(Debug)]
pub enum Error {
    Io(PathBuf, io::Error),
    Parse(PathBuf, mm_parse::Error),
    /// inclusion that is not of the shape `$[ file $]`
    Malformed(PathBuf, String),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "{}: {}", path.display(), e),
            Self::Malformed(path, tok) => write!(
                f,
                "{}: malformed inclusion, expected `$[ file $]` but found {}",
                path.display(),
                tok
            ),
        }
    }
}

struct File {
    /// used for error messages
    name: PathBuf,
    /// directory against which inclusions are resolved
    dir: PathBuf,
    src: String,
    /// byte offset after the last token read
    pos: usize,
}

impl File {
    fn new(name: PathBuf, dir: PathBuf, src: String) -> Self {
        let pos = 0;
        Self { name, dir, src, pos }
    }

    fn read(path: PathBuf) -> Result<Self, Error> {
        let src = fs::read_to_string(&path).map_err(|e| Error::Io(path.clone(), e))?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(path, dir, src))
    }

    /// Lex the next token that is not part of a comment.
    fn next(&mut self) -> Option<Result<Token<String>, Error>> {
        let mut tokens = Uncomment::new(mm_parse::lex_at(&self.src, self.pos));
        let tok = tokens.next()?;
        self.pos = tokens.get_ref().offset();
        let tok = tok.map(|tok| tok.map(String::from));
        Some(tok.map_err(|e| Error::Parse(self.name.clone(), e)))
    }
}

/// Stream of comment-free tokens of a file and all files it includes.
///
/// Every file is imported at most once, identified by its canonical path.
/// Comments and inclusions must be closed in the file they are opened in.
pub struct Includer {
    files: Vec<File>,
    imported: FnvHashSet<PathBuf>,
}

fn canonicalize(path: &Path) -> Result<PathBuf, Error> {
    fs::canonicalize(path).map_err(|e| Error::Io(path.to_path_buf(), e))
}

impl Includer {
    /// Read the file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = canonicalize(path.as_ref())?;
        info!("importing {}", path.display());
        let imported = core::iter::once(path.clone()).collect();
        let files = Vec::from([File::read(path)?]);
        Ok(Self { files, imported })
    }

    /// Read a source given as string.
    ///
    /// Inclusions are resolved relative to `dir`.
    pub fn from_source(src: &str, dir: impl Into<PathBuf>) -> Self {
        let file = File::new(PathBuf::from("<input>"), dir.into(), String::from(src));
        Self {
            files: Vec::from([file]),
            imported: FnvHashSet::default(),
        }
    }

    fn name(&self) -> PathBuf {
        self.files.last().map(|f| f.name.clone()).unwrap_or_default()
    }

    fn include(&mut self, name: &str) -> Result<(), Error> {
        let dir = self.files.last().map(|f| f.dir.clone()).unwrap_or_default();
        let path = canonicalize(&dir.join(name))?;
        if self.imported.contains(&path) {
            debug!("skipping already imported {}", path.display());
            return Ok(());
        }
        info!("importing {}", path.display());
        self.imported.insert(path.clone());
        self.files.push(File::read(path)?);
        Ok(())
    }

    /// Process the remainder of a `$[ file $]` directive.
    fn inclusion(&mut self) -> Result<(), Error> {
        let (name, close) = match self.files.last_mut() {
            Some(file) => (file.next().transpose()?, file.next().transpose()?),
            None => (None, None),
        };
        match (name, close) {
            (Some(Token::Word(name)), Some(Token::IncludeClose)) => self.include(&name),
            (Some(Token::Word(_)), None) | (None, _) => Err(Error::Parse(
                self.name(),
                mm_parse::Error::Unclosed(Block::Inclusion),
            )),
            (Some(Token::Word(_)), Some(tok)) | (Some(tok), _) => {
                Err(Error::Malformed(self.name(), tok.to_string()))
            }
        }
    }
}

impl Iterator for Includer {
    type Item = Result<Token<String>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let file = self.files.last_mut()?;
            match file.next() {
                None => {
                    self.files.pop();
                }
                Some(Err(e)) => {
                    self.files.clear();
                    return Some(Err(e));
                }
                Some(Ok(Token::IncludeOpen)) => {
                    if let Err(e) = self.inclusion() {
                        self.files.clear();
                        return Some(Err(e));
                    }
                }
                Some(Ok(tok)) => {
                    trace!("token {}", tok);
                    return Some(Ok(tok));
                }
            }
        }
    }
}
