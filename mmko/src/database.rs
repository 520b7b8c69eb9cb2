//! Reading of Metamath databases.

use crate::assertion::{Assertion, Statement, Symbol};
use crate::include::{self, Includer};
use crate::labels::{Entry, Labels, Redefined};
use crate::scope::{self, Env, Scopes};
use crate::tactic::Goal;
use crate::verify::Verifier;
use alloc::{boxed::Box, string::String, string::ToString, sync::Arc, vec::Vec};
use core::fmt::{self, Display};
use fnv::FnvHashSet;
use mm_parse::Token;
use std::path::Path;

/// Keyword introducing a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Const,
    Var,
    Disj,
    Float,
    Ess,
    Axiom,
    Prov,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Const => "$c",
            Self::Var => "$v",
            Self::Disj => "$d",
            Self::Float => "$f",
            Self::Ess => "$e",
            Self::Axiom => "$a",
            Self::Prov => "$p",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnknownKeyword(String),
    UnexpectedToken(String),
    Redefined(Symbol),
    MissingLabel(Keyword),
    /// label that is not followed by `$f`, `$e`, `$a`, or `$p`
    DanglingLabel(Symbol),
    FloatLength(usize),
    EmptyStatement,
    /// end of input inside a statement
    Unterminated,
    /// end of input inside a `${ ... $}` block
    UnclosedScope,
    UnmatchedClose,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownKeyword(tok) => write!(f, "unknown or misplaced keyword {}", tok),
            Self::UnexpectedToken(tok) => write!(f, "unexpected token {}", tok),
            Self::Redefined(l) => write!(f, "label {} multiply defined", l),
            Self::MissingLabel(kw) => write!(f, "{} must have a label", kw),
            Self::DanglingLabel(l) => write!(f, "label {} is not followed by a labelled statement", l),
            Self::FloatLength(n) => write!(f, "$f must have length two but has length {}", n),
            Self::EmptyStatement => write!(f, "empty statement"),
            Self::Unterminated => write!(f, "unterminated statement at end of file"),
            Self::UnclosedScope => write!(f, "unclosed ${{ ... $}} block at end of file"),
            Self::UnmatchedClose => write!(f, "$}} without matching ${{"),
        }
    }
}

impl From<Redefined> for Error {
    fn from(Redefined(label): Redefined) -> Self {
        Self::Redefined(label)
    }
}

/// Boundaries of verification.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// verify only proofs starting from this label
    pub begin: Option<String>,
    /// stop reading at this label
    pub stop: Option<String>,
}

/// A proof to be verified.
///
/// A check contains everything that is needed to verify its proof,
/// independently of the builder that produced it.
/// This allows checks to be verified in parallel to reading the database.
pub struct Check {
    pub label: Symbol,
    pub assertion: Arc<Assertion>,
    pub proof: Vec<Symbol>,
    env: Env,
    labels: Labels,
}

impl Check {
    /// Verify the proof.
    pub fn run(&self) -> Result<(), crate::Error> {
        let a = &self.assertion;
        debug!("verifying {}", self.label);
        let verifier = Verifier::new(&self.labels, &self.env);
        let result = verifier.verify(&a.floating, &a.essential, &a.conclusion, &self.proof);
        result.map_err(|e| crate::Error::In {
            keyword: Keyword::Prov,
            label: Some(self.label.clone()),
            error: Box::new(e.into()),
        })?;
        info!("verified {}", self.label);
        Ok(())
    }
}

/// Index of all axioms and theorems by their hypotheses and conclusion.
#[derive(Clone, Debug, Default)]
pub struct Facts(FnvHashSet<(Statement, Statement)>);

impl Facts {
    pub fn new(labels: &Labels) -> Self {
        let asserts = labels.iter().filter_map(|(_, entry)| entry.assertion());
        let facts = asserts.map(|a| {
            let premises = a.essential.iter().flatten().cloned().collect();
            (premises, a.conclusion.clone())
        });
        Self(facts.collect())
    }

    /// Return true if an assertion with the premises and conclusion of the goal exists.
    pub fn contains(&self, goal: &Goal) -> bool {
        self.0
            .contains(&(goal.flat_premises(), goal.conclusion.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A read-only database.
#[derive(Debug)]
pub struct Database {
    labels: Labels,
    facts: Facts,
}

impl Database {
    /// Read a database file and verify all its proofs.
    pub fn from_file(path: impl AsRef<Path>, config: Config) -> Result<Self, crate::Error> {
        Self::from_tokens(Includer::open(path)?, config)
    }

    /// Read a database given as string and verify all its proofs.
    ///
    /// Inclusions are resolved relative to the current directory.
    ///
    /// ~~~
    /// # use mmko::{Config, Database};
    /// let src = "$c wff |- $. $v ph $. wph $f wff ph $.
    ///     ax-id $a |- ph $. th $p |- ph $= wph ax-id $.";
    /// let db = Database::from_source(src, Config::default())?;
    /// assert_eq!(db.labels().len(), 3);
    /// # Ok::<_, mmko::Error>(())
    /// ~~~
    pub fn from_source(src: &str, config: Config) -> Result<Self, crate::Error> {
        Self::from_tokens(Includer::from_source(src, "."), config)
    }

    fn from_tokens(tokens: Includer, config: Config) -> Result<Self, crate::Error> {
        let mut builder = Builder::new(config);
        builder.read(tokens, |check| check.run())?;
        Ok(builder.finish())
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn facts(&self) -> &Facts {
        &self.facts
    }
}

/// Reads statements into scopes and labels.
pub struct Builder {
    scopes: Scopes,
    labels: Labels,
    config: Config,
    verifying: bool,
    stopped: bool,
}

type Tokens = Result<Token<String>, include::Error>;

/// Read words up to the given token.
fn words<I>(tokens: &mut I, end: Token<String>) -> Result<Statement, crate::Error>
where
    I: Iterator<Item = Tokens>,
{
    let mut stmt = Vec::new();
    loop {
        match tokens.next().ok_or(Error::Unterminated)?? {
            Token::Word(w) if w.starts_with('$') => return Err(Error::UnknownKeyword(w).into()),
            Token::Word(w) => stmt.push(w),
            tok if tok == end => return Ok(stmt),
            tok => return Err(Error::UnexpectedToken(tok.to_string()).into()),
        }
    }
}

impl Builder {
    pub fn new(config: Config) -> Self {
        Self {
            scopes: Scopes::new(),
            labels: Labels::new(),
            verifying: config.begin.is_none(),
            stopped: false,
            config,
        }
    }

    /// Return the number of open frames.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Return true if the stop label was reached.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Read statements from tokens.
    ///
    /// Every proof that has to be verified is passed to `f`.
    /// Reading stops at the first error, either returned by `f` or
    /// encountered while reading.
    pub fn read<I, F, E>(&mut self, tokens: I, mut f: F) -> Result<(), E>
    where
        I: IntoIterator<Item = Tokens>,
        F: FnMut(Check) -> Result<(), E>,
        E: From<crate::Error>,
    {
        let mut tokens = tokens.into_iter();
        let depth = self.scopes.depth();
        self.scopes.push();
        let mut label = None;
        while !self.stopped {
            let tok = match tokens.next() {
                Some(tok) => tok.map_err(crate::Error::from)?,
                None => break,
            };
            if let Some(check) = self.token(tok, &mut label, &mut tokens)? {
                f(check)?
            }
        }

        if self.stopped {
            self.scopes.truncate(depth);
            return Ok(());
        }
        if let Some(label) = label {
            return Err(crate::Error::from(Error::DanglingLabel(label)).into());
        }
        if self.scopes.depth() > depth + 1 {
            return Err(crate::Error::from(Error::UnclosedScope).into());
        }
        self.scopes.truncate(depth);
        Ok(())
    }

    fn token<I>(
        &mut self,
        tok: Token<String>,
        label: &mut Option<Symbol>,
        tokens: &mut I,
    ) -> Result<Option<Check>, crate::Error>
    where
        I: Iterator<Item = Tokens>,
    {
        let kw = match tok {
            Token::Word(w) if !w.starts_with('$') => {
                self.label(w, label)?;
                return Ok(None);
            }
            Token::Const => Keyword::Const,
            Token::Var => Keyword::Var,
            Token::Disj => Keyword::Disj,
            Token::Float => Keyword::Float,
            Token::Ess => Keyword::Ess,
            Token::Axiom => Keyword::Axiom,
            Token::Prov => Keyword::Prov,
            Token::Open | Token::Close if label.is_some() => {
                let label = label.take().unwrap_or_default();
                return Err(Error::DanglingLabel(label).into());
            }
            Token::Open => {
                self.scopes.push();
                return Ok(None);
            }
            Token::Close if self.scopes.depth() <= 1 => return Err(Error::UnmatchedClose.into()),
            Token::Close => {
                self.scopes.pop()?;
                return Ok(None);
            }
            tok => return Err(Error::UnknownKeyword(tok.to_string()).into()),
        };

        let label = label.take();
        match (kw, label) {
            (Keyword::Const | Keyword::Var | Keyword::Disj, Some(label)) => {
                Err(Error::DanglingLabel(label).into())
            }
            (Keyword::Const | Keyword::Var | Keyword::Disj, None) => {
                let result = self.unlabelled(kw, tokens);
                result.map(|()| None).map_err(|e| e.within(kw, None))
            }
            (_, None) => Err(Error::MissingLabel(kw).into()),
            (_, Some(label)) => {
                let result = self.labelled(kw, label.clone(), tokens);
                result.map_err(|e| e.within(kw, Some(label)))
            }
        }
    }

    /// Register a label that precedes a statement.
    fn label(&mut self, label: Symbol, pending: &mut Option<Symbol>) -> Result<(), Error> {
        if let Some(prev) = pending.take() {
            return Err(Error::DanglingLabel(prev));
        }
        if self.labels.contains(&label) {
            return Err(Error::Redefined(label));
        }
        trace!("label {}", label);
        if self.config.stop.as_ref() == Some(&label) {
            info!("stopping at {}", label);
            self.stopped = true;
        }
        if self.config.begin.as_ref() == Some(&label) {
            self.verifying = true;
        }
        *pending = Some(label);
        Ok(())
    }

    fn unlabelled<I>(&mut self, kw: Keyword, tokens: &mut I) -> Result<(), crate::Error>
    where
        I: Iterator<Item = Tokens>,
    {
        let stmt = words(tokens, Token::End)?;
        match kw {
            Keyword::Const => stmt
                .into_iter()
                .try_for_each(|c| self.scopes.declare_constant(c))?,
            Keyword::Var => stmt
                .into_iter()
                .try_for_each(|v| self.scopes.declare_variable(v))?,
            _ => {
                if let Some(v) = stmt.iter().find(|v| !self.scopes.is_active_variable(v)) {
                    return Err(scope::Error::NotAVariable(v.clone()).into());
                }
                self.scopes.add_disjoint(&stmt)?
            }
        }
        Ok(())
    }

    /// Ensure that a statement consists of constants and typed variables.
    fn check_symbols(&self, stmt: &[Symbol]) -> Result<(), crate::Error> {
        if stmt.is_empty() {
            return Err(Error::EmptyStatement.into());
        }
        for tok in stmt {
            if self.scopes.is_active_variable(tok) {
                if self.scopes.floating_label_of(tok).is_none() {
                    return Err(scope::Error::UntypedVariable(tok.clone()).into());
                }
            } else if !self.scopes.is_constant(tok) {
                return Err(scope::Error::UndeclaredSymbol(tok.clone()).into());
            }
        }
        Ok(())
    }

    fn labelled<I>(
        &mut self,
        kw: Keyword,
        label: Symbol,
        tokens: &mut I,
    ) -> Result<Option<Check>, crate::Error>
    where
        I: Iterator<Item = Tokens>,
    {
        let end = if kw == Keyword::Prov {
            Token::Eq
        } else {
            Token::End
        };
        let stmt = words(tokens, end)?;
        let entry = match kw {
            Keyword::Float => {
                if stmt.len() != 2 {
                    return Err(Error::FloatLength(stmt.len()).into());
                }
                let (typecode, var) = (stmt[0].clone(), stmt[1].clone());
                self.scopes.add_floating(typecode, var, label.clone())?;
                Entry::Floating(Arc::new(stmt))
            }
            Keyword::Ess => {
                self.check_symbols(&stmt)?;
                self.scopes.add_essential(stmt.clone(), label.clone())?;
                Entry::Essential(Arc::new(stmt))
            }
            Keyword::Axiom => {
                self.check_symbols(&stmt)?;
                Entry::Axiom(Arc::new(self.scopes.make_assertion(stmt)))
            }
            _ => {
                self.check_symbols(&stmt)?;
                let proof = words(tokens, Token::End)?;
                let assertion = Arc::new(self.scopes.make_assertion(stmt));
                let check = self.verifying.then(|| Check {
                    label: label.clone(),
                    assertion: assertion.clone(),
                    proof,
                    env: self.scopes.env().clone(),
                    labels: self.labels.clone(),
                });
                self.labels.insert(label, Entry::Theorem(assertion)).map_err(Error::from)?;
                return Ok(check);
            }
        };
        debug!("{} {}", label, entry);
        self.labels.insert(label, entry).map_err(Error::from)?;
        Ok(None)
    }

    /// Finish reading and return the database.
    pub fn finish(self) -> Database {
        let facts = Facts::new(&self.labels);
        Database {
            labels: self.labels,
            facts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify;

    const PROP: &str = "
        $c ( ) -> wff |- $.
        $v ph ps ch $.
        wph $f wff ph $.
        wps $f wff ps $.
        wch $f wff ch $.
        wi $a wff ( ph -> ps ) $.
        ${
            min $e |- ph $.
            maj $e |- ( ph -> ps ) $.
            ax-mp $a |- ps $.
        $}
        ax-1 $a |- ( ph -> ( ps -> ph ) ) $.
        ax-2 $a |- ( ( ph -> ( ps -> ch ) ) -> ( ( ph -> ps ) -> ( ph -> ch ) ) ) $.
    ";

    const ID: &str = "
        id $p |- ( ph -> ph ) $=
          wph wph wph wi wi wph wph wi wph wph ax-1 wph wph wph wi wph wi wi
          wph wph wph wi wi wph wph wi wi wph wph wph wi ax-1 wph wph wph wi
          wph ax-2 ax-mp ax-mp $.
        idc $p |- ( ph -> ph ) $=
          ( wi ax-1 ax-2 ax-mp ) AAABBAABAACAAABABBAAABBAABBAAABCAAABADEE $.
    ";

    fn load(src: &str) -> Result<Database, crate::Error> {
        Database::from_source(src, Config::default())
    }

    fn load_err(src: &str) -> crate::Error {
        match load(src) {
            Ok(_) => panic!("database should not load"),
            Err(e) => e.innermost(),
        }
    }

    #[test]
    fn normal_and_compressed() {
        let db = load(&[PROP, ID].concat()).unwrap();
        let id = db.labels().get("id").and_then(Entry::assertion).unwrap();
        let idc = db.labels().get("idc").and_then(Entry::assertion).unwrap();
        assert_eq!(id, idc);
        assert_eq!(id.floating.len(), 1);
        // `id` and `idc` are the same fact
        assert_eq!(db.facts().len(), 5);
    }

    #[test]
    fn balanced_frames() {
        let mut builder = Builder::new(Config::default());
        let toks = Includer::from_source(&[PROP, ID].concat(), ".");
        builder
            .read(toks, |check| check.run())
            .map_err(|e: crate::Error| e)
            .unwrap();
        assert_eq!(builder.depth(), 0);
    }

    #[test]
    fn assertion_hypotheses() {
        let db = load(PROP).unwrap();
        let mp = db.labels().get("ax-mp").and_then(Entry::assertion).unwrap();
        assert_eq!(mp.to_string(), "[[ |- ph |- ( ph -> ps ) ]] |- ps");
        let vars: Vec<_> = mp.floating.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(vars, ["ph", "ps"]);
        assert!(!db.labels().contains("ch"));
    }

    #[test]
    fn wrong_proof() {
        let src = [PROP, "th $p |- ( ph -> ph ) $= wph ax-1 $."].concat();
        let err = load(&src).unwrap_err();
        assert!(matches!(
            &err,
            crate::Error::In { keyword: Keyword::Prov, label: Some(l), .. } if l == "th"
        ));
        assert!(matches!(err.innermost(), crate::Error::Verify(verify::Error::Underflow { .. })));
    }

    #[test]
    fn begin_and_stop() {
        let bad = "bad $p |- ( ph -> ph ) $= wph $.";
        let src = [PROP, bad, ID, "later $p |- ph $= wph $."].concat();
        let config = Config {
            begin: Some("id".into()),
            stop: Some("later".into()),
        };
        let db = Database::from_source(&src, config).unwrap();
        assert!(db.labels().contains("bad"));
        assert!(db.labels().contains("idc"));
        assert!(!db.labels().contains("later"));
    }

    #[test]
    fn structural_errors() {
        use Error::*;
        let structural = |src: &str| match load_err(src) {
            crate::Error::Database(e) => e,
            e => panic!("unexpected error: {}", e),
        };
        assert_eq!(structural("$c a $. x $c b $."), DanglingLabel("x".into()));
        assert_eq!(structural("$c a $. x y $a a $."), DanglingLabel("x".into()));
        assert_eq!(structural("$c a $. $a a $."), MissingLabel(Keyword::Axiom));
        assert_eq!(structural("$c a $. x $a a $. x $a a $."), Redefined("x".into()));
        assert_eq!(structural("$c a $. ${ $c b $."), UnclosedScope);
        assert_eq!(structural("$c a $. $}"), UnmatchedClose);
        assert_eq!(structural("$c a $. $)"), UnknownKeyword("$)".into()));
        assert_eq!(structural("$c a $. $="), UnknownKeyword("$=".into()));
        assert_eq!(structural("$c a $x $."), UnknownKeyword("$x".into()));
        assert_eq!(structural("$c a $. x $a a"), Unterminated);
        assert_eq!(structural("$c a $. x $a a $= $."), UnexpectedToken("$=".into()));
        assert_eq!(structural("$c a $. x $e $."), EmptyStatement);
        assert_eq!(structural("$c a $. $v x $. f $f a x x $."), FloatLength(3));
    }

    #[test]
    fn scope_errors() {
        use scope::Error::*;
        let scoping = |src: &str| match load_err(src) {
            crate::Error::Scope(e) => e,
            e => panic!("unexpected error: {}", e),
        };
        assert_eq!(scoping("$c a $. x $a a b $."), UndeclaredSymbol("b".into()));
        assert_eq!(scoping("$c a $. $v x $. y $a a x $."), UntypedVariable("x".into()));
        assert_eq!(scoping("$c a $. $d a $."), NotAVariable("a".into()));
        assert_eq!(scoping("$c a $. $v a $."), ConstantAsVariable("a".into()));
        assert_eq!(
            scoping("$c a $. $v x $. f $f a x $. ${ g $f a x $. $}"),
            AlreadyTyped("x".into())
        );
        // variables are local to their block
        assert_eq!(
            scoping("$c a $. ${ $v x $. $} f $f a x $."),
            InactiveVariable("x".into())
        );
    }

    #[test]
    fn demo() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/demo0.mm");
        let db = Database::from_file(path, Config::default()).unwrap();
        assert!(db.labels().contains("th1c"));
    }
}
