//! Goal-directed proving of theorems.
//!
//! A session starts from the conclusion of a theorem and
//! replaces goals by the hypotheses of known axioms and theorems,
//! until no goals remain.
//! The protocol consists of three operations:
//! [`Server::init_search`], [`Server::run_tac`], and [`Server::clear_search`].

use crate::assertion::{Show, Statement, Symbol};
use crate::database::{Database, Facts};
use crate::labels::Entry;
use crate::tactic::{self, Goal, Tactic};
use alloc::{string::String, string::ToString, vec::Vec};
use core::fmt::{self, Display};
use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NotATheorem(Symbol),
    UnknownSearch(usize),
    /// tactic state that was never produced
    UnknownTacticState(usize),
    /// tactic state that is not the latest of its session
    StaleTacticState(usize),
    Syntax(tactic::Error),
    /// tactic that is neither an axiom nor a theorem
    UnknownFact(String),
    UnknownVariable(Symbol),
    InconsistentConclusion {
        expected: Statement,
        found: Statement,
    },
    SessionFailed,
    SessionClosed,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotATheorem(l) => write!(f, "not a theorem: {}", l),
            Self::UnknownSearch(id) => write!(f, "unknown search id: {}", id),
            Self::UnknownTacticState(id) => write!(f, "unknown tactic state id: {}", id),
            Self::StaleTacticState(id) => write!(f, "tactic state {} is not the latest one", id),
            Self::Syntax(e) => e.fmt(f),
            Self::UnknownFact(t) => write!(f, "{} is not in existing axioms or theorems", t),
            Self::UnknownVariable(v) => write!(f, "no typecode for variable {}", v),
            Self::InconsistentConclusion { expected, found } => write!(
                f,
                "inconsistent conclusion: expected {} but got {}",
                Show(expected),
                Show(found)
            ),
            Self::SessionFailed => write!(f, "session failed before"),
            Self::SessionClosed => write!(f, "session has no goals left"),
        }
    }
}

impl From<tactic::Error> for Error {
    fn from(err: tactic::Error) -> Self {
        Self::Syntax(err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Open,
    /// an error occurred
    Failed,
    /// no goals are left
    Closed,
}

/// A goal together with the goal it was created for.
#[derive(Debug)]
struct Node {
    stmt: Statement,
    /// number of subgoals not yet proved
    open: usize,
    parent: Option<usize>,
    /// false if the node or one of its subgoals was deferred
    sound: bool,
}

/// State of one proving attempt.
#[derive(Debug)]
pub struct Session {
    /// tactic states, indexed by their id
    history: Vec<String>,
    /// essential hypotheses of the theorem
    premises: Vec<Statement>,
    nodes: Vec<Node>,
    /// open goals, the last one being on top
    goals: Vec<usize>,
    floating: FnvHashSet<Statement>,
    essential: FnvHashSet<Statement>,
    /// goals proved in this session
    proved: FnvHashSet<Statement>,
    types: FnvHashMap<Symbol, Symbol>,
    /// deferred goals
    saved: FnvHashSet<Statement>,
    status: Status,
}

impl Session {
    /// Start proving the axiom or theorem with the given label.
    pub fn init(db: &Database, label: &str) -> Result<Self, Error> {
        let entry = db.labels().get(label).and_then(Entry::assertion);
        let assertion = entry.ok_or_else(|| Error::NotATheorem(label.to_string()))?;

        let mut floating = FnvHashSet::default();
        let mut essential = FnvHashSet::default();
        let mut types = FnvHashMap::default();
        for (_, entry) in db.labels().before(label) {
            match entry {
                Entry::Floating(stmt) => {
                    if let [typecode, var] = &stmt[..] {
                        types.insert(var.clone(), typecode.clone());
                    }
                    floating.insert((**stmt).clone());
                }
                Entry::Essential(stmt) => {
                    essential.insert((**stmt).clone());
                }
                Entry::Axiom(_) | Entry::Theorem(_) => (),
            }
        }

        let root = Node {
            stmt: assertion.conclusion.clone(),
            open: 0,
            parent: None,
            sound: true,
        };
        let mut session = Self {
            history: Vec::new(),
            premises: assertion.essential.clone(),
            nodes: Vec::from([root]),
            goals: Vec::from([0]),
            floating,
            essential,
            proved: FnvHashSet::default(),
            types,
            saved: FnvHashSet::default(),
            status: Status::Open,
        };
        session.history.push(session.render());
        debug!("init search for {}", label);
        Ok(session)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Return the latest tactic state.
    pub fn tactic_state(&self) -> &str {
        self.history.last().map_or("", |s| s.as_str())
    }

    /// Return the id of the latest tactic state.
    pub fn tactic_state_id(&self) -> usize {
        self.history.len() - 1
    }

    /// Return the number of open goals.
    pub fn goals(&self) -> usize {
        self.goals.len()
    }

    /// Return the number of deferred goals.
    pub fn saved(&self) -> usize {
        self.saved.len()
    }

    /// Show the open goals, most recent first.
    fn render(&self) -> String {
        let goal = |id: &usize| Goal {
            premises: self.premises.clone(),
            conclusion: self.nodes[*id].stmt.clone(),
        };
        let lines: Vec<String> = self.goals.iter().rev().map(|id| goal(id).to_string()).collect();
        match lines.len() {
            0 => "no goals".to_string(),
            1 => lines.concat(),
            n => format!("{} goals\n{}", n, lines.join("\n")),
        }
    }

    /// Apply a tactic to the latest tactic state.
    ///
    /// On success, return the id of the new tactic state.
    /// On failure, the goals remain unchanged and the session fails.
    pub fn run_tac(&mut self, facts: &Facts, id: usize, tactic: &str) -> Result<usize, Error> {
        match self.status {
            Status::Failed => return Err(Error::SessionFailed),
            Status::Closed => return Err(Error::SessionClosed),
            Status::Open => (),
        }
        let result = self.apply(facts, id, tactic);
        match &result {
            Ok(_) if self.goals.is_empty() => {
                self.status = Status::Closed;
                if !self.saved.is_empty() {
                    warn!("no goals left, but {} deferred goals", self.saved.len())
                }
            }
            Ok(_) => (),
            Err(e) => {
                debug!("session failed: {}", e);
                self.status = Status::Failed;
            }
        }
        result
    }

    fn apply(&mut self, facts: &Facts, id: usize, tactic: &str) -> Result<usize, Error> {
        let latest = self.tactic_state_id();
        if id > latest {
            return Err(Error::UnknownTacticState(id));
        } else if id < latest {
            return Err(Error::StaleTacticState(id));
        }

        let Tactic { goal, subst } = Tactic::parse(tactic)?;
        // goals are never empty for open sessions
        let top = *self.goals.last().ok_or(Error::SessionClosed)?;
        let target = &self.nodes[top].stmt;

        let known = facts.contains(&goal);
        let defer = !known && &goal.conclusion == target;
        if !known && !defer {
            return Err(Error::UnknownFact(goal.to_string()));
        }

        let mut typings = Vec::with_capacity(subst.len());
        for (var, expr) in subst.iter() {
            let typecode = self.types.get(var);
            let typecode = typecode.ok_or_else(|| Error::UnknownVariable(var.clone()))?;
            let typing: Statement = core::iter::once(typecode).chain(expr).cloned().collect();
            typings.push(typing);
        }

        let found = subst.apply(&goal.conclusion);
        if &found != target {
            let expected = target.clone();
            return Err(Error::InconsistentConclusion { expected, found });
        }

        // from here on, nothing fails
        self.goals.pop();
        let target = self.nodes[top].stmt.clone();
        if defer {
            debug!("defer {}", Show(&target));
            self.nodes[top].sound = false;
            self.saved.insert(target);
        } else if self.saved.remove(&target) {
            debug!("proved deferred goal {}", Show(&target));
        }

        let typings = typings.into_iter().filter(|typing: &Statement| {
            !self.floating.contains(typing) && !self.essential.contains(typing)
        });
        let premises = goal.premises.iter().map(|p| subst.apply(p));
        let premises = premises.filter(|p| !self.premises.contains(p));
        let mut subgoals: Vec<Statement> = typings.chain(premises).collect();
        subgoals.retain(|stmt| !self.proved.contains(stmt));

        self.nodes[top].open = subgoals.len();
        for stmt in subgoals {
            debug!("new goal {}", Show(&stmt));
            self.goals.push(self.nodes.len());
            let parent = Some(top);
            let (open, sound) = (0, true);
            self.nodes.push(Node { stmt, open, parent, sound });
        }
        if self.nodes[top].open == 0 {
            self.settle(top)
        }

        self.history.push(self.render());
        Ok(self.tactic_state_id())
    }

    /// Record a goal whose subgoals are all proved.
    fn settle(&mut self, mut id: usize) {
        loop {
            let node = &self.nodes[id];
            if node.sound {
                self.proved.insert(node.stmt.clone());
            }
            let (sound, parent) = (node.sound, node.parent);
            let parent = match parent {
                Some(parent) => parent,
                None => return,
            };
            let parent_node = &mut self.nodes[parent];
            parent_node.sound &= sound;
            parent_node.open -= 1;
            if parent_node.open > 0 {
                return;
            }
            id = parent;
        }
    }
}

/// Answer to a protocol request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub search_id: Option<usize>,
    pub tactic_state: Option<String>,
    pub tactic_state_id: Option<usize>,
    pub error: Option<String>,
}

impl Response {
    fn error(search_id: Option<usize>, err: Error) -> Self {
        Self {
            search_id,
            error: Some(err.to_string()),
            ..Default::default()
        }
    }
}

/// Protocol request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    InitSearch {
        name: String,
        namespace: Option<String>,
    },
    RunTac {
        search_id: usize,
        tactic_state_id: usize,
        tactic: String,
    },
    ClearSearch {
        search_id: usize,
    },
}

/// Sessions on a database, identified by search ids.
pub struct Server<'a> {
    db: &'a Database,
    sessions: FnvHashMap<usize, Session>,
    count: usize,
}

impl<'a> Server<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            sessions: FnvHashMap::default(),
            count: 0,
        }
    }

    /// Start a new session for the theorem with the given label.
    ///
    /// The namespace is ignored.
    ///
    /// ~~~
    /// # use mmko::{Config, Database, Server};
    /// let src = "$c wff |- ( ) -> $. $v ph $. wph $f wff ph $.
    ///     ax-id $a |- ( ph -> ph ) $.";
    /// let db = Database::from_source(src, Config::default())?;
    /// let mut server = Server::new(&db);
    /// let init = server.init_search("ax-id", None);
    /// assert_eq!(init.tactic_state.as_deref(), Some("[[ ]] |- ( ph -> ph )"));
    ///
    /// let tac = "[[ ]] |- ( ph -> ph )";
    /// let resp = server.run_tac(init.search_id.unwrap(), 0, tac);
    /// assert_eq!(resp.tactic_state.as_deref(), Some("no goals"));
    /// assert_eq!(resp.tactic_state_id, Some(1));
    /// # Ok::<_, mmko::Error>(())
    /// ~~~
    pub fn init_search(&mut self, name: &str, namespace: Option<&str>) -> Response {
        if let Some(ns) = namespace {
            trace!("ignoring namespace {}", ns);
        }
        match Session::init(self.db, name) {
            Ok(session) => {
                let search_id = self.count;
                self.count += 1;
                let response = Response {
                    search_id: Some(search_id),
                    tactic_state: Some(session.tactic_state().to_string()),
                    tactic_state_id: Some(session.tactic_state_id()),
                    error: None,
                };
                self.sessions.insert(search_id, session);
                response
            }
            Err(e) => Response::error(None, e),
        }
    }

    /// Apply a tactic to a tactic state of a session.
    pub fn run_tac(&mut self, search_id: usize, tactic_state_id: usize, tactic: &str) -> Response {
        let session = match self.sessions.get_mut(&search_id) {
            Some(session) => session,
            None => return Response::error(Some(search_id), Error::UnknownSearch(search_id)),
        };
        match session.run_tac(self.db.facts(), tactic_state_id, tactic) {
            Ok(id) => Response {
                search_id: Some(search_id),
                tactic_state: Some(session.tactic_state().to_string()),
                tactic_state_id: Some(id),
                error: None,
            },
            Err(e) => Response::error(Some(search_id), e),
        }
    }

    /// Release a session.
    pub fn clear_search(&mut self, search_id: usize) -> Response {
        match self.sessions.remove(&search_id) {
            Some(_) => {
                debug!("cleared search {}", search_id);
                Response::default()
            }
            None => Response::error(Some(search_id), Error::UnknownSearch(search_id)),
        }
    }

    pub fn session(&self, search_id: usize) -> Option<&Session> {
        self.sessions.get(&search_id)
    }

    /// Answer a request.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::InitSearch { name, namespace } => {
                self.init_search(&name, namespace.as_deref())
            }
            Request::RunTac {
                search_id,
                tactic_state_id,
                tactic,
            } => self.run_tac(search_id, tactic_state_id, &tactic),
            Request::ClearSearch { search_id } => self.clear_search(search_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Config;

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
        ax-id $a |- ( ph -> ph ) $.
        thm1 $p |- ( ps -> ps ) $= wps ax-id $.
        ${
            syl.1 $e |- ( ph -> ps ) $.
            syl.2 $e |- ( ps -> ch ) $.
            syl $a |- ( ph -> ch ) $.
        $}
    ";

    fn db() -> Database {
        Database::from_source(PROP, Config::default()).unwrap()
    }

    #[test]
    fn round_trip() {
        let db = db();
        let mut server = Server::new(&db);
        let init = server.init_search("thm1", Some("ignored"));
        assert_eq!(init.search_id, Some(0));
        assert_eq!(init.tactic_state_id, Some(0));
        assert_eq!(init.tactic_state.as_deref(), Some("[[ ]] |- ( ps -> ps )"));
        assert_eq!(init.error, None);

        let resp = server.run_tac(0, 0, "[[ ]] |- ( ps -> ps ) {{ ph : ps }}");
        assert_eq!(resp.error, None);
        assert_eq!(resp.tactic_state.as_deref(), Some("no goals"));
        assert_eq!(resp.tactic_state_id, Some(1));
        assert_eq!(server.session(0).map(Session::status), Some(Status::Closed));

        let closed = server.run_tac(0, 1, "[[ ]] |- ( ps -> ps )");
        assert_eq!(closed.error, Some(Error::SessionClosed.to_string()));

        assert_eq!(server.clear_search(0), Response::default());
        assert!(server.session(0).is_none());
        let gone = server.run_tac(0, 1, "[[ ]] |- ( ps -> ps )");
        assert_eq!(gone.error, Some(Error::UnknownSearch(0).to_string()));
    }

    #[test]
    fn not_a_theorem() {
        let db = db();
        let mut server = Server::new(&db);
        for name in ["nope", "wph", "min"] {
            let resp = server.init_search(name, None);
            let err = Error::NotATheorem(name.into()).to_string();
            assert_eq!(resp, Response::error(None, Error::NotATheorem(name.into())));
            assert_eq!(resp.error, Some(err));
        }
    }

    #[test]
    fn subgoals() {
        let db = db();
        let facts = db.facts();
        let mut s = Session::init(&db, "syl").unwrap();
        let premises = "[[ |- ( ph -> ps ) |- ( ps -> ch ) ]]";
        assert_eq!(s.tactic_state(), format!("{} |- ( ph -> ch )", premises));

        // modus ponens with a minor premise that is not a hypothesis
        let mp = "[[ |- ph |- ( ph -> ps ) ]] |- ps {{ ph : ( ph -> ps ) }} {{ ps : ( ph -> ch ) }}";
        let id = s.run_tac(facts, 0, mp).unwrap();
        assert_eq!(id, 1);
        // the minor premise `|- ( ph -> ps )` is a hypothesis
        let expected = [
            "3 goals".to_string(),
            format!("{} |- ( ( ph -> ps ) -> ( ph -> ch ) )", premises),
            format!("{} wff ( ph -> ch )", premises),
            format!("{} wff ( ph -> ps )", premises),
        ];
        assert_eq!(s.tactic_state(), expected.join("\n"));
        assert_eq!(s.goals(), 3);
    }

    #[test]
    fn inconsistent_conclusion() {
        let db = db();
        let facts = db.facts();
        let mut s = Session::init(&db, "thm1").unwrap();
        let before = s.tactic_state().to_string();
        let err = s.run_tac(facts, 0, "[[ ]] |- ( ph -> ph ) {{ ph : ch }}");
        assert_eq!(
            err,
            Err(Error::InconsistentConclusion {
                expected: "|- ( ps -> ps )".split(' ').map(String::from).collect(),
                found: "|- ( ch -> ch )".split(' ').map(String::from).collect(),
            })
        );
        assert_eq!(s.tactic_state(), before);
        assert_eq!(s.tactic_state_id(), 0);
        assert_eq!(s.goals(), 1);
        assert_eq!(s.status(), Status::Failed);
        let again = s.run_tac(facts, 0, "[[ ]] |- ( ph -> ph ) {{ ph : ps }}");
        assert_eq!(again, Err(Error::SessionFailed));
    }

    #[test]
    fn errors() {
        let db = db();
        let facts = db.facts();
        let run = |id, tac: &str| {
            let mut s = Session::init(&db, "thm1").unwrap();
            let result = s.run_tac(facts, id, tac);
            assert_eq!(s.status(), Status::Failed);
            result.unwrap_err()
        };
        let syntax = tactic::Error::Tactic("|- ( ps -> ps )".into());
        assert_eq!(run(0, "|- ( ps -> ps )"), Error::Syntax(syntax));
        assert_eq!(run(1, "[[ ]] |- ( ps -> ps )"), Error::UnknownTacticState(1));
        let fact = "[[ ]] |- ( ps -> ph )";
        assert_eq!(run(0, fact), Error::UnknownFact(fact.into()));
        let var = "[[ ]] |- ( ph -> ph ) {{ th : ps }}";
        assert_eq!(run(0, var), Error::UnknownVariable("th".into()));
    }

    #[test]
    fn stale_state() {
        let db = db();
        let facts = db.facts();
        let mut s = Session::init(&db, "syl").unwrap();
        let mp = "[[ |- ph |- ( ph -> ps ) ]] |- ps {{ ph : ( ph -> ps ) }} {{ ps : ( ph -> ch ) }}";
        s.run_tac(facts, 0, mp).unwrap();
        let err = s.run_tac(facts, 0, mp);
        assert_eq!(err, Err(Error::StaleTacticState(0)));
    }

    #[test]
    fn defer_and_prove() {
        let db = db();
        let facts = db.facts();
        let mut s = Session::init(&db, "thm1").unwrap();
        // not a fact, but concludes the goal
        let id = s.run_tac(facts, 0, "[[ |- ps ]] |- ( ps -> ps )").unwrap();
        assert_eq!(s.saved(), 1);
        assert_eq!(s.tactic_state(), "[[ ]] |- ps");
        // the deferred goal is closed without being proved
        let id = s.run_tac(facts, id, "[[ ]] |- ps").unwrap();
        assert_eq!(id, 2);
        assert_eq!(s.tactic_state(), "no goals");
        assert_eq!(s.status(), Status::Closed);
        assert_eq!(s.saved(), 2);
    }

    #[test]
    fn proved_goals_are_reused() {
        let db = db();
        let facts = db.facts();
        let mut s = Session::init(&db, "thm1").unwrap();
        let mp = "[[ |- ph |- ( ph -> ps ) ]] |- ps {{ ph : ( ps -> ps ) }} {{ ps : ( ps -> ps ) }}";
        s.run_tac(facts, 0, mp).unwrap();
        // two typings and two premises
        assert_eq!(s.goals(), 4);
        let ax = "[[ ]] |- ( ph -> ph ) {{ ph : ( ps -> ps ) }}";
        s.run_tac(facts, 1, ax).unwrap();
        assert_eq!(s.goals(), 4);
        let wi = "[[ ]] wff ( ph -> ps ) {{ ph : ps }} {{ ps : ps }}";
        s.run_tac(facts, 2, wi).unwrap();
        assert_eq!(s.goals(), 3);
        // the typings and the major premise are proved already
        s.run_tac(facts, 3, mp).unwrap();
        assert_eq!(s.goals(), 3);
        let state = s.tactic_state();
        assert!(state.starts_with("3 goals\n[[ ]] |- ( ps -> ps )\n"), "{}", state);
    }

    #[test]
    fn concurrent_sessions() {
        fn shareable<T: Send + Sync>() {}
        shareable::<Database>();

        let db = db();
        let tac = "[[ ]] |- ( ps -> ps ) {{ ph : ps }}";
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut server = Server::new(&db);
                    let init = server.init_search("thm1", None);
                    let search_id = init.search_id.unwrap();
                    let resp = server.run_tac(search_id, 0, tac);
                    assert_eq!(resp.tactic_state.as_deref(), Some("no goals"));
                    assert_eq!(resp.tactic_state_id, Some(1));
                });
            }
        });
    }

    #[test]
    fn requests() {
        let req: Request = serde_json::from_str(r#"{"cmd":"init_search","name":"thm1"}"#).unwrap();
        let name = "thm1".to_string();
        assert_eq!(req, Request::InitSearch { name, namespace: None });
        let req = r#"{"cmd":"run_tac","search_id":0,"tactic_state_id":0,"tactic":"[[ ]] |- ( ps -> ps )"}"#;
        let req: Request = serde_json::from_str(req).unwrap();

        let db = db();
        let mut server = Server::new(&db);
        server.init_search("thm1", None);
        let resp = serde_json::to_string(&server.handle(req)).unwrap();
        let expected = r#"{"search_id":0,"tactic_state":"no goals","tactic_state_id":1,"error":null}"#;
        assert_eq!(resp, expected);
    }
}
