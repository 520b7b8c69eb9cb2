//! Labelled statements in order of definition.

use crate::assertion::{Assertion, Statement, Symbol};
use alloc::sync::Arc;
use core::fmt::{self, Display};
use fnv::FnvBuildHasher;

type ImMap<K, V> = im::hashmap::HashMap<K, V, FnvBuildHasher>;

/// The object a label refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Floating(Arc<Statement>),
    Essential(Arc<Statement>),
    Axiom(Arc<Assertion>),
    Theorem(Arc<Assertion>),
}

impl Entry {
    /// Return the assertion of an axiom or theorem.
    pub fn assertion(&self) -> Option<&Arc<Assertion>> {
        match self {
            Self::Axiom(a) | Self::Theorem(a) => Some(a),
            Self::Floating(_) | Self::Essential(_) => None,
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::assertion::Show;
        match self {
            Self::Floating(s) => write!(f, "$f {}", Show(s)),
            Self::Essential(s) => write!(f, "$e {}", Show(s)),
            Self::Axiom(a) => write!(f, "$a {}", a),
            Self::Theorem(a) => write!(f, "$p {}", a),
        }
    }
}

/// A label was defined twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redefined(pub Symbol);

/// Map from labels to entries that remembers the order of insertion.
///
/// Cloning is cheap, because entries are stored in persistent structures.
/// This allows proof checks to take a snapshot of all labels
/// that were defined before the theorem to check.
#[derive(Clone, Debug, Default)]
pub struct Labels {
    entries: im::Vector<(Symbol, Entry)>,
    index: ImMap<Symbol, usize>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Return the position of a label in the order of definition.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn get(&self, label: &str) -> Option<&Entry> {
        let pos = self.position(label)?;
        self.entries.get(pos).map(|(_, e)| e)
    }

    /// Add a fresh label.
    pub fn insert(&mut self, label: Symbol, entry: Entry) -> Result<(), Redefined> {
        if self.contains(&label) {
            return Err(Redefined(label));
        }
        self.index.insert(label.clone(), self.entries.len());
        self.entries.push_back((label, entry));
        Ok(())
    }

    /// Iterate over all entries in the order of definition.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Entry)> {
        self.entries.iter().map(|(l, e)| (l, e))
    }

    /// Iterate over the entries defined strictly before the given label.
    ///
    /// If the label is unknown, iterate over all entries.
    pub fn before(&self, label: &str) -> impl Iterator<Item = (&Symbol, &Entry)> {
        let end = self.position(label).unwrap_or(self.len());
        self.iter().take(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::String, vec, vec::Vec};

    fn hyp(s: &str) -> Entry {
        Entry::Floating(Arc::new(s.split(' ').map(String::from).collect()))
    }

    #[test]
    fn order() {
        let mut labels = Labels::new();
        labels.insert("wph".into(), hyp("wff ph")).unwrap();
        labels.insert("wps".into(), hyp("wff ps")).unwrap();
        labels.insert("wch".into(), hyp("wff ch")).unwrap();

        let before: Vec<_> = labels.before("wch").map(|(l, _)| l.as_str()).collect();
        assert_eq!(before, vec!["wph", "wps"]);
        assert_eq!(labels.before("nope").count(), 3);
        assert_eq!(labels.position("wps"), Some(1));
        assert_eq!(labels.get("wps"), Some(&hyp("wff ps")));
    }

    #[test]
    fn redefined() {
        let mut labels = Labels::new();
        labels.insert("wph".into(), hyp("wff ph")).unwrap();
        let snapshot = labels.clone();
        let err = labels.insert("wph".into(), hyp("wff ps"));
        assert_eq!(err, Err(Redefined("wph".into())));
        labels.insert("wps".into(), hyp("wff ps")).unwrap();
        assert!(!snapshot.contains("wps"));
    }
}
