//! Stack of a proof replay.

use alloc::vec::Vec;

/// Stack of a proof replay.
///
/// Every proof step consumes some number of topmost entries
/// (in the order in which they were pushed) and pushes a single new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack<A>(Vec<A>);

impl<A> Stack<A> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, x: A) {
        self.0.push(x)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the most recently pushed entry.
    pub fn top(&self) -> Option<&A> {
        self.0.last()
    }

    /// Return the `n` topmost entries in the order they were pushed.
    ///
    /// ~~~
    /// # use mmko::Stack;
    /// let stack: Stack<_> = vec![1, 2, 3].into();
    /// assert_eq!(stack.args(2), Some(&[2, 3][..]));
    /// assert_eq!(stack.args(4), None);
    /// ~~~
    pub fn args(&self, n: usize) -> Option<&[A]> {
        let start = self.len().checked_sub(n)?;
        Some(&self.0[start..])
    }

    /// Replace the `n` topmost entries by a single one.
    ///
    /// Return false and leave the stack unchanged if
    /// it has fewer than `n` entries.
    pub fn reduce(&mut self, n: usize, x: A) -> bool {
        match self.len().checked_sub(n) {
            Some(start) => {
                self.0.truncate(start);
                self.0.push(x);
                true
            }
            None => false,
        }
    }
}

impl<A> Default for Stack<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> From<Vec<A>> for Stack<A> {
    fn from(v: Vec<A>) -> Self {
        Self(v)
    }
}

#[test]
fn reduce() {
    let mut stack = Stack::from(alloc::vec![1, 2, 3]);
    assert!(!stack.reduce(4, 0));
    assert_eq!(stack.len(), 3);
    assert!(stack.reduce(2, 5));
    assert_eq!(stack, Stack::from(alloc::vec![1, 5]));
    assert!(stack.reduce(0, 6));
    assert_eq!(stack.top(), Some(&6));
}
