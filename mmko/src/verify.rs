//! Replaying of normal and compressed proofs.

use crate::assertion::{Assertion, Show, Statement, Subst, Symbol};
use crate::labels::{Entry, Labels};
use crate::scope::Env;
use crate::Stack;
use alloc::{string::String, string::ToString, vec::Vec};
use core::fmt::{self, Display};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnknownLabel(Symbol),
    /// hypothesis that is not in scope of the theorem being proved
    InactiveHypothesis(Symbol),
    /// mandatory hypothesis without label in the current scope
    UnknownHypothesis(String),
    Underflow {
        needed: usize,
        available: usize,
    },
    TypecodeMismatch {
        expected: Symbol,
        found: Statement,
    },
    HypothesisMismatch {
        expected: Statement,
        found: Statement,
    },
    DisjointViolation(Symbol, Symbol),
    EmptyStack,
    TooManyEntries(usize),
    ConclusionMismatch {
        expected: Statement,
        found: Statement,
    },
    NotEnoughSaved {
        saved: usize,
        index: usize,
    },
    InvalidChar(char),
    /// label block of a compressed proof without `)`
    UnclosedLabels,
    /// continuation digits without terminal digit
    DanglingDigits,
    EmptyProof,
    SaveOnEmpty,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownLabel(l) => write!(f, "unknown label in proof: {}", l),
            Self::InactiveHypothesis(l) => write!(f, "hypothesis {} is not active", l),
            Self::UnknownHypothesis(h) => write!(f, "no active label for hypothesis {}", h),
            Self::Underflow { needed, available } => write!(
                f,
                "stack underflow: needed {} entries, but only {} available",
                needed, available
            ),
            Self::TypecodeMismatch { expected, found } => write!(
                f,
                "stack entry {} does not match floating hypothesis with typecode {}",
                Show(found),
                expected
            ),
            Self::HypothesisMismatch { expected, found } => write!(
                f,
                "stack entry {} does not match essential hypothesis {}",
                Show(found),
                Show(expected)
            ),
            Self::DisjointViolation(x, y) => {
                write!(f, "disjoint variable violation: {} {}", x, y)
            }
            Self::EmptyStack => write!(f, "empty stack at end of proof"),
            Self::TooManyEntries(n) => write!(f, "stack has {} > 1 entries at end of proof", n),
            Self::ConclusionMismatch { expected, found } => write!(
                f,
                "stack entry {} does not match proved assertion {}",
                Show(found),
                Show(expected)
            ),
            Self::NotEnoughSaved { saved, index } => write!(
                f,
                "not enough saved proof steps ({} saved, step {} requested)",
                saved, index
            ),
            Self::InvalidChar(c) => write!(f, "invalid character in compressed proof: {}", c),
            Self::UnclosedLabels => write!(f, "label block of compressed proof is not closed"),
            Self::DanglingDigits => write!(f, "compressed proof ends in continuation digits"),
            Self::EmptyProof => write!(f, "empty proof"),
            Self::SaveOnEmpty => write!(f, "cannot save step on empty stack"),
        }
    }
}

/// A proof step, resolved from a label.
#[derive(Clone, Copy, Debug)]
pub enum Step<'a> {
    Hyp(&'a Statement),
    Assert(&'a Assertion),
}

/// An item of a compressed proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Code {
    /// refers to a label or to a saved statement
    Index(usize),
    /// save the stack top
    Save,
}

/// Decode the digits of a compressed proof.
///
/// ~~~
/// # use mmko::verify::{decode, Code};
/// let codes = decode(["AB", "UAZ"])?;
/// assert_eq!(codes, [Code::Index(0), Code::Index(1), Code::Index(20), Code::Save]);
/// # Ok::<_, mmko::verify::Error>(())
/// ~~~
pub fn decode<'s>(digits: impl IntoIterator<Item = &'s str>) -> Result<Vec<Code>, Error> {
    let mut codes = Vec::new();
    let mut value: usize = 0;
    let mut pending = false;
    for c in digits.into_iter().flat_map(str::chars) {
        match c {
            'A'..='T' => {
                let digit = c as usize - 'A' as usize;
                codes.push(Code::Index(value.saturating_mul(20).saturating_add(digit)));
                value = 0;
                pending = false;
            }
            'U'..='Y' => {
                let digit = c as usize - 'U' as usize + 1;
                value = value.saturating_mul(5).saturating_add(digit);
                pending = true;
            }
            'Z' => codes.push(Code::Save),
            c => return Err(Error::InvalidChar(c)),
        }
    }
    if pending {
        Err(Error::DanglingDigits)
    } else {
        Ok(codes)
    }
}

/// Replays proofs in the scope of a theorem.
pub struct Verifier<'a> {
    labels: &'a Labels,
    env: &'a Env,
}

impl<'a> Verifier<'a> {
    pub fn new(labels: &'a Labels, env: &'a Env) -> Self {
        Self { labels, env }
    }

    /// Resolve a label to a proof step.
    pub fn step(&self, label: &str) -> Result<Step<'a>, Error> {
        match self.labels.get(label) {
            None => Err(Error::UnknownLabel(label.to_string())),
            Some(Entry::Floating(s) | Entry::Essential(s)) => {
                if self.env.is_active_hypothesis(label) {
                    Ok(Step::Hyp(s))
                } else {
                    Err(Error::InactiveHypothesis(label.to_string()))
                }
            }
            Some(Entry::Axiom(a) | Entry::Theorem(a)) => Ok(Step::Assert(a)),
        }
    }

    /// Execute a proof step on the stack.
    ///
    /// If the step fails, the stack is left unchanged.
    pub fn apply_step(&self, step: Step, stack: &mut Stack<Statement>) -> Result<(), Error> {
        let a = match step {
            Step::Hyp(stmt) => {
                stack.push(stmt.clone());
                return Ok(());
            }
            Step::Assert(a) => a,
        };

        let n = a.floating.len() + a.essential.len();
        let args = stack.args(n).ok_or(Error::Underflow {
            needed: n,
            available: stack.len(),
        })?;
        let (fargs, eargs) = args.split_at(a.floating.len());

        let mut subst = Subst::new();
        for ((typecode, var), entry) in a.floating.iter().zip(fargs) {
            match entry.split_first() {
                Some((head, expr)) if head == typecode => {
                    subst.insert(var.clone(), expr.to_vec());
                }
                _ => {
                    return Err(Error::TypecodeMismatch {
                        expected: typecode.clone(),
                        found: entry.clone(),
                    })
                }
            }
        }

        for (hyp, entry) in a.essential.iter().zip(eargs) {
            let expected = subst.apply(hyp);
            if &expected != entry {
                let found = entry.clone();
                return Err(Error::HypothesisMismatch { expected, found });
            }
        }

        for (x, y) in &a.dvs {
            let (xe, ye) = match (subst.get(x), subst.get(y)) {
                (Some(xe), Some(ye)) => (xe, ye),
                _ => continue,
            };
            let (xvars, yvars) = (self.env.variables_in(xe), self.env.variables_in(ye));
            for x0 in &xvars {
                for y0 in &yvars {
                    if x0 == y0 || !self.env.is_disjoint(x0, y0) {
                        return Err(Error::DisjointViolation(x0.to_string(), y0.to_string()));
                    }
                }
            }
        }

        let conclusion = subst.apply(&a.conclusion);
        debug!("apply {} yields {}", a, Show(&conclusion));
        stack.reduce(n, conclusion);
        Ok(())
    }

    /// Replay a proof and return the resulting stack.
    ///
    /// The hypotheses are those of the theorem being proved;
    /// their labels are implicitly available in compressed proofs.
    pub fn replay(
        &self,
        floating: &[(Symbol, Symbol)],
        essential: &[Statement],
        proof: &[Symbol],
    ) -> Result<Stack<Statement>, Error> {
        let mut stack = Stack::new();
        match proof.split_first() {
            None => return Err(Error::EmptyProof),
            Some((first, rest)) if first == "(" => {
                self.compressed(floating, essential, rest, &mut stack)?
            }
            Some(_) => {
                for label in proof {
                    self.apply_step(self.step(label)?, &mut stack)?
                }
            }
        }
        Ok(stack)
    }

    fn compressed(
        &self,
        floating: &[(Symbol, Symbol)],
        essential: &[Statement],
        proof: &[Symbol],
        stack: &mut Stack<Statement>,
    ) -> Result<(), Error> {
        let close = proof.iter().position(|tok| tok == ")");
        let (block, digits) = proof.split_at(close.ok_or(Error::UnclosedLabels)?);

        let mut labels: Vec<&str> = Vec::with_capacity(floating.len() + essential.len());
        for (_, var) in floating {
            let label = self.env.floating_label_of(var);
            labels.push(label.ok_or_else(|| Error::UnknownHypothesis(var.clone()))?);
        }
        for hyp in essential {
            let label = self.env.essential_label_of(hyp);
            let unknown = || Error::UnknownHypothesis(Show(hyp).to_string());
            labels.push(label.ok_or_else(unknown)?);
        }
        labels.extend(block.iter().map(|l| l.as_str()));

        let steps = labels.iter().map(|l| self.step(l));
        let steps: Vec<Step> = steps.collect::<Result<_, _>>()?;
        let mut saved: Vec<Statement> = Vec::new();

        // skip the closing parenthesis
        for code in decode(digits[1..].iter().map(|d| d.as_str()))? {
            match code {
                Code::Save => saved.push(stack.top().cloned().ok_or(Error::SaveOnEmpty)?),
                Code::Index(i) if i < steps.len() => self.apply_step(steps[i], stack)?,
                Code::Index(i) => match saved.get(i - steps.len()) {
                    Some(stmt) => stack.push(stmt.clone()),
                    None => {
                        let saved = saved.len();
                        return Err(Error::NotEnoughSaved { saved, index: i });
                    }
                },
            }
        }
        Ok(())
    }

    /// Verify that a proof yields exactly the given conclusion.
    pub fn verify(
        &self,
        floating: &[(Symbol, Symbol)],
        essential: &[Statement],
        conclusion: &[Symbol],
        proof: &[Symbol],
    ) -> Result<(), Error> {
        let stack = self.replay(floating, essential, proof)?;
        match stack.top() {
            None => Err(Error::EmptyStack),
            Some(_) if stack.len() > 1 => Err(Error::TooManyEntries(stack.len())),
            Some(top) if top != conclusion => Err(Error::ConclusionMismatch {
                expected: conclusion.to_vec(),
                found: top.clone(),
            }),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::pair;
    use crate::scope::Scopes;
    use alloc::sync::Arc;

    fn stmt(s: &str) -> Statement {
        s.split_whitespace().map(String::from).collect()
    }

    /// Propositional fragment with `ax-1 $a |- ( ph -> ph )`
    /// and `ax-dj $a |- ( ph -> ps )` under `$d ph ps`.
    fn setup() -> (Scopes, Labels) {
        let mut sc = Scopes::new();
        let mut labels = Labels::new();
        sc.push();
        for c in ["|-", "wff", "(", ")", "->"] {
            sc.declare_constant(c.into()).unwrap();
        }
        for (l, v) in [("wph", "ph"), ("wps", "ps"), ("wch", "ch")] {
            sc.declare_variable(v.into()).unwrap();
            sc.add_floating("wff".into(), v.into(), l.into()).unwrap();
            let hyp = Entry::Floating(Arc::new(stmt(&format!("wff {}", v))));
            labels.insert(l.into(), hyp).unwrap();
        }
        let wi = sc.make_assertion(stmt("wff ( ph -> ps )"));
        labels.insert("wi".into(), Entry::Axiom(Arc::new(wi))).unwrap();
        let ax1 = sc.make_assertion(stmt("|- ( ph -> ph )"));
        labels.insert("ax-1".into(), Entry::Axiom(Arc::new(ax1))).unwrap();

        sc.push();
        sc.add_disjoint(&stmt("ph ps")).unwrap();
        let axdj = sc.make_assertion(stmt("|- ( ph -> ps )"));
        assert_eq!(axdj.dvs, [pair("ph", "ps")]);
        labels.insert("ax-dj".into(), Entry::Axiom(Arc::new(axdj))).unwrap();
        sc.pop().unwrap();
        (sc, labels)
    }

    fn run(v: &Verifier, stack: &mut Stack<Statement>, label: &str) -> Result<(), Error> {
        v.apply_step(v.step(label)?, stack)
    }

    #[test]
    fn ax1_replay() {
        let (sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        let mut stack = Stack::from(vec![stmt("wff ph")]);
        run(&v, &mut stack, "ax-1").unwrap();
        assert_eq!(stack, Stack::from(vec![stmt("|- ( ph -> ph )")]));
    }

    #[test]
    fn underflow() {
        let (sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        let mut stack = Stack::from(vec![stmt("wff ph")]);
        let err = run(&v, &mut stack, "wi");
        assert_eq!(err, Err(Error::Underflow { needed: 2, available: 1 }));
        assert_eq!(stack, Stack::from(vec![stmt("wff ph")]));
    }

    #[test]
    fn typecode_mismatch() {
        let (sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        let mut stack = Stack::from(vec![stmt("|- ph")]);
        assert!(matches!(
            run(&v, &mut stack, "ax-1"),
            Err(Error::TypecodeMismatch { .. })
        ));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn disjoint_violation() {
        let (mut sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        // ph and ch are not disjoint in the outer scope
        let mut stack = Stack::from(vec![stmt("wff ph"), stmt("wff ch")]);
        let err = run(&v, &mut stack, "ax-dj");
        assert_eq!(err, Err(Error::DisjointViolation("ph".into(), "ch".into())));
        assert_eq!(stack.len(), 2);

        // the same variable on both sides is never disjoint
        let mut stack = Stack::from(vec![stmt("wff ph"), stmt("wff ph")]);
        let err = run(&v, &mut stack, "ax-dj");
        assert_eq!(err, Err(Error::DisjointViolation("ph".into(), "ph".into())));

        sc.push();
        sc.add_disjoint(&stmt("ph ch")).unwrap();
        let v = Verifier::new(&labels, sc.env());
        let mut stack = Stack::from(vec![stmt("wff ph"), stmt("wff ch")]);
        run(&v, &mut stack, "ax-dj").unwrap();
        assert_eq!(stack, Stack::from(vec![stmt("|- ( ph -> ch )")]));
    }

    #[test]
    fn normal_and_compressed() {
        let (sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        let floating: [(Symbol, Symbol); 2] =
            [("wff".into(), "ph".into()), ("wff".into(), "ps".into())];
        let concl = stmt("|- ( ( ph -> ps ) -> ( ph -> ps ) )");

        let normal = stmt("wph wps wi ax-1");
        let normal = v.replay(&floating, &[], &normal).unwrap();
        // labels: wph wps | wi ax-1
        let compressed = stmt("( wi ax-1 ) ABCD");
        let compressed = v.replay(&floating, &[], &compressed).unwrap();
        assert_eq!(normal, compressed);
        assert_eq!(normal, Stack::from(vec![concl.clone()]));

        // reuse of a saved step
        let saved = stmt("( wi ax-1 ) ABCZD");
        assert!(v.verify(&floating, &[], &concl, &saved).is_ok());
        let saved = stmt("( wi ax-1 ) ABCZE");
        let err = v.verify(&floating, &[], &concl, &saved);
        assert_eq!(err, Err(Error::TooManyEntries(2)));
    }

    #[test]
    fn proof_errors() {
        let (sc, labels) = setup();
        let v = Verifier::new(&labels, sc.env());
        let f: [(Symbol, Symbol); 1] = [("wff".into(), "ph".into())];
        let concl = stmt("|- ( ph -> ph )");
        let verify = |proof: &str| v.verify(&f, &[], &concl, &stmt(proof));

        assert_eq!(verify("wph ax-1"), Ok(()));
        assert_eq!(verify(""), Err(Error::EmptyProof));
        assert_eq!(verify("nope"), Err(Error::UnknownLabel("nope".into())));
        assert_eq!(verify("wph"), Err(Error::ConclusionMismatch {
            expected: concl.clone(),
            found: stmt("wff ph"),
        }));
        assert_eq!(verify("wph wph"), Err(Error::TooManyEntries(2)));
        assert_eq!(verify("( ax-1 AB"), Err(Error::UnclosedLabels));
        assert_eq!(verify("( ax-1 ) Aa"), Err(Error::InvalidChar('a')));
        assert_eq!(verify("( ax-1 ) AU"), Err(Error::DanglingDigits));
        assert_eq!(verify("( ax-1 ) Z"), Err(Error::SaveOnEmpty));
        assert_eq!(verify("( ax-1 ) AC"), Err(Error::NotEnoughSaved { saved: 0, index: 2 }));
        assert_eq!(verify("( ) "), Err(Error::EmptyStack));
    }

    #[test]
    fn inactive_hypothesis() {
        let (_, labels) = setup();
        let mut sc = Scopes::new();
        sc.push();
        let v = Verifier::new(&labels, sc.env());
        let err = v.step("wph").map(|_| ());
        assert_eq!(err, Err(Error::InactiveHypothesis("wph".into())));
    }

    #[test]
    fn decode_digits() {
        let codes = decode(["YT", "UUA"]).unwrap();
        assert_eq!(codes, [Code::Index(5 * 20 + 19), Code::Index((5 + 1) * 20)]);
    }
}
