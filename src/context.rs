use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula, LtlfNode};
use rustc_hash::{FxHashMap, FxHasher};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

/// Name of the reserved end-of-trace atom. The `!` cannot appear in a
/// surface-syntax identifier or a partition file, so the name can never
/// collide with a user atom.
const END_NAME: &str = "end!";

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(0);

struct Node {
    kind: LtlfNode,
    hash: u64,
}

/// Factory and registry for LTLf formula nodes.
///
/// The context owns every node it creates; nodes are immutable once interned
/// and live exactly as long as the context. Structural normalization happens
/// *before* the intern-table lookup, so the following hold for every handle:
///
/// * structurally equal formulas share a single handle;
/// * `And`/`Or` arguments are flattened, deduplicated and sorted by the
///   canonical handle order ([`Context::handle_cmp`]);
/// * `⊥` absorbs `And`, `⊤` absorbs `Or`, and neutral constants are dropped;
/// * double negation cancels, and negation of an atom is `PropNot`.
pub struct Context {
    id: u32,
    nodes: Vec<Node>,
    table: FxHashMap<LtlfNode, u32>,
    atom_names: Vec<String>,
    atom_table: FxHashMap<String, AtomId>,
    tt: Formula,
    ff: Formula,
    end: Formula,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    /// Create a new empty context.
    ///
    /// The constants `⊤` and `⊥` and the reserved end-of-trace atom are
    /// interned eagerly.
    pub fn new() -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, AtomicOrdering::Relaxed);
        let placeholder = Formula { context: id, index: 0 };
        let mut ctx = Context {
            id,
            nodes: Vec::new(),
            table: FxHashMap::default(),
            atom_names: Vec::new(),
            atom_table: FxHashMap::default(),
            tt: placeholder,
            ff: placeholder,
            end: placeholder,
        };
        ctx.tt = ctx.intern(LtlfNode::True);
        ctx.ff = ctx.intern(LtlfNode::False);
        let end_id = ctx.intern_atom_name(END_NAME);
        ctx.end = ctx.intern(LtlfNode::Atom(end_id));
        ctx
    }

    /// Unique id of this context.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of interned nodes (including the eagerly created constants).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the context holds only the eagerly created nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 3
    }

    /// Get the node data behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to a different context.
    pub fn node(&self, formula: Formula) -> &LtlfNode {
        assert_eq!(
            formula.context, self.id,
            "Formula handle belongs to a different context"
        );
        &self.nodes[formula.index as usize].kind
    }

    /// Cached structural hash of the formula behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to a different context.
    pub fn hash_of(&self, formula: Formula) -> u64 {
        assert_eq!(
            formula.context, self.id,
            "Formula handle belongs to a different context"
        );
        self.nodes[formula.index as usize].hash
    }

    pub(crate) fn check(&self, formula: Formula) -> Result<(), SynthesisError> {
        if formula.context != self.id {
            return Err(SynthesisError::InvalidArgument(format!(
                "formula handle from context {} used with context {}",
                formula.context, self.id
            )));
        }
        Ok(())
    }

    fn check_all(&self, formulas: &[Formula]) -> Result<(), SynthesisError> {
        for &f in formulas {
            self.check(f)?;
        }
        Ok(())
    }

    // Constructors

    /// The constant `⊤`.
    pub fn make_true(&self) -> Formula {
        self.tt
    }

    /// The constant `⊥`.
    pub fn make_false(&self) -> Formula {
        self.ff
    }

    /// The reserved atom signifying "the current step is the last".
    ///
    /// It is never a member of the environment or controller partition; the
    /// search layer binds it per move.
    pub fn end_atom(&self) -> Formula {
        self.end
    }

    /// Intern an atomic proposition by name.
    ///
    /// Names follow the surface-syntax identifier shape: an ASCII letter or
    /// `_` followed by letters, digits and `_`. Interning the same name
    /// twice returns the same handle.
    pub fn make_atom(&mut self, name: &str) -> Result<Formula, SynthesisError> {
        let mut chars = name.chars();
        let head_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !head_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SynthesisError::InvalidArgument(format!(
                "invalid atom name `{}`",
                name
            )));
        }
        let id = self.intern_atom_name(name);
        Ok(self.intern(LtlfNode::Atom(id)))
    }

    /// Negated atom. Fails with `InvalidArgument` if the operand is not an
    /// atom.
    pub fn make_prop_not(&mut self, atom: Formula) -> Result<Formula, SynthesisError> {
        self.check(atom)?;
        if !matches!(self.node(atom), LtlfNode::Atom(_)) {
            return Err(SynthesisError::InvalidArgument(format!(
                "PropNot applied to {} node; only atoms can be negated propositionally",
                self.node(atom).describe()
            )));
        }
        Ok(self.intern(LtlfNode::PropNot(atom)))
    }

    /// Negation. Double negation cancels, constants fold, and negating an
    /// atom yields `PropNot`.
    pub fn make_not(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        match self.node(operand) {
            LtlfNode::True => Ok(self.ff),
            LtlfNode::False => Ok(self.tt),
            LtlfNode::Atom(_) => self.make_prop_not(operand),
            LtlfNode::PropNot(atom) => Ok(*atom),
            LtlfNode::Not(inner) => Ok(*inner),
            _ => Ok(self.intern(LtlfNode::Not(operand))),
        }
    }

    /// Conjunction. Nested conjunctions are flattened, arguments are
    /// deduplicated and sorted canonically, `⊤` is dropped and `⊥` absorbs.
    /// The empty conjunction is `⊤` and a singleton collapses to its only
    /// argument.
    pub fn make_and(&mut self, operands: &[Formula]) -> Result<Formula, SynthesisError> {
        self.check_all(operands)?;
        let mut flat = Vec::with_capacity(operands.len());
        for &op in operands {
            match self.node(op) {
                LtlfNode::And(inner) => flat.extend(inner.iter().copied()),
                LtlfNode::True => {}
                LtlfNode::False => return Ok(self.ff),
                _ => flat.push(op),
            }
        }
        flat.sort_by(|&a, &b| self.handle_cmp(a, b));
        flat.dedup();
        match flat.len() {
            0 => Ok(self.tt),
            1 => Ok(flat[0]),
            _ => Ok(self.intern(LtlfNode::And(flat))),
        }
    }

    /// Disjunction; the mirror image of [`Context::make_and`]. The empty
    /// disjunction is `⊥`.
    pub fn make_or(&mut self, operands: &[Formula]) -> Result<Formula, SynthesisError> {
        self.check_all(operands)?;
        let mut flat = Vec::with_capacity(operands.len());
        for &op in operands {
            match self.node(op) {
                LtlfNode::Or(inner) => flat.extend(inner.iter().copied()),
                LtlfNode::False => {}
                LtlfNode::True => return Ok(self.tt),
                _ => flat.push(op),
            }
        }
        flat.sort_by(|&a, &b| self.handle_cmp(a, b));
        flat.dedup();
        match flat.len() {
            0 => Ok(self.ff),
            1 => Ok(flat[0]),
            _ => Ok(self.intern(LtlfNode::Or(flat))),
        }
    }

    /// Implication `left -> right`.
    pub fn make_implies(&mut self, left: Formula, right: Formula) -> Result<Formula, SynthesisError> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.intern(LtlfNode::Implies(left, right)))
    }

    /// Equivalence `left <-> right`.
    pub fn make_equivalent(
        &mut self,
        left: Formula,
        right: Formula,
    ) -> Result<Formula, SynthesisError> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.intern(LtlfNode::Equivalent(left, right)))
    }

    /// Exclusive or `left ^ right`.
    pub fn make_xor(&mut self, left: Formula, right: Formula) -> Result<Formula, SynthesisError> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.intern(LtlfNode::Xor(left, right)))
    }

    /// Strong next `X operand`: a next step exists and satisfies the operand.
    pub fn make_next(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        Ok(self.intern(LtlfNode::Next(operand)))
    }

    /// Weak next `WX operand`: if a next step exists, it satisfies the
    /// operand.
    pub fn make_weak_next(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        Ok(self.intern(LtlfNode::WeakNext(operand)))
    }

    /// Eventually `F operand`.
    pub fn make_eventually(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        Ok(self.intern(LtlfNode::Eventually(operand)))
    }

    /// Always `G operand`.
    pub fn make_always(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        Ok(self.intern(LtlfNode::Always(operand)))
    }

    /// Until `left U right`.
    pub fn make_until(&mut self, left: Formula, right: Formula) -> Result<Formula, SynthesisError> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.intern(LtlfNode::Until(left, right)))
    }

    /// Release `left R right`.
    pub fn make_release(&mut self, left: Formula, right: Formula) -> Result<Formula, SynthesisError> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.intern(LtlfNode::Release(left, right)))
    }

    /// Tagged next-step residual; created by the next-normal-form rewriter.
    pub fn make_tagged_next(&mut self, operand: Formula) -> Result<Formula, SynthesisError> {
        self.check(operand)?;
        Ok(self.intern(LtlfNode::TaggedNext(operand)))
    }

    // Atom table

    /// Name of an interned atom.
    ///
    /// # Panics
    ///
    /// Panics if the id was not allocated by this context.
    pub fn atom_name(&self, atom: AtomId) -> &str {
        &self.atom_names[atom.to_index()]
    }

    /// Id of an atom, if the name was interned before.
    pub fn atom_id(&self, name: &str) -> Option<AtomId> {
        self.atom_table.get(name).copied()
    }

    /// Number of interned atoms, the reserved end atom included.
    pub fn atom_count(&self) -> usize {
        self.atom_names.len()
    }

    fn intern_atom_name(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.atom_table.get(name) {
            return id;
        }
        let id = AtomId(self.atom_names.len() as u32);
        self.atom_names.push(name.to_string());
        self.atom_table.insert(name.to_string(), id);
        id
    }

    // Type checking methods

    /// Check if this formula is the constant `⊤`.
    pub fn is_true(&self, f: Formula) -> bool {
        f == self.tt
    }

    /// Check if this formula is the constant `⊥`.
    pub fn is_false(&self, f: Formula) -> bool {
        f == self.ff
    }

    /// Check if this formula is an atom.
    pub fn is_atom(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::Atom(_))
    }

    /// Check if this formula is a negated atom.
    pub fn is_prop_not(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::PropNot(_))
    }

    /// Check if this formula is a (non-propositional) negation.
    pub fn is_not(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::Not(_))
    }

    /// Check if this formula is a conjunction.
    pub fn is_and(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::And(_))
    }

    /// Check if this formula is a disjunction.
    pub fn is_or(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::Or(_))
    }

    /// Check if this formula is an `Eventually`.
    pub fn is_eventually(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::Eventually(_))
    }

    /// Check if this formula is an `Always`.
    pub fn is_always(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::Always(_))
    }

    /// Check if this formula is a tagged next-step residual.
    pub fn is_tagged_next(&self, f: Formula) -> bool {
        matches!(self.node(f), LtlfNode::TaggedNext(_))
    }

    // Access methods

    /// Get the atom id if this formula is an atom.
    pub fn as_atom(&self, f: Formula) -> Option<AtomId> {
        match self.node(f) {
            LtlfNode::Atom(id) => Some(*id),
            _ => None,
        }
    }

    /// Get the negated atom handle if this formula is a `PropNot`.
    pub fn as_prop_not(&self, f: Formula) -> Option<Formula> {
        match self.node(f) {
            LtlfNode::PropNot(atom) => Some(*atom),
            _ => None,
        }
    }

    /// Get the operand if this formula is a negation.
    pub fn as_not(&self, f: Formula) -> Option<Formula> {
        match self.node(f) {
            LtlfNode::Not(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Get the operands if this formula is a conjunction.
    pub fn as_and(&self, f: Formula) -> Option<&[Formula]> {
        match self.node(f) {
            LtlfNode::And(args) => Some(args),
            _ => None,
        }
    }

    /// Get the operands if this formula is a disjunction.
    pub fn as_or(&self, f: Formula) -> Option<&[Formula]> {
        match self.node(f) {
            LtlfNode::Or(args) => Some(args),
            _ => None,
        }
    }

    /// Get the operand if this formula is a tagged next-step residual.
    pub fn as_tagged_next(&self, f: Formula) -> Option<Formula> {
        match self.node(f) {
            LtlfNode::TaggedNext(inner) => Some(*inner),
            _ => None,
        }
    }

    // Traversal helpers

    /// Collect all atoms referenced by a formula, in id order.
    pub fn collect_atoms(&self, formula: Formula) -> BTreeSet<AtomId> {
        let mut atoms = BTreeSet::new();
        let mut stack = vec![formula];
        let mut seen = BTreeSet::new();
        while let Some(f) = stack.pop() {
            if !seen.insert(f.index) {
                continue;
            }
            match self.node(f) {
                LtlfNode::True | LtlfNode::False => {}
                LtlfNode::Atom(id) => {
                    atoms.insert(*id);
                }
                LtlfNode::PropNot(inner)
                | LtlfNode::Not(inner)
                | LtlfNode::Next(inner)
                | LtlfNode::WeakNext(inner)
                | LtlfNode::Eventually(inner)
                | LtlfNode::Always(inner)
                | LtlfNode::TaggedNext(inner) => stack.push(*inner),
                LtlfNode::And(args) | LtlfNode::Or(args) => stack.extend(args.iter().copied()),
                LtlfNode::Implies(l, r)
                | LtlfNode::Equivalent(l, r)
                | LtlfNode::Xor(l, r)
                | LtlfNode::Until(l, r)
                | LtlfNode::Release(l, r) => {
                    stack.push(*l);
                    stack.push(*r);
                }
            }
        }
        atoms
    }

    /// Render the formula in the infix surface syntax.
    pub fn display(&self, formula: Formula) -> String {
        crate::ltlf_writer::write_ltlf(self, formula)
    }

    // Canonical order

    /// Total order on handles of this context: type-tag rank, then cached
    /// hash, then child-wise structural comparison. `And`/`Or` arguments are
    /// kept sorted by this order.
    ///
    /// # Panics
    ///
    /// Panics if a handle belongs to a different context.
    pub fn handle_cmp(&self, a: Formula, b: Formula) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let rank_cmp = self.node(a).rank().cmp(&self.node(b).rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }
        let hash_cmp = self.hash_of(a).cmp(&self.hash_of(b));
        if hash_cmp != Ordering::Equal {
            return hash_cmp;
        }
        self.structural_cmp(a, b)
    }

    fn structural_cmp(&self, a: Formula, b: Formula) -> Ordering {
        match (self.node(a), self.node(b)) {
            (LtlfNode::Atom(x), LtlfNode::Atom(y)) => x.cmp(y),
            (LtlfNode::PropNot(x), LtlfNode::PropNot(y))
            | (LtlfNode::Not(x), LtlfNode::Not(y))
            | (LtlfNode::Next(x), LtlfNode::Next(y))
            | (LtlfNode::WeakNext(x), LtlfNode::WeakNext(y))
            | (LtlfNode::Eventually(x), LtlfNode::Eventually(y))
            | (LtlfNode::Always(x), LtlfNode::Always(y))
            | (LtlfNode::TaggedNext(x), LtlfNode::TaggedNext(y)) => self.handle_cmp(*x, *y),
            (LtlfNode::And(xs), LtlfNode::And(ys)) | (LtlfNode::Or(xs), LtlfNode::Or(ys)) => {
                let len_cmp = xs.len().cmp(&ys.len());
                if len_cmp != Ordering::Equal {
                    return len_cmp;
                }
                for (&x, &y) in xs.iter().zip(ys.iter()) {
                    let child_cmp = self.handle_cmp(x, y);
                    if child_cmp != Ordering::Equal {
                        return child_cmp;
                    }
                }
                Ordering::Equal
            }
            (LtlfNode::Implies(xl, xr), LtlfNode::Implies(yl, yr))
            | (LtlfNode::Equivalent(xl, xr), LtlfNode::Equivalent(yl, yr))
            | (LtlfNode::Xor(xl, xr), LtlfNode::Xor(yl, yr))
            | (LtlfNode::Until(xl, xr), LtlfNode::Until(yl, yr))
            | (LtlfNode::Release(xl, xr), LtlfNode::Release(yl, yr)) => self
                .handle_cmp(*xl, *yl)
                .then_with(|| self.handle_cmp(*xr, *yr)),
            // Equal ranks imply equal variants; constants are unique handles.
            _ => Ordering::Equal,
        }
    }

    // Interning

    fn intern(&mut self, kind: LtlfNode) -> Formula {
        if let Some(&index) = self.table.get(&kind) {
            return Formula { context: self.id, index };
        }
        let hash = self.structural_hash(&kind);
        let index = self.nodes.len() as u32;
        self.table.insert(kind.clone(), index);
        self.nodes.push(Node { kind, hash });
        Formula { context: self.id, index }
    }

    fn structural_hash(&self, kind: &LtlfNode) -> u64 {
        let mut hasher = FxHasher::default();
        kind.rank().hash(&mut hasher);
        match kind {
            LtlfNode::True | LtlfNode::False => {}
            LtlfNode::Atom(id) => id.0.hash(&mut hasher),
            LtlfNode::PropNot(f)
            | LtlfNode::Not(f)
            | LtlfNode::Next(f)
            | LtlfNode::WeakNext(f)
            | LtlfNode::Eventually(f)
            | LtlfNode::Always(f)
            | LtlfNode::TaggedNext(f) => self.hash_of(*f).hash(&mut hasher),
            LtlfNode::And(args) | LtlfNode::Or(args) => {
                args.len().hash(&mut hasher);
                for &arg in args {
                    self.hash_of(arg).hash(&mut hasher);
                }
            }
            LtlfNode::Implies(l, r)
            | LtlfNode::Equivalent(l, r)
            | LtlfNode::Xor(l, r)
            | LtlfNode::Until(l, r)
            | LtlfNode::Release(l, r) => {
                self.hash_of(*l).hash(&mut hasher);
                self.hash_of(*r).hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_unique() {
        let ctx = Context::new();
        assert_eq!(ctx.make_true(), ctx.make_true());
        assert_eq!(ctx.make_false(), ctx.make_false());
        assert_ne!(ctx.make_true(), ctx.make_false());
        assert!(ctx.is_true(ctx.make_true()));
        assert!(ctx.is_false(ctx.make_false()));
    }

    #[test]
    fn test_atom_interning() {
        let mut ctx = Context::new();
        let a1 = ctx.make_atom("a").unwrap();
        let a2 = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        let id = ctx.as_atom(a1).unwrap();
        assert_eq!(ctx.atom_name(id), "a");
        // Id 0 is the reserved end atom; user atoms are dense from 1.
        assert_eq!(id, AtomId(1));
        assert_eq!(ctx.as_atom(b), Some(AtomId(2)));
    }

    #[test]
    fn test_invalid_atom_names() {
        let mut ctx = Context::new();
        assert!(ctx.make_atom("").is_err());
        assert!(ctx.make_atom("1a").is_err());
        assert!(ctx.make_atom("a b").is_err());
        assert!(ctx.make_atom("end!").is_err());
        assert!(ctx.make_atom("_ok_1").is_ok());
    }

    #[test]
    fn test_hash_consing_across_construction_orders() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let c = ctx.make_atom("c").unwrap();

        // And(And(a, b), c) flattens to the same handle as And(c, b, a).
        let ab = ctx.make_and(&[a, b]).unwrap();
        let left = ctx.make_and(&[ab, c]).unwrap();
        let right = ctx.make_and(&[c, b, a]).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn test_and_or_absorption() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let tt = ctx.make_true();
        let ff = ctx.make_false();

        assert_eq!(ctx.make_and(&[a, ff]).unwrap(), ff);
        assert_eq!(ctx.make_and(&[a, tt]).unwrap(), a);
        assert_eq!(ctx.make_or(&[a, tt]).unwrap(), tt);
        assert_eq!(ctx.make_or(&[a, ff]).unwrap(), a);
        assert_eq!(ctx.make_and(&[]).unwrap(), tt);
        assert_eq!(ctx.make_or(&[]).unwrap(), ff);
    }

    #[test]
    fn test_idempotent_normalization() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();

        assert_eq!(ctx.make_and(&[a]).unwrap(), a);
        assert_eq!(ctx.make_or(&[a, a]).unwrap(), a);
        let ab = ctx.make_and(&[a, b]).unwrap();
        let aab = ctx.make_and(&[a, b, a]).unwrap();
        assert_eq!(ab, aab);
    }

    #[test]
    fn test_double_negation() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let not_a = ctx.make_not(a).unwrap();
        assert!(ctx.is_prop_not(not_a));
        assert_eq!(ctx.as_prop_not(not_a), Some(a));
        assert_eq!(ctx.make_not(not_a).unwrap(), a);

        let b = ctx.make_atom("b").unwrap();
        let ab = ctx.make_and(&[a, b]).unwrap();
        let not_ab = ctx.make_not(ab).unwrap();
        assert!(ctx.is_not(not_ab));
        assert_eq!(ctx.make_not(not_ab).unwrap(), ab);
    }

    #[test]
    fn test_negated_constants_fold() {
        let mut ctx = Context::new();
        let tt = ctx.make_true();
        let ff = ctx.make_false();
        assert_eq!(ctx.make_not(tt).unwrap(), ff);
        assert_eq!(ctx.make_not(ff).unwrap(), tt);
    }

    #[test]
    fn test_prop_not_requires_atom() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let ab = ctx.make_and(&[a, b]).unwrap();
        let result = ctx.make_prop_not(ab);
        assert!(matches!(result, Err(SynthesisError::InvalidArgument(_))));
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let mut ctx1 = Context::new();
        let mut ctx2 = Context::new();
        let a = ctx1.make_atom("a").unwrap();
        let result = ctx2.make_next(a);
        assert!(matches!(result, Err(SynthesisError::InvalidArgument(_))));
        let result = ctx2.make_and(&[a]);
        assert!(matches!(result, Err(SynthesisError::InvalidArgument(_))));
    }

    #[test]
    fn test_temporal_interning() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let u1 = ctx.make_until(a, b).unwrap();
        let u2 = ctx.make_until(a, b).unwrap();
        let u3 = ctx.make_until(b, a).unwrap();
        assert_eq!(u1, u2);
        assert_ne!(u1, u3);
    }

    #[test]
    fn test_end_atom_is_reserved() {
        let mut ctx = Context::new();
        let end = ctx.end_atom();
        assert!(ctx.is_atom(end));
        assert_eq!(ctx.as_atom(end), Some(AtomId(0)));
        // The reserved name is not reachable through `make_atom`.
        assert!(ctx.make_atom(END_NAME).is_err());
        let a = ctx.make_atom("a").unwrap();
        assert_ne!(end, a);
    }

    #[test]
    fn test_collect_atoms() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let not_b = ctx.make_not(b).unwrap();
        let u = ctx.make_until(a, not_b).unwrap();
        let f = ctx.make_eventually(u).unwrap();
        let atoms = ctx.collect_atoms(f);
        let names: Vec<&str> = atoms.iter().map(|&id| ctx.atom_name(id)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_canonical_order_is_total() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let ga = ctx.make_always(a).unwrap();
        let fb = ctx.make_eventually(b).unwrap();

        assert_eq!(ctx.handle_cmp(a, a), Ordering::Equal);
        let ab = ctx.handle_cmp(a, b);
        let ba = ctx.handle_cmp(b, a);
        assert_eq!(ab, ba.reverse());
        // Different ranks order by rank: Eventually (12) before Always (13).
        assert_eq!(ctx.handle_cmp(fb, ga), Ordering::Less);
    }
}
