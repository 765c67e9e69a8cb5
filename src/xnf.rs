use crate::context::Context;
use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula};
use crate::visitor::{accept, Visitor};
use rustc_hash::FxHashMap;

fn not_in_nnf(what: &str) -> SynthesisError {
    SynthesisError::InvalidArgument(format!(
        "next-normal form requires negation normal form input; found {} node",
        what
    ))
}

/// Rewrites a formula in negation normal form into *next-normal form*: a
/// Boolean combination of atoms, negated atoms, constants and `TaggedNext`
/// leaves, where `TaggedNext` is the only temporal node. Each `TaggedNext ψ`
/// stands for "the next-step residual is ψ".
///
/// Unfolding rules (`end` is the context's reserved end-of-trace atom):
///
/// * `X φ` → `TaggedNext φ`
/// * `WX φ` → `end ∨ TaggedNext φ`
/// * `F φ` → `xnf(φ) ∨ TaggedNext (F φ)`
/// * `G φ` → `xnf(φ) ∧ (end ∨ TaggedNext (G φ))`
/// * `φ U ψ` → `xnf(ψ) ∨ (xnf(φ) ∧ TaggedNext (φ U ψ))`
/// * `φ R ψ` → `xnf(ψ) ∧ (xnf(φ) ∨ end ∨ TaggedNext (φ R ψ))`
///
/// Fixpoint operators refer to themselves through hash-consing, so the
/// unfolding introduces no structural cycle, and the set of distinct
/// `TaggedNext` arguments is bounded by the Fischer–Ladner closure of the
/// input. Results are memoized per handle for the lifetime of the visitor.
pub struct Xnf {
    cache: FxHashMap<Formula, Formula>,
}

impl Default for Xnf {
    fn default() -> Self {
        Xnf::new()
    }
}

impl Xnf {
    pub fn new() -> Self {
        Xnf {
            cache: FxHashMap::default(),
        }
    }

    /// Rewrite `formula` into next-normal form with a fresh cache.
    pub fn rewrite(ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        ctx.check(formula)?;
        Xnf::new().apply(ctx, formula)
    }

    /// Rewrite one formula, reusing this visitor's cache. The cache stays
    /// valid for the lifetime of the owning context, so one visitor can
    /// serve a whole forward search.
    pub fn apply(&mut self, ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        if let Some(&cached) = self.cache.get(&formula) {
            return Ok(cached);
        }
        let result = accept(ctx, formula, self)?;
        self.cache.insert(formula, result);
        Ok(result)
    }
}

impl Visitor for Xnf {
    type Output = Result<Formula, SynthesisError>;

    fn visit_true(&mut self, _ctx: &mut Context, formula: Formula) -> Self::Output {
        Ok(formula)
    }

    fn visit_false(&mut self, _ctx: &mut Context, formula: Formula) -> Self::Output {
        Ok(formula)
    }

    fn visit_atom(&mut self, _ctx: &mut Context, formula: Formula, _atom: AtomId) -> Self::Output {
        Ok(formula)
    }

    fn visit_prop_not(
        &mut self,
        _ctx: &mut Context,
        formula: Formula,
        _atom: Formula,
    ) -> Self::Output {
        Ok(formula)
    }

    fn visit_not(&mut self, _ctx: &mut Context, _formula: Formula, _operand: Formula) -> Self::Output {
        Err(not_in_nnf("Not"))
    }

    fn visit_and(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operands: &[Formula],
    ) -> Self::Output {
        let rewritten: Result<Vec<_>, _> = operands.iter().map(|&op| self.apply(ctx, op)).collect();
        ctx.make_and(&rewritten?)
    }

    fn visit_or(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operands: &[Formula],
    ) -> Self::Output {
        let rewritten: Result<Vec<_>, _> = operands.iter().map(|&op| self.apply(ctx, op)).collect();
        ctx.make_or(&rewritten?)
    }

    fn visit_implies(
        &mut self,
        _ctx: &mut Context,
        _formula: Formula,
        _left: Formula,
        _right: Formula,
    ) -> Self::Output {
        Err(not_in_nnf("Implies"))
    }

    fn visit_equivalent(
        &mut self,
        _ctx: &mut Context,
        _formula: Formula,
        _left: Formula,
        _right: Formula,
    ) -> Self::Output {
        Err(not_in_nnf("Equivalent"))
    }

    fn visit_xor(
        &mut self,
        _ctx: &mut Context,
        _formula: Formula,
        _left: Formula,
        _right: Formula,
    ) -> Self::Output {
        Err(not_in_nnf("Xor"))
    }

    fn visit_next(&mut self, ctx: &mut Context, _formula: Formula, operand: Formula) -> Self::Output {
        ctx.make_tagged_next(operand)
    }

    fn visit_weak_next(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let end = ctx.end_atom();
        let tagged = ctx.make_tagged_next(operand)?;
        ctx.make_or(&[end, tagged])
    }

    fn visit_eventually(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let now = self.apply(ctx, operand)?;
        let later = ctx.make_tagged_next(formula)?;
        ctx.make_or(&[now, later])
    }

    fn visit_always(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let now = self.apply(ctx, operand)?;
        let end = ctx.end_atom();
        let later = ctx.make_tagged_next(formula)?;
        let tail = ctx.make_or(&[end, later])?;
        ctx.make_and(&[now, tail])
    }

    fn visit_until(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let goal = self.apply(ctx, right)?;
        let hold = self.apply(ctx, left)?;
        let later = ctx.make_tagged_next(formula)?;
        let postponed = ctx.make_and(&[hold, later])?;
        ctx.make_or(&[goal, postponed])
    }

    fn visit_release(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let invariant = self.apply(ctx, right)?;
        let releaser = self.apply(ctx, left)?;
        let end = ctx.end_atom();
        let later = ctx.make_tagged_next(formula)?;
        let tail = ctx.make_or(&[releaser, end, later])?;
        ctx.make_and(&[invariant, tail])
    }

    fn visit_tagged_next(
        &mut self,
        _ctx: &mut Context,
        _formula: Formula,
        _operand: Formula,
    ) -> Self::Output {
        Err(not_in_nnf("TaggedNext"))
    }
}

/// Check that a formula is a Boolean combination whose only temporal nodes
/// are `TaggedNext` leaves.
pub(crate) fn is_xnf(ctx: &Context, formula: Formula) -> bool {
    use crate::formula::LtlfNode;
    let mut stack = vec![formula];
    while let Some(f) = stack.pop() {
        match ctx.node(f) {
            LtlfNode::True
            | LtlfNode::False
            | LtlfNode::Atom(_)
            | LtlfNode::PropNot(_)
            | LtlfNode::TaggedNext(_) => {}
            LtlfNode::And(args) | LtlfNode::Or(args) => stack.extend(args.iter().copied()),
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::ToNnf;

    #[test]
    fn test_propositional_formulas_are_fixed() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let nb = ctx.make_not(b).unwrap();
        let f = ctx.make_or(&[a, nb]).unwrap();
        assert_eq!(Xnf::rewrite(&mut ctx, f).unwrap(), f);
    }

    #[test]
    fn test_next_becomes_tagged() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let xa = ctx.make_next(a).unwrap();
        let expected = ctx.make_tagged_next(a).unwrap();
        assert_eq!(Xnf::rewrite(&mut ctx, xa).unwrap(), expected);
    }

    #[test]
    fn test_weak_next_admits_trace_end() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let wxa = ctx.make_weak_next(a).unwrap();
        let end = ctx.end_atom();
        let tagged = ctx.make_tagged_next(a).unwrap();
        let expected = ctx.make_or(&[end, tagged]).unwrap();
        assert_eq!(Xnf::rewrite(&mut ctx, wxa).unwrap(), expected);
    }

    #[test]
    fn test_until_unfolding() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let u = ctx.make_until(a, b).unwrap();

        let xnf = Xnf::rewrite(&mut ctx, u).unwrap();
        // The fixpoint refers to the until formula itself through the tag.
        let tag = ctx.make_tagged_next(u).unwrap();
        let postponed = ctx.make_and(&[a, tag]).unwrap();
        let expected = ctx.make_or(&[b, postponed]).unwrap();
        assert_eq!(xnf, expected);
    }

    #[test]
    fn test_always_unfolding() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let g = ctx.make_always(a).unwrap();

        let xnf = Xnf::rewrite(&mut ctx, g).unwrap();
        let end = ctx.end_atom();
        let tag = ctx.make_tagged_next(g).unwrap();
        let tail = ctx.make_or(&[end, tag]).unwrap();
        let expected = ctx.make_and(&[a, tail]).unwrap();
        assert_eq!(xnf, expected);
    }

    #[test]
    fn test_xnf_totality_over_nnf() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let fb = ctx.make_eventually(b).unwrap();
        let imp = ctx.make_implies(a, fb).unwrap();
        let g = ctx.make_always(imp).unwrap();
        let wx = ctx.make_weak_next(g).unwrap();
        let u = ctx.make_until(wx, b).unwrap();

        let nnf = ToNnf::rewrite(&mut ctx, u).unwrap();
        let xnf = Xnf::rewrite(&mut ctx, nnf).unwrap();
        assert!(is_xnf(&ctx, xnf));
    }

    #[test]
    fn test_non_nnf_input_is_rejected() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let imp = ctx.make_implies(a, b).unwrap();
        assert!(matches!(
            Xnf::rewrite(&mut ctx, imp),
            Err(SynthesisError::InvalidArgument(_))
        ));

        let ab = ctx.make_and(&[a, b]).unwrap();
        let not_ab = ctx.make_not(ab).unwrap();
        assert!(matches!(
            Xnf::rewrite(&mut ctx, not_ab),
            Err(SynthesisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_memoized_rewrite_is_stable() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let fa = ctx.make_eventually(a).unwrap();

        let mut visitor = Xnf::new();
        let first = visitor.apply(&mut ctx, fa).unwrap();
        let second = visitor.apply(&mut ctx, fa).unwrap();
        let fresh = Xnf::rewrite(&mut ctx, fa).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }
}
