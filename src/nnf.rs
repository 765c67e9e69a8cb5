use crate::context::Context;
use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula, LtlfNode};
use crate::visitor::{accept, Visitor};
use rustc_hash::FxHashMap;

/// Rewrites a formula into negation normal form: negations appear only on
/// atoms (as `PropNot`), and `Implies`/`Equivalent`/`Xor` are eliminated.
/// Temporal operators dualize under negation: `Next`/`WeakNext`,
/// `Eventually`/`Always`, `Until`/`Release`.
///
/// The rewriter is functional and caches per handle (one cache per
/// polarity), so shared subformulas are transformed once.
pub struct ToNnf {
    positive: FxHashMap<Formula, Formula>,
    negative: FxHashMap<Formula, Formula>,
}

impl Default for ToNnf {
    fn default() -> Self {
        ToNnf::new()
    }
}

impl ToNnf {
    pub fn new() -> Self {
        ToNnf {
            positive: FxHashMap::default(),
            negative: FxHashMap::default(),
        }
    }

    /// Rewrite `formula` into negation normal form with a fresh cache.
    pub fn rewrite(ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        ctx.check(formula)?;
        ToNnf::new().apply(ctx, formula)
    }

    /// Rewrite one formula, reusing this visitor's caches.
    pub fn apply(&mut self, ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        if let Some(&cached) = self.positive.get(&formula) {
            return Ok(cached);
        }
        let result = accept(ctx, formula, self)?;
        self.positive.insert(formula, result);
        Ok(result)
    }

    /// Rewrite the negation of one formula, pushing the negation inwards.
    fn negated(&mut self, ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        if let Some(&cached) = self.negative.get(&formula) {
            return Ok(cached);
        }
        let result = match ctx.node(formula).clone() {
            LtlfNode::True => ctx.make_false(),
            LtlfNode::False => ctx.make_true(),
            LtlfNode::Atom(_) => ctx.make_prop_not(formula)?,
            LtlfNode::PropNot(atom) => atom,
            LtlfNode::Not(operand) => self.apply(ctx, operand)?,
            LtlfNode::And(operands) => {
                let negs = self.negated_all(ctx, &operands)?;
                ctx.make_or(&negs)?
            }
            LtlfNode::Or(operands) => {
                let negs = self.negated_all(ctx, &operands)?;
                ctx.make_and(&negs)?
            }
            LtlfNode::Implies(left, right) => {
                // ¬(l -> r) = l ∧ ¬r
                let l = self.apply(ctx, left)?;
                let r = self.negated(ctx, right)?;
                ctx.make_and(&[l, r])?
            }
            LtlfNode::Equivalent(left, right) => {
                // ¬(l <-> r) = (l ∧ ¬r) ∨ (¬l ∧ r)
                let pl = self.apply(ctx, left)?;
                let nl = self.negated(ctx, left)?;
                let pr = self.apply(ctx, right)?;
                let nr = self.negated(ctx, right)?;
                let one = ctx.make_and(&[pl, nr])?;
                let two = ctx.make_and(&[nl, pr])?;
                ctx.make_or(&[one, two])?
            }
            LtlfNode::Xor(left, right) => {
                // ¬(l ^ r) = (l ∧ r) ∨ (¬l ∧ ¬r)
                let pl = self.apply(ctx, left)?;
                let nl = self.negated(ctx, left)?;
                let pr = self.apply(ctx, right)?;
                let nr = self.negated(ctx, right)?;
                let one = ctx.make_and(&[pl, pr])?;
                let two = ctx.make_and(&[nl, nr])?;
                ctx.make_or(&[one, two])?
            }
            LtlfNode::Next(operand) => {
                let n = self.negated(ctx, operand)?;
                ctx.make_weak_next(n)?
            }
            LtlfNode::WeakNext(operand) => {
                let n = self.negated(ctx, operand)?;
                ctx.make_next(n)?
            }
            LtlfNode::Eventually(operand) => {
                let n = self.negated(ctx, operand)?;
                ctx.make_always(n)?
            }
            LtlfNode::Always(operand) => {
                let n = self.negated(ctx, operand)?;
                ctx.make_eventually(n)?
            }
            LtlfNode::Until(left, right) => {
                let nl = self.negated(ctx, left)?;
                let nr = self.negated(ctx, right)?;
                ctx.make_release(nl, nr)?
            }
            LtlfNode::Release(left, right) => {
                let nl = self.negated(ctx, left)?;
                let nr = self.negated(ctx, right)?;
                ctx.make_until(nl, nr)?
            }
            LtlfNode::TaggedNext(_) => {
                return Err(SynthesisError::InvalidArgument(
                    "TaggedNext may only appear in next-normal form output".to_string(),
                ))
            }
        };
        self.negative.insert(formula, result);
        Ok(result)
    }

    fn negated_all(
        &mut self,
        ctx: &mut Context,
        operands: &[Formula],
    ) -> Result<Vec<Formula>, SynthesisError> {
        operands
            .iter()
            .map(|&op| self.negated(ctx, op))
            .collect()
    }

    fn apply_all(
        &mut self,
        ctx: &mut Context,
        operands: &[Formula],
    ) -> Result<Vec<Formula>, SynthesisError> {
        operands.iter().map(|&op| self.apply(ctx, op)).collect()
    }
}

impl Visitor for ToNnf {
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

    fn visit_not(&mut self, ctx: &mut Context, _formula: Formula, operand: Formula) -> Self::Output {
        self.negated(ctx, operand)
    }

    fn visit_and(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operands: &[Formula],
    ) -> Self::Output {
        let rewritten = self.apply_all(ctx, operands)?;
        ctx.make_and(&rewritten)
    }

    fn visit_or(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operands: &[Formula],
    ) -> Self::Output {
        let rewritten = self.apply_all(ctx, operands)?;
        ctx.make_or(&rewritten)
    }

    fn visit_implies(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        // l -> r = ¬l ∨ r
        let nl = self.negated(ctx, left)?;
        let pr = self.apply(ctx, right)?;
        ctx.make_or(&[nl, pr])
    }

    fn visit_equivalent(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        // l <-> r = (l ∧ r) ∨ (¬l ∧ ¬r)
        let pl = self.apply(ctx, left)?;
        let nl = self.negated(ctx, left)?;
        let pr = self.apply(ctx, right)?;
        let nr = self.negated(ctx, right)?;
        let both = ctx.make_and(&[pl, pr])?;
        let neither = ctx.make_and(&[nl, nr])?;
        ctx.make_or(&[both, neither])
    }

    fn visit_xor(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        // l ^ r = (l ∧ ¬r) ∨ (¬l ∧ r)
        let pl = self.apply(ctx, left)?;
        let nl = self.negated(ctx, left)?;
        let pr = self.apply(ctx, right)?;
        let nr = self.negated(ctx, right)?;
        let one = ctx.make_and(&[pl, nr])?;
        let two = ctx.make_and(&[nl, pr])?;
        ctx.make_or(&[one, two])
    }

    fn visit_next(&mut self, ctx: &mut Context, _formula: Formula, operand: Formula) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        ctx.make_next(inner)
    }

    fn visit_weak_next(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        ctx.make_weak_next(inner)
    }

    fn visit_eventually(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        ctx.make_eventually(inner)
    }

    fn visit_always(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        ctx.make_always(inner)
    }

    fn visit_until(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let l = self.apply(ctx, left)?;
        let r = self.apply(ctx, right)?;
        ctx.make_until(l, r)
    }

    fn visit_release(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let l = self.apply(ctx, left)?;
        let r = self.apply(ctx, right)?;
        ctx.make_release(l, r)
    }

    fn visit_tagged_next(
        &mut self,
        _ctx: &mut Context,
        _formula: Formula,
        _operand: Formula,
    ) -> Self::Output {
        Err(SynthesisError::InvalidArgument(
            "TaggedNext may only appear in next-normal form output".to_string(),
        ))
    }
}

/// Check that a formula is in negation normal form.
pub(crate) fn is_nnf(ctx: &Context, formula: Formula) -> bool {
    let mut stack = vec![formula];
    while let Some(f) = stack.pop() {
        match ctx.node(f) {
            LtlfNode::Not(_)
            | LtlfNode::Implies(_, _)
            | LtlfNode::Equivalent(_, _)
            | LtlfNode::Xor(_, _)
            | LtlfNode::TaggedNext(_) => return false,
            LtlfNode::True | LtlfNode::False | LtlfNode::Atom(_) | LtlfNode::PropNot(_) => {}
            LtlfNode::Next(inner)
            | LtlfNode::WeakNext(inner)
            | LtlfNode::Eventually(inner)
            | LtlfNode::Always(inner) => stack.push(*inner),
            LtlfNode::And(args) | LtlfNode::Or(args) => stack.extend(args.iter().copied()),
            LtlfNode::Until(l, r) | LtlfNode::Release(l, r) => {
                stack.push(*l);
                stack.push(*r);
            }
        }
    }
    true
}
