use crate::context::Context;
use crate::formula::{AtomId, Formula, LtlfNode};

/// Double-dispatch capability over the closed set of formula variants.
///
/// [`accept`] dispatches a formula to the entry matching its variant. Every
/// entry receives the dispatched handle itself (so leaves can be returned
/// unchanged and fixpoint operators can refer to themselves) together with
/// its unpacked children. Rewriting visitors are functional: they return a
/// fresh handle through their `Output`. The framework does not cache results
/// across visitors; caching is the visitor's job.
pub trait Visitor {
    type Output;

    fn visit_true(&mut self, ctx: &mut Context, formula: Formula) -> Self::Output;
    fn visit_false(&mut self, ctx: &mut Context, formula: Formula) -> Self::Output;
    fn visit_atom(&mut self, ctx: &mut Context, formula: Formula, atom: AtomId) -> Self::Output;
    fn visit_prop_not(&mut self, ctx: &mut Context, formula: Formula, atom: Formula)
        -> Self::Output;
    fn visit_not(&mut self, ctx: &mut Context, formula: Formula, operand: Formula) -> Self::Output;
    fn visit_and(&mut self, ctx: &mut Context, formula: Formula, operands: &[Formula])
        -> Self::Output;
    fn visit_or(&mut self, ctx: &mut Context, formula: Formula, operands: &[Formula])
        -> Self::Output;
    fn visit_implies(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output;
    fn visit_equivalent(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output;
    fn visit_xor(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output;
    fn visit_next(&mut self, ctx: &mut Context, formula: Formula, operand: Formula)
        -> Self::Output;
    fn visit_weak_next(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output;
    fn visit_eventually(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output;
    fn visit_always(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output;
    fn visit_until(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output;
    fn visit_release(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output;
    fn visit_tagged_next(
        &mut self,
        ctx: &mut Context,
        formula: Formula,
        operand: Formula,
    ) -> Self::Output;
}

/// Dispatch a formula to the visitor entry matching its variant.
///
/// # Panics
///
/// Panics if the handle belongs to a different context; public rewriter
/// entry points validate the handle first.
pub fn accept<V: Visitor>(ctx: &mut Context, formula: Formula, visitor: &mut V) -> V::Output {
    let node = ctx.node(formula).clone();
    match node {
        LtlfNode::True => visitor.visit_true(ctx, formula),
        LtlfNode::False => visitor.visit_false(ctx, formula),
        LtlfNode::Atom(atom) => visitor.visit_atom(ctx, formula, atom),
        LtlfNode::PropNot(atom) => visitor.visit_prop_not(ctx, formula, atom),
        LtlfNode::Not(operand) => visitor.visit_not(ctx, formula, operand),
        LtlfNode::And(operands) => visitor.visit_and(ctx, formula, &operands),
        LtlfNode::Or(operands) => visitor.visit_or(ctx, formula, &operands),
        LtlfNode::Implies(left, right) => visitor.visit_implies(ctx, formula, left, right),
        LtlfNode::Equivalent(left, right) => visitor.visit_equivalent(ctx, formula, left, right),
        LtlfNode::Xor(left, right) => visitor.visit_xor(ctx, formula, left, right),
        LtlfNode::Next(operand) => visitor.visit_next(ctx, formula, operand),
        LtlfNode::WeakNext(operand) => visitor.visit_weak_next(ctx, formula, operand),
        LtlfNode::Eventually(operand) => visitor.visit_eventually(ctx, formula, operand),
        LtlfNode::Always(operand) => visitor.visit_always(ctx, formula, operand),
        LtlfNode::Until(left, right) => visitor.visit_until(ctx, formula, left, right),
        LtlfNode::Release(left, right) => visitor.visit_release(ctx, formula, left, right),
        LtlfNode::TaggedNext(operand) => visitor.visit_tagged_next(ctx, formula, operand),
    }
}
