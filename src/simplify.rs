use crate::context::Context;
use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula};
use crate::visitor::{accept, Visitor};
use rustc_hash::FxHashMap;

/// Applies the algebraic identities not already captured by construction
/// normalization, bottom-up:
///
/// * `φ U ⊥ = ⊥`, `φ U ⊤ = ⊤`, `⊥ U φ = φ`, `⊤ U φ = F φ`
/// * `φ R ⊥ = ⊥`, `φ R ⊤ = ⊤`, `⊥ R φ = G φ`, `⊤ R φ = φ`
/// * `F F φ = F φ`, `G G φ = G φ`, constant folds for `F`/`G`
/// * `X ⊥ = ⊥`, `WX ⊤ = ⊤`
/// * constant folds for `Implies`/`Equivalent`/`Xor`
///
/// The rewriter preserves negation normal form.
pub struct Simplify {
    cache: FxHashMap<Formula, Formula>,
}

impl Default for Simplify {
    fn default() -> Self {
        Simplify::new()
    }
}

impl Simplify {
    pub fn new() -> Self {
        Simplify {
            cache: FxHashMap::default(),
        }
    }

    /// Simplify `formula` with a fresh cache.
    pub fn rewrite(ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        ctx.check(formula)?;
        Simplify::new().apply(ctx, formula)
    }

    /// Simplify one formula, reusing this visitor's cache.
    pub fn apply(&mut self, ctx: &mut Context, formula: Formula) -> Result<Formula, SynthesisError> {
        if let Some(&cached) = self.cache.get(&formula) {
            return Ok(cached);
        }
        let result = accept(ctx, formula, self)?;
        self.cache.insert(formula, result);
        Ok(result)
    }
}

impl Visitor for Simplify {
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
        let inner = self.apply(ctx, operand)?;
        ctx.make_not(inner)
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
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let l = self.apply(ctx, left)?;
        let r = self.apply(ctx, right)?;
        if ctx.is_false(l) || ctx.is_true(r) {
            return Ok(ctx.make_true());
        }
        if ctx.is_true(l) {
            return Ok(r);
        }
        if ctx.is_false(r) {
            return ctx.make_not(l);
        }
        ctx.make_implies(l, r)
    }

    fn visit_equivalent(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let l = self.apply(ctx, left)?;
        let r = self.apply(ctx, right)?;
        if ctx.is_true(l) {
            return Ok(r);
        }
        if ctx.is_true(r) {
            return Ok(l);
        }
        if ctx.is_false(l) {
            return ctx.make_not(r);
        }
        if ctx.is_false(r) {
            return ctx.make_not(l);
        }
        ctx.make_equivalent(l, r)
    }

    fn visit_xor(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        left: Formula,
        right: Formula,
    ) -> Self::Output {
        let l = self.apply(ctx, left)?;
        let r = self.apply(ctx, right)?;
        if ctx.is_false(l) {
            return Ok(r);
        }
        if ctx.is_false(r) {
            return Ok(l);
        }
        if ctx.is_true(l) {
            return ctx.make_not(r);
        }
        if ctx.is_true(r) {
            return ctx.make_not(l);
        }
        ctx.make_xor(l, r)
    }

    fn visit_next(&mut self, ctx: &mut Context, _formula: Formula, operand: Formula) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        // A next step satisfying ⊥ cannot exist.
        if ctx.is_false(inner) {
            return Ok(ctx.make_false());
        }
        ctx.make_next(inner)
    }

    fn visit_weak_next(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        // Vacuously true when the operand is ⊤; `WX ⊥` stays: it states that
        // the current step is the last one.
        if ctx.is_true(inner) {
            return Ok(ctx.make_true());
        }
        ctx.make_weak_next(inner)
    }

    fn visit_eventually(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        if ctx.is_true(inner) || ctx.is_false(inner) || ctx.is_eventually(inner) {
            return Ok(inner);
        }
        ctx.make_eventually(inner)
    }

    fn visit_always(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        if ctx.is_true(inner) || ctx.is_false(inner) || ctx.is_always(inner) {
            return Ok(inner);
        }
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
        if ctx.is_true(r) || ctx.is_false(r) {
            // φ U ⊤ holds immediately; φ U ⊥ can never discharge.
            return Ok(r);
        }
        if ctx.is_false(l) {
            // Nothing may precede the goal, so the goal must hold now.
            return Ok(r);
        }
        if ctx.is_true(l) {
            return ctx.make_eventually(r);
        }
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
        if ctx.is_true(r) || ctx.is_false(r) {
            return Ok(r);
        }
        if ctx.is_false(l) {
            // Never released: the invariant must hold forever.
            return ctx.make_always(r);
        }
        if ctx.is_true(l) {
            // Released at the first step.
            return Ok(r);
        }
        ctx.make_release(l, r)
    }

    fn visit_tagged_next(
        &mut self,
        ctx: &mut Context,
        _formula: Formula,
        operand: Formula,
    ) -> Self::Output {
        let inner = self.apply(ctx, operand)?;
        ctx.make_tagged_next(inner)
    }
}
