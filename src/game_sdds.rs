use crate::context::Context;
use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula, LtlfNode};
use rsdd::builder::sdd::CompressionSddBuilder;
use rsdd::builder::BottomUpBuilder;
use rsdd::repr::{DDNNFPtr, SddPtr, VTree, VarLabel};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Maps every proposition of the one-step game to an SDD [`VarLabel`].
///
/// The allocation is computed once per synthesis run and is fixed for the
/// lifetime of the SDD manager: first the environment atoms, then the
/// controller atoms (both in partition order), then the end-of-trace
/// indicator, then one variable per potential next-step residual. Residuals
/// are drawn from the Fischer–Ladner closure of the initial formula: the
/// operands of `Next`/`WeakNext` plus every `Eventually`/`Always`/`Until`/
/// `Release` subformula, which bounds every `TaggedNext` argument the
/// unfolding can ever produce.
pub struct VarAllocation {
    atom_vars: BTreeMap<AtomId, VarLabel>,
    end_var: VarLabel,
    tags: Vec<(Formula, VarLabel)>,
    tag_index: FxHashMap<Formula, VarLabel>,
    labels: Vec<VarLabel>,
}

impl VarAllocation {
    /// Allocate SDD variables for a synthesis run rooted at `formula`.
    ///
    /// `inputs` and `outputs` are the partitioned atom ids; they must be
    /// disjoint and duplicate-free.
    pub fn new(
        ctx: &Context,
        formula: Formula,
        inputs: &[AtomId],
        outputs: &[AtomId],
    ) -> Result<Self, SynthesisError> {
        ctx.check(formula)?;

        let mut allocation = VarAllocation {
            atom_vars: BTreeMap::new(),
            end_var: VarLabel::new(0),
            tags: Vec::new(),
            tag_index: FxHashMap::default(),
            labels: Vec::new(),
        };

        for &atom in inputs.iter().chain(outputs.iter()) {
            let label = allocation.fresh_label();
            if allocation.atom_vars.insert(atom, label).is_some() {
                return Err(SynthesisError::InvalidArgument(format!(
                    "atom `{}` allocated twice",
                    ctx.atom_name(atom)
                )));
            }
        }

        allocation.end_var = allocation.fresh_label();
        let end_id = ctx
            .as_atom(ctx.end_atom())
            .expect("end indicator is an atom");
        allocation.atom_vars.insert(end_id, allocation.end_var);

        // Collect the potential next-step residuals in deterministic
        // traversal order.
        let mut seen = FxHashSet::default();
        let mut stack = vec![formula];
        while let Some(f) = stack.pop() {
            if !seen.insert(f) {
                continue;
            }
            match ctx.node(f) {
                LtlfNode::True | LtlfNode::False | LtlfNode::Atom(_) | LtlfNode::PropNot(_) => {}
                LtlfNode::Next(inner) | LtlfNode::WeakNext(inner) => {
                    allocation.add_tag(*inner);
                    stack.push(*inner);
                }
                LtlfNode::Eventually(inner) | LtlfNode::Always(inner) => {
                    allocation.add_tag(f);
                    stack.push(*inner);
                }
                LtlfNode::Until(left, right) | LtlfNode::Release(left, right) => {
                    allocation.add_tag(f);
                    stack.push(*right);
                    stack.push(*left);
                }
                LtlfNode::And(args) | LtlfNode::Or(args) => {
                    stack.extend(args.iter().rev().copied())
                }
                LtlfNode::Not(inner) | LtlfNode::TaggedNext(inner) => stack.push(*inner),
                LtlfNode::Implies(left, right)
                | LtlfNode::Equivalent(left, right)
                | LtlfNode::Xor(left, right) => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        Ok(allocation)
    }

    fn fresh_label(&mut self) -> VarLabel {
        let label = VarLabel::new(self.labels.len() as u64);
        self.labels.push(label);
        label
    }

    fn add_tag(&mut self, residual: Formula) {
        if !self.tag_index.contains_key(&residual) {
            let label = self.fresh_label();
            self.tags.push((residual, label));
            self.tag_index.insert(residual, label);
        }
    }

    /// Get the SDD variable of an atom (the end indicator included).
    pub fn atom_var(&self, atom: AtomId) -> Option<VarLabel> {
        self.atom_vars.get(&atom).copied()
    }

    /// The SDD variable of the end-of-trace indicator.
    pub fn end_var(&self) -> VarLabel {
        self.end_var
    }

    /// Get the SDD variable standing for "the next-step residual is
    /// `residual`".
    pub fn tag_var(&self, residual: Formula) -> Option<VarLabel> {
        self.tag_index.get(&residual).copied()
    }

    /// Residual formulas with their variables, in allocation order.
    pub fn tags(&self) -> &[(Formula, VarLabel)] {
        &self.tags
    }

    /// All allocated variables, in allocation order.
    pub fn labels(&self) -> &[VarLabel] {
        &self.labels
    }

    /// Total number of allocated variables.
    pub fn var_count(&self) -> usize {
        self.labels.len()
    }

    /// Right-linear vtree over the allocation; fixed for the whole search.
    pub fn vtree(&self) -> VTree {
        VTree::right_linear(&self.labels)
    }
}

/// Compiles next-normal-form formulas into SDDs and exposes the symbolic
/// operations the forward search needs: conditioning on a literal,
/// existential projection, satisfiability and model enumeration.
///
/// The bridge is referentially transparent given the allocation: compiling
/// the same formula twice yields equivalent SDDs.
pub struct GameSdds<'a> {
    builder: &'a CompressionSddBuilder<'a>,
    vars: &'a VarAllocation,
}

impl<'a> GameSdds<'a> {
    pub fn new(builder: &'a CompressionSddBuilder<'a>, vars: &'a VarAllocation) -> Self {
        GameSdds { builder, vars }
    }

    /// The variable allocation backing this bridge.
    pub fn vars(&self) -> &VarAllocation {
        self.vars
    }

    /// Compile a next-normal-form formula into an SDD. `And`/`Or` map to
    /// conjoin/disjoin, atoms and `TaggedNext` leaves map to literals of
    /// their allocated variables.
    pub fn compile(&self, ctx: &Context, formula: Formula) -> Result<SddPtr<'a>, SynthesisError> {
        match ctx.node(formula) {
            LtlfNode::True => Ok(self.builder.true_ptr()),
            LtlfNode::False => Ok(self.builder.false_ptr()),
            LtlfNode::Atom(id) => {
                let label = self.atom_label(ctx, *id)?;
                Ok(self.builder.var(label, true))
            }
            LtlfNode::PropNot(atom) => {
                let id = ctx.as_atom(*atom).ok_or_else(|| {
                    SynthesisError::Internal("PropNot over a non-atom node".to_string())
                })?;
                let label = self.atom_label(ctx, id)?;
                Ok(self.builder.var(label, false))
            }
            LtlfNode::And(operands) => {
                let mut result = self.builder.true_ptr();
                for &op in operands {
                    let compiled = self.compile(ctx, op)?;
                    result = self.builder.and(result, compiled);
                }
                Ok(result)
            }
            LtlfNode::Or(operands) => {
                let mut result = self.builder.false_ptr();
                for &op in operands {
                    let compiled = self.compile(ctx, op)?;
                    result = self.builder.or(result, compiled);
                }
                Ok(result)
            }
            LtlfNode::TaggedNext(inner) => {
                let label = self.tag_label(ctx, *inner)?;
                Ok(self.builder.var(label, true))
            }
            other => Err(SynthesisError::InvalidArgument(format!(
                "cannot compile {} node: not in next-normal form",
                other.describe()
            ))),
        }
    }

    fn atom_label(&self, ctx: &Context, atom: AtomId) -> Result<VarLabel, SynthesisError> {
        self.vars.atom_var(atom).ok_or_else(|| {
            SynthesisError::Internal(format!(
                "no SDD variable allocated for atom `{}`",
                ctx.atom_name(atom)
            ))
        })
    }

    fn tag_label(&self, ctx: &Context, residual: Formula) -> Result<VarLabel, SynthesisError> {
        self.vars.tag_var(residual).ok_or_else(|| {
            SynthesisError::Internal(format!(
                "no SDD variable allocated for residual `{}`",
                ctx.display(residual)
            ))
        })
    }

    /// Condition the SDD on a single literal.
    pub fn restrict(&self, sdd: SddPtr<'a>, var: VarLabel, value: bool) -> SddPtr<'a> {
        self.builder.condition(sdd, var, value)
    }

    /// Condition the SDD on the same value of every listed variable.
    pub fn restrict_all(&self, sdd: SddPtr<'a>, vars: &[VarLabel], value: bool) -> SddPtr<'a> {
        let mut result = sdd;
        for &var in vars {
            result = self.builder.condition(result, var, value);
        }
        result
    }

    /// Existentially project the listed variables out of the SDD.
    pub fn exists(&self, sdd: SddPtr<'a>, vars: &[VarLabel]) -> SddPtr<'a> {
        let mut result = sdd;
        for &var in vars {
            result = self.builder.exists(result, var);
        }
        result
    }

    /// Check satisfiability.
    pub fn satisfiable(&self, sdd: SddPtr<'a>) -> bool {
        !sdd.is_false()
    }

    /// Enumerate all total assignments over `over` under which the SDD is
    /// satisfiable. Unsatisfiable branches are pruned; within one variable
    /// the `false` branch is explored first, so the order is deterministic.
    pub fn models(&self, sdd: SddPtr<'a>, over: &[VarLabel]) -> Vec<Vec<(VarLabel, bool)>> {
        let mut result = Vec::new();
        let mut current = Vec::with_capacity(over.len());
        self.models_recursive(sdd, over, &mut current, &mut result);
        result
    }

    fn models_recursive(
        &self,
        sdd: SddPtr<'a>,
        over: &[VarLabel],
        current: &mut Vec<(VarLabel, bool)>,
        result: &mut Vec<Vec<(VarLabel, bool)>>,
    ) {
        if sdd.is_false() {
            return;
        }
        match over.split_first() {
            None => result.push(current.clone()),
            Some((&var, rest)) => {
                for value in [false, true] {
                    current.push((var, value));
                    self.models_recursive(self.restrict(sdd, var, value), rest, current, result);
                    current.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::ToNnf;
    use crate::xnf::Xnf;

    fn two_atoms(ctx: &mut Context) -> (Formula, Formula, AtomId, AtomId) {
        let x = ctx.make_atom("x").unwrap();
        let y = ctx.make_atom("y").unwrap();
        let x_id = ctx.as_atom(x).unwrap();
        let y_id = ctx.as_atom(y).unwrap();
        (x, y, x_id, y_id)
    }

    #[test]
    fn test_compile_constants() {
        let mut ctx = Context::new();
        let (_, _, x_id, y_id) = two_atoms(&mut ctx);
        let tt = ctx.make_true();
        let vars = VarAllocation::new(&ctx, tt, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        assert!(sdds.compile(&ctx, ctx.make_true()).unwrap().is_true());
        assert!(sdds.compile(&ctx, ctx.make_false()).unwrap().is_false());
    }

    #[test]
    fn test_compile_boolean_combination() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let ny = ctx.make_not(y).unwrap();
        let f = ctx.make_or(&[x, ny]).unwrap();

        let vars = VarAllocation::new(&ctx, f, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        let sdd = sdds.compile(&ctx, f).unwrap();
        let x_var = vars.atom_var(x_id).unwrap();
        let y_var = vars.atom_var(y_id).unwrap();

        // x = 1 satisfies the disjunction outright.
        assert!(sdds.restrict(sdd, x_var, true).is_true());
        // x = 0, y = 1 falsifies both disjuncts.
        let falsified = sdds.restrict(sdds.restrict(sdd, x_var, false), y_var, true);
        assert!(falsified.is_false());
    }

    #[test]
    fn test_compile_rejects_temporal_nodes() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let u = ctx.make_until(x, y).unwrap();

        let vars = VarAllocation::new(&ctx, u, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        assert!(matches!(
            sdds.compile(&ctx, u),
            Err(SynthesisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_allocation_covers_closure() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let fy = ctx.make_eventually(y).unwrap();
        let imp = ctx.make_implies(x, fy).unwrap();
        let g = ctx.make_always(imp).unwrap();
        let nnf = ToNnf::rewrite(&mut ctx, g).unwrap();

        let vars = VarAllocation::new(&ctx, nnf, &[x_id], &[y_id]).unwrap();
        // Two atoms, the end indicator, and two residuals: G (...) and F y.
        assert_eq!(vars.var_count(), 5);
        assert_eq!(vars.tags().len(), 2);
        assert!(vars.tag_var(nnf).is_some());
        assert!(vars.tag_var(fy).is_some());
    }

    #[test]
    fn test_compiled_unfolding_uses_allocated_tags() {
        let mut ctx = Context::new();
        let (_, y, x_id, y_id) = two_atoms(&mut ctx);
        let fy = ctx.make_eventually(y).unwrap();

        let vars = VarAllocation::new(&ctx, fy, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        let step = Xnf::rewrite(&mut ctx, fy).unwrap();
        let sdd = sdds.compile(&ctx, step).unwrap();

        // With y = 0 the unfolding forces the residual tag.
        let y_var = vars.atom_var(y_id).unwrap();
        let tag_var = vars.tag_var(fy).unwrap();
        let postponed = sdds.restrict(sdd, y_var, false);
        assert!(sdds.restrict(postponed, tag_var, false).is_false());
        assert!(sdds.restrict(postponed, tag_var, true).is_true());
    }

    #[test]
    fn test_models_enumeration_order() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let f = ctx.make_or(&[x, y]).unwrap();

        let vars = VarAllocation::new(&ctx, f, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        let sdd = sdds.compile(&ctx, f).unwrap();
        let x_var = vars.atom_var(x_id).unwrap();
        let y_var = vars.atom_var(y_id).unwrap();
        let models = sdds.models(sdd, &[x_var, y_var]);

        assert_eq!(
            models,
            vec![
                vec![(x_var, false), (y_var, true)],
                vec![(x_var, true), (y_var, false)],
                vec![(x_var, true), (y_var, true)],
            ]
        );
    }

    #[test]
    fn test_exists_projects_variables() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let f = ctx.make_and(&[x, y]).unwrap();

        let vars = VarAllocation::new(&ctx, f, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        let sdd = sdds.compile(&ctx, f).unwrap();
        let x_var = vars.atom_var(x_id).unwrap();
        let y_var = vars.atom_var(y_id).unwrap();

        // ∃x. (x ∧ y) = y
        let projected = sdds.exists(sdd, &[x_var]);
        assert!(sdds.restrict(projected, y_var, true).is_true());
        assert!(sdds.restrict(projected, y_var, false).is_false());

        // Projecting everything out of a satisfiable SDD yields ⊤.
        assert!(sdds.exists(sdd, &[x_var, y_var]).is_true());
    }

    #[test]
    fn test_restrict_all() {
        let mut ctx = Context::new();
        let (x, y, x_id, y_id) = two_atoms(&mut ctx);
        let ny = ctx.make_not(y).unwrap();
        let f = ctx.make_and(&[x, ny]).unwrap();

        let vars = VarAllocation::new(&ctx, f, &[x_id], &[y_id]).unwrap();
        let builder = CompressionSddBuilder::new(vars.vtree());
        let sdds = GameSdds::new(&builder, &vars);

        let sdd = sdds.compile(&ctx, f).unwrap();
        let x_var = vars.atom_var(x_id).unwrap();
        let y_var = vars.atom_var(y_id).unwrap();

        assert!(sdds.restrict_all(sdd, &[x_var, y_var], false).is_false());
        let partial = sdds.restrict_all(sdd, &[y_var], false);
        assert!(sdds.restrict(partial, x_var, true).is_true());
    }
}
