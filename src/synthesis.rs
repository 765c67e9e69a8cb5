use crate::context::Context;
use crate::error::SynthesisError;
use crate::formula::{AtomId, Formula};
use crate::game_sdds::{GameSdds, VarAllocation};
use crate::nnf::ToNnf;
use crate::partition::Partition;
use crate::simplify::Simplify;
use crate::xnf::Xnf;
use cancel_this::is_cancelled;
use log::{debug, info};
use rsdd::builder::sdd::CompressionSddBuilder;
use rsdd::repr::{DDNNFPtr, SddPtr, VarLabel};
use rustc_hash::{FxHashMap, FxHashSet};

/// Decide realizability of an LTLf formula against a variable partition.
///
/// Returns `true` iff a controller over the partition's outputs can force
/// every finite play to satisfy the formula, whatever the environment does
/// with the inputs. The verdict is deterministic for identical inputs.
///
/// The search plays one trace step per recursion level: the residual
/// formula is unfolded into next-normal form, compiled into an SDD, and the
/// environment (AND layer) and controller (OR layer) moves are enumerated
/// symbolically. A state already on the search stack is a controller loss:
/// postponing every obligation forever never produces a satisfying finite
/// trace. Verdicts are memoized per residual, which the hash-consed term
/// store makes a constant-time lookup.
///
/// This operation is cancellable using the `cancel-this` crate.
pub fn synthesize(
    ctx: &mut Context,
    formula: Formula,
    partition: &Partition,
) -> Result<bool, SynthesisError> {
    ctx.check(formula)?;

    let mut input_ids = Vec::with_capacity(partition.inputs().len());
    for name in partition.inputs() {
        let atom = ctx.make_atom(name)?;
        input_ids.push(ctx.as_atom(atom).expect("atom constructor returns an atom"));
    }
    let mut output_ids = Vec::with_capacity(partition.outputs().len());
    for name in partition.outputs() {
        let atom = ctx.make_atom(name)?;
        output_ids.push(ctx.as_atom(atom).expect("atom constructor returns an atom"));
    }

    // Every atom of the formula must be partitioned.
    let end_id = ctx.as_atom(ctx.end_atom()).expect("end indicator is an atom");
    for atom in ctx.collect_atoms(formula) {
        if atom == end_id || (!input_ids.contains(&atom) && !output_ids.contains(&atom)) {
            return Err(SynthesisError::InvalidArgument(format!(
                "atom `{}` does not appear in the variable partition",
                ctx.atom_name(atom)
            )));
        }
    }

    info!(
        "Starting synthesis over {} environment and {} controller atoms",
        input_ids.len(),
        output_ids.len()
    );

    let nnf = ToNnf::rewrite(ctx, formula)?;
    let initial = Simplify::rewrite(ctx, nnf)?;
    debug_assert!(crate::nnf::is_nnf(ctx, initial));
    debug!("Normalized specification: {}", ctx.display(initial));

    if ctx.is_true(initial) {
        return Ok(true);
    }
    if ctx.is_false(initial) {
        return Ok(false);
    }

    let vars = VarAllocation::new(ctx, initial, &input_ids, &output_ids)?;
    info!(
        "Allocated {} SDD variables ({} next-step residuals)",
        vars.var_count(),
        vars.tags().len()
    );

    let builder = CompressionSddBuilder::new(vars.vtree());
    let sdds = GameSdds::new(&builder, &vars);

    let env_vars = atom_labels(&vars, &input_ids);
    let ctrl_vars = atom_labels(&vars, &output_ids);
    let tag_formulas: Vec<Formula> = vars.tags().iter().map(|&(f, _)| f).collect();
    let tag_vars: Vec<VarLabel> = vars.tags().iter().map(|&(_, v)| v).collect();

    let mut search = Search {
        ctx,
        sdds: &sdds,
        env_vars,
        ctrl_vars,
        tag_vars,
        tag_formulas,
        end_var: vars.end_var(),
        unfold: Xnf::new(),
        memo: FxHashMap::default(),
        stack: FxHashSet::default(),
    };
    let realizable = search.win(initial)?;

    info!(
        "Forward search finished after {} memoized states: {}",
        search.memo.len(),
        if realizable { "realizable" } else { "unrealizable" }
    );
    Ok(realizable)
}

fn atom_labels(vars: &VarAllocation, atoms: &[AtomId]) -> Vec<VarLabel> {
    atoms
        .iter()
        .map(|&atom| {
            vars.atom_var(atom)
                .expect("every partitioned atom has an allocated variable")
        })
        .collect()
}

/// Depth-first AND/OR game search over residual formulas.
struct Search<'c, 's, 'b> {
    ctx: &'c mut Context,
    sdds: &'s GameSdds<'b>,
    env_vars: Vec<VarLabel>,
    ctrl_vars: Vec<VarLabel>,
    tag_vars: Vec<VarLabel>,
    tag_formulas: Vec<Formula>,
    end_var: VarLabel,
    unfold: Xnf,
    memo: FxHashMap<Formula, bool>,
    stack: FxHashSet<Formula>,
}

impl<'c, 's, 'b> Search<'c, 's, 'b> {
    /// Decide whether the controller wins from `state`.
    fn win(&mut self, state: Formula) -> Result<bool, SynthesisError> {
        is_cancelled!().map_err(|_| SynthesisError::Cancelled)?;

        if self.ctx.is_true(state) {
            return Ok(true);
        }
        if self.ctx.is_false(state) {
            return Ok(false);
        }
        if let Some(&verdict) = self.memo.get(&state) {
            return Ok(verdict);
        }
        if self.stack.contains(&state) {
            // Unfounded cycle: the controller never forces termination.
            return Ok(false);
        }

        self.stack.insert(state);
        let step = self.unfold.apply(self.ctx, state)?;
        debug_assert!(crate::xnf::is_xnf(self.ctx, step));
        let sdd = self.sdds.compile(self.ctx, step)?;
        debug!(
            "Expanding state `{}` ({} SDD nodes)",
            self.ctx.display(state),
            sdd.count_nodes()
        );
        let verdict = self.environment_layer(sdd, 0)?;
        self.stack.remove(&state);
        self.memo.insert(state, verdict);
        debug!(
            "State `{}` is a controller {}",
            self.ctx.display(state),
            if verdict { "win" } else { "loss" }
        );
        Ok(verdict)
    }

    /// AND layer: every total environment assignment must be survived. A
    /// restriction that is already unsatisfiable admits no controller
    /// response for any completion, so the scan stops early.
    fn environment_layer(&mut self, sdd: SddPtr<'b>, depth: usize) -> Result<bool, SynthesisError> {
        if sdd.is_false() {
            return Ok(false);
        }
        if depth == self.env_vars.len() {
            return self.controller_layer(sdd);
        }
        let var = self.env_vars[depth];
        let low = self.sdds.restrict(sdd, var, false);
        if !self.environment_layer(low, depth + 1)? {
            return Ok(false);
        }
        let high = self.sdds.restrict(sdd, var, true);
        self.environment_layer(high, depth + 1)
    }

    /// OR layer: the controller survives iff some move wins. The stop
    /// option is checked first: ending the trace now is a win iff the
    /// current step is satisfiable with no residual obligation left.
    fn controller_layer(&mut self, sdd: SddPtr<'b>) -> Result<bool, SynthesisError> {
        let ended = self.sdds.restrict(sdd, self.end_var, true);
        let stopped = self.sdds.restrict_all(ended, &self.tag_vars, false);
        if !stopped.is_false() {
            return Ok(true);
        }
        let continued = self.sdds.restrict(sdd, self.end_var, false);
        self.controller_moves(continued, 0)
    }

    /// Enumerate controller output assignments, `false` branch first.
    fn controller_moves(&mut self, sdd: SddPtr<'b>, depth: usize) -> Result<bool, SynthesisError> {
        if sdd.is_false() {
            return Ok(false);
        }
        if depth == self.ctrl_vars.len() {
            let mut chosen = Vec::new();
            return self.successor_moves(sdd, 0, &mut chosen);
        }
        let var = self.ctrl_vars[depth];
        let low = self.sdds.restrict(sdd, var, false);
        if self.controller_moves(low, depth + 1)? {
            return Ok(true);
        }
        let high = self.sdds.restrict(sdd, var, true);
        self.controller_moves(high, depth + 1)
    }

    /// Enumerate the next-step commitment of a move. The successor state is
    /// the conjunction of the residuals the move sets true; leaving a tag
    /// unset is tried first, so the weakest successors come first.
    fn successor_moves(
        &mut self,
        sdd: SddPtr<'b>,
        depth: usize,
        chosen: &mut Vec<Formula>,
    ) -> Result<bool, SynthesisError> {
        if sdd.is_false() {
            return Ok(false);
        }
        if depth == self.tag_vars.len() {
            let successor = self.ctx.make_and(chosen)?;
            return self.win(successor);
        }
        let var = self.tag_vars[depth];
        let low = self.sdds.restrict(sdd, var, false);
        if self.successor_moves(low, depth + 1, chosen)? {
            return Ok(true);
        }
        let high = self.sdds.restrict(sdd, var, true);
        chosen.push(self.tag_formulas[depth]);
        let result = self.successor_moves(high, depth + 1, chosen);
        chosen.pop();
        result
    }
}
