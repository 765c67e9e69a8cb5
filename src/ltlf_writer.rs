use crate::context::Context;
use crate::formula::{Formula, LtlfNode};
use std::fmt::Write;

/// Format a formula in the infix surface syntax.
///
/// Composite nodes are fully parenthesized, so re-parsing the output yields
/// the original handle. `TaggedNext` renders as `X*(...)`; it has no surface
/// syntax and appears only in diagnostics of next-normal-form output.
pub fn write_ltlf(ctx: &Context, formula: Formula) -> String {
    let mut result = String::new();
    write_to(&mut result, ctx, formula).expect("Writing to String should never fail");
    result
}

fn write_to(f: &mut impl Write, ctx: &Context, formula: Formula) -> std::fmt::Result {
    match ctx.node(formula) {
        LtlfNode::True => write!(f, "true"),
        LtlfNode::False => write!(f, "false"),
        LtlfNode::Atom(id) => write!(f, "{}", ctx.atom_name(*id)),
        LtlfNode::PropNot(atom) => {
            write!(f, "!")?;
            write_to(f, ctx, *atom)
        }
        LtlfNode::Not(operand) => {
            write!(f, "!")?;
            write_to(f, ctx, *operand)
        }
        LtlfNode::And(operands) => write_operands(f, ctx, operands, " & "),
        LtlfNode::Or(operands) => write_operands(f, ctx, operands, " | "),
        LtlfNode::Implies(left, right) => write_binary(f, ctx, *left, *right, "->"),
        LtlfNode::Equivalent(left, right) => write_binary(f, ctx, *left, *right, "<->"),
        LtlfNode::Xor(left, right) => write_binary(f, ctx, *left, *right, "^"),
        LtlfNode::Next(operand) => write_unary(f, ctx, *operand, "X"),
        LtlfNode::WeakNext(operand) => write_unary(f, ctx, *operand, "WX"),
        LtlfNode::Eventually(operand) => write_unary(f, ctx, *operand, "F"),
        LtlfNode::Always(operand) => write_unary(f, ctx, *operand, "G"),
        LtlfNode::Until(left, right) => write_binary(f, ctx, *left, *right, "U"),
        LtlfNode::Release(left, right) => write_binary(f, ctx, *left, *right, "R"),
        LtlfNode::TaggedNext(operand) => {
            write!(f, "X*(")?;
            write_to(f, ctx, *operand)?;
            write!(f, ")")
        }
    }
}

fn write_unary(f: &mut impl Write, ctx: &Context, operand: Formula, op: &str) -> std::fmt::Result {
    write!(f, "{} ", op)?;
    write_to(f, ctx, operand)
}

fn write_binary(
    f: &mut impl Write,
    ctx: &Context,
    left: Formula,
    right: Formula,
    op: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    write_to(f, ctx, left)?;
    write!(f, " {} ", op)?;
    write_to(f, ctx, right)?;
    write!(f, ")")
}

fn write_operands(
    f: &mut impl Write,
    ctx: &Context,
    operands: &[Formula],
    separator: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, &operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write_to(f, ctx, operand)?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ltlf_parser::parse_ltlf;
    use crate::nnf::ToNnf;

    #[test]
    fn test_write_literals() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let na = ctx.make_not(a).unwrap();
        assert_eq!(write_ltlf(&ctx, a), "a");
        assert_eq!(write_ltlf(&ctx, na), "!a");
        assert_eq!(write_ltlf(&ctx, ctx.make_true()), "true");
        assert_eq!(write_ltlf(&ctx, ctx.make_false()), "false");
    }

    #[test]
    fn test_write_temporal() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let u = ctx.make_until(a, b).unwrap();
        let g = ctx.make_always(u).unwrap();
        assert_eq!(write_ltlf(&ctx, g), "G (a U b)");
    }

    #[test]
    fn test_write_nary() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a").unwrap();
        let b = ctx.make_atom("b").unwrap();
        let c = ctx.make_atom("c").unwrap();
        let and = ctx.make_and(&[a, b, c]).unwrap();
        assert_eq!(write_ltlf(&ctx, and), "(a & b & c)");
    }

    #[test]
    fn test_round_trip_preserves_handles() {
        let mut ctx = Context::new();
        let inputs = [
            "G (x1 -> F y1)",
            "G y1 & F !y1",
            "X y1 & X !y1",
            "F (x1 & y1)",
            "G (x1 <-> y1) & F !x1",
            "y1 U x1",
            "WX (a R b) | a ^ b",
        ];
        for input in inputs {
            let parsed = parse_ltlf(&mut ctx, input).unwrap();
            let reparsed = parse_ltlf(&mut ctx, &write_ltlf(&ctx, parsed)).unwrap();
            assert_eq!(reparsed, parsed, "round trip failed for `{}`", input);
        }
    }

    #[test]
    fn test_round_trip_after_nnf() {
        let mut ctx = Context::new();
        let inputs = ["!(a U b)", "!(G (x1 -> F y1))", "!(a <-> b)"];
        for input in inputs {
            let parsed = parse_ltlf(&mut ctx, input).unwrap();
            let nnf = ToNnf::rewrite(&mut ctx, parsed).unwrap();
            let reparsed = parse_ltlf(&mut ctx, &write_ltlf(&ctx, nnf)).unwrap();
            assert_eq!(reparsed, nnf, "round trip failed for `{}`", input);
        }
    }
}
