//! Parser tests.
//!
//! Trees are compared through their `Display` rendering, which spells out
//! every attachment the dual-stack builder made.

#[cfg(test)]
mod tests {
    use crate::error::{Error, ErrorCode};
    use crate::syntax::parser::Parser;

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn tree(src: &str) -> String {
        Parser::new(src)
            .parse()
            .unwrap_or_else(|e| panic!("parse of {src:?} failed: {e}"))
            .to_string()
    }

    fn parse_err(src: &str) -> Error {
        match Parser::new(src).parse() {
            Ok(node) => panic!("expected parse of {src:?} to fail, got {node}"),
            Err(e) => e,
        }
    }

    fn assert_err(src: &str, code: ErrorCode, position: usize) {
        let e = parse_err(src);
        assert_eq!(e.code, code, "{src:?}: {e}");
        assert_eq!(e.position, position, "{src:?}: {e}");
    }

    // ─── Literals and statements ─────────────────────────────────────────────

    #[test]
    fn empty_program() {
        assert_eq!(tree(""), "program{}");
        assert_eq!(tree("  \n\t"), "program{}");
    }

    #[test]
    fn literal_pending_at_end_is_kept() {
        assert_eq!(tree("12.5"), "program{12.5}");
        assert_eq!(tree(".5"), "program{0.5}");
    }

    #[test]
    fn unknown_glyphs_are_ignored() {
        assert_eq!(tree("3z+4"), "program{(3 + 4)}");
        assert_eq!(tree("12@"), "program{12}");
    }

    #[test]
    fn statement_flushes_pending_expression() {
        assert_eq!(tree("a1 d"), "program{var(1); dot}");
        assert_eq!(tree("d d P"), "program{dot; dot; line}");
    }

    #[test]
    fn tuple_without_parent_is_a_statement() {
        assert_eq!(tree("1,2"), "program{[1, 2]}");
    }

    // ─── Infix and tuples ────────────────────────────────────────────────────

    #[test]
    fn literal_completes_infix() {
        assert_eq!(tree("3+4"), "program{(3 + 4)}");
        assert_eq!(tree("2^3 5x6"), "program{(2 ^ 3); (5 != 6)}");
    }

    #[test]
    fn prefix_statement_takes_tuple() {
        assert_eq!(tree("C255,0,0"), "program{rgba([255, 0, 0])}");
        assert_eq!(tree("p10,20 d"), "program{cursor([10, 20]); dot}");
        assert_eq!(tree("r1.5 d"), "program{rotate(1.5); dot}");
    }

    #[test]
    fn infix_takes_last_tuple_item() {
        assert_eq!(tree("C1,2+3,4"), "program{rgba([1, (2 + 3), 4])}");
    }

    #[test]
    fn settled_operand_joins_grandparent_tuple() {
        assert_eq!(tree("a1,a1 +1"), "program{var([1, (var(1) + 1)])}");
    }

    #[test]
    fn nested_prefix_inside_tuple() {
        assert_eq!(tree("C1,a2,3"), "program{rgba([1, var([2, 3])])}");
    }

    #[test]
    fn prefix_binds_to_adjacent_literal_before_infix() {
        // `+` only sees the literal on the tip, so it lands inside `var`.
        assert_eq!(tree("a1+1"), "program{var((1 + 1))}");
    }

    // ─── Groups and blocks ───────────────────────────────────────────────────

    #[test]
    fn group_collects_children() {
        assert_eq!(tree("(1 2)"), "program{group{1; 2}}");
        assert_eq!(tree("a(1+2)"), "program{var(group{(1 + 2)})}");
    }

    #[test]
    fn reducer_groups() {
        assert_eq!(tree("U1 2 3)"), "program{sum{1; 2; 3}}");
        assert_eq!(tree("V0 1)"), "program{any{0; 1}}");
        assert_eq!(tree("A1 0)"), "program{all{1; 0}}");
    }

    #[test]
    fn whitespace_runs_do_not_close_groups() {
        assert_eq!(tree("U1  2)"), "program{sum{1; 2}}");
    }

    #[test]
    fn closed_group_is_not_a_close_target() {
        assert_eq!(tree("L1 (2))"), "program{loop<1>{group{2}}}");
    }

    #[test]
    fn control_block_takes_control_first() {
        assert_eq!(tree("L3 d)"), "program{loop<3>{dot}}");
        assert_eq!(tree("L3d P)"), "program{loop<3>{dot; line}}");
        assert_eq!(tree("i1 d)"), "program{if<1>{dot}}");
    }

    #[test]
    fn function_definition_and_call() {
        // The second space settles `neg(1)` into `var` before `*` picks its operand.
        assert_eq!(tree("{1 an1 *2)"), "program{fn<1>{var((neg(1) * 2))}}");
        assert_eq!(
            tree("{1 an1  *2) q1,5"),
            "program{fn<1>{(var(neg(1)) * 2)}; call([1, 5])}",
        );
    }

    #[test]
    fn nested_blocks() {
        assert_eq!(tree("L2 L3 d))"), "program{loop<2>{loop<3>{dot}}}");
    }

    #[test]
    fn break_statement() {
        assert_eq!(tree("L2 ;)"), "program{loop<2>{break}}");
    }

    // ─── Failures ────────────────────────────────────────────────────────────

    #[test]
    fn p001_second_decimal_point() {
        assert_err("1.2.3", ErrorCode::P001, 3);
    }

    #[test]
    fn p001_lone_decimal_point() {
        assert_err(". d", ErrorCode::P001, 1);
    }

    #[test]
    fn p002_continuation_with_nothing() {
        assert_err(",", ErrorCode::P002, 0);
        assert_err("d ,", ErrorCode::P002, 2);
    }

    #[test]
    fn p003_continuation_on_statement() {
        assert_err("d,", ErrorCode::P003, 1);
        assert_err("(,", ErrorCode::P003, 1);
    }

    #[test]
    fn p004_infix_without_left_operand() {
        assert_err("+1", ErrorCode::P004, 0);
        assert_err("(+", ErrorCode::P004, 1);
    }

    #[test]
    fn p005_block_end_outside_block() {
        assert_err(")", ErrorCode::P005, 0);
        assert_err("L1 d))", ErrorCode::P005, 5);
    }

    #[test]
    fn p006_unclosed_block() {
        assert_err("L3 d", ErrorCode::P006, 4);
        assert_err("(1", ErrorCode::P006, 2);
    }

    #[test]
    fn p007_operand_for_operandless_node() {
        assert_err("d5", ErrorCode::P007, 2);
        assert_err("1N", ErrorCode::P007, 1);
    }

    #[test]
    fn p008_deep_prefix_chain() {
        let src = format!("{}1", "n".repeat(2000));
        assert_err(&src, ErrorCode::P008, 2001);
    }

    #[test]
    fn p008_long_infix_chain() {
        let src = format!("1{}", "+1".repeat(500));
        assert_err(&src, ErrorCode::P008, 255);
    }

    #[test]
    fn p008_nested_groups() {
        let src = format!("{}{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse_err(&src).code, ErrorCode::P008);
    }

    #[test]
    fn depth_bound_counts_every_level() {
        assert_eq!(Parser::with_max_depth("n1", 3).parse().unwrap().to_string(), "program{neg(1)}");
        let e = Parser::with_max_depth("nn1", 3).parse().unwrap_err();
        assert_eq!(e.code, ErrorCode::P008);
        assert!(tree(&format!("{}1", "n".repeat(100))).starts_with("program{neg(neg(neg("));
    }
}
