//! Constant folding and compound-assignment fusion. Runs before code
//! generation only; the tree walker always sees the tree as parsed.

use crate::syntax::ast::{percent, truth, truthy, BlockKind, DrawOp, LogicalOp, Node, UnaryOp};

impl Node {
    /// Bottom-up rewrite. Every fold preserves the value and side effects of
    /// the unoptimized subtree, including evaluation-time failures.
    pub fn optimize(self) -> Node {
        match self {
            Node::Literal(_) | Node::Break => self,
            Node::Unary { op, operand } => match operand {
                Some(operand) => optimize_unary(op, *operand),
                None => Node::Unary { op, operand: None },
            },
            Node::Logical { op, operand } => {
                let operand = operand.map(|o| o.optimize());
                match operand {
                    Some(Node::Tuple(items)) if items.len() == op.arity() => fold_logical(op, items),
                    operand => Node::Logical { op, operand: operand.map(Box::new) },
                }
            }
            Node::Draw { op, operand } => {
                let operand = operand.map(|o| o.optimize());
                match (op, operand) {
                    (DrawOp::SetRgba, Some(Node::Tuple(items))) if matches!(items.len(), 3 | 4) => rgba(items),
                    (DrawOp::SetHsla, Some(Node::Tuple(items))) if matches!(items.len(), 3 | 4) => hsla(items),
                    (op, operand) => Node::Draw { op, operand: operand.map(Box::new) },
                }
            }
            Node::Binary { op, left, right } => {
                let left = left.optimize();
                let right = right.map(|r| r.optimize());
                match (left.as_literal(), right.as_ref().and_then(Node::as_literal)) {
                    (Some(l), Some(r)) => Node::Literal(op.apply(l, r)),
                    _ => Node::Binary { op, left: Box::new(left), right: right.map(Box::new) },
                }
            }
            Node::Tuple(items) => Node::Tuple(optimize_all(items)),
            Node::Block { kind, body } => fold_block(kind, optimize_all(body)),
            Node::Control { kind, control, body } => Node::Control {
                kind,
                control: control.map(|c| Box::new(c.optimize())),
                body: optimize_all(body),
            },
            Node::CompoundAssign { op, key, value } => Node::CompoundAssign {
                op,
                key: Box::new(key.optimize()),
                value: Box::new(value.optimize()),
            },
        }
    }
}

fn optimize_all(nodes: Vec<Node>) -> Vec<Node> { nodes.into_iter().map(Node::optimize).collect() }

fn literals(nodes: &[Node]) -> Option<Vec<f64>> { nodes.iter().map(Node::as_literal).collect() }

fn optimize_unary(op: UnaryOp, operand: Node) -> Node {
    match op {
        // The trig child must stay a trig node; only its own operand is rewritten.
        UnaryOp::Inverse => match operand {
            Node::Unary { op: trig, operand: Some(inner) } if trig.is_trig() => {
                let inner = inner.optimize();
                match inner.as_literal().and_then(|x| trig.arc(x)) {
                    Some(v) => Node::Literal(v),
                    None => Node::unary(op, Node::unary(trig, inner)),
                }
            }
            other => Node::unary(op, other.optimize()),
        },
        UnaryOp::Assign => fuse(operand.optimize()),
        UnaryOp::Call => Node::unary(op, operand.optimize()),
        _ => {
            let operand = operand.optimize();
            match operand.as_literal().and_then(|x| op.apply(x)) {
                Some(v) => Node::Literal(v),
                None => Node::unary(op, operand),
            }
        }
    }
}

/// `var(k, var(k) <op> v)` becomes a fused compound assignment when `k` can
/// be evaluated once without changing meaning.
fn fuse(operand: Node) -> Node {
    let Node::Tuple(mut items) = operand else {
        return Node::unary(UnaryOp::Assign, operand);
    };
    let fusable = match items.as_slice() {
        [key, Node::Binary { op, left, right: Some(_) }] => {
            op.is_compound()
                && key.is_pure()
                && matches!(left.as_ref(), Node::Unary { op: UnaryOp::Assign, operand: Some(read) } if **read == *key)
        }
        _ => false,
    };
    if !fusable {
        return Node::unary(UnaryOp::Assign, Node::Tuple(items));
    }
    match (items.pop(), items.pop()) {
        (Some(Node::Binary { op, right: Some(value), .. }), Some(key)) => {
            tracing::trace!(key = %key, op = op.symbol(), "fuse compound assignment");
            Node::CompoundAssign { op, key: Box::new(key), value }
        }
        (value, key) => {
            items.extend(key);
            items.extend(value);
            Node::unary(UnaryOp::Assign, Node::Tuple(items))
        }
    }
}

fn fold_logical(op: LogicalOp, items: Vec<Node>) -> Node {
    if op == LogicalOp::IfThenElse {
        if let Some(cond) = items[0].as_literal() {
            let branch = if truthy(cond) { 1 } else { 2 };
            if let Some(chosen) = items.into_iter().nth(branch) {
                return chosen;
            }
            return Node::Literal(0.0);
        }
    }
    let folded = literals(&items).and_then(|v| match op {
        LogicalOp::And => Some(if truthy(v[0]) { v[1] } else { 0.0 }),
        LogicalOp::Or => Some(if truthy(v[0]) { v[0] } else { v[1] }),
        LogicalOp::Xor => Some(truth(truthy(v[0]) != truthy(v[1]))),
        LogicalOp::IfThenElse => None,
    });
    match folded {
        Some(v) => Node::Literal(v),
        None => Node::Logical { op, operand: Some(Box::new(Node::Tuple(items))) },
    }
}

fn fold_block(kind: BlockKind, body: Vec<Node>) -> Node {
    let folded = match kind {
        BlockKind::Program => None,
        _ => literals(&body).map(|v| match kind {
            BlockKind::Any => v.into_iter().find(|x| truthy(*x)).unwrap_or(0.0),
            BlockKind::All => truth(v.iter().all(|x| truthy(*x))),
            BlockKind::Sum => v.iter().fold(0.0, |acc, x| acc + x),
            _ => v.last().copied().unwrap_or(0.0),
        }),
    };
    match folded {
        Some(v) => Node::Literal(v),
        None => Node::Block { kind, body },
    }
}

fn channel(node: Node, rescale: bool) -> Node {
    match node.as_literal() {
        Some(x) if rescale => Node::Literal(percent(x)),
        Some(x) => Node::Literal(x as i32 as f64),
        None if rescale => Node::unary(UnaryOp::Percent, node),
        None => node,
    }
}

fn pad_alpha(mut items: Vec<Node>) -> Vec<Node> {
    if items.len() == 3 {
        items.push(Node::Literal(1.0));
    }
    items
}

fn rgba(items: Vec<Node>) -> Node {
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, n)| if i < 3 { channel(n, false) } else { n })
        .collect();
    Node::Draw { op: DrawOp::SetRgba, operand: Some(Box::new(Node::Tuple(pad_alpha(items)))) }
}

/// Saturation and lightness are rescaled once here, so the percent-form op
/// forwards them untouched.
fn hsla(items: Vec<Node>) -> Node {
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, n)| match i {
            0 => channel(n, false),
            1 | 2 => channel(n, true),
            _ => n,
        })
        .collect();
    Node::Draw { op: DrawOp::SetHslaPercent, operand: Some(Box::new(Node::Tuple(pad_alpha(items)))) }
}

#[cfg(test)]
mod tests {
    use crate::syntax::parser::Parser;

    fn optimized(src: &str) -> String {
        Parser::new(src).parse().unwrap().optimize().to_string()
    }

    #[test]
    fn folds_literal_arithmetic() {
        assert_eq!(optimized("3+4"), "program{7}");
        assert_eq!(optimized("s0  \\16"), "program{0; 4}");
        assert_eq!(optimized("N0  _2.7  `2.1"), "program{1; 2; 3}");
    }

    #[test]
    fn folds_logical_and_reducers() {
        assert_eq!(optimized("&1,2"), "program{2}");
        assert_eq!(optimized("|0,5"), "program{5}");
        assert_eq!(optimized("X1,1"), "program{0}");
        assert_eq!(optimized("U1 2 3)"), "program{6}");
        assert_eq!(optimized("V0 0)"), "program{0}");
        assert_eq!(optimized("A1 2)"), "program{1}");
    }

    #[test]
    fn if_then_else_picks_branch() {
        assert_eq!(optimized("I1,a2 ,7"), "program{var(2)}");
        assert_eq!(optimized("I0,a2 ,7"), "program{7}");
    }

    #[test]
    fn inverse_folds_through_trig_child() {
        assert_eq!(optimized("!s0"), "program{0}");
        assert_eq!(optimized("!sa1"), "program{inv(sin(var(1)))}");
    }

    #[test]
    fn inverse_of_non_trig_is_left_for_runtime() {
        assert_eq!(optimized("!5"), "program{inv(5)}");
    }

    #[test]
    fn wrong_arity_is_not_folded() {
        assert_eq!(optimized("&1,2,3"), "program{and([1, 2, 3])}");
        assert_eq!(optimized("C1,2"), "program{rgba([1, 2])}");
    }

    #[test]
    fn color_channels() {
        assert_eq!(optimized("C10.7,20.2,30.9"), "program{rgba([10, 20, 30, 1])}");
        assert_eq!(optimized("H10,255,127.5,0.5"), "program{hsla%([10, 100, 50, 0.5])}");
        assert_eq!(optimized("H10,a1 ,0"), "program{hsla%([10, pct(var(1)), 0, 1])}");
    }

    #[test]
    fn compound_assignment_fusion() {
        assert_eq!(optimized("a1,a1 +1"), "program{var(1 += 1)}");
        assert_eq!(optimized("a1,a1 ^2"), "program{var([1, (var(1) ^ 2)])}");
        assert_eq!(optimized("a1,a2 +1"), "program{var([1, (var(2) + 1)])}");
    }

    #[test]
    fn optimize_is_idempotent() {
        for src in ["3+4", "C1.5,2,3 H1,2,3", "a1,a1 *2", "L3 d)", "!sa1", "I0,1,2", "H1,a1 ,2"] {
            let once = Parser::new(src).parse().unwrap().optimize();
            assert_eq!(once.clone().optimize(), once, "{src}");
        }
    }
}
