use std::fmt;

// ─── Operator kinds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    Floor,
    Ceil,
    Square,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    /// Arc-function of the trig node directly beneath it.
    Inverse,
    /// `(key, value)` stores, a bare key reads.
    Assign,
    /// `id` or `(id, arg0, arg1, …)`.
    Call,
    /// 0–255 channel rescaled to a truncated percentage. Only produced by the optimizer.
    Percent,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Negate  => "neg",
            Self::Not     => "not",
            Self::Floor   => "floor",
            Self::Ceil    => "ceil",
            Self::Square  => "sq",
            Self::Sqrt    => "sqrt",
            Self::Sin     => "sin",
            Self::Cos     => "cos",
            Self::Tan     => "tan",
            Self::Sec     => "sec",
            Self::Csc     => "csc",
            Self::Cot     => "cot",
            Self::Inverse => "inv",
            Self::Assign  => "var",
            Self::Call    => "call",
            Self::Percent => "pct",
        }
    }

    pub fn is_trig(self) -> bool {
        matches!(self, Self::Sin | Self::Cos | Self::Tan | Self::Sec | Self::Csc | Self::Cot)
    }

    /// Number → number kernel. `None` for the kinds whose meaning depends on
    /// more than the operand's value (inverse, assign, call).
    pub fn apply(self, x: f64) -> Option<f64> {
        let v = match self {
            Self::Negate  => -x,
            Self::Not     => truth(!truthy(x)),
            Self::Floor   => x.floor(),
            Self::Ceil    => x.ceil(),
            Self::Square  => x.powi(2),
            Self::Sqrt    => x.sqrt(),
            Self::Sin     => x.sin(),
            Self::Cos     => x.cos(),
            Self::Tan     => x.tan(),
            Self::Sec     => 1.0 / x.cos(),
            Self::Csc     => 1.0 / x.sin(),
            Self::Cot     => 1.0 / x.tan(),
            Self::Percent => percent(x),
            Self::Inverse | Self::Assign | Self::Call => return None,
        };
        Some(v)
    }

    /// Arc-function for the six trig kinds.
    pub fn arc(self, x: f64) -> Option<f64> {
        let v = match self {
            Self::Sin => x.asin(),
            Self::Cos => x.acos(),
            Self::Tan => x.atan(),
            Self::Sec => (1.0 / x).acos(),
            Self::Csc => (1.0 / x).asin(),
            Self::Cot => (1.0 / x).atan(),
            _ => return None,
        };
        Some(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    IfThenElse,
    Xor,
}

impl LogicalOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::And        => "and",
            Self::Or         => "or",
            Self::IfThenElse => "if",
            Self::Xor        => "xor",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::IfThenElse => 3,
            Self::And | Self::Or | Self::Xor => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawOp {
    SetRgba,
    SetHsla,
    /// HSLA whose saturation/lightness channels are already percentages.
    SetHslaPercent,
    SetCursor,
    Translate,
    Rotate,
    Scale,
    ClearTransforms,
    PopTransform,
    Dot,
    Line,
}

impl DrawOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::SetRgba         => "rgba",
            Self::SetHsla         => "hsla",
            Self::SetHslaPercent  => "hsla%",
            Self::SetCursor       => "cursor",
            Self::Translate       => "translate",
            Self::Rotate          => "rotate",
            Self::Scale           => "scale",
            Self::ClearTransforms => "clear",
            Self::PopTransform    => "pop",
            Self::Dot             => "dot",
            Self::Line            => "line",
        }
    }

    pub fn takes_operand(self) -> bool {
        !matches!(self, Self::ClearTransforms | Self::PopTransform | Self::Dot | Self::Line)
    }

    /// Accepted tuple lengths, or `None` when the operand is a bare expression
    /// (rotate) or absent.
    pub fn arity(self) -> Option<&'static [usize]> {
        match self {
            Self::SetRgba | Self::SetHsla | Self::SetHslaPercent => Some(&[3, 4]),
            Self::SetCursor | Self::Translate | Self::Scale => Some(&[2]),
            Self::Rotate | Self::ClearTransforms | Self::PopTransform | Self::Dot | Self::Line => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Gt  => ">",
            Self::Ge  => ">=",
            Self::Eq  => "==",
            Self::Ne  => "!=",
        }
    }

    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            Self::Add => l + r,
            Self::Sub => l - r,
            Self::Mul => l * r,
            Self::Div => l / r,
            Self::Mod => l % r,
            Self::Pow => l.powf(r),
            Self::Gt  => truth(l > r),
            Self::Ge  => truth(l >= r),
            Self::Eq  => truth(l == r),
            Self::Ne  => truth(l != r),
        }
    }

    /// Operators eligible for compound-assignment fusion.
    pub fn is_compound(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Program,
    Group,
    Any,
    All,
    Sum,
}

impl BlockKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Group   => "group",
            Self::Any     => "any",
            Self::All     => "all",
            Self::Sum     => "sum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Loop,
    Conditional,
    Function,
}

impl ControlKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Loop        => "loop",
            Self::Conditional => "if",
            Self::Function    => "fn",
        }
    }
}

pub(crate) fn truth(b: bool) -> f64 { if b { 1.0 } else { 0.0 } }

/// Nonzero and not NaN.
pub(crate) fn truthy(x: f64) -> bool { x != 0.0 && !x.is_nan() }

pub(crate) fn percent(x: f64) -> f64 { (x / 255.0 * 100.0) as i32 as f64 }

// ─── Node ────────────────────────────────────────────────────────────────────

/// One node of the program tree. Each node has exactly one parent; the
/// `Program` block is the root.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(f64),
    Unary {
        op: UnaryOp,
        operand: Option<Box<Node>>,
    },
    /// Operand is expected to be a tuple of `op.arity()` items.
    Logical {
        op: LogicalOp,
        operand: Option<Box<Node>>,
    },
    Draw {
        op: DrawOp,
        operand: Option<Box<Node>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Option<Box<Node>>,
    },
    Tuple(Vec<Node>),
    Block {
        kind: BlockKind,
        body: Vec<Node>,
    },
    /// `control` is filled by the first attached child, the rest go to `body`.
    Control {
        kind: ControlKind,
        control: Option<Box<Node>>,
        body: Vec<Node>,
    },
    /// `key = key <op> value`, fused by the optimizer.
    CompoundAssign {
        op: BinaryOp,
        key: Box<Node>,
        value: Box<Node>,
    },
    Break,
}

impl Node {
    pub fn program() -> Self { Self::Block { kind: BlockKind::Program, body: Vec::new() } }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Self::Unary { op, operand: Some(Box::new(operand)) }
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Self::Binary { op, left: Box::new(left), right: Some(Box::new(right)) }
    }

    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Self::Literal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool { matches!(self, Self::Literal(_)) }

    pub fn is_tuple(&self) -> bool { matches!(self, Self::Tuple(_)) }

    /// Whether the node produces a value that may head a continuation.
    pub fn is_expression(&self) -> bool {
        match self {
            Self::Literal(_) | Self::Unary { .. } | Self::Logical { .. } | Self::Binary { .. }
            | Self::Tuple(_) | Self::CompoundAssign { .. } => true,
            Self::Block { kind, .. } => *kind != BlockKind::Program,
            Self::Draw { .. } | Self::Control { .. } | Self::Break => false,
        }
    }

    /// Free of side effects on the context and the surface.
    pub fn is_pure(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Unary { op: UnaryOp::Call, .. } => false,
            Self::Unary { op: UnaryOp::Assign, operand } => {
                operand.as_deref().is_some_and(|o| !o.is_tuple() && o.is_pure())
            }
            Self::Unary { operand, .. } => operand.as_deref().is_some_and(Node::is_pure),
            Self::Binary { left, right, .. } => {
                left.is_pure() && right.as_deref().is_some_and(Node::is_pure)
            }
            Self::Tuple(items) => items.iter().all(Node::is_pure),
            _ => false,
        }
    }

    /// Attach `child` as the next operand. Hands the child back when this node
    /// accepts no operand.
    pub(crate) fn attach(&mut self, child: Node) -> Result<(), Node> {
        match self {
            Self::Unary { operand, .. } | Self::Logical { operand, .. } => {
                *operand = Some(Box::new(child));
            }
            Self::Draw { op, operand } if op.takes_operand() => {
                *operand = Some(Box::new(child));
            }
            Self::Binary { right, .. } => *right = Some(Box::new(child)),
            Self::Tuple(items) => match child {
                Self::Tuple(more) => items.extend(more),
                other => items.push(other),
            },
            Self::Block { body, .. } => body.push(child),
            Self::Control { control, body, .. } => {
                if control.is_none() {
                    *control = Some(Box::new(child));
                } else {
                    body.push(child);
                }
            }
            Self::Literal(_) | Self::Draw { .. } | Self::CompoundAssign { .. } | Self::Break => {
                return Err(child);
            }
        }
        Ok(())
    }

    /// Short human-readable rendering of the subtree.
    pub fn describe(&self) -> String { self.to_string() }
}

// ─── Display ─────────────────────────────────────────────────────────────────

struct Operand<'a>(&'a Option<Box<Node>>);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("?"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[Node], sep: &str) -> fmt::Result {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 { f.write_str(sep)?; }
        write!(f, "{n}")?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Unary { op, operand } => write!(f, "{}({})", op.name(), Operand(operand)),
            Self::Logical { op, operand } => write!(f, "{}({})", op.name(), Operand(operand)),
            Self::Draw { op, operand } if op.takes_operand() => {
                write!(f, "{}({})", op.name(), Operand(operand))
            }
            Self::Draw { op, .. } => f.write_str(op.name()),
            Self::Binary { op, left, right } => {
                write!(f, "({left} {} {})", op.symbol(), Operand(right))
            }
            Self::Tuple(items) => {
                f.write_str("[")?;
                write_list(f, items, ", ")?;
                f.write_str("]")
            }
            Self::Block { kind, body } => {
                write!(f, "{}{{", kind.name())?;
                write_list(f, body, "; ")?;
                f.write_str("}")
            }
            Self::Control { kind, control, body } => {
                write!(f, "{}<{}>{{", kind.name(), Operand(control))?;
                write_list(f, body, "; ")?;
                f.write_str("}")
            }
            Self::CompoundAssign { op, key, value } => {
                write!(f, "var({key} {}= {value})", op.symbol())
            }
            Self::Break => f.write_str("break"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_attach_splices_nested_tuples() {
        let mut t = Node::Tuple(vec![Node::Literal(1.0)]);
        t.attach(Node::Tuple(vec![Node::Literal(2.0), Node::Literal(3.0)])).unwrap();
        assert_eq!(t, Node::Tuple(vec![Node::Literal(1.0), Node::Literal(2.0), Node::Literal(3.0)]));
    }

    #[test]
    fn control_takes_first_child_as_control() {
        let mut l = Node::Control { kind: ControlKind::Loop, control: None, body: vec![] };
        l.attach(Node::Literal(3.0)).unwrap();
        l.attach(Node::Draw { op: DrawOp::Dot, operand: None }).unwrap();
        assert_eq!(l.to_string(), "loop<3>{dot}");
    }

    #[test]
    fn operandless_nodes_reject_children() {
        let mut dot = Node::Draw { op: DrawOp::Dot, operand: None };
        assert!(dot.attach(Node::Literal(1.0)).is_err());
        assert!(Node::Literal(2.0).attach(Node::Literal(1.0)).is_err());
    }

    #[test]
    fn describe_renders_nested_structure() {
        let n = Node::unary(UnaryOp::Assign, Node::Tuple(vec![
            Node::Literal(1.0),
            Node::binary(BinaryOp::Add, Node::Literal(2.0), Node::Literal(0.5)),
        ]));
        assert_eq!(n.describe(), "var([1, (2 + 0.5)])");
    }

    #[test]
    fn purity_excludes_calls_and_stores() {
        let read = Node::unary(UnaryOp::Assign, Node::Literal(1.0));
        let store = Node::unary(UnaryOp::Assign, Node::Tuple(vec![Node::Literal(1.0), Node::Literal(2.0)]));
        let call = Node::unary(UnaryOp::Call, Node::Literal(1.0));
        assert!(read.is_pure());
        assert!(!store.is_pure());
        assert!(!call.is_pure());
    }
}
