use phf::phf_map;

use crate::syntax::ast::{BinaryOp, BlockKind, ControlKind, DrawOp, LogicalOp, Node, UnaryOp};

/// What a single opcode character selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// Drawing statement; operand-less kinds complete immediately, the rest
    /// await a following tuple or expression.
    Draw(DrawOp),
    Break,
    Unary(UnaryOp),
    Logical(LogicalOp),
    Infix(BinaryOp),
    /// Opens a block on the block stack.
    Control(ControlKind),
    /// Opens a group marker on the expression stack.
    Group(BlockKind),
}

static GLYPHS: phf::Map<char, Glyph> = phf_map! {
    // single statements
    '#'  => Glyph::Draw(DrawOp::ClearTransforms),
    '<'  => Glyph::Draw(DrawOp::PopTransform),
    'd'  => Glyph::Draw(DrawOp::Dot),
    'P'  => Glyph::Draw(DrawOp::Line),
    ';'  => Glyph::Break,

    // prefix statements
    'C'  => Glyph::Draw(DrawOp::SetRgba),
    'H'  => Glyph::Draw(DrawOp::SetHsla),
    'p'  => Glyph::Draw(DrawOp::SetCursor),
    't'  => Glyph::Draw(DrawOp::Translate),
    'r'  => Glyph::Draw(DrawOp::Rotate),
    'S'  => Glyph::Draw(DrawOp::Scale),

    // prefix expressions
    'n'  => Glyph::Unary(UnaryOp::Negate),
    'N'  => Glyph::Unary(UnaryOp::Not),
    '&'  => Glyph::Logical(LogicalOp::And),
    '|'  => Glyph::Logical(LogicalOp::Or),
    'I'  => Glyph::Logical(LogicalOp::IfThenElse),
    'X'  => Glyph::Logical(LogicalOp::Xor),
    's'  => Glyph::Unary(UnaryOp::Sin),
    'o'  => Glyph::Unary(UnaryOp::Cos),
    'T'  => Glyph::Unary(UnaryOp::Tan),
    'E'  => Glyph::Unary(UnaryOp::Sec),
    'O'  => Glyph::Unary(UnaryOp::Csc),
    'Y'  => Glyph::Unary(UnaryOp::Cot),
    '!'  => Glyph::Unary(UnaryOp::Inverse),
    '_'  => Glyph::Unary(UnaryOp::Floor),
    '`'  => Glyph::Unary(UnaryOp::Ceil),
    '"'  => Glyph::Unary(UnaryOp::Square),
    '\\' => Glyph::Unary(UnaryOp::Sqrt),
    'a'  => Glyph::Unary(UnaryOp::Assign),
    'q'  => Glyph::Unary(UnaryOp::Call),

    // infix expressions
    '+'  => Glyph::Infix(BinaryOp::Add),
    '-'  => Glyph::Infix(BinaryOp::Sub),
    '*'  => Glyph::Infix(BinaryOp::Mul),
    '/'  => Glyph::Infix(BinaryOp::Div),
    '%'  => Glyph::Infix(BinaryOp::Mod),
    '^'  => Glyph::Infix(BinaryOp::Pow),
    '>'  => Glyph::Infix(BinaryOp::Gt),
    'g'  => Glyph::Infix(BinaryOp::Ge),
    '='  => Glyph::Infix(BinaryOp::Eq),
    'x'  => Glyph::Infix(BinaryOp::Ne),

    // block statements
    'L'  => Glyph::Control(ControlKind::Loop),
    'i'  => Glyph::Control(ControlKind::Conditional),
    '{'  => Glyph::Control(ControlKind::Function),

    // block expressions
    '('  => Glyph::Group(BlockKind::Group),
    'V'  => Glyph::Group(BlockKind::Any),
    'A'  => Glyph::Group(BlockKind::All),
    'U'  => Glyph::Group(BlockKind::Sum),
};

pub const CONTINUATION: char = ',';
pub const BLOCK_END: char = ')';

pub fn is_numeric(c: char) -> bool { c.is_ascii_digit() || c == '.' }

pub fn is_whitespace(c: char) -> bool { matches!(c, ' ' | '\n' | '\r' | '\t') }

impl Glyph {
    pub fn lookup(c: char) -> Option<Glyph> { GLYPHS.get(&c).copied() }

    /// Statements flush pending expressions into the current block before
    /// they are shifted.
    pub fn is_statement(self) -> bool { matches!(self, Self::Draw(_) | Self::Break | Self::Control(_)) }

    /// Fresh node for the glyphs that are shifted onto the expression stack.
    /// Infix and control glyphs are built by the parser itself.
    pub fn node(self) -> Option<Node> {
        let node = match self {
            Self::Draw(op) => Node::Draw { op, operand: None },
            Self::Break => Node::Break,
            Self::Unary(op) => Node::Unary { op, operand: None },
            Self::Logical(op) => Node::Logical { op, operand: None },
            Self::Group(kind) => Node::Block { kind, body: Vec::new() },
            Self::Infix(_) | Self::Control(_) => return None,
        };
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_classes_are_disjoint() {
        for c in ['0', '.', ',', ')', ' ', '\t'] {
            assert!(Glyph::lookup(c).is_none(), "{c:?} must not be an opcode");
        }
        assert_eq!(Glyph::lookup('V'), Some(Glyph::Group(BlockKind::Any)));
        assert_eq!(Glyph::lookup('T'), Some(Glyph::Unary(UnaryOp::Tan)));
        assert_eq!(Glyph::lookup('\\'), Some(Glyph::Unary(UnaryOp::Sqrt)));
        assert_eq!(Glyph::lookup('@'), None);
    }

    #[test]
    fn statements_flush() {
        assert!(Glyph::lookup('d').is_some_and(Glyph::is_statement));
        assert!(Glyph::lookup('L').is_some_and(Glyph::is_statement));
        assert!(!Glyph::lookup('a').is_some_and(Glyph::is_statement));
        assert!(!Glyph::lookup('(').is_some_and(Glyph::is_statement));
    }
}
