use crate::error::{Error, ErrorCode};
use crate::syntax::ast::{BinaryOp, BlockKind, ControlKind, Node};
use crate::syntax::glyph::{self, Glyph};

/// Deepest tree the parser will build. Every later pass walks the tree
/// recursively, so deeper input is rejected here with P008.
pub const MAX_DEPTH: usize = 128;

/// One entry of either stack. `open` marks a group marker still waiting for
/// its `)`; `height` bounds the depth of the subtree rooted at `node`.
#[derive(Debug)]
struct Frame {
    node: Node,
    open: bool,
    height: usize,
}

impl Frame {
    fn leaf(node: Node) -> Self { Self { node, open: false, height: 1 } }

    fn over(node: Node, child_height: usize) -> Self { Self { node, open: false, height: child_height + 1 } }
}

/// Single-pass builder over the opcode string.
///
/// Two stacks drive the construction: `blocks` holds the open structural
/// blocks (the program at the bottom, then loops, conditionals and function
/// definitions), `exprs` holds expression nodes still waiting for their
/// operands. Nodes move from `exprs` into their parent only at delimiter and
/// whitespace events.
pub struct Parser<'a> {
    source: &'a str,
    blocks: Vec<Frame>,
    exprs: Vec<Frame>,
    literal: String,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self { Self::with_max_depth(source, MAX_DEPTH) }

    pub fn with_max_depth(source: &'a str, max_depth: usize) -> Self {
        Self {
            source,
            blocks: vec![Frame::leaf(Node::program())],
            exprs: Vec::new(),
            literal: String::new(),
            pos: 0,
            max_depth,
        }
    }

    /// Build the program tree. The returned node is always a `Program` block.
    pub fn parse(mut self) -> Result<Node, Error> {
        let source = self.source;
        let mut end = 0;
        for (pos, c) in source.chars().enumerate() {
            self.pos = pos;
            self.step(c)?;
            end = pos + 1;
        }
        self.pos = end;

        self.flush_literal()?;
        if self.exprs.iter().any(|f| f.open) {
            return Err(self.error(ErrorCode::P006, "unclosed group at end of input"));
        }
        while !self.exprs.is_empty() {
            self.commit()?;
        }

        if self.blocks.len() != 1 {
            let open = self.blocks.len() - 1;
            return Err(self.error(ErrorCode::P006, format!("{open} unclosed block(s) at end of input")));
        }
        match self.blocks.pop() {
            Some(program) => Ok(program.node),
            None => Err(self.error(ErrorCode::P006, "program block missing")),
        }
    }

    fn step(&mut self, c: char) -> Result<(), Error> {
        if glyph::is_numeric(c) {
            if c == '.' && self.literal.contains('.') {
                return Err(self.error(ErrorCode::P001, format!("second decimal point in `{}.`", self.literal)));
            }
            self.literal.push(c);
            return Ok(());
        }
        self.flush_literal()?;

        match c {
            glyph::CONTINUATION => self.continuation(),
            glyph::BLOCK_END => self.block_end(),
            c if glyph::is_whitespace(c) => self.commit(),
            c => match Glyph::lookup(c) {
                Some(g) => self.opcode(g),
                None => {
                    tracing::trace!(pos = self.pos, glyph = ?c, "ignored");
                    Ok(())
                }
            },
        }
    }

    // ─── Glyph handlers ──────────────────────────────────────────────────────

    fn opcode(&mut self, g: Glyph) -> Result<(), Error> {
        match g {
            Glyph::Infix(op) => self.infix(op),
            Glyph::Control(kind) => self.open_block(kind),
            Glyph::Group(kind) => self.open_group(kind),
            _ => {
                if g.is_statement() {
                    self.flush_pending()?;
                }
                match g.node() {
                    Some(node) => self.push_to_tip(Frame::leaf(node)),
                    None => Ok(()),
                }
            }
        }
    }

    fn continuation(&mut self) -> Result<(), Error> {
        let Some(frame) = self.exprs.pop() else {
            return Err(self.error(ErrorCode::P002, "continuation with nothing to continue"));
        };
        if frame.open || !frame.node.is_expression() {
            return Err(self.error(
                ErrorCode::P003,
                format!("continuation against non-expressive value `{}`", frame.node),
            ));
        }
        let tuple = match frame.node {
            Node::Tuple(items) => Frame { node: Node::Tuple(items), ..frame },
            other => Frame::over(Node::Tuple(vec![other]), frame.height),
        };
        self.push_to_tip(tuple)
    }

    fn infix(&mut self, op: BinaryOp) -> Result<(), Error> {
        let frame = match self.exprs.pop() {
            Some(frame) if !frame.open => frame,
            _ => return Err(self.error(ErrorCode::P004, "infix operator in invalid location")),
        };
        // A trailing tuple lends its last item as the left operand.
        let (left, height) = match frame.node {
            Node::Tuple(mut items) => {
                let Some(last) = items.pop() else {
                    return Err(self.error(ErrorCode::P004, "infix operator after an empty tuple"));
                };
                self.exprs.push(Frame { node: Node::Tuple(items), ..frame });
                (last, frame.height.saturating_sub(1))
            }
            other => (other, frame.height),
        };
        self.push_to_tip(Frame::over(Node::Binary { op, left: Box::new(left), right: None }, height))
    }

    fn block_end(&mut self) -> Result<(), Error> {
        if let Some(j) = self.exprs.iter().rposition(|f| f.open) {
            if let Some(inner) = self.collapse(j + 1)? {
                let (pos, max) = (self.pos, self.max_depth);
                attach(&mut self.exprs[j], inner, pos, max)?;
            }
            self.exprs[j].open = false;
            tracing::trace!(pos = self.pos, group = %self.exprs[j].node, "close group");
            return Ok(());
        }

        if self.blocks.len() <= 1 {
            return Err(self.error(ErrorCode::P005, "end of block detected outside of block"));
        }
        self.flush_pending()?;
        self.pop_block()
    }

    /// Whitespace: settle the top of the expression stack into its parent.
    fn commit(&mut self) -> Result<(), Error> {
        match self.exprs.last() {
            None => return Ok(()),
            Some(top) if top.open => return Ok(()),
            Some(_) => {}
        }
        let Some(mut frame) = self.exprs.pop() else { return Ok(()) };
        let (pos, max) = (self.pos, self.max_depth);

        // A finished tuple folds into its parent, which then settles in turn.
        if frame.node.is_tuple() {
            if let Some(parent) = self.exprs.last_mut() {
                attach(parent, frame, pos, max)?;
                if parent.open {
                    return Ok(());
                }
                match self.exprs.pop() {
                    Some(parent) => frame = parent,
                    None => return Ok(()),
                }
            }
        }

        let n = self.exprs.len();
        if n == 0 {
            return self.to_block(frame);
        }
        attach(&mut self.exprs[n - 1], frame, pos, max)?;
        tracing::trace!(pos, parent = %self.exprs[n - 1].node, "commit");

        // One more level: a settled operand whose grandparent is a tuple
        // joins that tuple as its next item.
        if n >= 2 && !self.exprs[n - 1].open && self.exprs[n - 2].node.is_tuple() {
            if let Some(item) = self.exprs.pop() {
                attach(&mut self.exprs[n - 2], item, pos, max)?;
            }
        }
        Ok(())
    }

    // ─── Stack primitives ────────────────────────────────────────────────────

    fn flush_literal(&mut self) -> Result<(), Error> {
        if self.literal.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.literal);
        let value = text
            .parse::<f64>()
            .map_err(|_| self.error(ErrorCode::P001, format!("invalid numeric literal `{text}`")))?;
        self.push_to_tip(Frame::leaf(Node::Literal(value)))
    }

    /// Shift a fresh node. Literals complete a pending tuple or infix operand
    /// in place; every other node gets its own frame.
    fn push_to_tip(&mut self, frame: Frame) -> Result<(), Error> {
        let (pos, max) = (self.pos, self.max_depth);
        if frame.height > max {
            return Err(too_deep(pos, max));
        }
        if let Some(top) = self.exprs.last_mut() {
            if top.node.is_literal() {
                return Err(Error::new(
                    ErrorCode::P007,
                    pos,
                    format!("cannot push `{}` onto literal `{}`", frame.node, top.node),
                ));
            }
            let waiting = matches!(top.node, Node::Tuple(_) | Node::Binary { right: None, .. });
            if waiting && frame.node.is_literal() {
                tracing::trace!(pos, node = %frame.node, parent = %top.node, "attach literal");
                return attach(top, frame, pos, max);
            }
        }
        tracing::trace!(pos, node = %frame.node, "shift");
        self.exprs.push(frame);
        Ok(())
    }

    fn open_group(&mut self, kind: BlockKind) -> Result<(), Error> {
        if let Some(top) = self.exprs.last().filter(|f| f.node.is_literal()) {
            let message = format!("cannot open `{}` group on literal `{}`", kind.name(), top.node);
            return Err(self.error(ErrorCode::P007, message));
        }
        tracing::trace!(pos = self.pos, kind = kind.name(), "open group");
        self.exprs.push(Frame { node: Node::Block { kind, body: Vec::new() }, open: true, height: 1 });
        Ok(())
    }

    fn open_block(&mut self, kind: ControlKind) -> Result<(), Error> {
        self.flush_pending()?;
        tracing::trace!(pos = self.pos, kind = kind.name(), "open block");
        self.blocks.push(Frame::leaf(Node::Control { kind, control: None, body: Vec::new() }));
        Ok(())
    }

    fn pop_block(&mut self) -> Result<(), Error> {
        let Some(mut block) = self.blocks.pop() else {
            return Err(self.error(ErrorCode::P005, "no block to close"));
        };
        if let Some(rest) = self.collapse(0)? {
            attach(&mut block, rest, self.pos, self.max_depth)?;
        }
        tracing::trace!(pos = self.pos, block = %block.node, "close block");
        self.to_block(block)
    }

    /// Pop every frame above `offset`, attaching each to the frame below it.
    /// The frame at `offset` itself is returned unattached.
    fn collapse(&mut self, offset: usize) -> Result<Option<Frame>, Error> {
        let (pos, max) = (self.pos, self.max_depth);
        while self.exprs.len() > offset {
            let Some(frame) = self.exprs.pop() else { break };
            if self.exprs.len() == offset {
                return Ok(Some(frame));
            }
            if let Some(top) = self.exprs.last_mut() {
                attach(top, frame, pos, max)?;
            }
        }
        Ok(None)
    }

    /// Collapse everything pending and make it a statement of the current block.
    fn flush_pending(&mut self) -> Result<(), Error> {
        match self.collapse(0)? {
            Some(node) => self.to_block(node),
            None => Ok(()),
        }
    }

    fn to_block(&mut self, frame: Frame) -> Result<(), Error> {
        let (pos, max) = (self.pos, self.max_depth);
        let Some(block) = self.blocks.last_mut() else {
            return Err(Error::new(ErrorCode::P005, pos, "no open block"));
        };
        tracing::trace!(pos, node = %frame.node, "statement");
        attach(block, frame, pos, max)
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> Error {
        Error::new(code, self.pos, message)
    }
}

/// Hang `child` under `parent`, refusing to grow the tree past `max` levels.
fn attach(parent: &mut Frame, child: Frame, pos: usize, max: usize) -> Result<(), Error> {
    let height = parent.height.max(child.height + 1);
    if height > max {
        return Err(too_deep(pos, max));
    }
    parent.node.attach(child.node).map_err(|child| {
        Error::new(ErrorCode::P007, pos, format!("`{}` takes no operand (got `{child}`)", parent.node))
    })?;
    parent.height = height;
    Ok(())
}

fn too_deep(pos: usize, max: usize) -> Error {
    Error::new(ErrorCode::P008, pos, format!("expression nested deeper than {max} levels"))
}
