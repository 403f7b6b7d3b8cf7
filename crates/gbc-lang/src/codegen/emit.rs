use crate::codegen::bytecode::{CompiledProgram, FailIdx, Op};
use crate::error::RuntimeError;
use crate::runtime::{required, tuple_items};
use crate::syntax::ast::{BlockKind, ControlKind, DrawOp, LogicalOp, Node, UnaryOp};

/// Accumulates ops while walking the tree. Forward jumps are emitted with a
/// placeholder target and patched once the target is known.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    ops: Vec<Op>,
    failures: Vec<RuntimeError>,
}

impl Emitter {
    fn emit(&mut self, op: Op) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }

    fn here(&self) -> usize { self.ops.len() }

    fn patch(&mut self, at: usize) {
        let target = self.here();
        self.patch_to(at, target);
    }

    fn patch_to(&mut self, at: usize, target: usize) {
        if let Some(op) = self.ops.get_mut(at) {
            op.set_target(target);
        }
    }

    /// Defer an evaluation-time error to the point where it would be raised.
    fn fail(&mut self, err: RuntimeError) {
        let idx = FailIdx(self.failures.len() as u32);
        self.failures.push(err);
        self.emit(Op::Fail(idx));
    }

    fn finish(mut self) -> CompiledProgram {
        self.emit(Op::Halt);
        CompiledProgram { ops: self.ops, failures: self.failures }
    }
}

impl Node {
    /// Generate a standalone executable unit for this subtree. Usually called
    /// on an optimized `Program`.
    pub fn generate_code(&self) -> CompiledProgram {
        let mut e = Emitter::default();
        self.emit(&mut e);
        e.finish()
    }

    /// Emit code leaving exactly one value on the stack.
    fn emit(&self, e: &mut Emitter) {
        match self {
            Node::Literal(v) => {
                e.emit(Op::Push(*v));
            }
            Node::Unary { op, operand } => match required(op.name(), operand) {
                Ok(operand) => emit_unary(*op, operand, e),
                Err(err) => e.fail(err),
            },
            Node::Logical { op, operand } => {
                match required(op.name(), operand).and_then(|o| tuple_items(op.name(), o, &[op.arity()])) {
                    Ok(items) => emit_logical(*op, items, e),
                    Err(err) => e.fail(err),
                }
            }
            Node::Draw { op, operand } => emit_draw(*op, operand, e),
            Node::Binary { op, left, right } => {
                left.emit(e);
                e.emit(Op::ToNumber);
                match required(op.symbol(), right) {
                    Ok(right) => {
                        right.emit(e);
                        e.emit(Op::Binary(*op));
                    }
                    Err(err) => e.fail(err),
                }
            }
            Node::Tuple(items) => {
                emit_numbers(items, e);
                e.emit(Op::MakeTuple(items.len() as u32));
            }
            Node::Block { kind, body } => emit_block(*kind, body, e),
            Node::Control { kind, control, body } => match required(kind.name(), control) {
                Ok(control) => emit_control(*kind, control, body, e),
                Err(err) => e.fail(err),
            },
            Node::CompoundAssign { op, key, value } => {
                key.emit(e);
                e.emit(Op::Key);
                e.emit(Op::Dup);
                e.emit(Op::Load);
                value.emit(e);
                e.emit(Op::Binary(*op));
                e.emit(Op::Store);
            }
            Node::Break => {
                e.emit(Op::Break);
            }
        }
    }
}

fn emit_numbers(items: &[Node], e: &mut Emitter) {
    for item in items {
        item.emit(e);
        e.emit(Op::ToNumber);
    }
}

/// Statements in order behind a result slot; a raised break skips the rest.
fn emit_sequence(body: &[Node], e: &mut Emitter) {
    e.emit(Op::Push(0.0));
    let mut exits = Vec::with_capacity(body.len());
    for stmt in body {
        stmt.emit(e);
        e.emit(Op::Replace);
        exits.push(e.emit(Op::JumpIfBreaking(usize::MAX)));
    }
    for at in exits {
        e.patch(at);
    }
}

fn emit_block(kind: BlockKind, body: &[Node], e: &mut Emitter) {
    match kind {
        BlockKind::Program => {
            emit_sequence(body, e);
            e.emit(Op::ClearBreak);
        }
        BlockKind::Group => emit_sequence(body, e),
        BlockKind::Any => {
            let mut hits = Vec::with_capacity(body.len());
            for child in body {
                child.emit(e);
                hits.push(e.emit(Op::JumpIfTruthyKeep(usize::MAX)));
            }
            e.emit(Op::Push(0.0));
            for at in hits {
                e.patch(at);
            }
        }
        BlockKind::All => {
            let mut misses = Vec::with_capacity(body.len());
            for child in body {
                child.emit(e);
                misses.push(e.emit(Op::JumpIfFalse(usize::MAX)));
            }
            e.emit(Op::Push(1.0));
            let done = e.emit(Op::Jump(usize::MAX));
            for at in misses {
                e.patch(at);
            }
            e.emit(Op::Push(0.0));
            e.patch(done);
        }
        BlockKind::Sum => {
            e.emit(Op::Push(0.0));
            for child in body {
                child.emit(e);
                e.emit(Op::Accumulate);
            }
        }
    }
}

fn emit_control(kind: ControlKind, control: &Node, body: &[Node], e: &mut Emitter) {
    match kind {
        ControlKind::Loop => {
            control.emit(e);
            e.emit(Op::ToNumber);
            e.emit(Op::LoopInit);
            let top = e.emit(Op::LoopNext(usize::MAX));
            emit_sequence(body, e);
            e.emit(Op::Pop);
            let brk = e.emit(Op::JumpIfBreaking(usize::MAX));
            e.emit(Op::Jump(top));
            e.patch(brk);
            e.emit(Op::LoopBreak);
            e.patch(top);
            e.emit(Op::Push(0.0));
        }
        ControlKind::Conditional => {
            control.emit(e);
            let skip = e.emit(Op::JumpIfFalse(usize::MAX));
            emit_sequence(body, e);
            e.emit(Op::Pop);
            e.patch(skip);
            e.emit(Op::Push(0.0));
        }
        ControlKind::Function => {
            control.emit(e);
            e.emit(Op::Key);
            let def = e.emit(Op::DefineFunction { skip: usize::MAX });
            emit_sequence(body, e);
            e.emit(Op::Return);
            e.patch(def);
        }
    }
}

fn emit_unary(op: UnaryOp, operand: &Node, e: &mut Emitter) {
    match op {
        UnaryOp::Not => {
            operand.emit(e);
            e.emit(Op::Not);
        }
        UnaryOp::Inverse => match operand {
            Node::Unary { op: trig, operand: inner } if trig.is_trig() => match required(trig.name(), inner) {
                Ok(inner) => {
                    inner.emit(e);
                    e.emit(Op::Arc(*trig));
                }
                Err(err) => e.fail(err),
            },
            other => e.fail(RuntimeError::unsupported_inversion(&other.describe())),
        },
        UnaryOp::Assign => match operand {
            Node::Tuple(_) => match tuple_items(op.name(), operand, &[2]) {
                Ok(items) => {
                    items[0].emit(e);
                    e.emit(Op::Key);
                    items[1].emit(e);
                    e.emit(Op::Store);
                }
                Err(err) => e.fail(err),
            },
            key => {
                key.emit(e);
                e.emit(Op::Load);
            }
        },
        UnaryOp::Call => match operand {
            Node::Tuple(items) if !items.is_empty() => {
                emit_numbers(items, e);
                e.emit(Op::Call { argc: items.len() as u32 - 1 });
            }
            id => {
                id.emit(e);
                e.emit(Op::Key);
                e.emit(Op::Call { argc: 0 });
            }
        },
        _ => {
            operand.emit(e);
            e.emit(Op::Unary(op));
        }
    }
}

fn emit_logical(op: LogicalOp, items: &[Node], e: &mut Emitter) {
    match op {
        LogicalOp::And => {
            items[0].emit(e);
            let zero = e.emit(Op::JumpIfFalse(usize::MAX));
            items[1].emit(e);
            let done = e.emit(Op::Jump(usize::MAX));
            e.patch(zero);
            e.emit(Op::Push(0.0));
            e.patch(done);
        }
        LogicalOp::Or => {
            items[0].emit(e);
            let done = e.emit(Op::JumpIfTruthyKeep(usize::MAX));
            items[1].emit(e);
            e.patch(done);
        }
        LogicalOp::IfThenElse => {
            items[0].emit(e);
            let other = e.emit(Op::JumpIfFalse(usize::MAX));
            items[1].emit(e);
            let done = e.emit(Op::Jump(usize::MAX));
            e.patch(other);
            items[2].emit(e);
            e.patch(done);
        }
        LogicalOp::Xor => {
            items[0].emit(e);
            items[1].emit(e);
            e.emit(Op::Xor);
        }
    }
}

fn emit_draw(op: DrawOp, operand: &Option<Box<Node>>, e: &mut Emitter) {
    let argc = match op.arity() {
        Some(arity) => match required(op.name(), operand).and_then(|o| tuple_items(op.name(), o, arity)) {
            Ok(items) => {
                emit_numbers(items, e);
                items.len()
            }
            Err(err) => return e.fail(err),
        },
        None if op.takes_operand() => match required(op.name(), operand) {
            Ok(operand) => {
                operand.emit(e);
                e.emit(Op::ToNumber);
                1
            }
            Err(err) => return e.fail(err),
        },
        None => 0,
    };
    e.emit(Op::Draw { op, argc: argc as u32 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_jumps_are_patched() {
        let program = Node::Logical {
            op: LogicalOp::Or,
            operand: Some(Box::new(Node::Tuple(vec![Node::Literal(0.0), Node::Literal(5.0)]))),
        }
        .generate_code();
        assert_eq!(
            program.ops(),
            &[Op::Push(0.0), Op::JumpIfTruthyKeep(3), Op::Push(5.0), Op::Halt],
        );
    }

    #[test]
    fn shape_errors_become_failures() {
        let program = Node::Logical { op: LogicalOp::And, operand: Some(Box::new(Node::Literal(1.0))) }.generate_code();
        assert_eq!(program.ops(), &[Op::Fail(FailIdx(0)), Op::Halt]);
        assert_eq!(program.failures[0].code, crate::error::ErrorCode::R001);
    }

    #[test]
    fn jump_targets_stay_in_bounds() {
        let program = crate::syntax::parser::Parser::new("L3 i1 ;) d) {1 V0 a1) A1 0)) &0,1")
            .parse()
            .unwrap()
            .generate_code();
        for op in program.ops() {
            let target = match *op {
                Op::Jump(t)
                | Op::JumpIfFalse(t)
                | Op::JumpIfTruthyKeep(t)
                | Op::JumpIfBreaking(t)
                | Op::LoopNext(t)
                | Op::DefineFunction { skip: t } => t,
                _ => continue,
            };
            assert!(target < program.len(), "`{op}` jumps out of range");
        }
    }
}
