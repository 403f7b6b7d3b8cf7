use std::fmt;

use crate::error::RuntimeError;
use crate::syntax::ast::{BinaryOp, DrawOp, UnaryOp};

/// Index into `CompiledProgram::failures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailIdx(pub u32);

/// One VM instruction. Jump targets are absolute op indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Push(f64),
    Pop,
    Dup,
    /// `[slot, v]` → `[v]`: keep the newest statement value.
    Replace,

    /// Coerce the top to a number (R006 for tuples).
    ToNumber,
    /// Coerce the top to an integer key.
    Key,
    MakeTuple(u32),

    Unary(UnaryOp),
    Not,
    Arc(UnaryOp),
    Binary(BinaryOp),
    Xor,

    /// `[key]` → `[value]`
    Load,
    /// `[key, value]` → `[value]`
    Store,
    /// `[id, arg0, …]` → `[result]`
    Call { argc: u32 },
    /// Registers the function whose body starts right after this op, then
    /// jumps to `skip`.
    DefineFunction { skip: usize },
    Return,

    Jump(usize),
    /// Pops the condition.
    JumpIfFalse(usize),
    /// Jumps keeping the value when truthy, pops it otherwise.
    JumpIfTruthyKeep(usize),
    JumpIfBreaking(usize),

    /// Pops the count and opens a loop counter.
    LoopInit,
    /// Jumps to the target and drops the counter once it is exhausted.
    LoopNext(usize),
    /// Leaves the innermost loop on a break: clears the signal, drops the counter.
    LoopBreak,

    Break,
    ClearBreak,
    /// `[acc, v]` → `[acc + total(v)]`
    Accumulate,

    Draw { op: DrawOp, argc: u32 },
    Fail(FailIdx),
    Halt,
}

impl Op {
    /// Rewrites the target of a jump-carrying op.
    pub(crate) fn set_target(&mut self, target: usize) {
        match self {
            Self::Jump(t)
            | Self::JumpIfFalse(t)
            | Self::JumpIfTruthyKeep(t)
            | Self::JumpIfBreaking(t)
            | Self::LoopNext(t)
            | Self::DefineFunction { skip: t } => *t = target,
            _ => {}
        }
    }
}

/// Self-contained executable unit produced by `Node::generate_code`.
/// Carries no run state; every `invoke` starts from a fresh context.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub(crate) ops: Vec<Op>,
    /// Evaluation-time errors detected while generating code, raised when
    /// their `Fail` op is reached.
    pub(crate) failures: Vec<RuntimeError>,
}

impl CompiledProgram {
    pub fn ops(&self) -> &[Op] { &self.ops }

    pub fn len(&self) -> usize { self.ops.len() }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    /// Human-readable listing, one op per line.
    pub fn disassemble(&self) -> String { self.to_string() }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(v)                 => write!(f, "push {v}"),
            Self::Pop                     => f.write_str("pop"),
            Self::Dup                     => f.write_str("dup"),
            Self::Replace                 => f.write_str("replace"),
            Self::ToNumber                => f.write_str("to_number"),
            Self::Key                     => f.write_str("key"),
            Self::MakeTuple(n)            => write!(f, "tuple {n}"),
            Self::Unary(op)               => write!(f, "{}", op.name()),
            Self::Not                     => f.write_str("not"),
            Self::Arc(op)                 => write!(f, "arc {}", op.name()),
            Self::Binary(op)              => write!(f, "bin {}", op.symbol()),
            Self::Xor                     => f.write_str("xor"),
            Self::Load                    => f.write_str("load"),
            Self::Store                   => f.write_str("store"),
            Self::Call { argc }           => write!(f, "call {argc}"),
            Self::DefineFunction { skip } => write!(f, "define -> {skip}"),
            Self::Return                  => f.write_str("return"),
            Self::Jump(t)                 => write!(f, "jump -> {t}"),
            Self::JumpIfFalse(t)          => write!(f, "jump_if_false -> {t}"),
            Self::JumpIfTruthyKeep(t)     => write!(f, "jump_if_truthy_keep -> {t}"),
            Self::JumpIfBreaking(t)       => write!(f, "jump_if_breaking -> {t}"),
            Self::LoopInit                => f.write_str("loop_init"),
            Self::LoopNext(t)             => write!(f, "loop_next -> {t}"),
            Self::LoopBreak               => f.write_str("loop_break"),
            Self::Break                   => f.write_str("break"),
            Self::ClearBreak              => f.write_str("clear_break"),
            Self::Accumulate              => f.write_str("accumulate"),
            Self::Draw { op, argc }       => write!(f, "draw {} {argc}", op.name()),
            Self::Fail(idx)               => write!(f, "fail #{}", idx.0),
            Self::Halt                    => f.write_str("halt"),
        }
    }
}

impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "{i:>4}  {op}")?;
        }
        for (i, e) in self.failures.iter().enumerate() {
            writeln!(f, "   #{i}  {e}")?;
        }
        Ok(())
    }
}
