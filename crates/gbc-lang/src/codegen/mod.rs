//! Ahead-of-time code generation: a flat bytecode program for a small stack
//! machine, reproducing the tree walker's surface calls op for op.

pub mod bytecode;
pub mod emit;
pub mod vm;

pub use bytecode::{CompiledProgram, FailIdx, Op};
pub use vm::VmContext;
