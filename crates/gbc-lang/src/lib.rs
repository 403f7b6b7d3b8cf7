pub mod codegen;
pub mod error;
pub mod optimize;
pub mod runtime;
pub mod surface;
pub mod syntax;

pub use codegen::CompiledProgram;
pub use error::{Error, ErrorCode, GbcError, RuntimeError};
pub use runtime::interpreter::TreeContext;
pub use runtime::{Context, Limits, Value};
pub use surface::{Pen, Recorder, Surface, SurfaceCall};
pub use syntax::ast::Node;

use std::fmt;

// ─── Program ──────────────────────────────────────────────────────────────────

/// A parsed program. Produced by `parse`; the root is always a `Program` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    root: Node,
}

impl Program {
    pub fn root(&self) -> &Node { &self.root }

    /// Interpret against a caller-owned context, which stays inspectable
    /// afterwards.
    pub fn run<'p>(&'p self, ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
        self.root.run(ctx)
    }

    /// Interpret against a fresh context.
    pub fn run_on(&self, surface: &mut dyn Surface, limits: Limits) -> Result<Value, RuntimeError> {
        let mut ctx = TreeContext::with_limits(surface, limits);
        self.run(&mut ctx)
    }

    pub fn optimize(self) -> Program { Program { root: self.root.optimize() } }

    pub fn generate_code(&self) -> CompiledProgram { self.root.generate_code() }

    /// Optimize, then generate code.
    pub fn compile(self) -> CompiledProgram { self.optimize().generate_code() }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.root) }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Build the program tree for `source`.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Program, Error> {
    let root = syntax::parser::Parser::new(source).parse()?;
    Ok(Program { root })
}

/// Parse, then run directly against `surface`.
pub fn interpret(source: &str, surface: &mut dyn Surface) -> Result<Value, GbcError> {
    interpret_with(source, surface, Limits::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn interpret_with(source: &str, surface: &mut dyn Surface, limits: Limits) -> Result<Value, GbcError> {
    let program = parse(source)?;
    Ok(program.run_on(surface, limits)?)
}

/// Parse, optimize and generate a unit that can be invoked any number of
/// times, each against its own surface.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn compile(source: &str) -> Result<CompiledProgram, Error> {
    let program = parse(source)?;
    let compiled = program.compile();
    tracing::debug!(ops = compiled.len(), "generated");
    Ok(compiled)
}
