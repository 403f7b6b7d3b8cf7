use crate::codegen::bytecode::{CompiledProgram, Op};
use crate::error::RuntimeError;
use crate::runtime::interpreter::loop_count;
use crate::runtime::{apply_draw, Context, Limits, Value};
use crate::surface::Surface;
use crate::syntax::ast::truth;

/// Context of the VM: functions are the address of their first body op.
pub type VmContext<'s> = Context<'s, usize>;

impl CompiledProgram {
    /// Run against `surface` with a fresh context and default limits.
    pub fn invoke(&self, surface: &mut dyn Surface) -> Result<Value, RuntimeError> {
        self.invoke_with(surface, Limits::default())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(ops = self.ops.len()))]
    pub fn invoke_with(&self, surface: &mut dyn Surface, limits: Limits) -> Result<Value, RuntimeError> {
        let mut ctx = VmContext::with_limits(surface, limits);
        Machine::default().run(self, &mut ctx)
    }
}

#[derive(Debug, Default)]
struct Machine {
    stack: Vec<Value>,
    /// Remaining iterations of each open loop, innermost last.
    loops: Vec<u64>,
    /// Return addresses.
    frames: Vec<usize>,
    ip: usize,
}

impl Machine {
    fn run(&mut self, program: &CompiledProgram, ctx: &mut VmContext<'_>) -> Result<Value, RuntimeError> {
        loop {
            let Some(&op) = program.ops.get(self.ip) else {
                return Err(RuntimeError::malformed("ran past the last op", self.ip));
            };
            let mut next = self.ip + 1;

            match op {
                Op::Push(v) => self.stack.push(Value::Number(v)),
                Op::Pop => {
                    self.pop()?;
                }
                Op::Dup => {
                    let v = self.peek()?.clone();
                    self.stack.push(v);
                }
                Op::Replace => {
                    let v = self.pop()?;
                    self.pop()?;
                    self.stack.push(v);
                }

                Op::ToNumber => {
                    let x = self.pop()?.as_number()?;
                    self.stack.push(Value::Number(x));
                }
                Op::Key => {
                    let k = self.pop()?.key()?;
                    self.stack.push(Value::Number(k as f64));
                }
                Op::MakeTuple(n) => {
                    let items = self.pop_numbers(n as usize)?;
                    self.stack.push(Value::Tuple(items));
                }

                Op::Unary(op) => {
                    let x = self.pop()?.as_number()?;
                    self.stack.push(Value::Number(op.apply(x).unwrap_or(f64::NAN)));
                }
                Op::Not => {
                    let v = self.pop()?;
                    self.stack.push(Value::Number(truth(!v.truthy())));
                }
                Op::Arc(trig) => {
                    let x = self.pop()?.as_number()?;
                    self.stack.push(Value::Number(trig.arc(x).unwrap_or(f64::NAN)));
                }
                Op::Binary(op) => {
                    let r = self.pop()?.as_number()?;
                    let l = self.pop()?.as_number()?;
                    self.stack.push(Value::Number(op.apply(l, r)));
                }
                Op::Xor => {
                    let b = self.pop()?.truthy();
                    let a = self.pop()?.truthy();
                    self.stack.push(Value::Number(truth(a != b)));
                }

                Op::Load => {
                    let key = self.pop()?.key()?;
                    self.stack.push(Value::Number(ctx.var(key)));
                }
                Op::Store => {
                    let value = self.pop()?.as_number()?;
                    let key = self.pop()?.key()?;
                    ctx.set_var(key, value);
                    self.stack.push(Value::Number(value));
                }
                Op::Call { argc } => {
                    let args = self.pop_numbers(argc as usize)?;
                    let id = self.pop()?.key()?;
                    let Some(addr) = ctx.function(id) else {
                        return Err(RuntimeError::undefined_function(id));
                    };
                    if ctx.depth >= ctx.limits.max_call_depth {
                        return Err(RuntimeError::call_depth(ctx.limits.max_call_depth));
                    }
                    tracing::debug!(id, argc, depth = ctx.depth, "call");
                    ctx.bind_args(&args);
                    ctx.depth += 1;
                    self.frames.push(next);
                    next = addr;
                }
                Op::DefineFunction { skip } => {
                    let key = self.pop()?.key()?;
                    ctx.define(key, next);
                    self.stack.push(Value::Number(key as f64));
                    next = skip;
                }
                Op::Return => {
                    let result = self.pop()?;
                    let Some(ret) = self.frames.pop() else {
                        return Err(RuntimeError::malformed("return outside a call", self.ip));
                    };
                    ctx.depth -= 1;
                    let result = if ctx.breaking {
                        ctx.breaking = false;
                        Value::ZERO
                    } else {
                        result.or_zero()
                    };
                    self.stack.push(result);
                    next = ret;
                }

                Op::Jump(target) => next = target,
                Op::JumpIfFalse(target) => {
                    if !self.pop()?.truthy() {
                        next = target;
                    }
                }
                Op::JumpIfTruthyKeep(target) => {
                    if self.peek()?.truthy() {
                        next = target;
                    } else {
                        self.pop()?;
                    }
                }
                Op::JumpIfBreaking(target) => {
                    if ctx.breaking {
                        next = target;
                    }
                }

                Op::LoopInit => {
                    let count = self.pop()?.as_number()?;
                    self.loops.push(loop_count(count)?);
                }
                Op::LoopNext(exit) => {
                    let Some(remaining) = self.loops.last_mut() else {
                        return Err(RuntimeError::malformed("loop_next without a loop", self.ip));
                    };
                    if *remaining == 0 {
                        self.loops.pop();
                        next = exit;
                    } else {
                        *remaining -= 1;
                    }
                }
                Op::LoopBreak => {
                    ctx.breaking = false;
                    self.loops.pop();
                }

                Op::Break => {
                    ctx.breaking = true;
                    self.stack.push(Value::ZERO);
                }
                Op::ClearBreak => ctx.breaking = false,
                Op::Accumulate => {
                    let v = self.pop()?;
                    let acc = self.pop()?.as_number()?;
                    self.stack.push(Value::Number(acc + v.total()));
                }

                Op::Draw { op, argc } => {
                    let args = self.pop_numbers(argc as usize)?;
                    apply_draw(&mut *ctx.surface, op, &args);
                    self.stack.push(Value::ZERO);
                }
                Op::Fail(idx) => {
                    let err = program.failures.get(idx.0 as usize).cloned();
                    return Err(err.unwrap_or_else(|| RuntimeError::malformed("unknown failure", self.ip)));
                }
                Op::Halt => return self.pop(),
            }

            self.ip = next;
        }
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::malformed("stack underflow", self.ip))
    }

    fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or_else(|| RuntimeError::malformed("stack underflow", self.ip))
    }

    /// Pop `n` values pushed in order, as numbers.
    fn pop_numbers(&mut self, n: usize) -> Result<Vec<f64>, RuntimeError> {
        if self.stack.len() < n {
            return Err(RuntimeError::malformed("stack underflow", self.ip));
        }
        let start = self.stack.len() - n;
        self.stack.drain(start..).map(|v| v.as_number()).collect()
    }
}
