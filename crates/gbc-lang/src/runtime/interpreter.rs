//! Tree-walking interpreter. Evaluates a node directly against a `Context`,
//! forwarding drawing side effects to its surface as they happen.

use crate::error::RuntimeError;
use crate::runtime::{apply_draw, required, tuple_items, Context, Value};
use crate::syntax::ast::{truth, BlockKind, ControlKind, DrawOp, LogicalOp, Node, UnaryOp};

/// Context of the tree walker: functions are their definition nodes.
pub type TreeContext<'p, 's> = Context<'s, &'p Node>;

impl Node {
    pub fn run<'p>(&'p self, ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
        match self {
            Node::Literal(v) => Ok(Value::Number(*v)),
            Node::Unary { op, operand } => run_unary(*op, required(op.name(), operand)?, ctx),
            Node::Logical { op, operand } => run_logical(*op, required(op.name(), operand)?, ctx),
            Node::Draw { op, operand } => run_draw(*op, operand, ctx),
            Node::Binary { op, left, right } => {
                let l = left.run(ctx)?.as_number()?;
                let r = required(op.symbol(), right)?.run(ctx)?.as_number()?;
                Ok(Value::Number(op.apply(l, r)))
            }
            Node::Tuple(items) => numbers(items, ctx).map(Value::Tuple),
            Node::Block { kind, body } => run_block(*kind, body, ctx),
            Node::Control { kind, control, body } => {
                let control = required(kind.name(), control)?;
                match kind {
                    ControlKind::Loop => run_loop(control, body, ctx),
                    ControlKind::Conditional => {
                        if control.run(ctx)?.truthy() {
                            run_sequence(body, ctx)?;
                        }
                        Ok(Value::ZERO)
                    }
                    ControlKind::Function => {
                        let key = control.run(ctx)?.key()?;
                        ctx.define(key, self);
                        Ok(Value::Number(key as f64))
                    }
                }
            }
            Node::CompoundAssign { op, key, value } => {
                let key = key.run(ctx)?.key()?;
                let current = ctx.var(key);
                let v = value.run(ctx)?.as_number()?;
                let out = op.apply(current, v);
                ctx.set_var(key, out);
                Ok(Value::Number(out))
            }
            Node::Break => {
                ctx.breaking = true;
                Ok(Value::ZERO)
            }
        }
    }
}

fn numbers<'p>(items: &'p [Node], ctx: &mut TreeContext<'p, '_>) -> Result<Vec<f64>, RuntimeError> {
    items.iter().map(|n| n.run(ctx)?.as_number()).collect()
}

/// Run statements in order, stopping early when a break is raised. Yields the
/// value of the last statement run.
fn run_sequence<'p>(body: &'p [Node], ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    let mut last = Value::ZERO;
    for stmt in body {
        last = stmt.run(ctx)?;
        if ctx.breaking {
            break;
        }
    }
    Ok(last)
}

fn run_block<'p>(kind: BlockKind, body: &'p [Node], ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    match kind {
        BlockKind::Program => {
            let result = run_sequence(body, ctx);
            ctx.breaking = false;
            result
        }
        BlockKind::Group => run_sequence(body, ctx),
        BlockKind::Any => {
            for child in body {
                let v = child.run(ctx)?;
                if v.truthy() {
                    return Ok(v);
                }
            }
            Ok(Value::ZERO)
        }
        BlockKind::All => {
            for child in body {
                if !child.run(ctx)?.truthy() {
                    return Ok(Value::ZERO);
                }
            }
            Ok(Value::Number(1.0))
        }
        BlockKind::Sum => {
            let mut total = 0.0;
            for child in body {
                total += child.run(ctx)?.total();
            }
            Ok(Value::Number(total))
        }
    }
}

fn run_loop<'p>(control: &'p Node, body: &'p [Node], ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    let count = control.run(ctx)?.as_number()?;
    let times = loop_count(count)?;
    for _ in 0..times {
        run_sequence(body, ctx)?;
        if ctx.breaking {
            ctx.breaking = false;
            break;
        }
    }
    Ok(Value::ZERO)
}

/// Iterations for a loop control value: `ceil(count)`, none for NaN.
pub(crate) fn loop_count(count: f64) -> Result<u64, RuntimeError> {
    if count < 0.0 {
        return Err(RuntimeError::negative_loop(count));
    }
    if count.is_nan() { Ok(0) } else { Ok(count.ceil() as u64) }
}

// ─── Prefix operations ────────────────────────────────────────────────────────

fn run_unary<'p>(op: UnaryOp, operand: &'p Node, ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Number(truth(!operand.run(ctx)?.truthy()))),
        UnaryOp::Inverse => match operand {
            Node::Unary { op: trig, operand: inner } if trig.is_trig() => {
                let x = required(trig.name(), inner)?.run(ctx)?.as_number()?;
                Ok(Value::Number(trig.arc(x).unwrap_or(f64::NAN)))
            }
            other => Err(RuntimeError::unsupported_inversion(&other.describe())),
        },
        UnaryOp::Assign => match operand {
            Node::Tuple(_) => {
                let items = tuple_items(op.name(), operand, &[2])?;
                let key = items[0].run(ctx)?.key()?;
                let value = items[1].run(ctx)?.as_number()?;
                ctx.set_var(key, value);
                Ok(Value::Number(value))
            }
            key => {
                let key = key.run(ctx)?.key()?;
                Ok(Value::Number(ctx.var(key)))
            }
        },
        UnaryOp::Call => {
            let (id, args) = match operand {
                Node::Tuple(items) if !items.is_empty() => {
                    let values = numbers(items, ctx)?;
                    (values[0] as i64, values[1..].to_vec())
                }
                id => (id.run(ctx)?.key()?, Vec::new()),
            };
            call(id, &args, ctx)
        }
        _ => {
            let x = operand.run(ctx)?.as_number()?;
            Ok(Value::Number(op.apply(x).unwrap_or(f64::NAN)))
        }
    }
}

fn call<'p>(id: i64, args: &[f64], ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    let Some(def) = ctx.function(id) else {
        return Err(RuntimeError::undefined_function(id));
    };
    if ctx.depth >= ctx.limits.max_call_depth {
        return Err(RuntimeError::call_depth(ctx.limits.max_call_depth));
    }
    let Node::Control { body, .. } = def else {
        return Err(RuntimeError::undefined_function(id));
    };
    tracing::debug!(id, argc = args.len(), depth = ctx.depth, "call");

    ctx.bind_args(args);
    ctx.depth += 1;
    let result = run_sequence(body, ctx);
    ctx.depth -= 1;

    let result = result?;
    if ctx.breaking {
        ctx.breaking = false;
        return Ok(Value::ZERO);
    }
    Ok(result.or_zero())
}

fn run_logical<'p>(op: LogicalOp, operand: &'p Node, ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    let items = tuple_items(op.name(), operand, &[op.arity()])?;
    match op {
        LogicalOp::And => {
            let l = items[0].run(ctx)?;
            if l.truthy() { items[1].run(ctx) } else { Ok(Value::ZERO) }
        }
        LogicalOp::Or => {
            let l = items[0].run(ctx)?;
            if l.truthy() { Ok(l) } else { items[1].run(ctx) }
        }
        LogicalOp::IfThenElse => {
            if items[0].run(ctx)?.truthy() { items[1].run(ctx) } else { items[2].run(ctx) }
        }
        LogicalOp::Xor => {
            let a = items[0].run(ctx)?.truthy();
            let b = items[1].run(ctx)?.truthy();
            Ok(Value::Number(truth(a != b)))
        }
    }
}

fn run_draw<'p>(op: DrawOp, operand: &'p Option<Box<Node>>, ctx: &mut TreeContext<'p, '_>) -> Result<Value, RuntimeError> {
    let args = match op.arity() {
        Some(arity) => {
            let items = tuple_items(op.name(), required(op.name(), operand)?, arity)?;
            numbers(items, ctx)?
        }
        None if op.takes_operand() => vec![required(op.name(), operand)?.run(ctx)?.as_number()?],
        None => Vec::new(),
    };
    apply_draw(&mut *ctx.surface, op, &args);
    Ok(Value::ZERO)
}
