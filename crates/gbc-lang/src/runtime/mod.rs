pub mod context;
pub mod interpreter;
pub mod value;

pub use context::{Context, Limits};
pub use value::Value;

use crate::error::RuntimeError;
use crate::surface::Surface;
use crate::syntax::ast::{percent, DrawOp, Node};

// ─── Operand shape checks ─────────────────────────────────────────────────────
//
// Shared by the tree walker, which runs them at evaluation time, and the code
// generator, which turns a failed check into a deferred failure.

pub(crate) fn required<'n>(what: &str, operand: &'n Option<Box<Node>>) -> Result<&'n Node, RuntimeError> {
    operand.as_deref().ok_or_else(|| RuntimeError::missing_operand(what))
}

/// Items of a tuple operand whose length is one of `arity`.
pub(crate) fn tuple_items<'n>(what: &str, operand: &'n Node, arity: &[usize]) -> Result<&'n [Node], RuntimeError> {
    match operand {
        Node::Tuple(items) if arity.contains(&items.len()) => Ok(items),
        Node::Tuple(items) => Err(RuntimeError::arity(what, arity, items.len())),
        _ => Err(RuntimeError::tuple_expected(what)),
    }
}

// ─── Drawing ─────────────────────────────────────────────────────────────────

/// Forward an evaluated drawing op to the surface. `args` has already passed
/// the arity check for `op`.
pub(crate) fn apply_draw(surface: &mut dyn Surface, op: DrawOp, args: &[f64]) {
    let arg = |i: usize| args.get(i).copied().unwrap_or(0.0);
    let alpha = args.get(3).copied().unwrap_or(1.0);
    match op {
        DrawOp::SetRgba         => surface.set_color(arg(0) as i32, arg(1) as i32, arg(2) as i32, alpha),
        DrawOp::SetHsla         => surface.set_hsl(arg(0) as i32, percent(arg(1)) as i32, percent(arg(2)) as i32, alpha),
        DrawOp::SetHslaPercent  => surface.set_hsl(arg(0) as i32, arg(1) as i32, arg(2) as i32, alpha),
        DrawOp::SetCursor       => surface.set_cursor(arg(0), arg(1)),
        DrawOp::Translate       => surface.translate(arg(0), arg(1)),
        DrawOp::Rotate          => surface.rotate(arg(0)),
        DrawOp::Scale           => surface.scale(arg(0), arg(1)),
        DrawOp::ClearTransforms => surface.clear_transforms(),
        DrawOp::PopTransform    => surface.pop_transform(),
        DrawOp::Dot             => surface.draw_dot(),
        DrawOp::Line            => surface.draw_line(),
    }
}
