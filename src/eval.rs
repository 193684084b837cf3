//! Tree-walking evaluator.
//!
//! Evaluation is total: every node produces an `f64`, and runtime problems
//! (out-of-range index, bitwise domain violations, aggregates over
//! non-array operands) surface as NaN rather than panics or errors.

use crate::types::{Callable, Expr, MAX_ARITY};
use core::cell::Cell;
use core::fmt;

impl Expr<'_> {
    /// Evaluates the tree to a value.
    ///
    /// Children evaluate left to right. The caller must not mutate the
    /// bound storage concurrently with evaluation; updating cells between
    /// evaluations is the intended use.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Constant(value) => *value,
            Expr::Scalar(cell) => cell.get(),
            Expr::Array(values) => values.len() as f64,
            Expr::Index { array, index } => {
                let idx = libm::trunc(index.eval());
                // the comparison also rejects NaN and infinite indices
                if idx >= 0.0 && idx < array.len() as f64 {
                    array[idx as usize].get()
                } else {
                    f64::NAN
                }
            }
            Expr::Call { func, args, .. } => {
                if let Callable::Aggregate { array_params, func } = func {
                    return eval_aggregate(*array_params, *func, args);
                }
                let mut values = [0.0; MAX_ARITY];
                for (slot, arg) in values.iter_mut().zip(args) {
                    *slot = arg.eval();
                }
                match func {
                    Callable::Static(f) => f(&values[..args.len()]),
                    Callable::Shared(f) => f(&values[..args.len()]),
                    Callable::Aggregate { .. } => f64::NAN, // handled above
                }
            }
        }
    }
}

/// Calls an aggregate built-in. The leading `array_params` arguments must
/// be bare array variables, passed through by reference; anything else
/// makes the call NaN. The remaining arguments evaluate as scalars.
fn eval_aggregate(
    array_params: usize,
    func: fn(&[&[Cell<f64>]], &[f64]) -> f64,
    args: &[Expr<'_>],
) -> f64 {
    let mut arrays: [&[Cell<f64>]; MAX_ARITY] = [&[]; MAX_ARITY];
    for (slot, arg) in arrays.iter_mut().zip(&args[..array_params]) {
        match arg {
            Expr::Array(values) => *slot = values,
            _ => return f64::NAN,
        }
    }
    let rest = &args[array_params..];
    let mut scalars = [0.0; MAX_ARITY];
    for (slot, arg) in scalars.iter_mut().zip(rest) {
        *slot = arg.eval();
    }
    func(&arrays[..array_params], &scalars[..rest.len()])
}

/// Indented one-node-per-line dump of the tree, for debugging host
/// integrations. Bound storage is shown by shape, not by address.
impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}

impl Expr<'_> {
    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        match self {
            Expr::Constant(value) => writeln!(f, "const {}", value),
            Expr::Scalar(_) => writeln!(f, "scalar"),
            Expr::Array(values) => writeln!(f, "array[{}]", values.len()),
            Expr::Index { array, index } => {
                writeln!(f, "index array[{}]", array.len())?;
                index.fmt_node(f, depth + 1)
            }
            Expr::Call { args, .. } => {
                writeln!(f, "call/{}", args.len())?;
                for arg in args {
                    arg.fmt_node(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}
