//! Constant folding.
//!
//! A single recursive pass run by `compile` after parsing. Only pure calls
//! are considered: their children are folded first, and if every child
//! reduced to a constant the call itself is evaluated once and replaced by
//! the result. Scalar and array references, index nodes, and impure calls
//! are left untouched, so folding never changes what an evaluation under
//! any variable binding would observe.

use crate::types::Expr;

pub(crate) fn optimize(node: &mut Expr<'_>) {
    let known = match node {
        Expr::Call {
            pure: true, args, ..
        } => {
            let mut known = true;
            for arg in args.iter_mut() {
                optimize(arg);
                if !matches!(arg, Expr::Constant(_)) {
                    known = false;
                }
            }
            known
        }
        _ => false,
    };
    if known {
        *node = Expr::Constant(node.eval());
    }
}
