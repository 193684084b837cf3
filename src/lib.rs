#![cfg_attr(not(test), no_std)]
#![doc = r#"
# miniexpr

A tiny, embeddable math expression compiler and evaluator.

miniexpr takes a textual expression together with a caller-supplied symbol
table (scalar variables, array variables, and native functions) and compiles
it into an expression tree that can be evaluated repeatedly to an `f64`.
It is meant to be dropped into larger host programs that need a safe,
lightweight way to let users or configuration files specify formulae.

The crate is `no_std` (with `alloc`) and does all of its math through
[`libm`], so it behaves the same on hosted and embedded targets.

## Quick start

```rust
use miniexpr::interp;

let result = interp("2 + 3 * 4").unwrap();
assert_eq!(result, 14.0);

let result = interp("sin(pi/4) + cos(pi/4)").unwrap();
assert!((result - 1.414).abs() < 0.001);
```

## Variables

Scalar variables are bound through shared [`Cell`](core::cell::Cell)
references, so the caller can update them between evaluations without
recompiling:

```rust
use core::cell::Cell;
use miniexpr::{compile, Symbol};

let x = Cell::new(5.0);
let y = Cell::new(10.0);
let symbols = [Symbol::scalar("x", &x), Symbol::scalar("y", &y)];

let expr = compile("x + y * 2", &symbols).unwrap();
assert_eq!(expr.eval(), 25.0);

x.set(7.0);
assert_eq!(expr.eval(), 27.0);
```

## Arrays

Array variables are slices of cells. They are indexed with the postfix
`[index]` operator (indices truncate toward zero, out-of-range reads give
NaN) and can be passed whole to the aggregate built-ins `sum`, `arrmin`,
`arrmax`, `arrlen`, and `linear_interpolate`:

```rust
use core::cell::Cell;
use miniexpr::{compile, Symbol};

let data = [10.0, 20.0, 30.0].map(Cell::new);
let symbols = [Symbol::array("data", &data)];

assert_eq!(compile("data[1]", &symbols).unwrap().eval(), 20.0);
assert_eq!(compile("sum(data)", &symbols).unwrap().eval(), 60.0);
assert!(compile("data[5]", &symbols).unwrap().eval().is_nan());
```

## Native functions

Callers can expose their own functions (arity 0 to 7). A capturing closure
gives the function state; marking it [`pure`](Symbol::pure) lets the
constant folder evaluate it at compile time when all arguments are known:

```rust
use miniexpr::{compile, Symbol};

let symbols = [Symbol::native("clamp01", 1, |args: &[f64]| {
    args[0].clamp(0.0, 1.0)
}).pure()];

let expr = compile("clamp01(1.7)", &symbols).unwrap();
assert_eq!(expr.eval(), 1.0);
```

## Grammar

```text
list    := expr (',' expr)*
expr    := term   (('+'|'-') term)*
term    := factor (('*'|'/'|'%'|'&'|'|') factor)*
factor  := power  ('^' power)*
power   := ('+'|'-')* base
base    := number
         | variable postfix?
         | func0 ('(' ')')?
         | func1 power
         | funcN '(' expr (',' expr){N-1} ')'
postfix := '[' list ']'
```

Single-argument functions may be applied by juxtaposition (`sin x`,
`abs -5`). The comma inside parentheses or brackets folds a sequence of
expressions to the value of the last one. `^` is left-associative by
default; the `pow-from-right` feature makes it right-associative and makes
`-a^b` parse as `-(a^b)`.

`&`, `|`, `xor`, and `bit` operate on 53-bit unsigned integers: operands
are rounded to nearest, and anything negative, NaN, or above 2^53 - 1 makes
the result NaN.

## Built-in functions

`abs acos asin atan atan2 bit ceil cos cosh e exp fac floor ln log log10
ncr npr pi pow sin sinh sqrt tan tanh xor` plus the array aggregates
`arrlen arrmax arrmin sum linear_interpolate`. `log` is base-10 unless the
`natural-log` feature is enabled.

## Errors

Compilation returns [`ExprError`] with the 1-based byte position of the
failure. Evaluation is total: it never panics or errors, and reports
runtime problems (bad index, bitwise domain, factorial of a negative, ...)
as NaN, or +∞ for integer overflow in `fac`/`ncr`.
"#]

extern crate alloc;

pub mod engine;
pub mod error;
pub mod types;

mod eval;
mod functions;
mod lexer;
mod optimize;

pub use engine::{compile, interp};
pub use error::{ExprError, Result};
pub use types::{Expr, Symbol, MAX_ARITY};

/// Asserts that two floating point values are approximately equal.
///
/// NaN compares equal to NaN and same-signed infinities compare equal,
/// which is what expression tests want.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, 1e-10)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < $epsilon,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
                left_val,
                right_val,
                $epsilon
            );
        }
    }};
}
