//! Operator and built-in function implementations.
//!
//! Everything callable from an expression has the same shape: a function
//! over a slice of evaluated arguments. The aggregate built-ins differ only
//! in that their leading parameters arrive as raw array slices instead of
//! evaluated scalars.
//!
//! All math goes through `libm` so the crate stays no_std-clean.

use core::cell::Cell;

use crate::types::AggregateFn;

/// Width of the integer domain for the bitwise operations. An f64 mantissa
/// holds 53 bits, so that is the largest width where round-tripping through
/// a double is exact.
const MAX_BITWISE_WIDTH: u32 = 53;
const MAX_BITWISE_VALUE: u64 = (1 << MAX_BITWISE_WIDTH) - 1;

/* Infix operators. */

pub(crate) fn add(args: &[f64]) -> f64 {
    args[0] + args[1]
}

pub(crate) fn sub(args: &[f64]) -> f64 {
    args[0] - args[1]
}

pub(crate) fn mul(args: &[f64]) -> f64 {
    args[0] * args[1]
}

pub(crate) fn div(args: &[f64]) -> f64 {
    args[0] / args[1]
}

pub(crate) fn modulo(args: &[f64]) -> f64 {
    libm::fmod(args[0], args[1])
}

pub(crate) fn neg(args: &[f64]) -> f64 {
    -args[0]
}

/// Folds a parenthesized sequence to its last value.
pub(crate) fn comma(args: &[f64]) -> f64 {
    args[1]
}

fn valid_bitwise_operand(x: f64) -> bool {
    x >= 0.0 && libm::round(x) <= MAX_BITWISE_VALUE as f64
}

pub(crate) fn bit_and(args: &[f64]) -> f64 {
    if !valid_bitwise_operand(args[0]) || !valid_bitwise_operand(args[1]) {
        return f64::NAN;
    }
    ((libm::round(args[0]) as u64) & (libm::round(args[1]) as u64)) as f64
}

pub(crate) fn bit_or(args: &[f64]) -> f64 {
    if !valid_bitwise_operand(args[0]) || !valid_bitwise_operand(args[1]) {
        return f64::NAN;
    }
    ((libm::round(args[0]) as u64) | (libm::round(args[1]) as u64)) as f64
}

/* Scalar built-ins. */

fn abs(args: &[f64]) -> f64 {
    libm::fabs(args[0])
}

fn acos(args: &[f64]) -> f64 {
    libm::acos(args[0])
}

fn asin(args: &[f64]) -> f64 {
    libm::asin(args[0])
}

fn atan(args: &[f64]) -> f64 {
    libm::atan(args[0])
}

fn atan2(args: &[f64]) -> f64 {
    libm::atan2(args[0], args[1])
}

/// `bit(n, i)`: 1.0 if bit `i` (0 = LSB) of `n` rounded to nearest is set.
/// Requires `0 <= i < 53` and `n` within the 53-bit domain.
fn bit(args: &[f64]) -> f64 {
    let (n, i) = (args[0], args[1]);
    if !(n >= 0.0) || !(i >= 0.0) {
        return f64::NAN;
    }
    let value = libm::round(n);
    let index = libm::round(i);
    if value > MAX_BITWISE_VALUE as f64 || index >= MAX_BITWISE_WIDTH as f64 {
        return f64::NAN;
    }
    if (value as u64) & (1u64 << index as u32) != 0 {
        1.0
    } else {
        0.0
    }
}

fn ceil(args: &[f64]) -> f64 {
    libm::ceil(args[0])
}

fn cos(args: &[f64]) -> f64 {
    libm::cos(args[0])
}

fn cosh(args: &[f64]) -> f64 {
    libm::cosh(args[0])
}

fn e(_: &[f64]) -> f64 {
    core::f64::consts::E
}

fn exp(args: &[f64]) -> f64 {
    libm::exp(args[0])
}

/// Factorial over the non-negative integers, truncating its argument.
/// Negative input is NaN; anything above `u32::MAX`, or a result that
/// overflows 64 bits, is +infinity.
fn fac(args: &[f64]) -> f64 {
    let a = args[0];
    if !(a >= 0.0) {
        return f64::NAN;
    }
    if a > u32::MAX as f64 {
        return f64::INFINITY;
    }
    let mut result: u64 = 1;
    for i in 1..=(a as u32 as u64) {
        result = match result.checked_mul(i) {
            Some(r) => r,
            None => return f64::INFINITY,
        };
    }
    result as f64
}

fn floor(args: &[f64]) -> f64 {
    libm::floor(args[0])
}

fn ln(args: &[f64]) -> f64 {
    libm::log(args[0])
}

/// Base-10 by default; the `natural-log` feature switches it to base-e.
fn log(args: &[f64]) -> f64 {
    #[cfg(feature = "natural-log")]
    {
        libm::log(args[0])
    }
    #[cfg(not(feature = "natural-log"))]
    {
        libm::log10(args[0])
    }
}

fn log10(args: &[f64]) -> f64 {
    libm::log10(args[0])
}

/// Binomial coefficient C(n, r) with the same domain rules as `fac`.
fn ncr(args: &[f64]) -> f64 {
    let (n, r) = (args[0], args[1]);
    if !(n >= 0.0) || !(r >= 0.0) || n < r {
        return f64::NAN;
    }
    if n > u32::MAX as f64 || r > u32::MAX as f64 {
        return f64::INFINITY;
    }
    let un = n as u32 as u64;
    let mut ur = r as u32 as u64;
    if ur > un / 2 {
        ur = un - ur;
    }
    let mut result: u64 = 1;
    for i in 1..=ur {
        result = match result.checked_mul(un - ur + i) {
            Some(r) => r / i,
            None => return f64::INFINITY,
        };
    }
    result as f64
}

/// Permutations P(n, r) = C(n, r) * r!.
fn npr(args: &[f64]) -> f64 {
    ncr(args) * fac(&args[1..])
}

fn pi(_: &[f64]) -> f64 {
    core::f64::consts::PI
}

pub(crate) fn pow(args: &[f64]) -> f64 {
    libm::pow(args[0], args[1])
}

fn sin(args: &[f64]) -> f64 {
    libm::sin(args[0])
}

fn sinh(args: &[f64]) -> f64 {
    libm::sinh(args[0])
}

fn sqrt(args: &[f64]) -> f64 {
    libm::sqrt(args[0])
}

fn tan(args: &[f64]) -> f64 {
    libm::tan(args[0])
}

fn tanh(args: &[f64]) -> f64 {
    libm::tanh(args[0])
}

fn xor(args: &[f64]) -> f64 {
    if !valid_bitwise_operand(args[0]) || !valid_bitwise_operand(args[1]) {
        return f64::NAN;
    }
    ((libm::round(args[0]) as u64) ^ (libm::round(args[1]) as u64)) as f64
}

/* Array aggregates. These receive their array arguments by reference. */

fn sum(arrays: &[&[Cell<f64>]], _: &[f64]) -> f64 {
    arrays[0].iter().map(Cell::get).sum()
}

fn arrmin(arrays: &[&[Cell<f64>]], _: &[f64]) -> f64 {
    let values = arrays[0];
    let mut min = match values.first() {
        Some(first) => first.get(),
        None => return f64::NAN,
    };
    for v in &values[1..] {
        let v = v.get();
        if v < min {
            min = v;
        }
    }
    min
}

fn arrmax(arrays: &[&[Cell<f64>]], _: &[f64]) -> f64 {
    let values = arrays[0];
    let mut max = match values.first() {
        Some(first) => first.get(),
        None => return f64::NAN,
    };
    for v in &values[1..] {
        let v = v.get();
        if v > max {
            max = v;
        }
    }
    max
}

fn arrlen(arrays: &[&[Cell<f64>]], _: &[f64]) -> f64 {
    arrays[0].len() as f64
}

/// Piecewise-linear interpolation of `x` through the points
/// `(domain[i], range[i])`. The domain may run ascending or descending; a
/// flat segment yields the midpoint of its range values. Mismatched or
/// too-short arrays, or `x` outside the domain, yield NaN.
fn linear_interpolate(arrays: &[&[Cell<f64>]], scalars: &[f64]) -> f64 {
    let (domain, range) = (arrays[0], arrays[1]);
    let x = scalars[0];
    let n = domain.len();
    if range.len() != n || n < 2 {
        return f64::NAN;
    }
    let ascending = domain[n - 1].get() > domain[0].get();
    for i in 0..n - 1 {
        let (d0, d1) = (domain[i].get(), domain[i + 1].get());
        let in_segment = if ascending {
            x >= d0 && x <= d1
        } else {
            x <= d0 && x >= d1
        };
        if in_segment {
            let (r0, r1) = (range[i].get(), range[i + 1].get());
            if d0 == d1 {
                return (r0 + r1) / 2.0;
            }
            return r0 + (x - d0) / (d1 - d0) * (r1 - r0);
        }
    }
    f64::NAN
}

/* The built-in table. */

pub(crate) struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
}

#[derive(Clone, Copy)]
pub(crate) enum BuiltinKind {
    Scalar {
        arity: usize,
        func: fn(&[f64]) -> f64,
    },
    Aggregate {
        arity: usize,
        array_params: usize,
        func: AggregateFn,
    },
}

macro_rules! scalar {
    ($name:literal, $arity:literal, $func:expr) => {
        Builtin {
            name: $name,
            kind: BuiltinKind::Scalar {
                arity: $arity,
                func: $func,
            },
        }
    };
}

macro_rules! aggregate {
    ($name:literal, $arity:literal, $arrays:literal, $func:expr) => {
        Builtin {
            name: $name,
            kind: BuiltinKind::Aggregate {
                arity: $arity,
                array_params: $arrays,
                func: $func,
            },
        }
    };
}

/// All built-ins are pure. Must stay sorted by name: lookup is a binary
/// search.
pub(crate) static BUILTINS: &[Builtin] = &[
    scalar!("abs", 1, abs),
    scalar!("acos", 1, acos),
    aggregate!("arrlen", 1, 1, arrlen),
    aggregate!("arrmax", 1, 1, arrmax),
    aggregate!("arrmin", 1, 1, arrmin),
    scalar!("asin", 1, asin),
    scalar!("atan", 1, atan),
    scalar!("atan2", 2, atan2),
    scalar!("bit", 2, bit),
    scalar!("ceil", 1, ceil),
    scalar!("cos", 1, cos),
    scalar!("cosh", 1, cosh),
    scalar!("e", 0, e),
    scalar!("exp", 1, exp),
    scalar!("fac", 1, fac),
    scalar!("floor", 1, floor),
    aggregate!("linear_interpolate", 3, 2, linear_interpolate),
    scalar!("ln", 1, ln),
    scalar!("log", 1, log),
    scalar!("log10", 1, log10),
    scalar!("ncr", 2, ncr),
    scalar!("npr", 2, npr),
    scalar!("pi", 0, pi),
    scalar!("pow", 2, pow),
    scalar!("sin", 1, sin),
    scalar!("sinh", 1, sinh),
    scalar!("sqrt", 1, sqrt),
    aggregate!("sum", 1, 1, sum),
    scalar!("tan", 1, tan),
    scalar!("tanh", 1, tanh),
    scalar!("xor", 2, xor),
];

pub(crate) fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS
        .binary_search_by(|b| b.name.cmp(name))
        .ok()
        .map(|i| &BUILTINS[i])
}
