//! End-to-end tests exercising the whole pipeline: lex, parse, fold,
//! evaluate.

use miniexpr::{assert_approx_eq, compile, interp, ExprError, Symbol};
use std::cell::Cell;

#[test]
fn arithmetic_table() {
    let cases: &[(&str, f64)] = &[
        ("1", 1.0),
        ("1 ", 1.0),
        ("(1)", 1.0),
        ("2+1", 3.0),
        ("(((2+(1))))", 3.0),
        ("3+2", 5.0),
        ("3+2+4", 9.0),
        ("(3+2)+4", 9.0),
        ("3+(2+4)", 9.0),
        ("3*2*4", 24.0),
        ("12/2/3", 2.0),
        ("12*2/3", 8.0),
        ("1+2*3", 7.0),
        ("(1+2)*3", 9.0),
        ("10/5", 2.0),
        ("2^10", 1024.0),
        ("100%11", 1.0),
        ("6%3", 0.0),
        ("-1+5", 4.0),
        ("5 & 3", 1.0),
        ("5 | 2", 7.0),
        (".5*2", 1.0),
        ("2.5e2", 250.0),
        ("1e3 + 1", 1001.0),
    ];
    for (expr, expected) in cases {
        let result = interp(expr).unwrap();
        assert_approx_eq!(result, *expected, 1e-9);
    }
}

#[test]
fn builtin_sanity() {
    assert_approx_eq!(interp("sqrt(100)").unwrap(), 10.0);
    assert_approx_eq!(interp("abs(-42)").unwrap(), 42.0);
    assert_approx_eq!(interp("ceil(1.1)").unwrap(), 2.0);
    assert_approx_eq!(interp("floor(1.9)").unwrap(), 1.0);
    assert_approx_eq!(interp("sin(0)").unwrap(), 0.0);
    assert_approx_eq!(interp("cos(0)").unwrap(), 1.0);
    assert_approx_eq!(interp("atan2(1, 1)").unwrap(), std::f64::consts::FRAC_PI_4);
    assert_approx_eq!(interp("ln(e)").unwrap(), 1.0);
    assert_approx_eq!(interp("log10(1000)").unwrap(), 3.0);
    assert_approx_eq!(interp("exp(0)").unwrap(), 1.0);
    assert_approx_eq!(interp("pow(3, 4)").unwrap(), 81.0);
    assert_approx_eq!(interp("fac(5)").unwrap(), 120.0);
    assert_approx_eq!(interp("ncr(6, 2)").unwrap(), 15.0);
    assert_approx_eq!(interp("npr(6, 2)").unwrap(), 30.0);
    assert_approx_eq!(interp("sin(pi/2)").unwrap(), 1.0);

    #[cfg(not(feature = "natural-log"))]
    assert_approx_eq!(interp("log(1000)").unwrap(), 3.0);
    #[cfg(feature = "natural-log")]
    assert_approx_eq!(interp("log(e)").unwrap(), 1.0);
}

#[test]
fn evaluation_is_idempotent() {
    let x = Cell::new(1.5);
    let symbols = [Symbol::scalar("x", &x)];
    for text in ["x^2 + 2*x + 1", "sin(x) * cos(x)", "sqrt(x + 1)"] {
        let a = compile(text, &symbols).unwrap();
        let b = compile(text, &symbols).unwrap();
        assert_eq!(a.eval().to_bits(), b.eval().to_bits());
        assert_eq!(a.eval().to_bits(), a.eval().to_bits());
    }
}

#[test]
fn scalar_roundtrip() {
    let x = Cell::new(0.0);
    let symbols = [Symbol::scalar("x", &x)];
    let expr = compile("x", &symbols).unwrap();
    for value in [-1e12, -2.5, 0.0, 1e-7, 3.25, f64::INFINITY] {
        x.set(value);
        assert_eq!(expr.eval(), value);
    }
    x.set(f64::NAN);
    assert!(expr.eval().is_nan());
}

#[test]
fn division_follows_ieee() {
    assert_eq!(interp("1/0").unwrap(), f64::INFINITY);
    assert_eq!(interp("-1/0").unwrap(), f64::NEG_INFINITY);
    assert!(interp("0/0").unwrap().is_nan());
}

#[test]
fn compile_errors_carry_positions() {
    for (text, expected_position) in [("", 1), ("1+", 2), ("bogus", 5), ("1 + $", 5)] {
        let err = compile(text, &[]).unwrap_err();
        assert_eq!(err.position(), expected_position, "for input {:?}", text);
    }
}

#[test]
fn error_display_is_informative() {
    let err = interp("nosuchfn(1)").unwrap_err();
    assert!(err.to_string().contains("nosuchfn"));
    assert!(matches!(err, ExprError::UnknownIdentifier { .. }));
}

#[test]
fn shadowing_builtins() {
    // a caller symbol named like a built-in wins
    let sin = Cell::new(0.25);
    let symbols = [Symbol::scalar("sin", &sin)];
    assert_eq!(compile("sin * 4", &symbols).unwrap().eval(), 1.0);

    let symbols = [Symbol::native("sqrt", 1, |args: &[f64]| args[0]).pure()];
    assert_eq!(compile("sqrt(9)", &symbols).unwrap().eval(), 9.0);
}

#[test]
fn closures_capture_host_state() {
    let gain = Cell::new(2.0);
    let samples = [1.0, 2.0, 3.0].map(Cell::new);
    let symbols = [
        Symbol::native("scaled", 1, |args: &[f64]| args[0] * gain.get()),
        Symbol::array("samples", &samples),
    ];
    let expr = compile("scaled(samples[2])", &symbols).unwrap();
    assert_eq!(expr.eval(), 6.0);
    gain.set(10.0);
    assert_eq!(expr.eval(), 30.0);
}

#[test]
fn seven_argument_native() {
    let symbols = [Symbol::native("total", 7, |args: &[f64]| {
        args.iter().sum()
    })];
    let expr = compile("total(1, 2, 3, 4, 5, 6, 7)", &symbols).unwrap();
    assert_eq!(expr.eval(), 28.0);

    assert!(matches!(
        compile("total(1, 2, 3)", &symbols).unwrap_err(),
        ExprError::ArityMismatch { expected: 7, .. }
    ));
}

#[test]
fn whitespace_is_insignificant() {
    assert_eq!(interp("\t1 +\n 2\r* 3 ").unwrap(), 7.0);
}

#[test]
fn long_chains_compile_and_evaluate() {
    // parser is O(n); make sure a long flat expression works
    let text = (1..=200).map(|i| i.to_string()).collect::<Vec<_>>().join("+");
    let expected = (200 * 201 / 2) as f64;
    assert_eq!(interp(&text).unwrap(), expected);
}
