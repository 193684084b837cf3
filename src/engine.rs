//! Recursive-descent parser and the public compile/interp entry points.
//!
//! The parser follows the precedence grammar one function per production:
//!
//! ```text
//! list    := expr (',' expr)*
//! expr    := term   (('+'|'-') term)*
//! term    := factor (('*'|'/'|'%'|'&'|'|') factor)*
//! factor  := power  ('^' power)*
//! power   := ('+'|'-')* base
//! base    := number | variable postfix? | func0 ('(' ')')?
//!          | func1 power | funcN '(' expr (',' expr){N-1} ')'
//!          | '(' list ')'
//! postfix := '[' list ']'
//! ```
//!
//! The comma folds a sequence to its last value. Function argument lists
//! are not parsed by `list`: a function of arity N takes exactly N
//! comma-separated expressions. The postfix `[index]` only applies to an
//! array variable.

use crate::error::ExprError;
use crate::lexer::{BinOp, Lexer, Token};
use crate::optimize::optimize;
use crate::types::{Callable, Expr, Symbol};
use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

struct Parser<'t, 's> {
    lexer: Lexer<'t, 's>,
    token: Token<'s>,
}

fn binary<'s>(op: BinOp, lhs: Expr<'s>, rhs: Expr<'s>) -> Expr<'s> {
    Expr::Call {
        func: Callable::Static(op.func()),
        pure: true,
        args: vec![lhs, rhs],
    }
}

fn negated(arg: Expr<'_>) -> Expr<'_> {
    Expr::Call {
        func: Callable::Static(crate::functions::neg),
        pure: true,
        args: vec![arg],
    }
}

fn comma<'s>(lhs: Expr<'s>, rhs: Expr<'s>) -> Expr<'s> {
    Expr::Call {
        func: Callable::Static(crate::functions::comma),
        pure: true,
        args: vec![lhs, rhs],
    }
}

impl<'t, 's> Parser<'t, 's> {
    fn new(input: &'t str, symbols: &'t [Symbol<'s>]) -> Result<Self, ExprError> {
        let mut lexer = Lexer::new(input, symbols);
        let token = lexer.next_token()?;
        Ok(Self { lexer, token })
    }

    fn advance(&mut self) -> Result<(), ExprError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn position(&self) -> usize {
        self.lexer.position()
    }

    fn unexpected(&self) -> ExprError {
        ExprError::Syntax {
            message: format!("unexpected {}", self.token.describe()),
            position: self.position(),
        }
    }

    fn list(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut ret = self.expr()?;
        while matches!(self.token, Token::Separator) {
            self.advance()?;
            let rhs = self.expr()?;
            ret = comma(ret, rhs);
        }
        Ok(ret)
    }

    fn expr(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut ret = self.term()?;
        while let Token::Infix(op @ (BinOp::Add | BinOp::Sub)) = self.token {
            self.advance()?;
            let rhs = self.term()?;
            ret = binary(op, ret, rhs);
        }
        Ok(ret)
    }

    fn term(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut ret = self.factor()?;
        while let Token::Infix(
            op @ (BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::BitAnd | BinOp::BitOr),
        ) = self.token
        {
            self.advance()?;
            let rhs = self.factor()?;
            ret = binary(op, ret, rhs);
        }
        Ok(ret)
    }

    #[cfg(not(feature = "pow-from-right"))]
    fn factor(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut ret = self.power()?;
        while let Token::Infix(BinOp::Pow) = self.token {
            self.advance()?;
            let rhs = self.power()?;
            ret = binary(BinOp::Pow, ret, rhs);
        }
        Ok(ret)
    }

    /// With `pow-from-right`, `^` chains right-to-left and a leading sign
    /// binds looser than the whole chain: `-a^b^c` is `-(a^(b^c))`.
    #[cfg(feature = "pow-from-right")]
    fn factor(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut negate = false;
        while let Token::Infix(op @ (BinOp::Add | BinOp::Sub)) = self.token {
            if op == BinOp::Sub {
                negate = !negate;
            }
            self.advance()?;
        }
        let mut ret = self.base()?;
        if let Token::Infix(BinOp::Pow) = self.token {
            self.advance()?;
            let rhs = self.factor_rhs()?;
            ret = binary(BinOp::Pow, ret, rhs);
        }
        if negate {
            ret = negated(ret);
        }
        Ok(ret)
    }

    #[cfg(feature = "pow-from-right")]
    fn factor_rhs(&mut self) -> Result<Expr<'s>, ExprError> {
        let lhs = self.power()?;
        if let Token::Infix(BinOp::Pow) = self.token {
            self.advance()?;
            let rhs = self.factor_rhs()?;
            Ok(binary(BinOp::Pow, lhs, rhs))
        } else {
            Ok(lhs)
        }
    }

    fn power(&mut self) -> Result<Expr<'s>, ExprError> {
        let mut sign = 1;
        while let Token::Infix(op @ (BinOp::Add | BinOp::Sub)) = self.token {
            if op == BinOp::Sub {
                sign = -sign;
            }
            self.advance()?;
        }
        let ret = self.base()?;
        Ok(if sign < 0 { negated(ret) } else { ret })
    }

    fn base(&mut self) -> Result<Expr<'s>, ExprError> {
        match self.token.clone() {
            Token::Number(value) => {
                self.advance()?;
                Ok(Expr::Constant(value))
            }
            Token::Scalar(cell) => {
                self.advance()?;
                self.postfix(Expr::Scalar(cell))
            }
            Token::Array(values) => {
                self.advance()?;
                self.postfix(Expr::Array(values))
            }
            Token::Func {
                name,
                arity,
                pure,
                call,
            } => {
                self.advance()?;
                self.call(name, arity, pure, call)
            }
            Token::Open => {
                self.advance()?;
                let ret = self.list()?;
                if !matches!(self.token, Token::Close) {
                    return Err(ExprError::UnmatchedParenthesis {
                        position: self.position(),
                    });
                }
                self.advance()?;
                Ok(ret)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Zero or more `[ list ]` groups after a variable. Only an array
    /// variable may be indexed, so a second group (whose operand would be
    /// the index node itself) is rejected, as is any index on a scalar.
    fn postfix(&mut self, mut ret: Expr<'s>) -> Result<Expr<'s>, ExprError> {
        while matches!(self.token, Token::OpenBracket) {
            let array = match ret {
                Expr::Array(values) => values,
                _ => {
                    return Err(ExprError::IndexOnNonArray {
                        position: self.position(),
                    })
                }
            };
            self.advance()?;
            let index = self.list()?;
            if !matches!(self.token, Token::CloseBracket) {
                return Err(ExprError::UnmatchedBracket {
                    position: self.position(),
                });
            }
            self.advance()?;
            ret = Expr::Index {
                array,
                index: Box::new(index),
            };
        }
        Ok(ret)
    }

    /// Function application. Arity 0 allows optional empty parens, arity 1
    /// takes a signed operand by juxtaposition, higher arities require a
    /// parenthesized argument list with exactly `arity` entries.
    fn call(
        &mut self,
        name: &'s str,
        arity: usize,
        pure: bool,
        func: Callable<'s>,
    ) -> Result<Expr<'s>, ExprError> {
        if arity == 0 {
            if matches!(self.token, Token::Open) {
                self.advance()?;
                if !matches!(self.token, Token::Close) {
                    return Err(ExprError::ArityMismatch {
                        name: name.to_string(),
                        expected: 0,
                        position: self.position(),
                    });
                }
                self.advance()?;
            }
            return Ok(Expr::Call {
                func,
                pure,
                args: Vec::new(),
            });
        }

        if arity == 1 {
            let arg = self.power()?;
            return Ok(Expr::Call {
                func,
                pure,
                args: vec![arg],
            });
        }

        if !matches!(self.token, Token::Open) {
            return Err(ExprError::Syntax {
                message: format!("expected '(' after '{}'", name),
                position: self.position(),
            });
        }
        let mut args = Vec::with_capacity(arity);
        loop {
            self.advance()?; // consume '(' or ','
            args.push(self.expr()?);
            if !matches!(self.token, Token::Separator) || args.len() == arity {
                break;
            }
        }
        if matches!(self.token, Token::Separator) || args.len() != arity {
            return Err(ExprError::ArityMismatch {
                name: name.to_string(),
                expected: arity,
                position: self.position(),
            });
        }
        if !matches!(self.token, Token::Close) {
            return Err(ExprError::UnmatchedParenthesis {
                position: self.position(),
            });
        }
        self.advance()?;
        Ok(Expr::Call { func, pure, args })
    }
}

/// Compiles `expression` against the given symbol table and runs the
/// constant folder over the result.
///
/// The table is searched linearly and the first entry with a matching name
/// wins; names that resolve nowhere (neither table nor built-ins) are
/// compile errors. The table itself may be dropped after this call; the
/// storage its entries point at must outlive the returned tree.
///
/// On failure the error carries the 1-based byte position at which parsing
/// stopped, via [`ExprError::position`].
pub fn compile<'s>(expression: &str, symbols: &[Symbol<'s>]) -> Result<Expr<'s>, ExprError> {
    let mut parser = Parser::new(expression, symbols)?;
    let mut root = parser.list()?;
    if !matches!(parser.token, Token::End) {
        return Err(ExprError::TrailingInput {
            position: parser.position(),
        });
    }
    optimize(&mut root);
    Ok(root)
}

/// Compiles `expression` with an empty symbol table and evaluates it once.
///
/// ```
/// assert_eq!(miniexpr::interp("2^10").unwrap(), 1024.0);
/// ```
pub fn interp(expression: &str) -> Result<f64, ExprError> {
    compile(expression, &[]).map(|expr| expr.eval())
}
