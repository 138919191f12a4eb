//! Restricted arithmetic expressions for similar-item user functions.
//!
//! Grammar (Pratt parser, lowest to highest binding):
//!
//! ```text
//! expr   := expr ('+' | '-') expr
//!         | expr ('*' | '/') expr
//!         | expr '^' expr          (right associative)
//!         | '-' expr
//!         | func '(' expr ')'
//!         | '(' expr ')'
//!         | number | variable
//! func   := exp | ln | log10 | sqrt | abs
//! variable := hr | pi1..pi8 | uf1..uf3 | ui1..ui3 | res1..res5
//! ```
//!
//! An expression is parsed once into an [`Expression`] tree and evaluated
//! any number of times against a [`Variables`] map.
//! Input is capped at [`MAX_TOKENS`] tokens and [`MAX_NESTING`] levels of
//! recursion so hostile input fails with an error instead of exhausting the
//! stack.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::degraded::ratio_or_zero;

/// Expression parse and evaluation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected '{found}' at offset {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("expression evaluated to a non-finite value")]
    NonFinite,

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("expression has more than {0} tokens")]
    TooLong(usize),
}

impl From<ExprError> for rk_common::Error {
    fn from(err: ExprError) -> Self {
        rk_common::Error::Expression(err.to_string())
    }
}

/// Whether `name` is one of the variables an expression may reference.
pub fn is_known_variable(name: &str) -> bool {
    fn indexed(name: &str, prefix: &str, max: u32) -> bool {
        name.strip_prefix(prefix)
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|n| (1..=max).contains(&n))
            && !name[prefix.len()..].starts_with('0')
    }
    name == "hr"
        || indexed(name, "pi", 8)
        || indexed(name, "uf", 3)
        || indexed(name, "ui", 3)
        || indexed(name, "res", 5)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "exp" => Some(Function::Exp),
            "ln" => Some(Function::Ln),
            "log10" => Some(Function::Log10),
            "sqrt" => Some(Function::Sqrt),
            "abs" => Some(Function::Abs),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }

    /// Left and right binding power.
    fn binding_power(self) -> (u8, u8) {
        match self {
            BinaryOp::Add | BinaryOp::Sub => (1, 2),
            BinaryOp::Mul | BinaryOp::Div => (3, 4),
            BinaryOp::Pow => (7, 6),
        }
    }
}

const PREFIX_MINUS_POWER: u8 = 5;

/// Parser recursion limit: parentheses, calls, unary minus and `^` chains.
pub const MAX_NESTING: usize = 256;

/// Token limit. Bounds the depth of left-associative chains, which the
/// parser builds iteratively but evaluation walks recursively.
pub const MAX_TOKENS: usize = 2048;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Negate(Box<Expression>),
    Call(Function, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

/// Variable bindings for evaluation. Unbound known variables read as 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: BTreeMap<String, f64>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }
}

impl Expression {
    /// Parse an expression, rejecting unknown identifiers.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.expression(0)?;
        match parser.peek() {
            None => Ok(expr),
            Some((pos, tok)) => Err(ExprError::UnexpectedToken {
                pos: *pos,
                found: tok.to_string(),
            }),
        }
    }

    /// Evaluate against `vars`. Division by zero yields 0.0 and is logged.
    pub fn evaluate(&self, vars: &Variables) -> Result<f64, ExprError> {
        let value = self.eval_inner(vars);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite)
        }
    }

    fn eval_inner(&self, vars: &Variables) -> f64 {
        match self {
            Expression::Number(n) => *n,
            Expression::Variable(name) => vars.get(name),
            Expression::Negate(inner) => -inner.eval_inner(vars),
            Expression::Call(func, arg) => func.apply(arg.eval_inner(vars)),
            Expression::Binary(op, lhs, rhs) => {
                let a = lhs.eval_inner(vars);
                let b = rhs.eval_inner(vars);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => ratio_or_zero(a, b, "similar_item.division"),
                    BinaryOp::Pow => a.powf(b),
                }
            }
        }
    }

    /// Variables referenced anywhere in the tree.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Number(_) => {}
            Expression::Variable(name) => out.push(name),
            Expression::Negate(inner) | Expression::Call(_, inner) => {
                inner.collect_variables(out)
            }
            Expression::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{:?}", n),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Negate(inner) => write!(f, "(-{})", inner),
            Expression::Call(func, arg) => write!(f, "{}({})", func.name(), arg),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(op) => write!(f, "{}", op.symbol()),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = pos;
                let mut prev = ' ';
                while let Some(&(i, c)) = chars.peek() {
                    let exponent_sign = (c == '+' || c == '-') && (prev == 'e' || prev == 'E');
                    if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                        end = i + c.len_utf8();
                        prev = c;
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &source[pos..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
                tokens.push((pos, Token::Number(value)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((pos, Token::Ident(source[pos..end].to_lowercase())));
            }
            '+' | '-' | '*' | '/' | '^' => {
                let op = match ch {
                    '+' => BinaryOp::Add,
                    '-' => BinaryOp::Sub,
                    '*' => BinaryOp::Mul,
                    '/' => BinaryOp::Div,
                    _ => BinaryOp::Pow,
                };
                tokens.push((pos, Token::Op(op)));
                chars.next();
            }
            '(' => {
                tokens.push((pos, Token::LParen));
                chars.next();
            }
            ')' => {
                tokens.push((pos, Token::RParen));
                chars.next();
            }
            other => return Err(ExprError::UnexpectedChar { pos, ch: other }),
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong(MAX_TOKENS));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self) -> Result<(), ExprError> {
        match self.next() {
            Some((_, Token::RParen)) => Ok(()),
            Some((pos, tok)) => Err(ExprError::UnexpectedToken {
                pos,
                found: tok.to_string(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expression, ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(ExprError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = self.binary(min_power);
        self.depth -= 1;
        result
    }

    fn binary(&mut self, min_power: u8) -> Result<Expression, ExprError> {
        let mut lhs = self.prefix()?;

        while let Some((_, Token::Op(op))) = self.peek() {
            let op = *op;
            let (left, right) = op.binding_power();
            if left < min_power {
                break;
            }
            self.next();
            let rhs = self.expression(right)?;
            lhs = Expression::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expression, ExprError> {
        let (pos, tok) = self.next().ok_or(ExprError::UnexpectedEnd)?;
        match tok {
            Token::Number(n) => Ok(Expression::Number(n)),
            Token::Op(BinaryOp::Sub) => {
                let inner = self.expression(PREFIX_MINUS_POWER)?;
                Ok(Expression::Negate(Box::new(inner)))
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if let Some((_, Token::LParen)) = self.peek() {
                    let func =
                        Function::from_name(&name).ok_or(ExprError::UnknownFunction(name))?;
                    self.next();
                    let arg = self.expression(0)?;
                    self.expect_rparen()?;
                    Ok(Expression::Call(func, Box::new(arg)))
                } else if is_known_variable(&name) {
                    Ok(Expression::Variable(name))
                } else {
                    Err(ExprError::UnknownVariable(name))
                }
            }
            other => Err(ExprError::UnexpectedToken {
                pos,
                found: other.to_string(),
            }),
        }
    }
}
