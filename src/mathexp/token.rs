//! Tokens of the derived-metric expression language.

use crate::utils::error::ExpressionError;
use std::fmt;

/// Characters that end a token; each non-blank one is a token itself
pub const DELIMITERS: &str = "(),=+-*/%^ \t";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Operator {
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Self::Assign),
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "%" => Some(Self::Rem),
            "^" => Some(Self::Pow),
            _ => None,
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Self::Assign => 0,
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Rem => 2,
            Self::Pow => 3,
        }
    }

    pub fn associativity(self) -> Associativity {
        match self {
            Self::Assign | Self::Pow => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// Apply to already-resolved operands; `Assign` yields the right side
    pub fn apply(self, a: f64, b: f64) -> Result<f64, ExpressionError> {
        Ok(match self {
            Self::Assign => b,
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            // zero divisor is replaced by 1
            Self::Div => a / if b == 0.0 { 1.0 } else { b },
            Self::Rem => {
                if b == 0.0 {
                    return Err(ExpressionError::ModuloByZero);
                }
                // result takes the sign of the divisor
                a - b * (a / b).floor()
            }
            Self::Pow => a.powf(b),
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Assign => '=',
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Rem => '%',
            Self::Pow => '^',
        }
    }
}

/// Built-in functions with fixed arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Abs,
    Min,
    Max,
    Pow,
    Exp,
    Log,
    Log10,
    Sqrt,
    Acos,
    Asin,
    Atan,
    Cos,
    Sin,
    Tan,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "abs" => Self::Abs,
            "min" => Self::Min,
            "max" => Self::Max,
            "pow" => Self::Pow,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "log10" => Self::Log10,
            "sqrt" => Self::Sqrt,
            "acos" => Self::Acos,
            "asin" => Self::Asin,
            "atan" => Self::Atan,
            "cos" => Self::Cos,
            "sin" => Self::Sin,
            "tan" => Self::Tan,
            _ => return None,
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max | Self::Pow | Self::Log => 2,
            _ => 1,
        }
    }

    /// Apply to `args`, which holds exactly `arity()` values
    pub fn apply(self, args: &[f64]) -> f64 {
        let a = args[0];
        match self {
            Self::Abs => a.abs(),
            Self::Min => a.min(args[1]),
            Self::Max => a.max(args[1]),
            Self::Pow => a.powf(args[1]),
            Self::Exp => a.exp(),
            // log(x, base)
            Self::Log => a.ln() / args[1].ln(),
            Self::Log10 => a.log10(),
            Self::Sqrt => a.sqrt(),
            Self::Acos => a.acos(),
            Self::Asin => a.asin(),
            Self::Atan => a.atan(),
            Self::Cos => a.cos(),
            Self::Sin => a.sin(),
            Self::Tan => a.tan(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Operator(Operator),
    Variable(String),
    Number(f64),
    LeftParen,
    RightParen,
    Function(Function),
    Comma,
}

impl Token {
    fn classify(text: &str) -> Self {
        match text {
            "(" => Self::LeftParen,
            ")" => Self::RightParen,
            "," => Self::Comma,
            _ => {
                if let Some(op) = Operator::from_symbol(text) {
                    Self::Operator(op)
                } else if let Some(func) = Function::from_name(text) {
                    Self::Function(func)
                } else if let Ok(value) = text.parse::<f64>() {
                    Self::Number(value)
                } else {
                    Self::Variable(text.to_string())
                }
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator(op) => write!(f, "{}", op.symbol()),
            Self::Variable(name) => f.write_str(name),
            Self::Number(v) => write!(f, "{}", v),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::Function(func) => write!(f, "{:?}", func),
            Self::Comma => f.write_str(","),
        }
    }
}

/// Split an infix expression into classified tokens
pub fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = expression.trim();

    while !rest.is_empty() {
        let cut = match rest.find(|c: char| DELIMITERS.contains(c)) {
            Some(0) => rest.chars().next().map_or(1, char::len_utf8),
            Some(i) => i,
            None => rest.len(),
        };
        tokens.push(Token::classify(&rest[..cut]));
        rest = rest[cut..].trim();
    }

    tokens
}
