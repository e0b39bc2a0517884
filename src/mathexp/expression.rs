//! Compiled expressions and their evaluation.

use super::rpn::to_rpn;
use super::token::{tokenize, Operator, Token};
use crate::utils::error::ExpressionError;
use std::collections::HashMap;

/// Variable bindings consulted (and, through `=`, updated) during evaluation
pub type SymbolTable = HashMap<String, f64>;

/// An infix expression compiled to RPN
#[derive(Debug, Clone, PartialEq)]
pub struct MathExp {
    source: String,
    rpn: Vec<Token>,
    variables: Vec<String>,
    assigned: Vec<String>,
}

/// Evaluation stack entry; variables stay unresolved until an operator
/// needs their value so `=` can bind its left operand by name.
#[derive(Debug, Clone)]
enum Operand {
    Number(f64),
    Variable(String),
}

impl MathExp {
    /// Compile an infix expression
    ///
    /// # Errors
    /// * `ExpressionError::MismatchedParentheses`
    /// * `ExpressionError::Syntax`
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(expression);

        let mut variables: Vec<String> = Vec::new();
        let mut assigned: Vec<String> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if let Token::Variable(name) = token {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
                let is_target = matches!(tokens.get(i + 1), Some(Token::Operator(Operator::Assign)));
                if is_target && !assigned.contains(name) {
                    assigned.push(name.clone());
                }
            }
        }

        Ok(Self {
            source: expression.trim().to_string(),
            rpn: to_rpn(tokens)?,
            variables,
            assigned,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rpn(&self) -> &[Token] {
        &self.rpn
    }

    /// Every variable named in the expression, in order of first appearance
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Variables that appear as the target of `=`
    pub fn assigned(&self) -> &[String] {
        &self.assigned
    }

    /// Evaluate against `symtab`; `=` writes its target into `symtab`
    ///
    /// # Errors
    /// * `ExpressionError::UnresolvedSymbol` - a variable is not bound
    /// * `ExpressionError::Syntax` - operand count mismatch
    pub fn eval(&self, symtab: &mut SymbolTable) -> Result<f64, ExpressionError> {
        let mut stack: Vec<Operand> = Vec::new();

        for token in &self.rpn {
            match token {
                Token::Number(v) => stack.push(Operand::Number(*v)),
                Token::Variable(name) => stack.push(Operand::Variable(name.clone())),
                Token::Operator(op) => apply_operator(*op, &mut stack, symtab)?,
                Token::Function(func) => {
                    let args = pop_args(&mut stack, func.arity())?
                        .into_iter()
                        .map(|arg| resolve(arg, symtab))
                        .collect::<Result<Vec<_>, _>>()?;
                    stack.push(Operand::Number(func.apply(&args)));
                }
                Token::LeftParen | Token::RightParen | Token::Comma => {
                    return Err(ExpressionError::Syntax(format!(
                        "unexpected `{}` in compiled expression",
                        token
                    )))
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(result), true) => resolve(result, symtab),
            _ => Err(ExpressionError::Syntax(format!(
                "`{}` does not reduce to a single value",
                self.source
            ))),
        }
    }
}

fn apply_operator(
    op: Operator,
    stack: &mut Vec<Operand>,
    symtab: &mut SymbolTable,
) -> Result<(), ExpressionError> {
    let mut args = pop_args(stack, 2)?.into_iter();
    let (Some(lhs), Some(rhs)) = (args.next(), args.next()) else {
        return Err(ExpressionError::Syntax("missing operand".to_string()));
    };

    if op == Operator::Assign {
        let Operand::Variable(target) = lhs else {
            return Err(ExpressionError::Syntax(
                "left side of `=` must be a variable".to_string(),
            ));
        };
        let value = resolve(rhs, symtab)?;
        symtab.insert(target, value);
        stack.push(Operand::Number(value));
        return Ok(());
    }

    let a = resolve(lhs, symtab)?;
    let b = resolve(rhs, symtab)?;
    stack.push(Operand::Number(op.apply(a, b)?));
    Ok(())
}

/// Pop `argc` operands, returned in source order
fn pop_args(stack: &mut Vec<Operand>, argc: usize) -> Result<Vec<Operand>, ExpressionError> {
    if stack.len() < argc {
        return Err(ExpressionError::Syntax(format!(
            "expected {} operands, found {}",
            argc,
            stack.len()
        )));
    }
    Ok(stack.split_off(stack.len() - argc))
}

fn resolve(operand: Operand, symtab: &SymbolTable) -> Result<f64, ExpressionError> {
    match operand {
        Operand::Number(v) => Ok(v),
        Operand::Variable(name) => symtab
            .get(&name)
            .copied()
            .ok_or(ExpressionError::UnresolvedSymbol(name)),
    }
}
