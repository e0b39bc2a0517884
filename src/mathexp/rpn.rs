//! Shunting-yard conversion from infix tokens to reverse Polish notation.

use super::token::{Associativity, Operator, Token};
use crate::utils::error::ExpressionError;

/// Convert infix tokens to an RPN queue
///
/// # Errors
/// * `ExpressionError::MismatchedParentheses` - unbalanced `(` / `)`
/// * `ExpressionError::Syntax` - a comma outside any open parenthesis
pub fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Token>, ExpressionError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) | Token::Variable(_) => output.push(token),

            Token::Function(_) | Token::LeftParen => stack.push(token),

            Token::Comma => {
                if !pop_until_left_paren(&mut stack, &mut output) {
                    return Err(ExpressionError::Syntax(
                        "argument separator outside parentheses".to_string(),
                    ));
                }
            }

            Token::Operator(o1) => {
                while let Some(Token::Operator(o2)) = stack.last() {
                    if yields_to(o1, *o2) {
                        output.extend(stack.pop());
                    } else {
                        break;
                    }
                }
                stack.push(Token::Operator(o1));
            }

            Token::RightParen => {
                if !pop_until_left_paren(&mut stack, &mut output) {
                    return Err(ExpressionError::MismatchedParentheses);
                }
                stack.pop();
                if let Some(Token::Function(_)) = stack.last() {
                    output.extend(stack.pop());
                }
            }
        }
    }

    while let Some(token) = stack.pop() {
        if matches!(token, Token::LeftParen | Token::RightParen) {
            return Err(ExpressionError::MismatchedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}

/// `o1` lets `o2` go first
fn yields_to(o1: Operator, o2: Operator) -> bool {
    (o1.associativity() == Associativity::Left && o1.precedence() <= o2.precedence())
        || o1.precedence() < o2.precedence()
}

/// Move operators to the output until a `(` tops the stack; the `(`
/// stays. Returns false if the stack runs out first.
fn pop_until_left_paren(stack: &mut Vec<Token>, output: &mut Vec<Token>) -> bool {
    while let Some(top) = stack.last() {
        if *top == Token::LeftParen {
            return true;
        }
        output.extend(stack.pop());
    }
    false
}
