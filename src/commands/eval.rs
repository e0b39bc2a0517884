//! Eval command implementation.
//!
//! Evaluates one infix expression against command-line bindings.

use super::models::EvalArgs;
use crate::mathexp::{MathExp, SymbolTable};
use anyhow::{Context, Result};

/// Execute the eval command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The value of the expression
///
/// # Errors
/// * A binding value that is not a number
/// * Syntax errors and unresolved symbols
pub fn execute_eval(args: EvalArgs) -> Result<f64> {
    let mut symtab = SymbolTable::new();
    for (name, value) in &args.bindings {
        let value: f64 = value
            .parse()
            .with_context(|| format!("Binding `{}` is not a number: `{}`", name, value))?;
        symtab.insert(name.clone(), value);
    }

    let exp = MathExp::parse(&args.expression)
        .with_context(|| format!("Failed to parse `{}`", args.expression))?;

    if args.show_rpn {
        let rpn: Vec<String> = exp.rpn().iter().map(|t| t.to_string()).collect();
        println!("RPN: {}", rpn.join(" "));
    }

    let value = exp
        .eval(&mut symtab)
        .with_context(|| format!("Failed to evaluate `{}`", args.expression))?;

    for name in exp.assigned() {
        if let Some(v) = symtab.get(name) {
            println!("{} = {}", name, v);
        }
    }
    println!("{}", value);

    Ok(value)
}
