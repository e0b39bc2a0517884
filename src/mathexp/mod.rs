//! Arithmetic expressions used to define derived metrics.
//!
//! Expressions are tokenized, converted to RPN with the shunting-yard
//! algorithm and evaluated against a symbol table of counter values.
//!
//! # Example
//! ```ignore
//! use autoperf_ppk::mathexp::{MathExp, SymbolTable};
//!
//! let mut symtab = SymbolTable::new();
//! symtab.insert("PAPI_TOT_INS".to_string(), 300.0);
//! symtab.insert("PAPI_TOT_CYC".to_string(), 100.0);
//! let ipc = MathExp::parse("IPC = PAPI_TOT_INS / PAPI_TOT_CYC")?.eval(&mut symtab)?;
//! ```

mod expression;
mod rpn;
mod token;

// Public API exports
pub use expression::{MathExp, SymbolTable};
pub use rpn::to_rpn;
pub use token::{tokenize, Associativity, Function, Operator, Token};
