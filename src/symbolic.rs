#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// the expression tree every computation mode works on
/// 1) numeric substitution and evaluation
/// 2) free symbol discovery
/// 3) plain-text rendering for logs
///# Example#
/// ```
/// use RustedFormula::symbolic::latex_parser::parse_latex;
/// use RustedFormula::symbolic::symbolic_engine::Expr;
/// use std::collections::HashMap;
/// let expr: Expr = parse_latex("\\frac{x^{2}}{2}").unwrap();
/// let mut values = HashMap::new();
/// values.insert("x".to_string(), 4.0);
/// assert_eq!(expr.eval_expression(&values).unwrap(), 8.0);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
/// tokenizer for the formula markup
pub mod latex_lexer;
/// markup -> expression tree
/// Example#
/// ```
/// use RustedFormula::symbolic::latex_parser::parse_latex;
/// let expr = parse_latex("\\sin{x} + \\frac{1}{2}").unwrap();
/// assert_eq!(expr.to_latex(), "\\sin{\\left(x \\right)} + \\frac{1}{2}");
/// ```
pub mod latex_parser;
/// expression tree -> markup
pub mod latex_printer;
///______________________________________________________________________________________________________________________________________________
/// canonical forms: like terms collected, numeric parts folded, function identities applied
/// Example#
/// ```
/// use RustedFormula::symbolic::latex_parser::parse_latex;
/// let expr = parse_latex("x + x + 2 \\cdot 3").unwrap();
/// assert_eq!(expr.simplify().to_latex(), "2 x + 6");
/// ```
pub mod symbolic_simplify;
/// products of sums multiplied out
pub mod symbolic_expand;
/// polynomial extraction, rational roots and factoring
pub mod symbolic_polynomial;
/// symbolic differentiation
pub mod symbolic_derivatives;
/// antiderivatives, definite integrals (with a quadrature fallback) and evaluation of
/// integral/derivative constructs written in the markup
pub mod symbolic_integration;
/// equation solving
/// Example#
/// ```
/// use RustedFormula::symbolic::latex_parser::parse_latex;
/// use RustedFormula::symbolic::latex_printer::print_solution_list;
/// use RustedFormula::symbolic::symbolic_solve::solve_equation;
/// let lhs = parse_latex("x^{2}").unwrap();
/// let rhs = parse_latex("9").unwrap();
/// let solutions = solve_equation(&lhs, &rhs, "x").unwrap();
/// assert_eq!(print_solution_list(&solutions), "\\left[ -3, \\  3\\right]");
/// ```
pub mod symbolic_solve;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions mainly for bracket parsing and number formatting
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
#[cfg(test)]
mod symbolic_engine_tests;
