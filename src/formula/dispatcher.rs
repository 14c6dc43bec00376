//! # Computation Dispatcher
//!
//! Maps a compute request (markup, mode, bound variable, substitutions) onto the
//! symbolic engine and always returns a classified [`ComputeResult`]: markup on
//! success, or a parse/computation failure with a readable message. No engine error
//! escapes as anything else.
//!
//! ## Steps
//! 1. split the markup on a top-level `=` (at most one) and parse each side
//! 2. evaluate `\int ... dx` and `\frac{d}{dx} ...` constructs written in the markup
//! 3. apply the mode: simplify, expand, factor, solve, differentiate, integrate,
//!    or substitute and evaluate numerically
//! 4. render the expression (or, for Solve, the solution list) back to markup
//!
//! An equation in any mode other than Solve is transformed side by side and rendered
//! as `lhs = rhs`. Substitutions apply to the numeric evaluation mode only.
use crate::formula::errors::FormulaError;
use crate::formula::substitution::{Substitution, normalize_identifier};
use crate::symbolic::latex_parser::parse_latex;
use crate::symbolic::latex_printer::print_solution_list;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_polynomial::check_degree;
use crate::symbolic::symbolic_solve::solve_equation;
use crate::symbolic::utils::{format_decimal, split_top_level};
use log::{debug, info, warn};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ComputeMode {
    Simplify,
    Expand,
    Factor,
    Solve,
    #[strum(to_string = "Differentiate", serialize = "diff")]
    Differentiate,
    #[strum(to_string = "Integrate", serialize = "int")]
    Integrate,
    #[strum(to_string = "Evaluate", serialize = "eval", serialize = "numeric")]
    Evaluate,
}

impl ComputeMode {
    /// Modes that act with respect to a bound variable.
    pub fn needs_variable(&self) -> bool {
        matches!(
            self,
            ComputeMode::Solve | ComputeMode::Differentiate | ComputeMode::Integrate
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub text: String,
    pub mode: ComputeMode,
    /// bound variable; empty means "the only free symbol"
    pub variable: String,
    pub substitutions: Substitution,
}

impl ComputeRequest {
    pub fn new(text: &str, mode: ComputeMode) -> Self {
        ComputeRequest {
            text: text.to_string(),
            mode,
            variable: String::new(),
            substitutions: Substitution::new(),
        }
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = variable.to_string();
        self
    }

    pub fn with_substitutions(mut self, substitutions: Substitution) -> Self {
        self.substitutions = substitutions;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComputeResult {
    Success(String),
    Failure(FormulaError),
}

impl ComputeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ComputeResult::Success(_))
    }

    pub fn markup(&self) -> Option<&str> {
        match self {
            ComputeResult::Success(markup) => Some(markup),
            ComputeResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FormulaError> {
        match self {
            ComputeResult::Success(_) => None,
            ComputeResult::Failure(err) => Some(err),
        }
    }
}

impl From<Result<String, FormulaError>> for ComputeResult {
    fn from(result: Result<String, FormulaError>) -> Self {
        match result {
            Ok(markup) => ComputeResult::Success(markup),
            Err(err) => ComputeResult::Failure(err),
        }
    }
}

/// Parsed input: an expression or a `lhs = rhs` equation.
#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    Expression(Expr),
    Equation(Expr, Expr),
}

impl Parsed {
    fn free_variables(&self) -> Vec<String> {
        let vars = match self {
            Parsed::Expression(e) => e.free_variables(),
            Parsed::Equation(l, r) => {
                let mut vars = l.free_variables();
                vars.extend(r.free_variables());
                vars
            }
        };
        vars.into_iter().collect()
    }
}

fn computation(message: String) -> FormulaError {
    FormulaError::Computation(message)
}

fn parse_side(text: &str) -> Result<Expr, FormulaError> {
    parse_latex(text).map_err(FormulaError::Parse)
}

fn parse_input(text: &str) -> Result<Parsed, FormulaError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FormulaError::Parse("the formula is empty".to_string()));
    }
    let sides = split_top_level(text, '=');
    match sides.as_slice() {
        [single] => Ok(Parsed::Expression(parse_side(single)?)),
        [lhs, rhs] if !lhs.is_empty() && !rhs.is_empty() => {
            Ok(Parsed::Equation(parse_side(lhs)?, parse_side(rhs)?))
        }
        [_, _] => Err(computation(
            "malformed equation: both sides of '=' must be filled in".to_string(),
        )),
        _ => Err(computation(
            "malformed equation: only one '=' is allowed".to_string(),
        )),
    }
}

/// The variable a mode acts on: the requested one, or the single free symbol.
fn bound_variable(request: &ComputeRequest, parsed: &Parsed) -> Result<String, FormulaError> {
    let requested = request.variable.trim();
    if !requested.is_empty() {
        return normalize_identifier(requested)
            .ok_or_else(|| computation(format!("'{}' is not a variable name", requested)));
    }
    let free = parsed.free_variables();
    match free.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(computation(format!(
            "{} needs a variable but the formula has none",
            request.mode
        ))),
        _ => Err(computation(format!(
            "{} needs a variable: choose one of {}",
            request.mode,
            free.join(", ")
        ))),
    }
}

fn evaluate(expr: &Expr, substitutions: &Substitution) -> Result<String, String> {
    let substituted = expr.doit()?.set_variable_from_map(&substitutions.to_var_map());
    let value = substituted.eval_expression(&HashMap::new())?;
    Ok(format_decimal(value))
}

/// One side (or the whole expression) through a non-Solve mode.
fn transform(
    expr: &Expr,
    mode: ComputeMode,
    var: Option<&str>,
    substitutions: &Substitution,
) -> Result<String, String> {
    let result = match (mode, var) {
        (ComputeMode::Simplify, _) => expr.doit()?.simplify(),
        (ComputeMode::Expand, _) => expr.doit()?.expand(),
        (ComputeMode::Factor, _) => {
            let simplified = expr.doit()?.simplify();
            check_degree(&simplified)?;
            simplified.factor()
        }
        (ComputeMode::Differentiate, Some(var)) => expr.doit()?.differentiate(var, 1),
        // an integral or derivative written in the markup is evaluated, not integrated again
        (ComputeMode::Integrate, _)
            if matches!(expr, Expr::Integral { .. } | Expr::Derivative { .. }) =>
        {
            expr.doit()?.simplify()
        }
        (ComputeMode::Integrate, Some(var)) => expr.integrate(var)?,
        (ComputeMode::Evaluate, _) => return evaluate(expr, substitutions),
        (mode, _) => return Err(format!("{} needs a variable", mode)),
    };
    debug!("{} -> {}", expr, result);
    Ok(result.to_latex())
}

fn run(request: &ComputeRequest) -> Result<String, FormulaError> {
    let parsed = parse_input(&request.text)?;
    let has_zero_division = match &parsed {
        Parsed::Expression(e) => e.has_zero_division(),
        Parsed::Equation(l, r) => l.has_zero_division() || r.has_zero_division(),
    };
    if has_zero_division {
        return Err(computation("division by zero".to_string()));
    }
    if request.mode != ComputeMode::Evaluate && !request.substitutions.is_empty() {
        debug!("substitutions ignored in {} mode", request.mode);
    }
    let is_top_level_construct = matches!(
        &parsed,
        Parsed::Expression(Expr::Integral { .. } | Expr::Derivative { .. })
    );
    let var = if request.mode.needs_variable()
        && !(request.mode == ComputeMode::Integrate && is_top_level_construct)
    {
        Some(bound_variable(request, &parsed)?)
    } else {
        None
    };
    let subs = &request.substitutions;
    match (&parsed, request.mode) {
        (Parsed::Expression(expr), ComputeMode::Solve) => {
            let var = var.as_deref().unwrap_or_default();
            let solutions = solve_equation(expr, &Expr::Const(0.0), var).map_err(computation)?;
            Ok(print_solution_list(&solutions))
        }
        (Parsed::Equation(lhs, rhs), ComputeMode::Solve) => {
            let var = var.as_deref().unwrap_or_default();
            let solutions = solve_equation(lhs, rhs, var).map_err(computation)?;
            Ok(print_solution_list(&solutions))
        }
        (Parsed::Expression(expr), mode) => {
            transform(expr, mode, var.as_deref(), subs).map_err(computation)
        }
        (Parsed::Equation(lhs, rhs), mode) => {
            let lhs = transform(lhs, mode, var.as_deref(), subs).map_err(computation)?;
            let rhs = transform(rhs, mode, var.as_deref(), subs).map_err(computation)?;
            Ok(format!("{} = {}", lhs, rhs))
        }
    }
}

/// Runs one compute request. Never panics on bad input; every failure comes back
/// as `ComputeResult::Failure` with its kind.
pub fn compute(request: &ComputeRequest) -> ComputeResult {
    info!(
        "compute {} (variable '{}', {} substitutions): {}",
        request.mode,
        request.variable,
        request.substitutions.len(),
        request.text
    );
    let result = ComputeResult::from(run(request));
    if let ComputeResult::Failure(err) = &result {
        warn!("{}: {}", err.kind(), err);
    }
    result
}
