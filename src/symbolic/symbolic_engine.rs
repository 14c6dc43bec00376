//! # Symbolic Engine Module
//!
//! Core expression tree of the formula backend. Markup typed by the user is parsed
//! (see `latex_parser`) into an [`Expr`], transformed by one of the computation
//! modes and rendered back to markup (see `latex_printer`).
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Symbols**: `Var(String)` - `x`, `y`, Greek letters stored by name (`alpha`), the
//!   constants `pi` and `e`
//! - **Constants**: `Const(f64)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `Log`, `sin`, `cos`, `tg`, `ctg`, `arcsin`, `arccos`, `arctg`
//! - **Unevaluated constructs**: `Integral` and `Derivative`, produced when the markup
//!   itself contains `\int ... dx` or `\frac{d}{dx}`; they are evaluated by `doit()`
//!
//! ### Key Methods
//! - `set_variable_from_map()` - substitute numeric values
//! - `free_variables()` - symbols that still need a value
//! - `eval_expression()` - numeric evaluation with a classified error for unbound symbols
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Expression Tree**: `Box<Expr>` children, so arbitrary nesting
//! 2. **Operator Overloading**: std::ops traits build trees with natural syntax
//! 3. **Non-standard Function Names**: `tg`, `ctg`, `arctg` as in the rest of the engine

#![allow(non_camel_case_types)]

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{E, PI};
use std::fmt;

/// Names that stand for mathematical constants rather than free symbols.
pub const CONSTANT_SYMBOLS: [&str; 2] = ["pi", "e"];

/// Core symbolic expression enum.
///
/// # Examples
/// ```rust, ignore
/// use RustedFormula::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbol with a name ("x", "alpha", "x_1")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// left + right
    Add(Box<Expr>, Box<Expr>),
    /// left - right
    Sub(Box<Expr>, Box<Expr>),
    /// left * right
    Mul(Box<Expr>, Box<Expr>),
    /// left / right
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// e^x
    Exp(Box<Expr>),
    /// natural logarithm
    Ln(Box<Expr>),
    /// logarithm with explicit base: Log(base, argument)
    Log(Box<Expr>, Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    tg(Box<Expr>),
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    /// Unevaluated integral; `bounds` is `Some((lower, upper))` for a definite integral
    Integral {
        integrand: Box<Expr>,
        var: String,
        bounds: Option<(Box<Expr>, Box<Expr>)>,
    },
    /// Unevaluated derivative of the given order
    Derivative {
        expr: Box<Expr>,
        var: String,
        order: usize,
    },
}

/// Plain-text form, used in log lines and error messages.
/// For markup output see `Expr::to_latex`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::Log(base, expr) => write!(f, "log_{}({})", base, expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
            Expr::ctg(expr) => write!(f, "ctg({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
            Expr::arctg(expr) => write!(f, "arctg({})", expr),
            Expr::Integral {
                integrand,
                var,
                bounds: None,
            } => write!(f, "integral({}, d{})", integrand, var),
            Expr::Integral {
                integrand,
                var,
                bounds: Some((lower, upper)),
            } => write!(f, "integral({}, d{}, {}..{})", integrand, var, lower, upper),
            Expr::Derivative { expr, var, order } => {
                write!(f, "derivative({}, d{}^{})", expr, var, order)
            }
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates a symbol.
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Wraps expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            _ => None,
        }
    }

    /// Argument of a one-argument function node (`Exp`, `Ln`, `sin`, ...).
    pub fn unary_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(a)
            | Expr::Ln(a)
            | Expr::sin(a)
            | Expr::cos(a)
            | Expr::tg(a)
            | Expr::ctg(a)
            | Expr::arcsin(a)
            | Expr::arccos(a)
            | Expr::arctg(a) => Some(a),
            _ => None,
        }
    }

    /// Rebuilds a one-argument function node of the same kind around a new argument.
    /// Returns the argument unchanged for any other node.
    pub fn with_unary_arg(&self, arg: Expr) -> Expr {
        let arg = Box::new(arg);
        match self {
            Expr::Exp(_) => Expr::Exp(arg),
            Expr::Ln(_) => Expr::Ln(arg),
            Expr::sin(_) => Expr::sin(arg),
            Expr::cos(_) => Expr::cos(arg),
            Expr::tg(_) => Expr::tg(arg),
            Expr::ctg(_) => Expr::ctg(arg),
            Expr::arcsin(_) => Expr::arcsin(arg),
            Expr::arccos(_) => Expr::arccos(arg),
            Expr::arctg(_) => Expr::arctg(arg),
            _ => *arg,
        }
    }

    /// Applies `f` to every direct child and rebuilds the node.
    /// Bound variables of `Integral`/`Derivative` are left untouched.
    pub fn map_children<F>(&self, f: &F) -> Expr
    where
        F: Fn(&Expr) -> Expr,
    {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Mul(lhs, rhs) => Expr::Mul(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Div(lhs, rhs) => Expr::Div(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Pow(base, exp) => Expr::Pow(Box::new(f(base)), Box::new(f(exp))),
            Expr::Log(base, arg) => Expr::Log(Box::new(f(base)), Box::new(f(arg))),
            Expr::Integral {
                integrand,
                var,
                bounds,
            } => Expr::Integral {
                integrand: Box::new(f(integrand)),
                var: var.clone(),
                bounds: bounds
                    .as_ref()
                    .map(|(lower, upper)| (Box::new(f(lower)), Box::new(f(upper)))),
            },
            Expr::Derivative { expr, var, order } => Expr::Derivative {
                expr: Box::new(f(expr)),
                var: var.clone(),
                order: *order,
            },
            other => match other.unary_arg() {
                Some(arg) => other.with_unary_arg(f(arg)),
                None => other.clone(),
            },
        }
    }

    /// Fallible version of [`Expr::map_children`]; stops at the first error.
    pub fn try_map_children<F>(&self, f: &F) -> Result<Expr, String>
    where
        F: Fn(&Expr) -> Result<Expr, String>,
    {
        let pair = |a: &Expr, b: &Expr| -> Result<(Box<Expr>, Box<Expr>), String> {
            Ok((Box::new(f(a)?), Box::new(f(b)?)))
        };
        Ok(match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let (a, b) = pair(lhs, rhs)?;
                Expr::Add(a, b)
            }
            Expr::Sub(lhs, rhs) => {
                let (a, b) = pair(lhs, rhs)?;
                Expr::Sub(a, b)
            }
            Expr::Mul(lhs, rhs) => {
                let (a, b) = pair(lhs, rhs)?;
                Expr::Mul(a, b)
            }
            Expr::Div(lhs, rhs) => {
                let (a, b) = pair(lhs, rhs)?;
                Expr::Div(a, b)
            }
            Expr::Pow(base, exp) => {
                let (a, b) = pair(base, exp)?;
                Expr::Pow(a, b)
            }
            Expr::Log(base, arg) => {
                let (a, b) = pair(base, arg)?;
                Expr::Log(a, b)
            }
            Expr::Integral {
                integrand,
                var,
                bounds,
            } => Expr::Integral {
                integrand: Box::new(f(integrand)?),
                var: var.clone(),
                bounds: match bounds {
                    Some((lower, upper)) => Some(pair(lower, upper)?),
                    None => None,
                },
            },
            Expr::Derivative { expr, var, order } => Expr::Derivative {
                expr: Box::new(f(expr)?),
                var: var.clone(),
                order: *order,
            },
            other => match other.unary_arg() {
                Some(arg) => other.with_unary_arg(f(arg)?),
                None => other.clone(),
            },
        })
    }

    /// Replaces every occurrence of the subtree `target`.
    pub fn replace_subexpr(&self, target: &Expr, replacement: &Expr) -> Expr {
        if self == target {
            replacement.clone()
        } else {
            self.map_children(&|child| child.replace_subexpr(target, replacement))
        }
    }

    /// Substitutes multiple symbols with constant values.
    /// Only symbols present in the map are substituted.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::Const(*value),
                None => self.clone(),
            },
            // the integration variable of a definite integral is bound
            Expr::Integral {
                integrand,
                var,
                bounds: Some((lower, upper)),
            } => {
                let mut inner_map = var_map.clone();
                inner_map.remove(var);
                Expr::Integral {
                    integrand: Box::new(integrand.set_variable_from_map(&inner_map)),
                    var: var.clone(),
                    bounds: Some((
                        Box::new(lower.set_variable_from_map(var_map)),
                        Box::new(upper.set_variable_from_map(var_map)),
                    )),
                }
            }
            _ => self.map_children(&|child| child.set_variable_from_map(var_map)),
        }
    }

    /// Substitutes a symbol with a constant value.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        let mut map = HashMap::new();
        map.insert(var.to_string(), value);
        self.set_variable_from_map(&map)
    }

    /// Substitutes a symbol with an expression.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_children(&|child| child.substitute_variable(var, expr)),
        }
    }

    /// Checks if the expression contains a symbol.
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right)
            | Expr::Log(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            Expr::Integral {
                integrand,
                var,
                bounds: Some((lower, upper)),
            } => {
                (var != var_name && integrand.contains_variable(var_name))
                    || lower.contains_variable(var_name)
                    || upper.contains_variable(var_name)
            }
            Expr::Integral { integrand, var, .. } => {
                var == var_name || integrand.contains_variable(var_name)
            }
            Expr::Derivative { expr, .. } => expr.contains_variable(var_name),
            other => other
                .unary_arg()
                .is_some_and(|arg| arg.contains_variable(var_name)),
        }
    }

    /// Free symbols in deterministic (sorted) order; `pi` and `e` are not free.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out.retain(|name| !CONSTANT_SYMBOLS.contains(&name.as_str()));
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Const(_) => {}
            Expr::Integral {
                integrand,
                var,
                bounds: Some((lower, upper)),
            } => {
                let mut inner = BTreeSet::new();
                integrand.collect_variables(&mut inner);
                inner.remove(var);
                out.extend(inner);
                lower.collect_variables(out);
                upper.collect_variables(out);
            }
            Expr::Integral { integrand, var, .. } => {
                out.insert(var.clone());
                integrand.collect_variables(out);
            }
            Expr::Derivative { expr, var, .. } => {
                out.insert(var.clone());
                expr.collect_variables(out);
            }
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Log(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
            other => {
                if let Some(arg) = other.unary_arg() {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// True when the tree still holds an unevaluated `Integral` or `Derivative`.
    pub fn has_unevaluated(&self) -> bool {
        match self {
            Expr::Integral { .. } | Expr::Derivative { .. } => true,
            Expr::Var(_) | Expr::Const(_) => false,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Log(a, b) => a.has_unevaluated() || b.has_unevaluated(),
            other => other.unary_arg().is_some_and(|arg| arg.has_unevaluated()),
        }
    }

    /// Number of nodes, used to pick the smaller of equivalent forms.
    pub fn size(&self) -> usize {
        match self {
            Expr::Var(_) | Expr::Const(_) => 1,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Log(a, b) => 1 + a.size() + b.size(),
            Expr::Integral { integrand, .. } => 1 + integrand.size(),
            Expr::Derivative { expr, .. } => 1 + expr.size(),
            other => 1 + other.unary_arg().map_or(0, |arg| arg.size()),
        }
    }

    /// Evaluates the expression to a number.
    ///
    /// `pi` and `e` evaluate to their values unless the map overrides them.
    /// Any other symbol missing from `values` is an error, as is a non-finite
    /// intermediate (division by zero, logarithm of a non-positive number, ...).
    pub fn eval_expression(&self, values: &HashMap<String, f64>) -> Result<f64, String> {
        let res = match self {
            Expr::Var(name) => match (values.get(name), name.as_str()) {
                (Some(value), _) => *value,
                (None, "pi") => PI,
                (None, "e") => E,
                (None, _) => return Err(format!("no value for variable '{}'", name)),
            },
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_expression(values)? + rhs.eval_expression(values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_expression(values)? - rhs.eval_expression(values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_expression(values)? * rhs.eval_expression(values)?,
            Expr::Div(lhs, rhs) => {
                let denominator = rhs.eval_expression(values)?;
                if denominator == 0.0 {
                    return Err(format!("division by zero in {}", self));
                }
                lhs.eval_expression(values)? / denominator
            }
            Expr::Pow(base, exp) => base.eval_expression(values)?.powf(exp.eval_expression(values)?),
            Expr::Exp(expr) => expr.eval_expression(values)?.exp(),
            Expr::Ln(expr) => expr.eval_expression(values)?.ln(),
            Expr::Log(base, expr) => {
                expr.eval_expression(values)?.ln() / base.eval_expression(values)?.ln()
            }
            Expr::sin(expr) => expr.eval_expression(values)?.sin(),
            Expr::cos(expr) => expr.eval_expression(values)?.cos(),
            Expr::tg(expr) => expr.eval_expression(values)?.tan(),
            Expr::ctg(expr) => 1.0 / expr.eval_expression(values)?.tan(),
            Expr::arcsin(expr) => expr.eval_expression(values)?.asin(),
            Expr::arccos(expr) => expr.eval_expression(values)?.acos(),
            Expr::arctg(expr) => expr.eval_expression(values)?.atan(),
            Expr::Integral { .. } | Expr::Derivative { .. } => {
                return Err(format!("cannot evaluate unevaluated construct {}", self));
            }
        };
        if res.is_finite() {
            Ok(res)
        } else {
            Err(format!("{} is undefined for the given values", self))
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbols from a comma-separated list
/// Usage: symbols!(x, y, z) -> creates Expr::Var for x, y, z
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        ($($crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string())),+)
    };
}
