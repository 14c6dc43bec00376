use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_polynomial::Polynomial;
use crate::symbolic::symbolic_simplify::{Term, build_term, flatten_add, term_of};
use crate::symbolic::utils::is_integer;
use gauss_quad::GaussLegendre;
use std::collections::HashMap;

/// placeholder symbol for u-substitution
const SUBSTITUTION_VAR: &str = "__u";
/// Gauss-Legendre degree for definite integrals without a closed form
pub const QUADRATURE_DEGREE: usize = 64;

/// Slope `a` of an expression of the form `a x + b` (`a != 0`).
fn linear_slope(expr: &Expr, var: &str) -> Option<f64> {
    match expr.diff(var).simplify() {
        Expr::Const(a) if a != 0.0 => Some(a),
        _ => None,
    }
}

fn product(factors: &[(Expr, Expr)]) -> Expr {
    build_term(&Term {
        coeff: 1.0,
        factors: factors.to_vec(),
    })
}

fn sqrt_of(expr: Expr) -> Expr {
    expr.pow(Expr::Const(0.5))
}

/// ∫ f(u) dx for a function node whose argument `u = a x + b` is linear.
fn integrate_linear_function(f: &Expr, var: &str) -> Option<Expr> {
    let u = f.unary_arg().or(match f {
        Expr::Log(_, arg) => Some(arg.as_ref()),
        _ => None,
    })?;
    let a = linear_slope(u, var)?;
    let u = u.clone();
    let one = Expr::Const(1.0);
    let antiderivative = match f {
        // ∫ e^u = e^u
        Expr::Exp(_) => Expr::Exp(Box::new(u)),
        // ∫ sin u = -cos u
        Expr::sin(_) => -Expr::cos(Box::new(u)),
        Expr::cos(_) => Expr::sin(Box::new(u)),
        // ∫ tan u = -ln(cos u)
        Expr::tg(_) => -Expr::Ln(Box::new(Expr::cos(Box::new(u)))),
        Expr::ctg(_) => Expr::Ln(Box::new(Expr::sin(Box::new(u)))),
        // ∫ ln u = u ln u - u
        Expr::Ln(_) => u.clone() * Expr::Ln(Box::new(u.clone())) - u,
        Expr::Log(base, _) => {
            (u.clone() * Expr::Ln(Box::new(u.clone())) - u) / Expr::Ln(base.clone())
        }
        Expr::arcsin(_) => {
            u.clone() * Expr::arcsin(Box::new(u.clone()))
                + sqrt_of(one - u.clone().pow(Expr::Const(2.0)))
        }
        Expr::arccos(_) => {
            u.clone() * Expr::arccos(Box::new(u.clone()))
                - sqrt_of(one - u.clone().pow(Expr::Const(2.0)))
        }
        Expr::arctg(_) => {
            u.clone() * Expr::arctg(Box::new(u.clone()))
                - Expr::Ln(Box::new(one + u.clone().pow(Expr::Const(2.0)))) / Expr::Const(2.0)
        }
        _ => return None,
    };
    Some(antiderivative / Expr::Const(a))
}

/// ∫ 1/(a x^2 + b x + c) dx
fn integrate_reciprocal_quadratic(base: &Expr, var: &str) -> Option<Expr> {
    let poly = Polynomial::from_expr(base, var)?;
    if poly.degree() != 2 {
        return None;
    }
    let (c, b, a) = (poly.coeffs[0], poly.coeffs[1], poly.coeffs[2]);
    let x = Expr::var(var);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        // 2/sqrt(4ac - b^2) atan((2ax + b)/sqrt(4ac - b^2))
        let root = (-discriminant).sqrt();
        let inner = (Expr::Const(2.0 * a / root) * x) + Expr::Const(b / root);
        Some(Expr::Const(2.0 / root) * Expr::arctg(Box::new(inner)))
    } else if discriminant > 0.0 {
        // partial fractions over the two real roots
        let root = discriminant.sqrt();
        let (r1, r2) = ((-b + root) / (2.0 * a), (-b - root) / (2.0 * a));
        let scale = 1.0 / (a * (r1 - r2));
        let ln_shift = |r: f64| Expr::Ln(Box::new(x.clone() - Expr::Const(r)));
        Some(Expr::Const(scale) * (ln_shift(r1) - ln_shift(r2)))
    } else {
        None
    }
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var`, without the constant of integration.
    ///
    /// The integrand is simplified and split into terms; each term is integrated by
    /// table lookup on linear arguments, the power rule, integration by parts for
    /// `x^n e^{ax}`, `x^n \sin`, `x^n \cos`, `x^n \ln x`, the `f'/f` rule and
    /// u-substitution.
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        let integrand = self.doit()?.simplify();
        let mut items = Vec::new();
        flatten_add(&integrand, &mut items);
        let mut parts = Vec::with_capacity(items.len());
        for item in &items {
            parts.push(integrate_term(&term_of(item), var)?);
        }
        let sum = parts
            .into_iter()
            .reduce(|acc, p| acc + p)
            .unwrap_or(Expr::Const(0.0));
        Ok(sum.simplify())
    }

    /// Definite integral. Uses the antiderivative when one is found, otherwise
    /// Gauss-Legendre quadrature when the bounds are numeric.
    pub fn definite_integrate(&self, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, String> {
        match self.integrate(var) {
            Ok(antiderivative) => {
                let at_upper = antiderivative.substitute_variable(var, upper);
                let at_lower = antiderivative.substitute_variable(var, lower);
                Ok((at_upper - at_lower).simplify())
            }
            Err(symbolic_error) => {
                let empty = HashMap::new();
                let bounds = (lower.eval_expression(&empty), upper.eval_expression(&empty));
                let free = self.free_variables();
                match bounds {
                    (Ok(a), Ok(b)) if free.iter().all(|v| v == var) => {
                        log::info!("no antiderivative for {}, using quadrature", self);
                        Ok(Expr::Const(self.quad(var, QUADRATURE_DEGREE, a, b)?))
                    }
                    _ => Err(symbolic_error),
                }
            }
        }
    }

    /// Numerical integration by Gauss-Legendre quadrature.
    pub fn quad(&self, var: &str, degree: usize, lower: f64, upper: f64) -> Result<f64, String> {
        let quad = GaussLegendre::new(degree)
            .map_err(|e| format!("Failed to create Gauss-Legendre quadrature: {:?}", e))?;
        let f = |x: f64| {
            let mut values = HashMap::new();
            values.insert(var.to_string(), x);
            self.eval_expression(&values).unwrap_or(f64::NAN)
        };
        let result = quad.integrate(lower, upper, f);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(format!("integral of {} diverges on [{}, {}]", self, lower, upper))
        }
    }

    /// Evaluates every `Integral` and `Derivative` construct, innermost first.
    pub fn doit(&self) -> Result<Expr, String> {
        if !self.has_unevaluated() {
            return Ok(self.clone());
        }
        let inner = self.try_map_children(&|child| child.doit())?;
        match &inner {
            Expr::Derivative { expr, var, order } => Ok(expr.differentiate(var, *order)),
            Expr::Integral {
                integrand,
                var,
                bounds: None,
            } => integrand.integrate(var),
            Expr::Integral {
                integrand,
                var,
                bounds: Some((lower, upper)),
            } => integrand.definite_integrate(var, lower, upper),
            _ => Ok(inner),
        }
    }
}

fn integrate_term(term: &Term, var: &str) -> Result<Expr, String> {
    let (dependent, constant): (Vec<(Expr, Expr)>, Vec<(Expr, Expr)>) = term
        .factors
        .iter()
        .cloned()
        .partition(|(base, exp)| base.contains_variable(var) || exp.contains_variable(var));
    let constant = build_term(&Term {
        coeff: term.coeff,
        factors: constant,
    });
    let integral = match dependent.as_slice() {
        [] => Some(Expr::var(var)),
        [(base, exp)] => integrate_factor(base, exp, var),
        _ => None,
    }
    .or_else(|| integrate_by_parts(&dependent, var))
    .or_else(|| integrate_log_derivative(&dependent, var))
    .or_else(|| integrate_substitution(&dependent, var));
    match integral {
        Some(integral) => Ok(constant * integral),
        None => Err(format!(
            "cannot integrate {} with respect to {}",
            build_term(term).to_latex(),
            var
        )),
    }
}

/// ∫ base^exp dx for a single factor.
fn integrate_factor(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    let exp_free = !exp.contains_variable(var);
    let base_free = !base.contains_variable(var);
    if exp_free {
        if let Some(a) = linear_slope(base, var) {
            // ∫ u^n = u^(n+1)/(n+1), ∫ 1/u = ln u
            return Some(match exp.as_const() {
                Some(n) if n == -1.0 => Expr::Ln(Box::new(base.clone())) / Expr::Const(a),
                Some(n) => base.clone().pow(Expr::Const(n + 1.0)) / Expr::Const(a * (n + 1.0)),
                None => {
                    let raised = exp.clone() + Expr::Const(1.0);
                    base.clone().pow(raised.clone()) / (Expr::Const(a) * raised)
                }
            });
        }
    }
    if base_free {
        // ∫ c^u = c^u / (a ln c)
        let a = linear_slope(exp, var)?;
        return Some(
            base.clone().pow(exp.clone()) / (Expr::Const(a) * Expr::Ln(Box::new(base.clone()))),
        );
    }
    match exp.as_const() {
        Some(n) if n == 1.0 => integrate_linear_function(base, var),
        Some(n) if n == 2.0 => match base {
            // sin^2 u = (1 - cos 2u)/2, cos^2 u = (1 + cos 2u)/2
            Expr::sin(u) | Expr::cos(u) => {
                let a = linear_slope(u, var)?;
                let double = Expr::sin(Box::new(Expr::Const(2.0) * (**u).clone()))
                    / Expr::Const(4.0 * a);
                let half = Expr::var(var) / Expr::Const(2.0);
                Some(if matches!(base, Expr::sin(_)) {
                    half - double
                } else {
                    half + double
                })
            }
            _ => None,
        },
        Some(n) if n == -1.0 => integrate_reciprocal_quadratic(base, var),
        _ => None,
    }
}

/// ∫ x^n f(x) dx = x^n F - n ∫ x^(n-1) F dx for f in {exp, sin, cos}; x^n ln x.
fn integrate_by_parts(factors: &[(Expr, Expr)], var: &str) -> Option<Expr> {
    let [first, second] = factors else {
        return None;
    };
    let is_power = |(base, exp): &(Expr, Expr)| match (base, exp.as_const()) {
        (Expr::Var(name), Some(n)) if name == var && is_integer(n) && n > 0.0 => Some(n),
        _ => None,
    };
    let (n, (other, other_exp)) = match (is_power(first), is_power(second)) {
        (Some(n), _) => (n, second),
        (_, Some(n)) => (n, first),
        _ => return None,
    };
    if !other_exp.is_one() {
        return None;
    }
    let x = Expr::var(var);
    match other {
        Expr::Ln(arg) if **arg == x => {
            // ∫ x^n ln x = x^(n+1) ln x/(n+1) - x^(n+1)/(n+1)^2
            let raised = x.clone().pow(Expr::Const(n + 1.0));
            Some(
                raised.clone() * Expr::Ln(Box::new(x)) / Expr::Const(n + 1.0)
                    - raised / Expr::Const((n + 1.0) * (n + 1.0)),
            )
        }
        Expr::Exp(_) | Expr::sin(_) | Expr::cos(_) => {
            let antiderivative = integrate_linear_function(other, var)?;
            let reduced = x.clone().pow(Expr::Const(n - 1.0)) * antiderivative.clone();
            let remainder = reduced.integrate(var).ok()?;
            Some(x.pow(Expr::Const(n)) * antiderivative - Expr::Const(n) * remainder)
        }
        _ => None,
    }
}

/// ∫ c h'(x)/h(x) dx = c ln h(x)
fn integrate_log_derivative(factors: &[(Expr, Expr)], var: &str) -> Option<Expr> {
    let position = factors
        .iter()
        .position(|(_, exp)| exp.as_const() == Some(-1.0))?;
    let denominator = &factors[position].0;
    let rest: Vec<(Expr, Expr)> = factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, f)| f.clone())
        .collect();
    let derivative = denominator.diff(var).simplify();
    if derivative.is_zero() {
        return None;
    }
    let ratio = (product(&rest) / derivative).simplify();
    if ratio.contains_variable(var) {
        return None;
    }
    Some(ratio * Expr::Ln(Box::new(denominator.clone())))
}

/// ∫ f(h(x)) h'(x) dx = F(h(x))
fn integrate_substitution(factors: &[(Expr, Expr)], var: &str) -> Option<Expr> {
    let u = Expr::var(SUBSTITUTION_VAR);
    for (i, (base, exp)) in factors.iter().enumerate() {
        let mut candidates = Vec::new();
        if !exp.contains_variable(var) {
            candidates.push(base.clone());
        }
        if !base.contains_variable(var) {
            candidates.push(exp.clone());
        }
        if let Some(arg) = base.unary_arg() {
            candidates.push(arg.clone());
        }
        for inner in candidates {
            if inner == Expr::var(var) || !inner.contains_variable(var) {
                continue;
            }
            let derivative = inner.diff(var).simplify();
            if derivative.is_zero() {
                continue;
            }
            let rest: Vec<(Expr, Expr)> = factors
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, f)| f.clone())
                .collect();
            let ratio = (product(&rest) / derivative).simplify();
            if ratio.contains_variable(var) {
                continue;
            }
            let outer = Expr::Pow(
                Box::new(base.replace_subexpr(&inner, &u)),
                Box::new(exp.replace_subexpr(&inner, &u)),
            );
            if outer.contains_variable(var) {
                continue;
            }
            if let Ok(antiderivative) = outer.integrate(SUBSTITUTION_VAR) {
                return Some(ratio * antiderivative.substitute_variable(SUBSTITUTION_VAR, &inner));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::latex_parser::parse_latex;
    use approx::assert_relative_eq;

    fn integrate(input: &str) -> String {
        parse_latex(input).unwrap().integrate("x").unwrap().to_latex()
    }

    /// checks F' == f numerically at a few points
    fn assert_antiderivative(input: &str) {
        let f = parse_latex(input).unwrap();
        let antiderivative = f.integrate("x").unwrap();
        let derivative = antiderivative.differentiate("x", 1);
        for x in [0.3, 0.7, 1.9] {
            let mut values = HashMap::new();
            values.insert("x".to_string(), x);
            assert_relative_eq!(
                derivative.eval_expression(&values).unwrap(),
                f.eval_expression(&values).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_integrate_power() {
        assert_eq!(integrate("x^{2}"), "\\frac{x^{3}}{3}");
        assert_eq!(integrate("\\frac{1}{x}"), "\\ln{\\left(x \\right)}");
        assert_eq!(integrate("3"), "3 x");
    }

    #[test]
    fn test_integrate_polynomial() {
        assert_eq!(integrate("x^{2} + 2x"), "\\frac{x^{3}}{3} + x^{2}");
    }

    #[test]
    fn test_integrate_functions_of_linear_arguments() {
        assert_eq!(integrate("\\cos x"), "\\sin{\\left(x \\right)}");
        assert_antiderivative("e^{3x + 1}");
        assert_antiderivative("\\sin(2x)");
        assert_antiderivative("\\ln x");
    }

    #[test]
    fn test_integrate_by_parts() {
        assert_antiderivative("x e^{x}");
        assert_antiderivative("x^{2} \\cos x");
        assert_antiderivative("x \\ln x");
    }

    #[test]
    fn test_integrate_substitution_and_log_derivative() {
        assert_antiderivative("2x e^{x^{2}}");
        assert_antiderivative("\\frac{2x}{x^{2} + 1}");
        assert_antiderivative("\\frac{1}{x^{2} + 1}");
        assert_antiderivative("x (x^{2} + 1)^{3}");
    }

    #[test]
    fn test_unknown_integral_is_an_error() {
        let f = parse_latex("e^{x^{2}}").unwrap();
        assert!(f.integrate("x").is_err());
    }

    #[test]
    fn test_definite_integral_symbolic_and_numeric() {
        let f = parse_latex("x^{2}").unwrap();
        let value = f
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(3.0))
            .unwrap();
        assert_eq!(value, Expr::Const(9.0));
        // no closed form: quadrature
        let g = parse_latex("e^{x^{2}}").unwrap();
        let numeric = g
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0))
            .unwrap();
        assert_relative_eq!(numeric.as_const().unwrap(), 1.4626517459071816, epsilon = 1e-10);
    }

    #[test]
    fn test_doit_evaluates_constructs() {
        let expr = parse_latex("\\int_{0}^{1} x \\, dx + \\frac{d}{dx} x^{2}").unwrap();
        let done = expr.doit().unwrap().simplify();
        assert_eq!(done.to_latex(), "2 x + \\frac{1}{2}");
    }
}
