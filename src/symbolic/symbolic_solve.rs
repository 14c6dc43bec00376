//! # Equation Solving Module
//!
//! Solves `lhs = rhs` for one symbol.
//!
//! ## Strategy
//!
//! 1. Move everything to one side and clear denominators that contain the unknown
//! 2. **Polynomial, numeric coefficients**: exact rational roots, exact quadratic formula
//!    (surds and complex pairs written with `i`), Durand-Kerner iteration for the
//!    irreducible rest of degree three or more
//! 3. **Polynomial, symbolic coefficients**: linear and quadratic formulas
//! 4. **Single occurrence of the unknown**: the expression is peeled off by inverse
//!    operations (`e^u = r` gives `u = \ln r`, `\sin u = r` gives `\arcsin r` and
//!    `\pi - \arcsin r`, ...)
//!
//! Real solutions are reported in ascending order, followed by complex ones.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_polynomial::{
    Polynomial, check_degree, polynomial_terms, rational_roots,
};
use crate::symbolic::symbolic_simplify::{Term, build_term, flatten_add, term_of};
use crate::symbolic::utils::is_integer;
use num_complex::Complex64;
use std::cmp::Ordering;
use std::collections::HashMap;

const DURAND_KERNER_MAX_ITER: usize = 1000;
const DURAND_KERNER_TOL: f64 = 1e-14;
/// imaginary parts below this are rounding noise
const IMAG_EPS: f64 = 1e-10;

fn imaginary_unit() -> Expr {
    Expr::var("i")
}

fn sqrt_of(expr: Expr) -> Expr {
    expr.pow(Expr::Const(0.5))
}

/// `s sqrt(m)` with the largest square factor of `n` taken out
fn integer_sqrt(n: i128) -> Expr {
    let mut outside: i128 = 1;
    let mut inside = n;
    let mut k: i128 = 2;
    while k * k <= inside {
        while inside % (k * k) == 0 {
            inside /= k * k;
            outside *= k;
        }
        k += 1;
    }
    if inside == 1 {
        Expr::Const(outside as f64)
    } else {
        (Expr::Const(outside as f64) * sqrt_of(Expr::Const(inside as f64))).simplify()
    }
}

fn complex_expr(re: f64, im: f64) -> Expr {
    // iteration noise around zero
    let re = if re.abs() < IMAG_EPS { 0.0 } else { re };
    if im.abs() < IMAG_EPS {
        return Expr::Const(re);
    }
    let imaginary = Expr::Const(im) * imaginary_unit();
    if re == 0.0 {
        imaginary.simplify()
    } else {
        (Expr::Const(re) + imaginary).simplify()
    }
}

/// Exact roots of `a x^2 + b x + c` with integer coefficients.
fn quadratic_roots(a: i128, b: i128, c: i128) -> Vec<Expr> {
    let discriminant = b * b - 4 * a * c;
    let center = Expr::Const(-(b as f64) / (2 * a) as f64);
    let scale = Expr::Const(1.0 / (2 * a) as f64);
    if discriminant == 0 {
        return vec![center.simplify()];
    }
    let root = integer_sqrt(discriminant.abs());
    let offset = if discriminant > 0 {
        scale * root
    } else {
        scale * root * imaginary_unit()
    };
    vec![
        (center.clone() - offset.clone()).simplify(),
        (center + offset).simplify(),
    ]
}

/// All complex roots of a polynomial (ascending coefficients) by Durand-Kerner.
pub fn durand_kerner(coeffs: &[f64]) -> Vec<Complex64> {
    let degree = coeffs.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }
    let lead = coeffs[degree];
    let monic: Vec<Complex64> = coeffs
        .iter()
        .map(|c| Complex64::new(c / lead, 0.0))
        .collect();
    let eval = |z: Complex64| {
        monic
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
    };
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|k| seed.powu(k as u32)).collect();
    for _ in 0..DURAND_KERNER_MAX_ITER {
        let mut max_change: f64 = 0.0;
        for k in 0..degree {
            let mut denominator = Complex64::new(1.0, 0.0);
            for (j, other) in roots.iter().enumerate() {
                if j != k {
                    denominator *= roots[k] - other;
                }
            }
            if denominator.norm() == 0.0 {
                continue;
            }
            let step = eval(roots[k]) / denominator;
            roots[k] -= step;
            max_change = max_change.max(step.norm());
        }
        if max_change < DURAND_KERNER_TOL {
            break;
        }
    }
    roots
}

/// Roots of a polynomial with numeric coefficients, exact where possible.
fn solve_numeric_polynomial(poly: &Polynomial) -> Vec<Expr> {
    match poly.degree() {
        0 => return Vec::new(),
        1 => return vec![Expr::Const(-poly.coeffs[0] / poly.coeffs[1])],
        _ => {}
    }
    let Some((ints, _)) = poly.to_integer_coeffs() else {
        return durand_kerner(&poly.coeffs)
            .into_iter()
            .map(|z| complex_expr(z.re, z.im))
            .collect();
    };
    let (roots, remaining) = rational_roots(&ints);
    let mut solutions: Vec<Expr> = roots.iter().map(|r| Expr::Const(r.value())).collect();
    match remaining.len() {
        0 | 1 => {}
        2 => solutions.push(Expr::Const(-(remaining[0] as f64) / remaining[1] as f64)),
        3 => solutions.extend(quadratic_roots(remaining[2], remaining[1], remaining[0])),
        _ => {
            let floats: Vec<f64> = remaining.iter().map(|c| *c as f64).collect();
            solutions.extend(
                durand_kerner(&floats)
                    .into_iter()
                    .map(|z| complex_expr(z.re, z.im)),
            );
        }
    }
    solutions
}

/// Coefficients (by degree in `var`) of a polynomial whose coefficients may hold
/// other symbols.
fn symbolic_coefficients(expr: &Expr, var: &str) -> Option<Vec<Expr>> {
    let map = polynomial_terms(expr)?;
    let mut coeffs: Vec<Expr> = vec![Expr::Const(0.0)];
    for (key, coeff) in map {
        let degree = key.0.get(var).copied().unwrap_or(0) as usize;
        let others = key
            .0
            .iter()
            .filter(|(name, _)| *name != var)
            .map(|(name, exp)| (Expr::var(name), Expr::Const(*exp as f64)))
            .collect();
        let term = build_term(&Term {
            coeff,
            factors: others,
        });
        if coeffs.len() <= degree {
            coeffs.resize(degree + 1, Expr::Const(0.0));
        }
        coeffs[degree] = (coeffs[degree].clone() + term).simplify();
    }
    while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.is_zero()) {
        coeffs.pop();
    }
    Some(coeffs)
}

fn solve_symbolic_polynomial(coeffs: &[Expr]) -> Result<Vec<Expr>, String> {
    match coeffs {
        [c, b] => Ok(vec![(-(c.clone()) / b.clone()).simplify()]),
        [c, b, a] if b.is_zero() => {
            let root = sqrt_of((-(c.clone()) / a.clone()).simplify()).simplify();
            Ok(vec![(-root.clone()).simplify(), root])
        }
        [c, b, a] => {
            let discriminant = (b.clone().pow(Expr::Const(2.0))
                - Expr::Const(4.0) * a.clone() * c.clone())
            .expand();
            let root = sqrt_of(discriminant);
            let denominator = Expr::Const(2.0) * a.clone();
            Ok(vec![
                ((-(b.clone()) - root.clone()) / denominator.clone()).simplify(),
                ((-(b.clone()) + root) / denominator).simplify(),
            ])
        }
        _ => Err(format!(
            "cannot solve a polynomial of degree {} with symbolic coefficients",
            coeffs.len().saturating_sub(1)
        )),
    }
}

fn occurrences(expr: &Expr, var: &str) -> usize {
    match expr {
        Expr::Var(name) => usize::from(name == var),
        Expr::Const(_) => 0,
        Expr::Add(a, b)
        | Expr::Sub(a, b)
        | Expr::Mul(a, b)
        | Expr::Div(a, b)
        | Expr::Pow(a, b)
        | Expr::Log(a, b) => occurrences(a, var) + occurrences(b, var),
        other => other.unary_arg().map_or(0, |arg| occurrences(arg, var)),
    }
}

/// Peels `lhs = rhs` down to `var = ...`; `lhs` holds `var` exactly once.
fn isolate(lhs: &Expr, rhs: Vec<Expr>, var: &str) -> Result<Vec<Expr>, String> {
    let map = |rhs: Vec<Expr>, f: &dyn Fn(Expr) -> Vec<Expr>| -> Vec<Expr> {
        rhs.into_iter().flat_map(f).map(|e| e.simplify()).collect()
    };
    let pi = Expr::var("pi");
    match lhs {
        Expr::Var(name) if name == var => Ok(rhs),
        Expr::Add(a, b) => {
            let (inner, other) = if a.contains_variable(var) { (a, b) } else { (b, a) };
            isolate(inner, map(rhs, &|r| vec![r - (**other).clone()]), var)
        }
        Expr::Sub(a, b) if a.contains_variable(var) => {
            isolate(a, map(rhs, &|r| vec![r + (**b).clone()]), var)
        }
        Expr::Sub(a, b) => isolate(b, map(rhs, &|r| vec![(**a).clone() - r]), var),
        Expr::Mul(a, b) => {
            let (inner, other) = if a.contains_variable(var) { (a, b) } else { (b, a) };
            isolate(inner, map(rhs, &|r| vec![r / (**other).clone()]), var)
        }
        Expr::Div(a, b) if a.contains_variable(var) => {
            isolate(a, map(rhs, &|r| vec![r * (**b).clone()]), var)
        }
        Expr::Div(a, b) => isolate(b, map(rhs, &|r| vec![(**a).clone() / r]), var),
        Expr::Pow(base, exp) if base.contains_variable(var) => match exp.as_const() {
            Some(n) if n == 0.0 => Err("cannot solve: exponent is zero".to_string()),
            Some(n) if is_integer(n) && (n as i64) % 2 == 0 => {
                let inverse = Expr::Const(1.0 / n);
                isolate(
                    base,
                    map(rhs, &|r| {
                        let root = r.pow(inverse.clone());
                        vec![-root.clone(), root]
                    }),
                    var,
                )
            }
            _ => {
                let inverse = Expr::Const(1.0) / (**exp).clone();
                isolate(base, map(rhs, &|r| vec![r.pow(inverse.clone())]), var)
            }
        },
        // base^u = r  =>  u = ln r / ln base
        Expr::Pow(base, exp) => isolate(
            exp,
            map(rhs, &|r| vec![r.ln() / (**base).clone().ln()]),
            var,
        ),
        Expr::Exp(u) => isolate(u, map(rhs, &|r| vec![r.ln()]), var),
        Expr::Ln(u) => isolate(u, map(rhs, &|r| vec![r.exp()]), var),
        Expr::Log(base, u) => isolate(u, map(rhs, &|r| vec![(**base).clone().pow(r)]), var),
        Expr::sin(u) => isolate(
            u,
            map(rhs, &|r| {
                let principal = Expr::arcsin(Box::new(r));
                vec![principal.clone(), pi.clone() - principal]
            }),
            var,
        ),
        Expr::cos(u) => isolate(
            u,
            map(rhs, &|r| {
                let principal = Expr::arccos(Box::new(r));
                vec![principal.clone(), Expr::Const(2.0) * pi.clone() - principal]
            }),
            var,
        ),
        Expr::tg(u) => isolate(u, map(rhs, &|r| vec![Expr::arctg(Box::new(r))]), var),
        Expr::ctg(u) => isolate(
            u,
            map(rhs, &|r| vec![Expr::arctg(Box::new(Expr::Const(1.0) / r))]),
            var,
        ),
        Expr::arcsin(u) => isolate(u, map(rhs, &|r| vec![Expr::sin(Box::new(r))]), var),
        Expr::arccos(u) => isolate(u, map(rhs, &|r| vec![Expr::cos(Box::new(r))]), var),
        Expr::arctg(u) => isolate(u, map(rhs, &|r| vec![Expr::tg(Box::new(r))]), var),
        _ => Err(format!("cannot solve for {}: unsupported equation", var)),
    }
}

/// Multiplies through by every denominator that contains `var`.
/// Returns the numerator and the denominators (which must not vanish).
fn clear_denominators(expr: &Expr, var: &str) -> (Expr, Vec<Expr>) {
    let mut items = Vec::new();
    flatten_add(expr, &mut items);
    let terms: Vec<Term> = items.iter().map(term_of).collect();
    let mut denominators: Vec<(Expr, f64)> = Vec::new();
    for term in &terms {
        for (base, exp) in &term.factors {
            if let Some(e) = exp.as_const() {
                if e < 0.0 && base.contains_variable(var) {
                    match denominators.iter_mut().find(|(b, _)| b == base) {
                        Some((_, power)) => *power = power.max(-e),
                        None => denominators.push((base.clone(), -e)),
                    }
                }
            }
        }
    }
    if denominators.is_empty() {
        return (expr.clone(), Vec::new());
    }
    let numerator = terms
        .into_iter()
        .map(|mut term| {
            for (base, power) in &denominators {
                match term.factors.iter_mut().find(|(b, _)| b == base) {
                    Some((_, exp)) => {
                        *exp = Expr::Const(exp.as_const().unwrap_or(0.0) + power);
                    }
                    None => term.factors.push((base.clone(), Expr::Const(*power))),
                }
            }
            term.factors.retain(|(_, exp)| !exp.is_zero());
            build_term(&term)
        })
        .reduce(|acc, t| acc + t)
        .unwrap_or(Expr::Const(0.0))
        .expand();
    (numerator, denominators.into_iter().map(|(b, _)| b).collect())
}

/// numeric value as (re, im) if the solution has no free symbols
fn numeric_key(solution: &Expr) -> Option<(f64, f64)> {
    let empty = HashMap::new();
    let vars = solution.free_variables();
    if vars.is_empty() {
        return solution.eval_expression(&empty).ok().map(|re| (re, 0.0));
    }
    if vars.len() == 1 && vars.contains("i") {
        let re = solution.set_variable("i", 0.0).eval_expression(&empty).ok()?;
        let im = solution
            .diff("i")
            .simplify()
            .eval_expression(&empty)
            .ok()?;
        return Some((re, im));
    }
    None
}

fn order_solutions(mut solutions: Vec<Expr>) -> Vec<Expr> {
    let mut unique: Vec<Expr> = Vec::new();
    for s in solutions.drain(..) {
        let duplicate = unique.iter().any(|u| {
            *u == s
                || matches!((numeric_key(u), numeric_key(&s)), (Some(a), Some(b))
                    if (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12)
        });
        if !duplicate {
            unique.push(s);
        }
    }
    if unique.iter().all(|s| numeric_key(s).is_some()) {
        unique.sort_by(|a, b| {
            let (ka, kb) = (numeric_key(a), numeric_key(b));
            match (ka, kb) {
                (Some((ra, ia)), Some((rb, ib))) => (ia != 0.0)
                    .cmp(&(ib != 0.0))
                    .then(ra.partial_cmp(&rb).unwrap_or(Ordering::Equal))
                    .then(ia.partial_cmp(&ib).unwrap_or(Ordering::Equal)),
                _ => Ordering::Equal,
            }
        });
    }
    unique
}

/// Solves `lhs = rhs` for `var`.
///
/// An equation without `var` that always holds is an error (every value solves it);
/// one that never holds has no solutions.
pub fn solve_equation(lhs: &Expr, rhs: &Expr, var: &str) -> Result<Vec<Expr>, String> {
    let difference = (lhs.doit()? - rhs.doit()?).simplify();
    check_degree(&difference)?;
    if !difference.contains_variable(var) {
        return if difference.is_zero() {
            Err(format!("the equation holds for every value of {}", var))
        } else if difference.free_variables().is_empty() {
            Ok(Vec::new())
        } else {
            Err(format!("{} does not appear in the equation", var))
        };
    }
    let (numerator, denominators) = clear_denominators(&difference, var);
    check_degree(&numerator)?;
    let admissible = |s: &Expr| {
        denominators
            .iter()
            .all(|d| !d.substitute_variable(var, s).simplify().is_zero())
    };
    let candidates = if let Some(poly) = Polynomial::from_expr(&numerator, var) {
        if poly.is_zero() {
            return Err(format!("the equation holds for every value of {}", var));
        }
        solve_numeric_polynomial(&poly)
    } else if let Some(coeffs) = symbolic_coefficients(&numerator, var) {
        solve_symbolic_polynomial(&coeffs)?
    } else if occurrences(&difference, var) == 1 {
        isolate(&difference, vec![Expr::Const(0.0)], var)?
    } else {
        return Err(format!("cannot solve for {}: unsupported equation", var));
    };
    let solutions = candidates
        .into_iter()
        .filter(|s| admissible(s))
        // drop branches that are not real numbers (ln of a negative, asin(2), ...)
        .filter(|s| {
            !s.free_variables().is_empty()
                || s.eval_expression(&HashMap::new()).is_ok()
        })
        .collect();
    Ok(order_solutions(solutions))
}

impl Expr {
    /// Solutions of `self = 0` for `var`.
    pub fn solve(&self, var: &str) -> Result<Vec<Expr>, String> {
        solve_equation(self, &Expr::Const(0.0), var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::latex_parser::parse_latex;
    use crate::symbolic::latex_printer::print_solution_list;
    use approx::assert_relative_eq;

    fn solve(lhs: &str, rhs: &str) -> String {
        let lhs = parse_latex(lhs).unwrap();
        let rhs = parse_latex(rhs).unwrap();
        print_solution_list(&solve_equation(&lhs, &rhs, "x").unwrap())
    }

    #[test]
    fn test_solve_quadratic_ascending() {
        assert_eq!(solve("x^{2}", "4"), "\\left[ -2, \\  2\\right]");
        assert_eq!(solve("x^{2} - 5x + 6", "0"), "\\left[ 2, \\  3\\right]");
    }

    #[test]
    fn test_solve_linear() {
        assert_eq!(solve("2x + 1", "0"), "\\left[ -\\frac{1}{2}\\right]");
    }

    #[test]
    fn test_solve_surd_and_complex_roots() {
        assert_eq!(solve("x^{2}", "2"), "\\left[ -\\sqrt{2}, \\  \\sqrt{2}\\right]");
        assert_eq!(solve("x^{2} + 1", "0"), "\\left[ -i, \\  i\\right]");
    }

    #[test]
    fn test_solve_no_solution_and_identity() {
        assert_eq!(solve("x + 1", "x + 2"), "\\left[ \\right]");
        let lhs = parse_latex("x + 1").unwrap();
        assert!(solve_equation(&lhs, &lhs, "x").is_err());
    }

    #[test]
    fn test_solve_cubic_with_rational_roots() {
        assert_eq!(
            solve("x^{3} - 6x^{2} + 11x - 6", "0"),
            "\\left[ 1, \\  2, \\  3\\right]"
        );
    }

    #[test]
    fn test_solve_by_isolation() {
        let lhs = parse_latex("e^{x}").unwrap();
        let solutions = solve_equation(&lhs, &Expr::Const(5.0), "x").unwrap();
        assert_eq!(solutions.len(), 1);
        assert_relative_eq!(
            solutions[0].eval_expression(&HashMap::new()).unwrap(),
            5.0f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_solve_rational_equation_drops_poles() {
        // x/(x - 1) = 1/(x - 1) has no solution: x = 1 is a pole
        assert_eq!(solve("\\frac{x}{x - 1}", "\\frac{1}{x - 1}"), "\\left[ \\right]");
        assert_eq!(solve("\\frac{1}{x}", "2"), "\\left[ \\frac{1}{2}\\right]");
    }

    #[test]
    fn test_solve_symbolic_coefficients() {
        let lhs = parse_latex("a x + b").unwrap();
        let solutions = lhs.solve("x").unwrap();
        assert_eq!(print_solution_list(&solutions), "\\left[ -\\frac{b}{a}\\right]");
    }

    #[test]
    fn test_durand_kerner_quintic() {
        // x^5 - x - 1 has one real root near 1.1673
        let roots = durand_kerner(&[-1.0, -1.0, 0.0, 0.0, 0.0, 1.0]);
        let real: Vec<f64> = roots
            .iter()
            .filter(|z| z.im.abs() < 1e-9)
            .map(|z| z.re)
            .collect();
        assert_eq!(real.len(), 1);
        assert_relative_eq!(real[0], 1.1673039782614187, epsilon = 1e-10);
    }
}
