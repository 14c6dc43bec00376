//! # Polynomial Module
//!
//! Extraction of polynomial structure from expression trees and the exact integer
//! arithmetic used by factoring and equation solving.
//!
//! - [`Polynomial`]: univariate polynomial with `f64` coefficients (ascending powers)
//! - [`MonomialKey`]: multivariate monomial, the key of like-term maps
//! - [`rational_roots`]: exact rational roots of an integer polynomial, with multiplicity
//! - `Expr::factor`: factorisation over the rationals
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::{Term, build_term, flatten_add, term_of};
use crate::symbolic::utils::{as_rational, gcd_all, is_integer, lcm_all};
use std::collections::BTreeMap;

/// largest |coefficient| whose divisors are enumerated for the rational root test
const MAX_DIVISOR_SEARCH: i128 = 1_000_000_000;
/// highest power of a symbol read into a dense coefficient vector
pub const MAX_POLYNOMIAL_DEGREE: i32 = 100;

/// Variable part of a polynomial term: `x^2 y` is `{"x": 2, "y": 1}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonomialKey(pub BTreeMap<String, i32>);

impl MonomialKey {
    /// Monomial of a term whose factors are all symbols with non-negative
    /// integer exponents.
    pub fn of_term(term: &Term) -> Option<MonomialKey> {
        let mut map = BTreeMap::new();
        for (base, exp) in &term.factors {
            match (base, exp.as_const()) {
                (Expr::Var(name), Some(e))
                    if is_integer(e) && (0.0..=MAX_POLYNOMIAL_DEGREE as f64).contains(&e) =>
                {
                    *map.entry(name.clone()).or_insert(0) += e as i32;
                }
                _ => return None,
            }
        }
        Some(MonomialKey(map))
    }
}

/// Err when a symbol is raised to an integer power above [`MAX_POLYNOMIAL_DEGREE`];
/// factoring and solving refuse such input instead of treating it as non-polynomial.
pub fn check_degree(expr: &Expr) -> Result<(), String> {
    match expr {
        Expr::Var(_) | Expr::Const(_) => Ok(()),
        Expr::Pow(base, exp) => {
            if let Some(e) = exp.as_const() {
                if is_integer(e)
                    && e.abs() > MAX_POLYNOMIAL_DEGREE as f64
                    && !base.free_variables().is_empty()
                {
                    return Err(format!(
                        "the power {} is above the largest supported degree {}",
                        e, MAX_POLYNOMIAL_DEGREE
                    ));
                }
            }
            check_degree(base)?;
            check_degree(exp)
        }
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Log(a, b) => {
            check_degree(a)?;
            check_degree(b)
        }
        Expr::Integral { integrand, .. } => check_degree(integrand),
        Expr::Derivative { expr, .. } => check_degree(expr),
        other => other.unary_arg().map_or(Ok(()), check_degree),
    }
}

/// Terms of an expanded expression as a monomial -> coefficient map, if every term
/// is a polynomial monomial.
pub fn polynomial_terms(expr: &Expr) -> Option<BTreeMap<MonomialKey, f64>> {
    let mut terms = Vec::new();
    flatten_add(&expr.expand(), &mut terms);
    let mut map: BTreeMap<MonomialKey, f64> = BTreeMap::new();
    for term in terms {
        let term = term_of(&term);
        let key = MonomialKey::of_term(&term)?;
        *map.entry(key).or_insert(0.0) += term.coeff;
    }
    map.retain(|_, c| *c != 0.0);
    Some(map)
}

/// Univariate polynomial, `coeffs[i]` multiplies `var^i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    pub var: String,
    pub coeffs: Vec<f64>,
}

impl Polynomial {
    /// Reads `expr` as a polynomial in `var` with numeric coefficients.
    pub fn from_expr(expr: &Expr, var: &str) -> Option<Polynomial> {
        let map = polynomial_terms(expr)?;
        let mut coeffs = vec![0.0];
        for (key, coeff) in map {
            let mut degree = 0usize;
            for (name, exp) in &key.0 {
                if name != var {
                    return None;
                }
                degree = *exp as usize;
            }
            if coeffs.len() <= degree {
                coeffs.resize(degree + 1, 0.0);
            }
            coeffs[degree] += coeff;
        }
        let mut poly = Polynomial {
            var: var.to_string(),
            coeffs,
        };
        poly.trim();
        Some(poly)
    }

    fn trim(&mut self) {
        while self.coeffs.len() > 1 && self.coeffs.last() == Some(&0.0) {
            self.coeffs.pop();
        }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| *c == 0.0)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Integer coefficients of a primitive multiple of the polynomial, if all
    /// coefficients are rational.
    pub fn to_integer_coeffs(&self) -> Option<(Vec<i128>, f64)> {
        let rationals = self
            .coeffs
            .iter()
            .map(|c| as_rational(*c))
            .collect::<Option<Vec<_>>>()?;
        let denominators: Vec<i64> = rationals.iter().map(|r| *r.denom()).collect();
        let lcm = lcm_all(&denominators);
        let scaled: Vec<i64> = rationals
            .iter()
            .map(|r| r.numer().checked_mul(lcm / r.denom()))
            .collect::<Option<Vec<_>>>()?;
        let mut content = gcd_all(&scaled);
        if content == 0 {
            return None;
        }
        if scaled.last().is_some_and(|lead| *lead < 0) {
            content = -content;
        }
        let ints = scaled.iter().map(|c| (*c / content) as i128).collect();
        Some((ints, content as f64 / lcm as f64))
    }
}

/// Rebuilds `sum coeffs[i] var^i`, highest power first.
pub fn integer_poly_to_expr(coeffs: &[i128], var: &str) -> Expr {
    let mut terms = Vec::new();
    for (degree, coeff) in coeffs.iter().enumerate().rev() {
        if *coeff == 0 {
            continue;
        }
        let factors = if degree == 0 {
            Vec::new()
        } else {
            vec![(Expr::var(var), Expr::Const(degree as f64))]
        };
        terms.push(build_term(&Term {
            coeff: *coeff as f64,
            factors,
        }));
    }
    terms
        .into_iter()
        .reduce(|acc, t| Expr::Add(Box::new(acc), Box::new(t)))
        .unwrap_or(Expr::Const(0.0))
}

fn divisors(n: i128) -> Vec<i128> {
    let n = n.abs();
    let mut out = Vec::new();
    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            out.push(i);
            if i != n / i {
                out.push(n / i);
            }
        }
        i += 1;
    }
    out
}

/// q^n P(p/q), exact
fn scaled_value(coeffs: &[i128], p: i128, q: i128) -> Option<i128> {
    let n = coeffs.len() - 1;
    let mut total: i128 = 0;
    for (i, c) in coeffs.iter().enumerate() {
        let term = c
            .checked_mul(p.checked_pow(i as u32)?)?
            .checked_mul(q.checked_pow((n - i) as u32)?)?;
        total = total.checked_add(term)?;
    }
    Some(total)
}

/// Divides by (q x - p), assuming p/q is a root.
fn deflate(coeffs: &[i128], p: i128, q: i128) -> Option<Vec<i128>> {
    let n = coeffs.len() - 1;
    let mut quotient = vec![0i128; n];
    let mut carry: i128 = 0;
    for i in (1..=n).rev() {
        let value = coeffs[i].checked_add(carry)?;
        if value % q != 0 {
            return None;
        }
        quotient[i - 1] = value / q;
        carry = quotient[i - 1].checked_mul(p)?;
    }
    Some(quotient)
}

/// A rational root `p/q` (lowest terms, `q > 0`) and its multiplicity.
#[derive(Clone, Debug, PartialEq)]
pub struct RationalRoot {
    pub p: i128,
    pub q: i128,
    pub multiplicity: usize,
}

impl RationalRoot {
    pub fn value(&self) -> f64 {
        self.p as f64 / self.q as f64
    }
}

/// Rational roots of an integer polynomial (ascending coefficients) and the
/// remaining cofactor. Zero roots are included. Roots come out in descending order.
pub fn rational_roots(coeffs: &[i128]) -> (Vec<RationalRoot>, Vec<i128>) {
    let mut remaining: Vec<i128> = coeffs.to_vec();
    while remaining.len() > 1 && remaining.last() == Some(&0) {
        remaining.pop();
    }
    let mut roots = Vec::new();
    let zero_multiplicity = remaining.iter().take_while(|c| **c == 0).count();
    if zero_multiplicity > 0 && zero_multiplicity < remaining.len() {
        remaining.drain(..zero_multiplicity);
        roots.push(RationalRoot {
            p: 0,
            q: 1,
            multiplicity: zero_multiplicity,
        });
    }
    if remaining.len() < 2 {
        return (roots, remaining);
    }
    let constant = remaining[0];
    let leading = remaining[remaining.len() - 1];
    if constant.abs() > MAX_DIVISOR_SEARCH || leading.abs() > MAX_DIVISOR_SEARCH {
        return (roots, remaining);
    }
    let mut candidates = Vec::new();
    for p in divisors(constant) {
        for q in divisors(leading) {
            if gcd(p, q) == 1 {
                candidates.push((p, q));
                candidates.push((-p, q));
            }
        }
    }
    for (p, q) in candidates {
        let mut multiplicity = 0;
        while remaining.len() > 1 && scaled_value(&remaining, p, q) == Some(0) {
            match deflate(&remaining, p, q) {
                Some(quotient) => {
                    remaining = quotient;
                    multiplicity += 1;
                }
                None => break,
            }
        }
        if multiplicity > 0 {
            roots.push(RationalRoot { p, q, multiplicity });
        }
    }
    roots.sort_by(|a, b| b.value().total_cmp(&a.value()));
    (roots, remaining)
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `q x - p`
fn linear_factor(root: &RationalRoot, var: &str) -> Expr {
    let x = Expr::var(var);
    let lead = if root.q == 1 {
        x
    } else {
        Expr::Const(root.q as f64) * x
    };
    if root.p == 0 {
        lead
    } else {
        Expr::Add(Box::new(lead), Box::new(Expr::Const(-(root.p as f64))))
    }
}

fn with_multiplicity(factor: Expr, multiplicity: usize) -> Expr {
    if multiplicity == 1 {
        factor
    } else {
        factor.pow(Expr::Const(multiplicity as f64))
    }
}

/// Factorisation of a univariate polynomial over the rationals.
fn factor_univariate(poly: &Polynomial) -> Option<Expr> {
    if poly.degree() < 1 {
        return None;
    }
    let (ints, constant) = poly.to_integer_coeffs()?;
    let (mut roots, remaining) = rational_roots(&ints);
    // the bare power of the variable leads: 2 x (x - 1)
    roots.sort_by_key(|root| root.p != 0);
    let mut factors: Vec<Expr> = roots
        .iter()
        .map(|root| with_multiplicity(linear_factor(root, &poly.var), root.multiplicity))
        .collect();
    if remaining.len() > 1 {
        factors.push(integer_poly_to_expr(&remaining, &poly.var));
    } else if remaining.len() == 1 && remaining[0] != 1 {
        // leftover unit from deflation, folded into the constant
        let unit = remaining[0] as f64;
        return Some(combine(constant * unit, factors));
    }
    Some(combine(constant, factors))
}

fn combine(constant: f64, factors: Vec<Expr>) -> Expr {
    let product = factors.into_iter().reduce(|acc, f| acc * f);
    match product {
        None => Expr::Const(constant),
        Some(product) if constant == 1.0 => product,
        Some(product) => Expr::Const(constant) * product,
    }
}

/// Pulls the common numeric content and the common symbol powers out of a sum.
fn factor_common(expr: &Expr) -> Option<(Expr, Expr)> {
    let mut items = Vec::new();
    flatten_add(expr, &mut items);
    if items.len() < 2 {
        return None;
    }
    let terms: Vec<Term> = items.iter().map(term_of).collect();
    let content = if terms.iter().all(|t| is_integer(t.coeff)) {
        let ints: Vec<i64> = terms.iter().map(|t| t.coeff as i64).collect();
        let mut g = gcd_all(&ints);
        if terms[0].coeff < 0.0 {
            g = -g;
        }
        if g == 0 { 1.0 } else { g as f64 }
    } else {
        1.0
    };
    let mut common: Vec<(Expr, f64)> = Vec::new();
    for (base, exp) in &terms[0].factors {
        let Some(first) = exp.as_const() else { continue };
        if first <= 0.0 || !is_integer(first) {
            continue;
        }
        let mut lowest = first;
        let shared = terms[1..].iter().all(|t| {
            t.factors.iter().any(|(b, e)| match e.as_const() {
                Some(e) if b == base && e > 0.0 && is_integer(e) => {
                    lowest = lowest.min(e);
                    true
                }
                _ => false,
            })
        });
        if shared {
            common.push((base.clone(), lowest));
        }
    }
    if content == 1.0 && common.is_empty() {
        return None;
    }
    let mut divided = Vec::new();
    for mut term in terms {
        term.coeff /= content;
        for (base, lowest) in &common {
            if let Some((_, exp)) = term.factors.iter_mut().find(|(b, _)| b == base) {
                *exp = Expr::Const(exp.as_const().unwrap_or(*lowest) - lowest);
            }
        }
        divided.push(build_term(&term));
    }
    let rest = divided
        .into_iter()
        .reduce(|acc, t| Expr::Add(Box::new(acc), Box::new(t)))
        .unwrap_or(Expr::Const(0.0))
        .simplify();
    let outer = build_term(&Term {
        coeff: content,
        factors: common
            .into_iter()
            .map(|(base, exp)| (base, Expr::Const(exp)))
            .collect(),
    });
    Some((outer, rest))
}

impl Expr {
    /// Factors the expression over the rationals.
    ///
    /// Univariate polynomials are split into linear factors `(q x - p)` for every
    /// rational root, highest root first, followed by the irreducible remainder.
    /// Other sums get their common content and common symbol powers extracted.
    /// Anything else is returned simplified.
    pub fn factor(&self) -> Expr {
        let simplified = self.simplify();
        let vars = simplified.free_variables();
        if vars.len() == 1 {
            if let Some(var) = vars.iter().next() {
                if let Some(poly) = Polynomial::from_expr(&simplified, var) {
                    if let Some(factored) = factor_univariate(&poly) {
                        return factored;
                    }
                }
            }
        }
        match factor_common(&simplified) {
            Some((outer, rest)) => {
                let rest = if rest.free_variables().len() == 1 {
                    rest.factor()
                } else {
                    rest
                };
                if outer.is_one() {
                    rest
                } else {
                    Expr::Mul(Box::new(outer), Box::new(rest))
                }
            }
            None => simplified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::latex_parser::parse_latex;

    fn factor(input: &str) -> String {
        parse_latex(input).unwrap().factor().to_latex()
    }

    #[test]
    fn test_polynomial_from_expr() {
        let expr = parse_latex("3x^{2} - 2x + 1").unwrap();
        let poly = Polynomial::from_expr(&expr, "x").unwrap();
        assert_eq!(poly.coeffs, vec![1.0, -2.0, 3.0]);
        assert_eq!(poly.degree(), 2);
        assert_eq!(poly.eval(2.0), 9.0);
        assert!(Polynomial::from_expr(&parse_latex("\\sin x").unwrap(), "x").is_none());
        assert!(Polynomial::from_expr(&parse_latex("x y").unwrap(), "x").is_none());
    }

    #[test]
    fn test_degree_cap() {
        let huge = parse_latex("x^{100000000000} - 1").unwrap();
        assert!(Polynomial::from_expr(&huge, "x").is_none());
        assert!(check_degree(&huge).is_err());
        let largest = parse_latex("x^{100} + 1").unwrap();
        assert_eq!(Polynomial::from_expr(&largest, "x").unwrap().degree(), 100);
        assert!(check_degree(&largest).is_ok());
        // constants may have any power
        assert!(check_degree(&parse_latex("2^{5000} x").unwrap()).is_ok());
    }

    #[test]
    fn test_rational_roots_with_multiplicity() {
        // (x - 1)^2 (2x + 1) = 2x^3 - 3x^2 + 1
        let (roots, rest) = rational_roots(&[1, 0, -3, 2]);
        assert_eq!(
            roots,
            vec![
                RationalRoot { p: 1, q: 1, multiplicity: 2 },
                RationalRoot { p: -1, q: 2, multiplicity: 1 },
            ]
        );
        assert_eq!(rest, vec![1]);
    }

    #[test]
    fn test_factor_difference_of_squares() {
        assert_eq!(factor("x^{2} - 1"), "\\left(x - 1\\right) \\left(x + 1\\right)");
    }

    #[test]
    fn test_factor_quadratic_trinomial() {
        assert_eq!(factor("x^{2} - 5x + 6"), "\\left(x - 3\\right) \\left(x - 2\\right)");
    }

    #[test]
    fn test_factor_with_content_and_zero_root() {
        assert_eq!(factor("2x^{3} - 2x"), "2 x \\left(x - 1\\right) \\left(x + 1\\right)");
    }

    #[test]
    fn test_factor_irreducible_stays() {
        assert_eq!(factor("x^{2} + 1"), "x^{2} + 1");
    }

    #[test]
    fn test_factor_multivariate_common_factor() {
        assert_eq!(factor("x y + x"), "x \\left(y + 1\\right)");
    }
}
