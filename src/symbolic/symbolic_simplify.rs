//! # Symbolic Expression Simplification Module
//!
//! Canonical simplification of expression trees, the engine behind the `Simplify`
//! computation mode and the final step of every other mode.
//!
//! ## Simplification Strategy
//!
//! 1. **Bottom-up**: children are simplified first, then the node itself
//! 2. **Term Collection**: sums are flattened into terms; every term is a numeric
//!    coefficient times a list of `(base, exponent)` factors, and like terms are merged
//! 3. **Power Rules**: `x^a * x^b = x^(a+b)`, `(x^a)^n = x^(a n)` for integer `n`,
//!    `(x y)^n = x^n y^n`, exact numeric powers (`\sqrt{4} = 2`)
//! 4. **Function Identities**: `e^{\ln u} = u`, `\ln 1 = 0`, `\sin 0 = 0`,
//!    `\sin^2 u + \cos^2 u = 1`, ...
//! 5. **Fixed Point**: the pass is repeated until the tree stops changing
//!
//! ## Canonical Order
//!
//! Terms of a sum are ordered by total degree (highest first), then lexicographically
//! with higher powers first, numeric constants last: `x^{2} + 2 x y + y^{2} + 1`.
//! Factors of a product are ordered numeric radicals, symbols, sums, functions.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{as_rational, is_integer};
use std::cmp::Ordering;

const MAX_PASSES: usize = 8;
/// relative size below which a sum of like coefficients counts as exact cancellation
const CANCELLATION_EPS: f64 = 1e-12;

/// A product term: `coeff * base_1^exp_1 * base_2^exp_2 * ...`
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub coeff: f64,
    pub factors: Vec<(Expr, Expr)>,
}

impl Term {
    fn constant(coeff: f64) -> Term {
        Term {
            coeff,
            factors: Vec::new(),
        }
    }

    fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    /// Multiplies two terms, merging factors with the same base.
    fn merge(mut self, other: Term) -> Term {
        self.coeff *= other.coeff;
        for (base, exp) in other.factors {
            push_factor(&mut self.factors, base, exp);
        }
        self
    }

    /// Raises the term to an integer power.
    fn powi(self, n: f64) -> Term {
        Term {
            coeff: self.coeff.powf(n),
            factors: self
                .factors
                .into_iter()
                .map(|(base, exp)| (base, mul_exponents(&exp, n)))
                .collect(),
        }
    }

    /// Total degree in plain symbols; used for ordering only.
    fn degree(&self) -> f64 {
        self.factors
            .iter()
            .map(|(base, exp)| match (base, exp) {
                (Expr::Var(_), Expr::Const(e)) => *e,
                _ => 0.0,
            })
            .sum()
    }
}

fn add_exponents(a: &Expr, b: &Expr) -> Expr {
    match (a, b) {
        (Expr::Const(x), Expr::Const(y)) => Expr::Const(x + y),
        _ => Expr::Add(Box::new(a.clone()), Box::new(b.clone())).simplify_(),
    }
}

fn mul_exponents(exp: &Expr, n: f64) -> Expr {
    match exp {
        Expr::Const(e) => Expr::Const(e * n),
        other => Expr::Mul(Box::new(Expr::Const(n)), Box::new(other.clone())).simplify_(),
    }
}

fn push_factor(factors: &mut Vec<(Expr, Expr)>, base: Expr, exp: Expr) {
    match factors.iter_mut().find(|(b, _)| *b == base) {
        Some((_, existing)) => *existing = add_exponents(existing, &exp),
        None => factors.push((base, exp)),
    }
}

/// Decomposes a product/quotient/power into a [`Term`].
pub fn term_of(expr: &Expr) -> Term {
    match expr {
        Expr::Const(c) => Term::constant(*c),
        Expr::Mul(lhs, rhs) => term_of(lhs).merge(term_of(rhs)),
        Expr::Div(lhs, rhs) => {
            let denominator = term_of(rhs);
            if denominator.coeff == 0.0 {
                // keep division by zero visible
                return Term {
                    coeff: 1.0,
                    factors: vec![(expr.clone(), Expr::Const(1.0))],
                };
            }
            term_of(lhs).merge(denominator.powi(-1.0))
        }
        Expr::Pow(base, exp) => match exp.as_const() {
            Some(n) if is_integer(n) => {
                let inner = term_of(base);
                if inner.coeff == 0.0 && n < 0.0 {
                    return Term {
                        coeff: 1.0,
                        factors: vec![(expr.clone(), Expr::Const(1.0))],
                    };
                }
                inner.powi(n)
            }
            _ => Term {
                coeff: 1.0,
                factors: vec![((**base).clone(), (**exp).clone())],
            },
        },
        other => Term {
            coeff: 1.0,
            factors: vec![(other.clone(), Expr::Const(1.0))],
        },
    }
}

fn factor_rank(base: &Expr) -> u8 {
    match base {
        Expr::Const(_) => 0,
        Expr::Var(_) => 1,
        Expr::Add(..) | Expr::Sub(..) => 2,
        _ => 3,
    }
}

fn cmp_factors(a: &(Expr, Expr), b: &(Expr, Expr)) -> Ordering {
    factor_rank(&a.0)
        .cmp(&factor_rank(&b.0))
        .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
}

/// Order of terms in a sum: higher degree first, then lexicographic with higher
/// powers first, constants last.
fn cmp_terms(a: &Term, b: &Term) -> Ordering {
    if a.is_constant() != b.is_constant() {
        return a.is_constant().cmp(&b.is_constant());
    }
    match b.degree().partial_cmp(&a.degree()) {
        Some(Ordering::Equal) | None => {}
        Some(other) => return other,
    }
    for (fa, fb) in a.factors.iter().zip(b.factors.iter()) {
        let by_base = cmp_factors(fa, fb);
        if by_base != Ordering::Equal {
            return by_base;
        }
        let exponents = match (&fa.1, &fb.1) {
            (Expr::Const(x), Expr::Const(y)) => y.partial_cmp(x).unwrap_or(Ordering::Equal),
            (x, y) => x.to_string().cmp(&y.to_string()),
        };
        if exponents != Ordering::Equal {
            return exponents;
        }
    }
    a.factors.len().cmp(&b.factors.len())
}

fn build_factor(base: &Expr, exp: &Expr) -> Expr {
    if exp.is_one() {
        base.clone()
    } else {
        Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()))
    }
}

fn product_of(items: Vec<Expr>) -> Option<Expr> {
    items
        .into_iter()
        .reduce(|acc, item| Expr::Mul(Box::new(acc), Box::new(item)))
}

/// Rebuilds a canonical expression from a term. Rational coefficients become a
/// quotient (`x^2/2`), negative powers move to the denominator.
pub fn build_term(term: &Term) -> Expr {
    if term.coeff == 0.0 {
        return Expr::Const(0.0);
    }
    let mut factors: Vec<(Expr, Expr)> = term
        .factors
        .iter()
        .filter(|(_, exp)| !exp.is_zero())
        .cloned()
        .collect();
    factors.sort_by(cmp_factors);
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for (base, exp) in &factors {
        match exp.as_const() {
            Some(e) if e < 0.0 => denominator.push(build_factor(base, &Expr::Const(-e))),
            _ => numerator.push(build_factor(base, exp)),
        }
    }
    let (numer_coeff, denom_coeff) = match as_rational(term.coeff) {
        Some(r) => (*r.numer() as f64, *r.denom() as f64),
        None => (term.coeff, 1.0),
    };
    if numer_coeff != 1.0 || numerator.is_empty() {
        numerator.insert(0, Expr::Const(numer_coeff));
    }
    if denom_coeff != 1.0 {
        denominator.insert(0, Expr::Const(denom_coeff));
    }
    let numerator = product_of(numerator).unwrap_or(Expr::Const(1.0));
    match product_of(denominator) {
        Some(denominator) => Expr::Div(Box::new(numerator), Box::new(denominator)),
        None => numerator,
    }
}

/// Flattens nested sums and differences into signed terms.
pub fn flatten_add(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Add(a, b) => {
            flatten_add(a, out);
            flatten_add(b, out);
        }
        Expr::Sub(a, b) => {
            flatten_add(a, out);
            let neg_b = Expr::Mul(Box::new(Expr::Const(-1.0)), b.clone());
            flatten_add(&neg_b, out);
        }
        // c * (a + b) distributes, as -1 * (a - b) must for subtraction
        Expr::Mul(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
            (Expr::Const(c), sum @ (Expr::Add(..) | Expr::Sub(..)))
            | (sum @ (Expr::Add(..) | Expr::Sub(..)), Expr::Const(c)) => {
                let mut inner = Vec::new();
                flatten_add(sum, &mut inner);
                for term in inner {
                    out.push(Expr::Mul(Box::new(Expr::Const(*c)), Box::new(term)));
                }
            }
            _ => out.push(expr.clone()),
        },
        _ => out.push(expr.clone()),
    }
}

/// Collects like terms of a sum.
fn collect_sum(expr: &Expr) -> Expr {
    let mut flat = Vec::new();
    flatten_add(expr, &mut flat);
    let mut groups: Vec<Term> = Vec::new();
    let mut pending = flat;
    while let Some(item) = pending.pop() {
        let mut term = term_of(&item);
        // (x + 1)/2 contributes x/2 and 1/2
        if let [(sum @ (Expr::Add(..) | Expr::Sub(..)), exp)] = term.factors.as_slice() {
            if exp.is_one() {
                let mut inner = Vec::new();
                flatten_add(sum, &mut inner);
                for part in inner {
                    pending.push(Expr::Mul(Box::new(Expr::Const(term.coeff)), Box::new(part)));
                }
                continue;
            }
        }
        term.factors.retain(|(_, exp)| !exp.is_zero());
        term.factors.sort_by(cmp_factors);
        match groups.iter_mut().find(|g| g.factors == term.factors) {
            Some(group) => {
                let scale = group.coeff.abs().max(term.coeff.abs());
                group.coeff += term.coeff;
                // rounding left over from cancelling decimals, e.g. 0.1 + 0.2 - 0.3
                if group.coeff.abs() <= CANCELLATION_EPS * scale {
                    group.coeff = 0.0;
                }
            }
            None => groups.push(term),
        }
    }
    pythagorean_identity(&mut groups);
    groups.retain(|g| g.coeff != 0.0);
    groups.sort_by(cmp_terms);
    groups
        .iter()
        .map(build_term)
        .reduce(|acc, term| Expr::Add(Box::new(acc), Box::new(term)))
        .unwrap_or(Expr::Const(0.0))
}

/// `c sin^2(u) + c cos^2(u) = c`
fn pythagorean_identity(groups: &mut Vec<Term>) {
    let square_of = |term: &Term| -> Option<(bool, Expr)> {
        match term.factors.as_slice() {
            [(Expr::sin(u), Expr::Const(e))] if *e == 2.0 => Some((true, (**u).clone())),
            [(Expr::cos(u), Expr::Const(e))] if *e == 2.0 => Some((false, (**u).clone())),
            _ => None,
        }
    };
    let mut i = 0;
    while i < groups.len() {
        let Some((is_sin, arg)) = square_of(&groups[i]) else {
            i += 1;
            continue;
        };
        let partner = groups.iter().position(|g| {
            g.coeff == groups[i].coeff && square_of(g) == Some((!is_sin, arg.clone()))
        });
        match partner {
            Some(j) => {
                let coeff = groups[i].coeff;
                let (first, second) = if i > j { (i, j) } else { (j, i) };
                groups.remove(first);
                groups.remove(second);
                match groups.iter_mut().find(|g| g.is_constant()) {
                    Some(constant) => constant.coeff += coeff,
                    None => groups.push(Term::constant(coeff)),
                }
                i = 0;
            }
            None => i += 1,
        }
    }
}

/// Simplifies a product, quotient or power node whose children are already simple.
fn collect_product(expr: &Expr) -> Expr {
    let mut term = term_of(expr);
    merge_exponentials(&mut term);
    term.factors.retain(|(_, exp)| !exp.is_zero());
    // a number times a single sum distributes: 2 (x + 1) = 2 x + 2
    if term.coeff != 1.0 && term.factors.len() == 1 {
        if let (sum @ (Expr::Add(..) | Expr::Sub(..)), exp) = &term.factors[0] {
            if exp.is_one() {
                let scaled = Expr::Mul(Box::new(Expr::Const(term.coeff)), Box::new(sum.clone()));
                return collect_sum(&scaled);
            }
        }
    }
    build_term(&term)
}

/// `e^a e^b = e^{a + b}`
fn merge_exponentials(term: &mut Term) {
    let mut exponent: Option<Expr> = None;
    let mut rest = Vec::new();
    for (base, exp) in term.factors.drain(..) {
        match (&base, exp.as_const()) {
            (Expr::Exp(arg), Some(n)) if is_integer(n) => {
                let scaled = mul_exponents(arg, n);
                exponent = Some(match exponent {
                    Some(acc) => Expr::Add(Box::new(acc), Box::new(scaled)),
                    None => scaled,
                });
            }
            _ => rest.push((base, exp)),
        }
    }
    if let Some(exponent) = exponent {
        let exponent = collect_sum(&exponent);
        if !exponent.is_zero() {
            rest.push((Expr::Exp(Box::new(exponent)), Expr::Const(1.0)));
        }
    }
    term.factors = rest;
}

fn simplify_power(base: &Expr, exp: &Expr) -> Expr {
    match (base, exp) {
        (_, Expr::Const(e)) if *e == 0.0 => Expr::Const(1.0),
        (_, Expr::Const(e)) if *e == 1.0 => base.clone(),
        (Expr::Const(b), _) if *b == 1.0 => Expr::Const(1.0),
        (Expr::Const(b), Expr::Const(e)) if *b == 0.0 && *e > 0.0 => Expr::Const(0.0),
        (Expr::Const(b), Expr::Const(e)) if *b != 0.0 => {
            let value = b.powf(*e);
            if value.is_finite() && (is_integer(*e) || is_integer(value)) {
                Expr::Const(value)
            } else {
                Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()))
            }
        }
        (Expr::Var(name), _) if name == "e" => simplify_function(&Expr::Exp(Box::new(exp.clone()))),
        _ => collect_product(&Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()))),
    }
}

fn is_pi(expr: &Expr) -> bool {
    matches!(expr, Expr::Var(name) if name == "pi")
}

fn is_negated(expr: &Expr) -> Option<Expr> {
    let term = term_of(expr);
    if term.coeff < 0.0 && !term.factors.is_empty() {
        Some(build_term(&Term {
            coeff: -term.coeff,
            factors: term.factors,
        }))
    } else {
        None
    }
}

/// Identities of single-argument functions whose argument is already simplified.
fn simplify_function(expr: &Expr) -> Expr {
    let Some(arg) = expr.unary_arg() else {
        return expr.clone();
    };
    match (expr, arg) {
        (Expr::Exp(_), Expr::Const(c)) if *c == 0.0 => Expr::Const(1.0),
        (Expr::Exp(_), Expr::Const(c)) if *c == 1.0 => Expr::var("e"),
        (Expr::Exp(_), Expr::Ln(inner)) => (**inner).clone(),
        (Expr::Ln(_), Expr::Const(c)) if *c == 1.0 => Expr::Const(0.0),
        (Expr::Ln(_), Expr::Var(name)) if name == "e" => Expr::Const(1.0),
        (Expr::Ln(_), Expr::Exp(inner)) => (**inner).clone(),
        (Expr::sin(_) | Expr::tg(_) | Expr::arcsin(_) | Expr::arctg(_), Expr::Const(c))
            if *c == 0.0 =>
        {
            Expr::Const(0.0)
        }
        (Expr::cos(_), Expr::Const(c)) if *c == 0.0 => Expr::Const(1.0),
        (Expr::arccos(_), Expr::Const(c)) if *c == 1.0 => Expr::Const(0.0),
        (Expr::sin(_) | Expr::tg(_), a) if is_pi(a) => Expr::Const(0.0),
        (Expr::cos(_), a) if is_pi(a) => Expr::Const(-1.0),
        (Expr::sin(_) | Expr::tg(_) | Expr::arcsin(_) | Expr::arctg(_), a) => match is_negated(a) {
            // odd functions
            Some(positive) => Expr::Mul(
                Box::new(Expr::Const(-1.0)),
                Box::new(expr.with_unary_arg(positive)),
            )
            .simplify_(),
            None => expr.clone(),
        },
        (Expr::cos(_), a) => match is_negated(a) {
            Some(positive) => Expr::cos(Box::new(positive)),
            None => expr.clone(),
        },
        _ => expr.clone(),
    }
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// One bottom-up simplification pass.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(..) | Expr::Sub(..) => {
                let children = self.map_children(&|child| child.simplify_());
                collect_sum(&children)
            }
            Expr::Mul(..) | Expr::Div(..) => {
                let children = self.map_children(&|child| child.simplify_());
                collect_product(&children)
            }
            Expr::Pow(base, exp) => simplify_power(&base.simplify_(), &exp.simplify_()),
            Expr::Log(base, arg) => {
                let base = base.simplify_();
                let arg = arg.simplify_();
                match (&base, &arg) {
                    (_, a) if a.is_one() => Expr::Const(0.0),
                    (b, a) if b == a => Expr::Const(1.0),
                    (Expr::Const(b), Expr::Const(a)) if *b > 0.0 && *a > 0.0 => {
                        let value = a.ln() / b.ln();
                        if (value - value.round()).abs() < 1e-12 {
                            Expr::Const(value.round())
                        } else {
                            Expr::Log(Box::new(base), Box::new(arg))
                        }
                    }
                    _ => Expr::Log(Box::new(base), Box::new(arg)),
                }
            }
            Expr::Integral { .. } | Expr::Derivative { .. } => {
                self.map_children(&|child| child.simplify_())
            }
            other => simplify_function(&other.map_children(&|child| child.simplify_())),
        }
    }

    /// Simplifies until a fixed point is reached.
    ///
    /// # Examples
    /// ```rust, ignore
    /// use RustedFormula::symbolic::latex_parser::parse_latex;
    /// let expr = parse_latex("x + x").unwrap();
    /// assert_eq!(expr.simplify().to_latex(), "2 x");
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.simplify_();
        for _ in 1..MAX_PASSES {
            let next = current.simplify_();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// True when the tree divides by a literal zero (`x/0`, `0^{-1}`).
    pub fn has_zero_division(&self) -> bool {
        match self {
            Expr::Div(_, rhs) if rhs.is_zero() => true,
            Expr::Pow(base, exp) if base.is_zero() && exp.as_const().is_some_and(|e| e < 0.0) => {
                true
            }
            Expr::Var(_) | Expr::Const(_) => false,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Log(a, b) => a.has_zero_division() || b.has_zero_division(),
            Expr::Integral {
                integrand, bounds, ..
            } => {
                integrand.has_zero_division()
                    || bounds
                        .as_ref()
                        .is_some_and(|(l, u)| l.has_zero_division() || u.has_zero_division())
            }
            Expr::Derivative { expr, .. } => expr.has_zero_division(),
            other => other.unary_arg().is_some_and(|a| a.has_zero_division()),
        }
    }
}
