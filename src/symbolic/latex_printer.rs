//! Renders an [`Expr`] back to markup.
//!
//! The output follows the usual computer-algebra conventions: negative terms of a sum
//! are written with ` - `, products are space separated, quotients and rational
//! coefficients become `\frac{}{}`, square roots `\sqrt{}`, function arguments
//! `\sin{\left(x \right)}`. Everything printed here parses again with `parse_latex`.
use crate::symbolic::latex_parser::GREEK_LETTERS;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::as_rational;
use itertools::Itertools;

impl Expr {
    pub fn to_latex(&self) -> String {
        print(self)
    }
}

/// `\left[ a, \  b\right]`; the empty list is `\left[ \right]`.
pub fn print_solution_list(solutions: &[Expr]) -> String {
    if solutions.is_empty() {
        return "\\left[ \\right]".to_string();
    }
    format!(
        "\\left[ {}\\right]",
        solutions.iter().map(print).join(", \\  ")
    )
}

pub fn print(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => print_symbol(name),
        Expr::Const(c) => print_number(*c),
        Expr::Add(..) | Expr::Sub(..) => print_sum(expr),
        Expr::Mul(..) | Expr::Div(..) => print_product(expr),
        Expr::Pow(base, exp) => print_power(base, exp),
        Expr::Exp(arg) => format!("e^{{{}}}", print(arg)),
        Expr::Ln(arg) => format!("\\ln{{\\left({} \\right)}}", print(arg)),
        Expr::Log(base, arg) => format!(
            "\\log_{{{}}}{{\\left({} \\right)}}",
            print(base),
            print(arg)
        ),
        Expr::Integral {
            integrand,
            var,
            bounds,
        } => {
            let limits = match bounds {
                Some((lower, upper)) => format!("_{{{}}}^{{{}}}", print(lower), print(upper)),
                None => String::new(),
            };
            format!(
                "\\int{} {}\\, d{}",
                limits,
                print_factor(integrand),
                print_symbol(var)
            )
        }
        Expr::Derivative { expr, var, order } => {
            let operator = if *order == 1 {
                format!("\\frac{{d}}{{d {}}}", print_symbol(var))
            } else {
                format!("\\frac{{d^{{{}}}}}{{d {}^{{{}}}}}", order, print_symbol(var), order)
            };
            format!("{} {}", operator, print_factor(expr))
        }
        other => match (function_name(other), other.unary_arg()) {
            (Some(name), Some(arg)) => format!("{}{{\\left({} \\right)}}", name, print(arg)),
            _ => format!("{}", other),
        },
    }
}

fn function_name(expr: &Expr) -> Option<&'static str> {
    match expr {
        Expr::sin(_) => Some("\\sin"),
        Expr::cos(_) => Some("\\cos"),
        Expr::tg(_) => Some("\\tan"),
        Expr::ctg(_) => Some("\\cot"),
        Expr::arcsin(_) => Some("\\arcsin"),
        Expr::arccos(_) => Some("\\arccos"),
        Expr::arctg(_) => Some("\\arctan"),
        _ => None,
    }
}

fn print_symbol(name: &str) -> String {
    let (stem, subscript) = match name.split_once('_') {
        Some((stem, subscript)) => (stem, Some(subscript)),
        None => (name, None),
    };
    let stem = if stem == "pi" || GREEK_LETTERS.contains(&stem) {
        format!("\\{}", stem)
    } else {
        stem.to_string()
    };
    match subscript {
        Some(subscript) => format!("{}_{{{}}}", stem, subscript),
        None => stem,
    }
}

fn print_number(c: f64) -> String {
    if c.fract() == 0.0 && c.abs() < 1e15 {
        return format!("{}", c as i64);
    }
    match as_rational(c) {
        Some(r) => {
            let sign = if *r.numer() < 0 { "-" } else { "" };
            format!("{}\\frac{{{}}}{{{}}}", sign, r.numer().abs(), r.denom())
        }
        None => format!("{}", c),
    }
}

/// operand that binds weaker than a product gets `\left(\right)`
fn print_factor(expr: &Expr) -> String {
    match expr {
        Expr::Add(..) | Expr::Sub(..) => format!("\\left({}\\right)", print(expr)),
        _ => print(expr),
    }
}

fn is_negative_term(expr: &Expr) -> bool {
    match expr {
        Expr::Const(c) => *c < 0.0,
        Expr::Mul(lhs, _) | Expr::Div(lhs, _) => is_negative_term(lhs),
        _ => false,
    }
}

fn negate_term(expr: &Expr) -> Expr {
    match expr {
        Expr::Const(c) => Expr::Const(-c),
        Expr::Mul(lhs, rhs) if lhs.as_const() == Some(-1.0) => (**rhs).clone(),
        Expr::Mul(lhs, rhs) => Expr::Mul(Box::new(negate_term(lhs)), rhs.clone()),
        Expr::Div(lhs, rhs) => Expr::Div(Box::new(negate_term(lhs)), rhs.clone()),
        other => Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(other.clone())),
    }
}

fn flatten_sum(expr: &Expr, negate: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Add(lhs, rhs) => {
            flatten_sum(lhs, negate, out);
            flatten_sum(rhs, negate, out);
        }
        Expr::Sub(lhs, rhs) => {
            flatten_sum(lhs, negate, out);
            flatten_sum(rhs, !negate, out);
        }
        other if negate => out.push(negate_term(other)),
        other => out.push(other.clone()),
    }
}

fn print_sum(expr: &Expr) -> String {
    let mut terms = Vec::new();
    flatten_sum(expr, false, &mut terms);
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let negative = is_negative_term(term);
        let body = if negative {
            print(&negate_term(term))
        } else {
            print(term)
        };
        match (i, negative) {
            (0, true) => out.push('-'),
            (0, false) => {}
            (_, true) => out.push_str(" - "),
            (_, false) => out.push_str(" + "),
        }
        out.push_str(&body);
    }
    out
}

struct Fraction {
    coefficient: f64,
    numerator: Vec<Expr>,
    denominator: Vec<Expr>,
}

fn collect_factors(expr: &Expr, in_denominator: bool, acc: &mut Fraction) {
    match expr {
        Expr::Mul(lhs, rhs) => {
            collect_factors(lhs, in_denominator, acc);
            collect_factors(rhs, in_denominator, acc);
        }
        Expr::Div(lhs, rhs) => {
            collect_factors(lhs, in_denominator, acc);
            collect_factors(rhs, !in_denominator, acc);
        }
        Expr::Const(c) if in_denominator && *c != 0.0 => acc.coefficient /= c,
        Expr::Const(c) if !in_denominator => acc.coefficient *= c,
        Expr::Pow(base, exp) if matches!(exp.as_const(), Some(e) if e < 0.0) => {
            let flipped = match exp.as_const() {
                Some(e) if e == -1.0 => (**base).clone(),
                Some(e) => Expr::Pow(base.clone(), Box::new(Expr::Const(-e))),
                None => expr.clone(),
            };
            if in_denominator {
                acc.numerator.push(flipped);
            } else {
                acc.denominator.push(flipped);
            }
        }
        other if in_denominator => acc.denominator.push(other.clone()),
        other => acc.numerator.push(other.clone()),
    }
}

fn join_factors(coefficient: Option<String>, factors: &[Expr]) -> String {
    let mut out = coefficient.unwrap_or_default();
    for factor in factors {
        let text = print_factor(factor);
        if !out.is_empty() {
            let starts_with_digit = text.chars().next().is_some_and(|c| c.is_ascii_digit());
            out.push_str(if starts_with_digit { " \\cdot " } else { " " });
        }
        out.push_str(&text);
    }
    if out.is_empty() { "1".to_string() } else { out }
}

/// `\frac` groups its arguments, so a lone sum needs no parentheses there
fn frac_argument(coefficient: Option<String>, factors: &[Expr]) -> String {
    match (coefficient, factors) {
        (None, [single]) => print(single),
        (coefficient, factors) => join_factors(coefficient, factors),
    }
}

fn print_product(expr: &Expr) -> String {
    let mut acc = Fraction {
        coefficient: 1.0,
        numerator: Vec::new(),
        denominator: Vec::new(),
    };
    collect_factors(expr, false, &mut acc);
    if acc.coefficient == 0.0 {
        return "0".to_string();
    }
    let sign = if acc.coefficient < 0.0 { "-" } else { "" };
    let magnitude = acc.coefficient.abs();
    let (numerator_coefficient, denominator_coefficient) = match as_rational(magnitude) {
        Some(r) => (
            (*r.numer() != 1).then(|| r.numer().to_string()),
            (*r.denom() != 1).then(|| r.denom().to_string()),
        ),
        None => ((magnitude != 1.0).then(|| format!("{}", magnitude)), None),
    };
    let numerator_coefficient = if acc.numerator.is_empty() && numerator_coefficient.is_none() {
        Some("1".to_string())
    } else {
        numerator_coefficient
    };
    if acc.denominator.is_empty() && denominator_coefficient.is_none() {
        return format!(
            "{}{}",
            sign,
            join_factors(numerator_coefficient, &acc.numerator)
        );
    }
    let numerator = frac_argument(numerator_coefficient, &acc.numerator);
    let denominator = frac_argument(denominator_coefficient, &acc.denominator);
    format!("{}\\frac{{{}}}{{{}}}", sign, numerator, denominator)
}

fn print_power(base: &Expr, exp: &Expr) -> String {
    if let Some(e) = exp.as_const() {
        if e == 1.0 {
            return print_factor(base);
        }
        if e == -1.0 {
            return format!("\\frac{{1}}{{{}}}", print(base));
        }
        if e < 0.0 {
            return format!("\\frac{{1}}{{{}}}", print_power(base, &Expr::Const(-e)));
        }
        if e == 0.5 {
            return format!("\\sqrt{{{}}}", print(base));
        }
        if let Some(r) = as_rational(e) {
            if *r.numer() == 1 && *r.denom() > 1 {
                return format!("\\sqrt[{}]{{{}}}", r.denom(), print(base));
            }
        }
        if let (Some(name), Some(arg)) = (function_name(base), base.unary_arg()) {
            return format!(
                "{}^{{{}}}{{\\left({} \\right)}}",
                name,
                print_number(e),
                print(arg)
            );
        }
    }
    let base_text = match base {
        Expr::Var(name) => print_symbol(name),
        Expr::Const(c) if *c >= 0.0 && c.fract() == 0.0 => print_number(*c),
        other => format!("\\left({}\\right)", print(other)),
    };
    format!("{}^{{{}}}", base_text, print(exp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::latex_parser::parse_latex;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_print_polynomial() {
        let expr = Expr::Const(2.0) * x() + Expr::Const(-1.0) * x().pow(Expr::Const(2.0))
            - Expr::Const(3.0);
        assert_eq!(print(&expr), "2 x - x^{2} - 3");
    }

    #[test]
    fn test_print_rational_coefficient() {
        let expr = Expr::Const(0.5) * x().pow(Expr::Const(2.0));
        assert_eq!(print(&expr), "\\frac{x^{2}}{2}");
        assert_eq!(print(&Expr::Const(-1.5)), "-\\frac{3}{2}");
    }

    #[test]
    fn test_print_functions_and_roots() {
        assert_eq!(print(&Expr::sin(Box::new(x()))), "\\sin{\\left(x \\right)}");
        assert_eq!(print(&x().pow(Expr::Const(0.5))), "\\sqrt{x}");
        assert_eq!(print(&x().pow(Expr::Const(-1.0))), "\\frac{1}{x}");
        assert_eq!(print(&x().exp()), "e^{x}");
        let squared = Expr::cos(Box::new(x())).pow(Expr::Const(2.0));
        assert_eq!(print(&squared), "\\cos^{2}{\\left(x \\right)}");
    }

    #[test]
    fn test_print_symbols() {
        assert_eq!(print(&Expr::var("alpha")), "\\alpha");
        assert_eq!(print(&Expr::var("x_1")), "x_{1}");
        assert_eq!(print(&Expr::var("pi")), "\\pi");
    }

    #[test]
    fn test_print_product_with_sum_factor() {
        let expr = (x() - Expr::Const(1.0)) * (x() + Expr::Const(1.0));
        assert_eq!(
            print(&expr),
            "\\left(x - 1\\right) \\left(x + 1\\right)"
        );
    }

    #[test]
    fn test_fraction_of_sums_has_no_parentheses() {
        let expr = (x().pow(Expr::Const(2.0)) - Expr::Const(1.0)) / (x() - Expr::Const(1.0));
        assert_eq!(print(&expr), "\\frac{x^{2} - 1}{x - 1}");
        let reciprocal = (x() + Expr::Const(1.0)).pow(Expr::Const(-1.0));
        assert_eq!(print(&reciprocal), "\\frac{1}{x + 1}");
        // a coefficient next to the sum keeps the parentheses
        let scaled = Expr::Const(2.0) * (x() + Expr::Const(1.0)) / x();
        assert_eq!(print(&scaled), "\\frac{2 \\left(x + 1\\right)}{x}");
    }

    #[test]
    fn test_solution_list() {
        assert_eq!(
            print_solution_list(&[Expr::Const(-2.0), Expr::Const(2.0)]),
            "\\left[ -2, \\  2\\right]"
        );
        assert_eq!(print_solution_list(&[]), "\\left[ \\right]");
    }

    #[test]
    fn test_printed_markup_parses_again() {
        for input in [
            "\\frac{x^{2}}{2} - 3 x",
            "\\sin{\\left(x \\right)} + e^{x}",
            "\\int x^{2}\\, dx",
            "\\frac{d}{d x} x^{3}",
        ] {
            let expr = parse_latex(input).unwrap();
            let printed = print(&expr);
            assert!(parse_latex(&printed).is_ok(), "{} -> {}", input, printed);
        }
    }
}
