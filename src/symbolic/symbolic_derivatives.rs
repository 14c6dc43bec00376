//! # Symbolic Differentiation Module
//!
//! Rule-based derivatives of expression trees.
//!
//! - **Linearity**: `(f ± g)' = f' ± g'`
//! - **Product Rule**: `(fg)' = f'g + fg'`
//! - **Quotient Rule**: `(f/g)' = (f'g - fg')/g²`
//! - **Power Rule**: `(f^n)' = n f^(n-1) f'` for exponents free of the variable,
//!   `(a^g)' = a^g ln(a) g'` for bases free of it, `(f^g)' = f^g (g' ln f + g f'/f)` otherwise
//! - **Chain Rule**: applied automatically for every function node
//!
//! The raw derivative is not simplified; use [`Expr::differentiate`] for a canonical result.
use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// Symbolic derivative with respect to `var`.
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(Box::new(rhs.diff(var)), lhs.clone())),
                )),
                Box::new(Expr::Pow(rhs.clone(), Box::new(Expr::Const(2.0)))),
            ),
            Expr::Pow(base, exp) => {
                if !exp.contains_variable(var) {
                    Expr::Mul(
                        Box::new(Expr::Mul(
                            exp.clone(),
                            Box::new(Expr::Pow(
                                base.clone(),
                                Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                            )),
                        )),
                        Box::new(base.diff(var)),
                    )
                } else if !base.contains_variable(var) {
                    // a^g = e^(g ln a)
                    Expr::Mul(
                        Box::new(Expr::Mul(Box::new(self.clone()), Box::new(Expr::Ln(base.clone())))),
                        Box::new(exp.diff(var)),
                    )
                } else {
                    Expr::Mul(
                        Box::new(self.clone()),
                        Box::new(Expr::Add(
                            Box::new(Expr::Mul(
                                Box::new(exp.diff(var)),
                                Box::new(Expr::Ln(base.clone())),
                            )),
                            Box::new(Expr::Div(
                                Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                                base.clone(),
                            )),
                        )),
                    )
                }
            }
            Expr::Exp(expr) => {
                Expr::Mul(Box::new(Expr::Exp(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::Ln(expr) => Expr::Div(Box::new(expr.diff(var)), expr.clone()),
            Expr::Log(base, expr) => {
                // log_b(u) = ln(u) / ln(b)
                Expr::Div(Box::new(Expr::Ln(expr.clone())), Box::new(Expr::Ln(base.clone())))
                    .diff(var)
            }
            Expr::sin(expr) => {
                Expr::Mul(Box::new(Expr::cos(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::cos(expr) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::sin(expr.clone())),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::tg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::cos(expr.clone())),
                        Box::new(Expr::Const(2.0)),
                    )),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::ctg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::sin(expr.clone())),
                        Box::new(Expr::Const(2.0)),
                    )),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::arcsin(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arccos(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arctg(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Add(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                )),
            ),
            // d/dx \int f dx = f
            Expr::Integral {
                integrand,
                var: bound,
                bounds: None,
            } if bound == var => (**integrand).clone(),
            Expr::Integral { .. } | Expr::Derivative { .. } => {
                if self.contains_variable(var) {
                    Expr::Derivative {
                        expr: Box::new(self.clone()),
                        var: var.to_string(),
                        order: 1,
                    }
                } else {
                    Expr::Const(0.0)
                }
            }
        }
    }

    /// n-th derivative, simplified after every step so the tree stays small.
    pub fn diff_n(&self, var: &str, order: usize) -> Expr {
        let mut current = self.clone();
        for _ in 0..order {
            current = current.diff(var).simplify();
        }
        current
    }

    /// Simplified derivative of the given order.
    pub fn differentiate(&self, var: &str, order: usize) -> Expr {
        if order == 0 {
            return self.simplify();
        }
        self.diff_n(var, order)
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::latex_parser::parse_latex;
    use crate::symbolic::symbolic_engine::Expr;
    use std::collections::HashMap;

    fn derivative(input: &str, var: &str) -> String {
        parse_latex(input).unwrap().differentiate(var, 1).to_latex()
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(derivative("x^{3}", "x"), "3 x^{2}");
        assert_eq!(derivative("x^{2} + 3x + 1", "x"), "2 x + 3");
    }

    #[test]
    fn test_trig_and_chain_rule() {
        assert_eq!(derivative("\\sin x", "x"), "\\cos{\\left(x \\right)}");
        assert_eq!(derivative("e^{2x}", "x"), "2 e^{2 x}");
    }

    #[test]
    fn test_other_symbols_are_constants() {
        assert_eq!(derivative("a x^{2}", "x"), "2 a x");
        assert_eq!(derivative("y^{2}", "x"), "0");
    }

    #[test]
    fn test_second_derivative() {
        let expr = parse_latex("x^{4}").unwrap();
        assert_eq!(expr.differentiate("x", 2).to_latex(), "12 x^{2}");
    }

    #[test]
    fn test_quotient_rule_numerically() {
        let expr = parse_latex("\\frac{\\sin x}{x}").unwrap();
        let derivative = expr.differentiate("x", 1);
        let mut values = HashMap::new();
        values.insert("x".to_string(), 1.3);
        let expected = (1.3f64.cos() * 1.3 - 1.3f64.sin()) / (1.3 * 1.3);
        let got = derivative.eval_expression(&values).unwrap();
        approx::assert_relative_eq!(got, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_exponent_with_variable() {
        let expr = Expr::var("x").pow(Expr::var("x"));
        let derivative = expr.differentiate("x", 1);
        let mut values = HashMap::new();
        values.insert("x".to_string(), 2.0);
        // d/dx x^x = x^x (ln x + 1)
        let expected = 4.0 * (2.0f64.ln() + 1.0);
        approx::assert_relative_eq!(
            derivative.eval_expression(&values).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }
}
