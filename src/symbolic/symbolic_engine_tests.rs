use crate::symbolic::symbolic_engine::Expr;
use crate::symbols;
use std::collections::HashMap;
//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::latex_parser::parse_latex;
    use approx::assert_relative_eq;

    fn simplified(input: &str) -> String {
        parse_latex(input).unwrap().simplify().to_latex()
    }

    #[test]
    fn test_operators_build_trees() {
        let (x, y) = symbols!(x, y);
        let expr = x.clone() + y.clone() * Expr::Const(2.0);
        let expected = Expr::Add(
            Box::new(Expr::Var("x".to_string())),
            Box::new(Expr::Mul(
                Box::new(Expr::Var("y".to_string())),
                Box::new(Expr::Const(2.0)),
            )),
        );
        assert_eq!(expr, expected);
        let neg = -x;
        assert_eq!(
            neg,
            Expr::Mul(
                Box::new(Expr::Const(-1.0)),
                Box::new(Expr::Var("x".to_string()))
            )
        );
    }

    #[test]
    fn test_set_variable_from_map() {
        let (x, y) = symbols!(x, y);
        let expr = x * y.clone();
        let mut map = HashMap::new();
        map.insert("x".to_string(), 3.0);
        let partially = expr.set_variable_from_map(&map);
        assert_eq!(partially, Expr::Const(3.0) * y);
    }

    #[test]
    fn test_definite_integral_variable_is_bound() {
        let expr = parse_latex("\\int_{0}^{a} x \\, dx").unwrap();
        let free: Vec<String> = expr.free_variables().into_iter().collect();
        assert_eq!(free, vec!["a".to_string()]);
        let mut map = HashMap::new();
        map.insert("x".to_string(), 5.0);
        // x is bound inside the integral, the substitution leaves it alone
        assert_eq!(expr.set_variable_from_map(&map), expr);
    }

    #[test]
    fn test_free_variables_skip_constants() {
        let expr = parse_latex("\\pi r^{2} + e^{t}").unwrap();
        let free: Vec<String> = expr.free_variables().into_iter().collect();
        assert_eq!(free, vec!["r".to_string(), "t".to_string()]);
    }

    #[test]
    fn test_eval_expression() {
        let expr = parse_latex("\\frac{x^{2} + 1}{2}").unwrap();
        let mut values = HashMap::new();
        values.insert("x".to_string(), 3.0);
        assert_relative_eq!(expr.eval_expression(&values).unwrap(), 5.0);
        let circle = parse_latex("\\pi r^{2}").unwrap();
        values.insert("r".to_string(), 2.0);
        assert_relative_eq!(
            circle.eval_expression(&values).unwrap(),
            4.0 * std::f64::consts::PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_eval_expression_errors() {
        let unbound = parse_latex("x + y").unwrap();
        let mut values = HashMap::new();
        values.insert("x".to_string(), 1.0);
        let err = unbound.eval_expression(&values).unwrap_err();
        assert!(err.contains("'y'"));
        let pole = parse_latex("\\frac{1}{x - 1}").unwrap();
        assert!(pole.eval_expression(&values).is_err());
        let log = parse_latex("\\ln x").unwrap();
        values.insert("x".to_string(), -1.0);
        assert!(log.eval_expression(&values).is_err());
    }

    #[test]
    fn test_has_unevaluated_and_contains_variable() {
        let expr = parse_latex("\\frac{d}{dx} x^{3} + y").unwrap();
        assert!(expr.has_unevaluated());
        assert!(expr.contains_variable("y"));
        assert!(!parse_latex("x + 1").unwrap().has_unevaluated());
    }

    #[test]
    fn test_replace_subexpr() {
        let expr = parse_latex("\\sin{(x^{2})} + x^{2}").unwrap();
        let target = parse_latex("x^{2}").unwrap();
        let replaced = expr.replace_subexpr(&target, &Expr::var("u"));
        assert_eq!(replaced.to_latex(), "\\sin{\\left(u \\right)} + u");
    }

    #[test]
    fn test_simplify_collects_like_terms() {
        assert_eq!(simplified("x + x"), "2 x");
        assert_eq!(simplified("x + 2x - 3x"), "0");
        assert_eq!(simplified("x \\cdot x"), "x^{2}");
        assert_eq!(simplified("2 + 3 \\cdot 4"), "14");
    }

    #[test]
    fn test_simplify_keeps_small_and_decimal_coefficients() {
        assert_eq!(simplified("0.0000000001 x"), "0.0000000001 x");
        assert_eq!(simplified("x + 0.0000000005"), "x + 0.0000000005");
        assert_eq!(simplified("0.1 + 0.2"), "\\frac{3}{10}");
        assert_eq!(simplified("0.1 x + 0.2 x - 0.3 x"), "0");
    }

    #[test]
    fn test_simplify_cancels_quotients() {
        assert_eq!(simplified("\\frac{x^{3}}{x}"), "x^{2}");
        assert_eq!(simplified("\\frac{2x}{4}"), "\\frac{x}{2}");
        assert_eq!(simplified("\\frac{x + 1}{2}"), "\\frac{x}{2} + \\frac{1}{2}");
    }

    #[test]
    fn test_simplify_function_identities() {
        assert_eq!(simplified("\\sin^{2}{x} + \\cos^{2}{x}"), "1");
        assert_eq!(simplified("\\ln{e^{x}}"), "x");
        assert_eq!(simplified("\\cos{0} + \\sin{\\pi}"), "1");
    }

    #[test]
    fn test_zero_division_is_detected() {
        let expr = parse_latex("\\frac{x}{0}").unwrap();
        assert!(expr.has_zero_division());
        assert!(!parse_latex("\\frac{x}{2}").unwrap().has_zero_division());
    }
}
