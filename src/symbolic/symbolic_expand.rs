//! Algebraic expansion: products over sums, quotients of sums, integer powers of sums.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::flatten_add;
use crate::symbolic::utils::is_integer;

/// largest integer power of a sum that is multiplied out
const MAX_EXPANDED_POWER: f64 = 12.0;

fn sum_terms(expr: &Expr) -> Vec<Expr> {
    let mut terms = Vec::new();
    flatten_add(expr, &mut terms);
    terms
}

fn sum_of(terms: Vec<Expr>) -> Expr {
    terms
        .into_iter()
        .reduce(|acc, term| Expr::Add(Box::new(acc), Box::new(term)))
        .unwrap_or(Expr::Const(0.0))
}

/// (a + b)(c + d) = ac + ad + bc + bd
fn distribute(lhs: &Expr, rhs: &Expr) -> Expr {
    let left = sum_terms(lhs);
    let right = sum_terms(rhs);
    if left.len() == 1 && right.len() == 1 {
        return Expr::Mul(Box::new(lhs.clone()), Box::new(rhs.clone()));
    }
    let mut products = Vec::with_capacity(left.len() * right.len());
    for a in &left {
        for b in &right {
            products.push(distribute(a, b));
        }
    }
    sum_of(products)
}

impl Expr {
    /// Multiplies out products and integer powers of sums, then simplifies.
    ///
    /// `(x + 1)^{2}` becomes `x^{2} + 2 x + 1`; `\frac{x + 1}{y}` becomes
    /// `\frac{x}{y} + \frac{1}{y}`. Function arguments are expanded too.
    pub fn expand(&self) -> Expr {
        self.expand_().simplify()
    }

    fn expand_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Mul(lhs, rhs) => distribute(&lhs.expand_(), &rhs.expand_()),
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.expand_();
                let denominator = rhs.expand_();
                let terms = sum_terms(&numerator);
                if terms.len() == 1 {
                    Expr::Div(Box::new(numerator), Box::new(denominator))
                } else {
                    sum_of(
                        terms
                            .into_iter()
                            .map(|t| Expr::Div(Box::new(t), Box::new(denominator.clone())))
                            .collect(),
                    )
                }
            }
            Expr::Pow(base, exp) => {
                let base = base.expand_();
                let exp = exp.expand_();
                match exp.as_const() {
                    Some(n)
                        if is_integer(n)
                            && (2.0..=MAX_EXPANDED_POWER).contains(&n)
                            && sum_terms(&base).len() > 1 =>
                    {
                        let mut acc = base.clone();
                        for _ in 1..(n as usize) {
                            // collect after every step so the term count stays small
                            acc = distribute(&acc, &base).simplify();
                        }
                        acc
                    }
                    _ => Expr::Pow(Box::new(base), Box::new(exp)),
                }
            }
            _ => self.map_children(&|child| child.expand_()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::latex_parser::parse_latex;

    fn expand(input: &str) -> String {
        parse_latex(input).unwrap().expand().to_latex()
    }

    #[test]
    fn test_expand_square_of_sum() {
        assert_eq!(expand("(x + 1)^{2}"), "x^{2} + 2 x + 1");
    }

    #[test]
    fn test_expand_product_of_sums() {
        assert_eq!(expand("(x - 1)(x + 1)"), "x^{2} - 1");
        assert_eq!(expand("(a + b)(a - b)"), "a^{2} - b^{2}");
    }

    #[test]
    fn test_expand_cube() {
        assert_eq!(expand("(x + 2)^{3}"), "x^{3} + 6 x^{2} + 12 x + 8");
    }

    #[test]
    fn test_expand_leaves_monomials() {
        assert_eq!(expand("2 x y"), "2 x y");
    }
}
