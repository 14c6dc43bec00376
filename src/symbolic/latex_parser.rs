//! Turns formula markup into a symbolic expression.
//!
//! Grammar (highest binding last):
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := unary (('*' | \cdot | \times | '/' | \div) unary | postfix)*
//! unary      := ('-' | '+') unary | postfix
//! postfix    := primary ('^' script)?
//! primary    := number | letter ('_' script)? | greek | group | \left ... \right
//!             | \frac{..}{..} | \sqrt[..]{..} | function argument | \int ... d<var>
//! ```
//! Sums and products with bounds, limits, matrices, multi-line input, relations and
//! fractions nested inside fraction arguments are rejected with an error naming the
//! construct, never with a panic.
use crate::symbolic::latex_lexer::{Token, tokenize};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::is_integer;

pub const GREEK_LETTERS: [&str; 36] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "rho", "sigma", "tau", "upsilon",
    "phi", "varphi", "chi", "psi", "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi",
    "Sigma", "Upsilon", "Phi", "Psi", "Omega",
];

/// highest order accepted in `\frac{d^{n}}{dx^{n}}`
pub const MAX_DERIVATIVE_ORDER: usize = 20;

fn derivative_order(n: f64) -> Result<usize, String> {
    if !is_integer(n) || n < 1.0 || n > MAX_DERIVATIVE_ORDER as f64 {
        return Err(format!(
            "derivative order {} must be a whole number from 1 to {}",
            n, MAX_DERIVATIVE_ORDER
        ));
    }
    Ok(n as usize)
}

const FUNCTIONS: [&str; 15] = [
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "ln", "log", "exp",
];

const UNSUPPORTED_COMMANDS: [&str; 33] = [
    "sum", "prod", "lim", "iint", "iiint", "oint", "begin", "end", "infty", "neq", "approx",
    "leq", "geq", "le", "ge", "in", "notin", "forall", "exists", "cup", "cap", "rightarrow",
    "Rightarrow", "leftarrow", "to", "land", "lor", "implies", "iff", "pm", "mp", "cdots",
    "ldots",
];

/// Parses a single expression. A top-level `=` is an error here; equations are split
/// before parsing (see `split_top_level`).
pub fn parse_latex(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = LatexParser::new(tokens);
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(describe_leftover(token)),
    }
}

fn describe_leftover(token: &Token) -> String {
    match token {
        Token::Symbol('=') => "unexpected '=': an equation must have exactly one top-level '='"
            .to_string(),
        Token::Symbol('<') | Token::Symbol('>') => {
            "relations ('<', '>') are not supported".to_string()
        }
        Token::Symbol(c @ (')' | ']' | '}')) => format!("unbalanced '{}'", c),
        Token::Command(name) if name == "right" => "unbalanced \\right".to_string(),
        other => format!("unexpected {}", describe(other)),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Letter(c) => format!("'{}'", c),
        Token::Command(name) => format!("'\\{}'", name),
        Token::Symbol(c) => format!("'{}'", c),
        Token::LineBreak => "line break '\\\\'".to_string(),
        Token::Space => "space".to_string(),
    }
}

struct LatexParser {
    tokens: Vec<Token>,
    pos: usize,
    /// > 0 while parsing the arguments of a \frac
    frac_depth: usize,
    /// > 0 while parsing an integrand, so `d<var>` ends the term
    integral_depth: usize,
}

impl LatexParser {
    fn new(tokens: Vec<Token>) -> Self {
        LatexParser {
            tokens,
            pos: 0,
            frac_depth: 0,
            integral_depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next_is_symbol(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == c)
    }

    fn next_is_command(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Command(n)) if n == name)
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), String> {
        match self.advance() {
            Some(Token::Symbol(s)) if s == c => Ok(()),
            Some(other) => Err(format!("expected '{}' but found {}", c, describe(&other))),
            None => Err(format!("unbalanced group: expected '{}' before end of input", c)),
        }
    }

    /// `d` followed by a variable token while inside an integrand
    fn at_differential(&self) -> bool {
        self.integral_depth > 0
            && matches!(self.peek(), Some(Token::Letter('d')))
            && match self.peek_at(1) {
                Some(Token::Letter(_)) => true,
                Some(Token::Command(name)) => GREEK_LETTERS.contains(&name.as_str()),
                _ => false,
            }
    }

    /// True when the next token can begin an implicitly multiplied factor.
    fn starts_factor(&self) -> bool {
        if self.at_differential() {
            return false;
        }
        match self.peek() {
            Some(Token::Number(_)) | Some(Token::Letter(_)) | Some(Token::LineBreak) => true,
            Some(Token::Symbol(c)) => matches!(c, '(' | '[' | '{' | '|' | '&'),
            Some(Token::Command(name)) => {
                !matches!(name.as_str(), "cdot" | "times" | "div" | "right" | "}")
            }
            _ => false,
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_term()?;
        loop {
            if self.next_is_symbol('+') {
                self.advance();
                let rhs = self.parse_term()?;
                lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
            } else if self.next_is_symbol('-') {
                self.advance();
                let rhs = self.parse_term()?;
                lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.next_is_symbol('*') || self.next_is_command("cdot") || self.next_is_command("times")
            {
                self.advance();
                let rhs = self.parse_unary()?;
                lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
            } else if self.next_is_symbol('/') || self.next_is_command("div") {
                self.advance();
                let rhs = self.parse_unary()?;
                lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
            } else if self.starts_factor() {
                let rhs = self.parse_postfix()?;
                lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.next_is_symbol('-') {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(match operand {
                Expr::Const(c) => Expr::Const(-c),
                other => -other,
            });
        }
        if self.next_is_symbol('+') {
            self.advance();
            return self.parse_unary();
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let base = self.parse_primary()?;
        self.parse_power(base)
    }

    fn parse_power(&mut self, base: Expr) -> Result<Expr, String> {
        if self.next_is_symbol('_') {
            return Err("subscripts are only supported on symbols".to_string());
        }
        if self.next_is_symbol('!') {
            return Err("factorials are not supported".to_string());
        }
        if self.next_is_symbol('\'') {
            return Err("prime notation is not supported, use \\frac{d}{dx}".to_string());
        }
        if !self.next_is_symbol('^') {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_script_argument()?;
        if self.next_is_symbol('^') {
            return Err("double superscript".to_string());
        }
        Ok(match base {
            Expr::Var(ref name) if name == "e" => Expr::Exp(Box::new(exponent)),
            _ => Expr::Pow(Box::new(base), Box::new(exponent)),
        })
    }

    /// argument of `^` or `_`: a braced group or a single primary
    fn parse_script_argument(&mut self) -> Result<Expr, String> {
        if self.next_is_symbol('{') {
            self.advance();
            self.parse_group_body('}')
        } else {
            self.parse_primary()
        }
    }

    /// Parses after an opening bracket up to and including `close`.
    fn parse_group_body(&mut self, close: char) -> Result<Expr, String> {
        if self.next_is_symbol(close) {
            return Err(format!(
                "empty group '{}' (fill in the placeholder)",
                if close == '}' { "{}" } else { "()" }
            ));
        }
        let saved_integral_depth = self.integral_depth;
        self.integral_depth = 0;
        let inner = self.parse_expression();
        self.integral_depth = saved_integral_depth;
        let inner = inner?;
        self.expect_symbol(close)?;
        Ok(inner)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let token = self
            .advance()
            .ok_or_else(|| "unexpected end of input".to_string())?;
        match token {
            Token::Number(n) => Ok(Expr::Const(n)),
            Token::Letter(c) => self.parse_symbol_name(c.to_string()),
            Token::Symbol('(') => self.parse_group_body(')'),
            Token::Symbol('[') => self.parse_group_body(']'),
            Token::Symbol('{') => self.parse_group_body('}'),
            Token::Symbol('|') => Err("absolute values are not supported".to_string()),
            Token::Symbol('&') => Err("alignment '&' (matrices) is not supported".to_string()),
            Token::Symbol(c) => Err(format!("unexpected '{}'", c)),
            Token::LineBreak => Err("multi-line expressions are not supported".to_string()),
            Token::Space => self.parse_primary(),
            Token::Command(name) => self.parse_command(&name),
        }
    }

    /// a letter or Greek name with an optional subscript, e.g. `x_{1}` -> `x_1`
    fn parse_symbol_name(&mut self, name: String) -> Result<Expr, String> {
        if !self.next_is_symbol('_') {
            return Ok(Expr::Var(name));
        }
        self.advance();
        let mut subscript = String::new();
        if self.next_is_symbol('{') {
            self.advance();
            loop {
                match self.advance() {
                    Some(Token::Symbol('}')) => break,
                    Some(Token::Letter(c)) => subscript.push(c),
                    Some(Token::Number(n)) => subscript.push_str(&format_subscript_number(n)),
                    Some(other) => {
                        return Err(format!("unsupported subscript content {}", describe(&other)));
                    }
                    None => return Err("unbalanced group: expected '}'".to_string()),
                }
            }
        } else {
            match self.advance() {
                Some(Token::Letter(c)) => subscript.push(c),
                Some(Token::Number(n)) => subscript.push_str(&format_subscript_number(n)),
                _ => return Err("missing subscript".to_string()),
            }
        }
        if subscript.is_empty() {
            return Err("empty group '{}' (fill in the placeholder)".to_string());
        }
        Ok(Expr::Var(format!("{}_{}", name, subscript)))
    }

    fn parse_command(&mut self, name: &str) -> Result<Expr, String> {
        match name {
            "frac" | "dfrac" | "tfrac" => self.parse_fraction(),
            "sqrt" => self.parse_sqrt(),
            "left" => self.parse_left(),
            "right" => Err("unbalanced \\right".to_string()),
            "int" => self.parse_integral(),
            "pi" => self.parse_symbol_name("pi".to_string()),
            "{" => {
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some(Token::Command(close)) if close == "}" => Ok(inner),
                    _ => Err("unbalanced group: expected '\\}'".to_string()),
                }
            }
            "partial" => Err("'\\partial' is only supported as \\frac{\\partial}{\\partial x}".to_string()),
            "cdot" | "times" | "div" => Err(format!("'\\{}' is missing its left operand", name)),
            f if FUNCTIONS.contains(&f) => self.parse_function(f),
            g if GREEK_LETTERS.contains(&g) => self.parse_symbol_name(g.to_string()),
            u if UNSUPPORTED_COMMANDS.contains(&u) => Err(format!(
                "'\\{}' is not supported by the computation engine",
                u
            )),
            other => Err(format!("unknown command '\\{}'", other)),
        }
    }

    fn parse_left(&mut self) -> Result<Expr, String> {
        let close = match self.advance() {
            Some(Token::Symbol('(')) => Token::Symbol(')'),
            Some(Token::Symbol('[')) => Token::Symbol(']'),
            Some(Token::Command(brace)) if brace == "{" => Token::Command("}".to_string()),
            Some(Token::Symbol('|')) => return Err("absolute values are not supported".to_string()),
            Some(other) => return Err(format!("unsupported delimiter {} after \\left", describe(&other))),
            None => return Err("unexpected end of input after \\left".to_string()),
        };
        let inner = self.parse_expression()?;
        match (self.advance(), self.advance()) {
            (Some(Token::Command(right)), Some(found)) if right == "right" && found == close => {
                Ok(inner)
            }
            _ => Err("unbalanced \\left ... \\right".to_string()),
        }
    }

    fn parse_sqrt(&mut self) -> Result<Expr, String> {
        let index = if self.next_is_symbol('[') {
            self.advance();
            Some(self.parse_group_body(']')?)
        } else {
            None
        };
        let radicand = self.parse_script_argument()?;
        let exponent = match index {
            None => Expr::Const(0.5),
            Some(Expr::Const(n)) if n != 0.0 => Expr::Const(1.0 / n),
            Some(other) => Expr::Div(Box::new(Expr::Const(1.0)), Box::new(other)),
        };
        Ok(Expr::Pow(Box::new(radicand), Box::new(exponent)))
    }

    /// numerator/denominator argument: braced group or a single token (`\frac12`)
    fn parse_fraction_argument(&mut self) -> Result<Expr, String> {
        if self.next_is_symbol('{') {
            self.advance();
            self.parse_group_body('}')
        } else {
            self.parse_primary()
        }
    }

    fn parse_fraction(&mut self) -> Result<Expr, String> {
        if self.frac_depth > 0 {
            return Err("nested fractions are not supported".to_string());
        }
        if let Some(derivative) = self.try_parse_derivative_operator()? {
            return Ok(derivative);
        }
        self.frac_depth += 1;
        let numerator = self.parse_fraction_argument();
        let denominator = match numerator {
            Ok(_) => self.parse_fraction_argument(),
            Err(_) => Err(String::new()),
        };
        self.frac_depth -= 1;
        let numerator = numerator?;
        let denominator = denominator?;
        Ok(Expr::Div(Box::new(numerator), Box::new(denominator)))
    }

    /// index one past the `}` closing the group that opens at `open`
    fn matching_brace(&self, open: usize) -> Option<usize> {
        if !matches!(self.tokens.get(open), Some(Token::Symbol('{'))) {
            return None;
        }
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token {
                Token::Symbol('{') => depth += 1,
                Token::Symbol('}') => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Recognises `\frac{d}{dx}`, `\frac{d^{n}}{dx^{n}}`, `\frac{dy}{dx}` and the
    /// `\partial` spellings. Returns `None` (consuming nothing) for ordinary fractions.
    fn try_parse_derivative_operator(&mut self) -> Result<Option<Expr>, String> {
        let start = self.pos;
        if !matches!(self.tokens.get(start), Some(Token::Symbol('{'))) {
            return Ok(None);
        }
        let is_d = |t: Option<&Token>| {
            matches!(t, Some(Token::Letter('d')))
                || matches!(t, Some(Token::Command(name)) if name == "partial")
        };
        if !is_d(self.tokens.get(start + 1)) {
            return Ok(None);
        }
        let Some(numerator_end) = self.matching_brace(start) else {
            return Ok(None);
        };
        let Some(denominator_end) = self.matching_brace(numerator_end) else {
            return Ok(None);
        };
        // denominator: { d <var> [^ order] }
        let denominator = &self.tokens[numerator_end..denominator_end];
        if denominator.len() < 4 || !is_d(denominator.get(1)) {
            return Ok(None);
        }
        let var = match denominator.get(2) {
            Some(Token::Letter(c)) => c.to_string(),
            Some(Token::Command(name)) if GREEK_LETTERS.contains(&name.as_str()) => name.clone(),
            _ => return Ok(None),
        };
        let denominator_order = match &denominator[3..denominator.len() - 1] {
            [] => 1,
            [Token::Symbol('^'), Token::Number(n)]
            | [Token::Symbol('^'), Token::Symbol('{'), Token::Number(n), Token::Symbol('}')] => {
                derivative_order(*n)?
            }
            _ => return Ok(None),
        };
        // numerator: { d [^ order] [operand...] }
        let numerator = &self.tokens[start + 2..numerator_end - 1];
        let (numerator_order, operand_tokens) = match numerator {
            [Token::Symbol('^'), Token::Number(n), rest @ ..] => (derivative_order(*n)?, rest),
            [Token::Symbol('^'), Token::Symbol('{'), Token::Number(n), Token::Symbol('}'), rest @ ..] => {
                (derivative_order(*n)?, rest)
            }
            rest => (1, rest),
        };
        if numerator_order != denominator_order || numerator_order == 0 {
            return Err(format!(
                "derivative orders do not match: d^{} / d{}^{}",
                numerator_order, var, denominator_order
            ));
        }
        let operand_tokens = operand_tokens.to_vec();
        self.pos = denominator_end;
        let operand = if operand_tokens.is_empty() {
            self.parse_term()?
        } else {
            let mut inner = LatexParser::new(operand_tokens);
            inner.frac_depth = 1;
            let operand = inner.parse_expression()?;
            if let Some(token) = inner.peek() {
                return Err(describe_leftover(token));
            }
            operand
        };
        Ok(Some(Expr::Derivative {
            expr: Box::new(operand),
            var,
            order: numerator_order,
        }))
    }

    fn parse_function_argument(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Symbol('(')) | Some(Token::Symbol('{')) | Some(Token::Symbol('[')) => {
                self.parse_primary()
            }
            Some(Token::Command(name)) if name == "left" => self.parse_primary(),
            Some(Token::Symbol('-')) => self.parse_unary(),
            None => Err("function without argument".to_string()),
            _ => {
                // `\sin 2x` takes the implicit product `2x`, stopping at the next function
                let mut arg = self.parse_postfix()?;
                while self.starts_factor() {
                    let next_is_function = matches!(
                        self.peek(),
                        Some(Token::Command(name)) if FUNCTIONS.contains(&name.as_str())
                            || name == "int" || name == "frac"
                    );
                    if next_is_function {
                        break;
                    }
                    let rhs = self.parse_postfix()?;
                    arg = Expr::Mul(Box::new(arg), Box::new(rhs));
                }
                Ok(arg)
            }
        }
    }

    fn parse_function(&mut self, name: &str) -> Result<Expr, String> {
        let base = if name == "log" && self.next_is_symbol('_') {
            self.advance();
            Some(self.parse_script_argument()?)
        } else {
            None
        };
        let power = if self.next_is_symbol('^') {
            self.advance();
            Some(self.parse_script_argument()?)
        } else {
            None
        };
        let arg = Box::new(self.parse_function_argument()?);
        let inverse = matches!(power, Some(Expr::Const(p)) if p == -1.0);
        let applied = match (name, inverse) {
            ("sin", true) => Expr::arcsin(arg),
            ("cos", true) => Expr::arccos(arg),
            ("tan", true) => Expr::arctg(arg),
            ("sin", false) => Expr::sin(arg),
            ("cos", false) => Expr::cos(arg),
            ("tan", false) => Expr::tg(arg),
            ("cot", false) => Expr::ctg(arg),
            ("sec", false) => Expr::Div(Box::new(Expr::Const(1.0)), Box::new(Expr::cos(arg))),
            ("csc", false) => Expr::Div(Box::new(Expr::Const(1.0)), Box::new(Expr::sin(arg))),
            ("arcsin", false) => Expr::arcsin(arg),
            ("arccos", false) => Expr::arccos(arg),
            ("arctan", false) => Expr::arctg(arg),
            ("sinh", false) => hyperbolic(*arg, -1.0),
            ("cosh", false) => hyperbolic(*arg, 1.0),
            ("tanh", false) => hyperbolic(*arg.clone(), -1.0) / hyperbolic(*arg, 1.0),
            ("ln", false) => Expr::Ln(arg),
            ("log", false) => match base {
                Some(base) => Expr::Log(Box::new(base), arg),
                None => Expr::Ln(arg),
            },
            ("exp", false) => Expr::Exp(arg),
            (other, _) => return Err(format!("'\\{}^{{-1}}' is not supported", other)),
        };
        Ok(match power {
            Some(p) if !inverse => Expr::Pow(Box::new(applied), Box::new(p)),
            _ => applied,
        })
    }

    fn parse_integral(&mut self) -> Result<Expr, String> {
        let mut lower = None;
        let mut upper = None;
        for _ in 0..2 {
            if self.next_is_symbol('_') && lower.is_none() {
                self.advance();
                lower = Some(self.parse_script_argument()?);
            } else if self.next_is_symbol('^') && upper.is_none() {
                self.advance();
                upper = Some(self.parse_script_argument()?);
            }
        }
        let bounds = match (lower, upper) {
            (Some(lower), Some(upper)) => Some((Box::new(lower), Box::new(upper))),
            (None, None) => None,
            _ => return Err("a definite integral needs both bounds".to_string()),
        };
        self.integral_depth += 1;
        let integrand = if self.at_differential() {
            Ok(Expr::Const(1.0))
        } else {
            self.parse_expression()
        };
        let at_differential = self.at_differential();
        self.integral_depth -= 1;
        let integrand = integrand?;
        if !at_differential {
            return Err("integral without differential, e.g. 'dx'".to_string());
        }
        self.advance();
        let var = match self.advance() {
            Some(Token::Letter(c)) => c.to_string(),
            Some(Token::Command(name)) => name,
            _ => return Err("integral without differential, e.g. 'dx'".to_string()),
        };
        Ok(Expr::Integral {
            integrand: Box::new(integrand),
            var,
            bounds,
        })
    }
}

/// (e^u + sign * e^-u) / 2
fn hyperbolic(arg: Expr, sign: f64) -> Expr {
    let positive = Expr::Exp(Box::new(arg.clone()));
    let negative = Expr::Exp(Box::new(-arg));
    let numerator = if sign < 0.0 {
        positive - negative
    } else {
        positive + negative
    };
    numerator / Expr::Const(2.0)
}

fn format_subscript_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    #[test]
    fn test_parse_sum_of_symbols() {
        let expr = parse_latex("x + x").unwrap();
        assert_eq!(expr, Expr::Add(var("x"), var("x")));
    }

    #[test]
    fn test_implicit_multiplication() {
        let expr = parse_latex("2xy").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(
                Box::new(Expr::Mul(Box::new(Expr::Const(2.0)), var("x"))),
                var("y")
            )
        );
    }

    #[test]
    fn test_parse_fraction() {
        let expr = parse_latex("\\frac{1}{x}").unwrap();
        assert_eq!(expr, Expr::Div(Box::new(Expr::Const(1.0)), var("x")));
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        let expr = parse_latex("-x^{2}").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(
                Box::new(Expr::Const(-1.0)),
                Box::new(Expr::Pow(var("x"), Box::new(Expr::Const(2.0))))
            )
        );
    }

    #[test]
    fn test_e_power_is_exponential() {
        let expr = parse_latex("e^{x}").unwrap();
        assert_eq!(expr, Expr::Exp(var("x")));
    }

    #[test]
    fn test_indefinite_integral() {
        let expr = parse_latex("\\int x^2 dx").unwrap();
        assert_eq!(
            expr,
            Expr::Integral {
                integrand: Box::new(Expr::Pow(var("x"), Box::new(Expr::Const(2.0)))),
                var: "x".to_string(),
                bounds: None,
            }
        );
    }

    #[test]
    fn test_definite_integral_with_spacing() {
        let expr = parse_latex("\\int_{0}^{1} x \\, dx").unwrap();
        assert_eq!(
            expr,
            Expr::Integral {
                integrand: var("x"),
                var: "x".to_string(),
                bounds: Some((Box::new(Expr::Const(0.0)), Box::new(Expr::Const(1.0)))),
            }
        );
    }

    #[test]
    fn test_derivative_operator() {
        let expr = parse_latex("\\frac{d}{dx} x^{2}").unwrap();
        assert_eq!(
            expr,
            Expr::Derivative {
                expr: Box::new(Expr::Pow(var("x"), Box::new(Expr::Const(2.0)))),
                var: "x".to_string(),
                order: 1,
            }
        );
        let second = parse_latex("\\frac{d^{2}}{dx^{2}} \\sin x").unwrap();
        assert!(matches!(second, Expr::Derivative { order: 2, .. }));
    }

    #[test]
    fn test_derivative_order_is_bounded() {
        let huge = parse_latex("\\frac{d^{1000000000}}{dx^{1000000000}} x");
        assert!(huge.unwrap_err().contains("derivative order"));
        assert!(parse_latex("\\frac{d^{1.5}}{dx^{1.5}} x").is_err());
        let largest = parse_latex("\\frac{d^{20}}{dx^{20}} x^{25}").unwrap();
        assert!(matches!(largest, Expr::Derivative { order: 20, .. }));
    }

    #[test]
    fn test_functions_and_greek() {
        let expr = parse_latex("\\sin\\left(\\alpha\\right)").unwrap();
        assert_eq!(expr, Expr::sin(var("alpha")));
        let log = parse_latex("\\log_{2} 8").unwrap();
        assert_eq!(
            log,
            Expr::Log(Box::new(Expr::Const(2.0)), Box::new(Expr::Const(8.0)))
        );
        let squared = parse_latex("\\sin^{2} x").unwrap();
        assert_eq!(
            squared,
            Expr::Pow(Box::new(Expr::sin(var("x"))), Box::new(Expr::Const(2.0)))
        );
    }

    #[test]
    fn test_sqrt_and_subscript() {
        let expr = parse_latex("\\sqrt{x_{1}}").unwrap();
        assert_eq!(expr, Expr::Pow(var("x_1"), Box::new(Expr::Const(0.5))));
    }

    #[test]
    fn test_unsupported_constructs_are_errors() {
        for input in [
            "\\sum_{i=1}^{n} i",
            "\\begin{pmatrix} a & b \\\\ c & d \\end{pmatrix}",
            "a \\\\ b",
            "\\frac{\\frac{1}{2}}{3}",
            "\\lim_{x \\to 0} x",
            "x \\leq 2",
            "\\infty",
            "|x|",
        ] {
            assert!(parse_latex(input).is_err(), "expected error for {}", input);
        }
    }

    #[test]
    fn test_empty_placeholder_is_an_error() {
        let err = parse_latex("x^{}").unwrap_err();
        assert!(err.contains("placeholder"));
    }

    #[test]
    fn test_unbalanced_groups() {
        assert!(parse_latex("(x + 1").is_err());
        assert!(parse_latex("x + 1)").is_err());
        assert!(parse_latex("\\left( x").is_err());
    }

    #[test]
    fn test_equals_sign_is_rejected_inside_expression() {
        assert!(parse_latex("x = 2").is_err());
    }
}
