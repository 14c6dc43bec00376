use num::integer::Integer;
use num::rational::Ratio;

pub fn has_brackets(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '(' | '{' | '[' | ')' | '}' | ']'))
}

// byte positions of a char that sits outside any (), [] or {} group
pub fn find_char_positions_outside_brackets(s: &str, c: char) -> Vec<usize> {
    let mut depth: i64 = 0;
    let mut positions = Vec::new();
    for (i, ch) in s.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if ch == c && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// Splits on every top-level occurrence of `separator`; pieces are trimmed.
pub fn split_top_level(s: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for pos in find_char_positions_outside_brackets(s, separator) {
        pieces.push(s[start..pos].trim());
        start = pos + separator.len_utf8();
    }
    pieces.push(s[start..].trim());
    pieces
}

/// True when the brackets of every kind open and close in order.
pub fn brackets_balanced(s: &str) -> bool {
    let mut stack = Vec::new();
    for ch in s.chars() {
        match ch {
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

const MAX_DENOMINATOR: i64 = 10_000;

/// Best rational approximation p/q with q <= 10000, if it reproduces `value`
/// to 1e-9 relative accuracy (continued fractions). A non-zero value never comes
/// back as zero.
pub fn as_rational(value: f64) -> Option<Ratio<i64>> {
    if !value.is_finite() || value.abs() > 1e12 {
        return None;
    }
    if value == 0.0 {
        return Some(Ratio::from_integer(0));
    }
    let tolerance = 1e-9 * value.abs();
    let (mut p0, mut q0, mut p1, mut q1): (i64, i64, i64, i64) = (0, 1, 1, 0);
    let mut x = value;
    for _ in 0..40 {
        let a = x.floor();
        let a_int = a as i64;
        let p2 = a_int.checked_mul(p1)?.checked_add(p0)?;
        let q2 = a_int.checked_mul(q1)?.checked_add(q0)?;
        if q2 > MAX_DENOMINATOR {
            return None;
        }
        if p2 != 0 && (value - p2 as f64 / q2 as f64).abs() <= tolerance {
            return Some(Ratio::new(p2, q2));
        }
        let frac = x - a;
        if frac.abs() < 1e-15 {
            return None;
        }
        x = 1.0 / frac;
        (p0, q0, p1, q1) = (p1, q1, p2, q2);
    }
    None
}

/// True for values that are integers and small enough to be treated as such.
pub fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15
}

pub fn lcm_all(values: &[i64]) -> i64 {
    values.iter().fold(1i64, |acc, v| acc.lcm(v))
}

pub fn gcd_all(values: &[i64]) -> i64 {
    values.iter().fold(0i64, |acc, v| acc.gcd(v))
}

/// Decimal rendering for numeric results: 12 significant digits, integers keep `.0`.
pub fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    let rounded = format!("{:.11e}", value)
        .parse::<f64>()
        .unwrap_or(value);
    format!("{:?}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_respects_groups() {
        let pieces = split_top_level("\\frac{a=1}{2} = x", '=');
        assert_eq!(pieces, vec!["\\frac{a=1}{2}", "x"]);
        assert_eq!(split_top_level("x", '='), vec!["x"]);
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("\\left( \\frac{1}{2} \\right)"));
        assert!(!brackets_balanced("(]"));
        assert!(!brackets_balanced("{"));
    }

    #[test]
    fn test_as_rational() {
        assert_eq!(as_rational(0.5), Some(Ratio::new(1, 2)));
        assert_eq!(as_rational(1.0 / 3.0), Some(Ratio::new(1, 3)));
        assert_eq!(as_rational(-2.0), Some(Ratio::new(-2, 1)));
        assert_eq!(as_rational(std::f64::consts::PI), None);
        assert_eq!(as_rational(0.0), Some(Ratio::from_integer(0)));
        assert_eq!(as_rational(0.0001), Some(Ratio::new(1, 10000)));
    }

    #[test]
    fn test_tiny_values_are_not_rounded_to_zero() {
        assert_eq!(as_rational(1e-10), None);
        assert_eq!(as_rational(-6.674e-11), None);
        assert_eq!(as_rational(1.0 / 3000000001.0), None);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(4.0), "4.0");
        assert_eq!(format_decimal(0.1 + 0.2), "0.3");
        assert_eq!(format_decimal(-2.5), "-2.5");
    }
}
