//! Variable substitution: `"x=2, y=3.5"` into a symbol -> value map.
//!
//! Resolution is all or nothing: one bad pair rejects the whole input.
//! Identifiers follow the names the markup parser gives symbols, so `\alpha=0.5`
//! binds `alpha` and `x_{1}=2` (or `x_1=2`) binds `x_1`.
use crate::formula::errors::FormulaError;
use nom::{
    IResult, Parser,
    bytes::complete::take_till,
    character::complete::char,
    combinator::{all_consuming, rest},
    number::complete::double,
    sequence::separated_pair,
};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\?([A-Za-z][A-Za-z0-9]*)(?:_\{?([A-Za-z0-9]+)\}?)?$")
        .expect("identifier pattern is valid")
});

/// Symbol name -> numeric value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution(BTreeMap<String, f64>);

impl Substitution {
    pub fn new() -> Self {
        Substitution(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    /// The map the expression engine substitutes with.
    pub fn to_var_map(&self) -> HashMap<String, f64> {
        self.0.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

impl FromIterator<(String, f64)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Substitution(iter.into_iter().collect())
    }
}

/// `name = value`, split on the first `=`
fn parse_pair(input: &str) -> IResult<&str, (&str, &str)> {
    let mut parser = separated_pair(take_till(|c| c == '='), char('='), rest);
    parser.parse(input)
}

fn parse_value(input: &str) -> IResult<&str, f64> {
    let mut parser = all_consuming(double);
    parser.parse(input)
}

/// Canonical symbol name of an identifier, `None` if it is not one.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let caps = IDENTIFIER.captures(raw)?;
    let stem = caps.get(1)?.as_str();
    Some(match caps.get(2) {
        Some(subscript) => format!("{}_{}", stem, subscript.as_str()),
        None => stem.to_string(),
    })
}

/// Parses `"name=value, name=value"`; empty input is an empty substitution.
pub fn resolve(raw: &str) -> Result<Substitution, FormulaError> {
    let mut map = BTreeMap::new();
    if raw.trim().is_empty() {
        return Ok(Substitution(map));
    }
    for (position, segment) in raw.split(',').enumerate() {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(FormulaError::Substitution(format!(
                "empty entry at position {}",
                position + 1
            )));
        }
        let (_, (name, value)) = parse_pair(segment).map_err(|_| {
            FormulaError::Substitution(format!("'{}' is not of the form name=value", segment))
        })?;
        let name = normalize_identifier(name.trim()).ok_or_else(|| {
            FormulaError::Substitution(format!("'{}' is not a variable name", name.trim()))
        })?;
        let (_, number) = parse_value(value.trim()).map_err(|_| {
            FormulaError::Substitution(format!("'{}' is not a number", value.trim()))
        })?;
        if !number.is_finite() {
            return Err(FormulaError::Substitution(format!(
                "value of {} must be finite",
                name
            )));
        }
        if map.insert(name.clone(), number).is_some() {
            return Err(FormulaError::Substitution(format!(
                "{} is given more than once",
                name
            )));
        }
    }
    Ok(Substitution(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resolve_pairs() {
        let subs = resolve("x=2, y = 3.5").unwrap();
        assert_eq!(subs.len(), 2);
        assert_relative_eq!(subs.get("x").unwrap(), 2.0);
        assert_relative_eq!(subs.get("y").unwrap(), 3.5);
    }

    #[test]
    fn test_empty_input_is_empty_mapping() {
        assert!(resolve("").unwrap().is_empty());
        assert!(resolve("   ").unwrap().is_empty());
    }

    #[test]
    fn test_all_or_nothing() {
        let err = resolve("x=2, y=abc").unwrap_err();
        assert!(matches!(err, FormulaError::Substitution(_)));
        assert!(resolve("x=2, y").is_err());
        assert!(resolve("x=2,,y=1").is_err());
        assert!(resolve("2x=1").is_err());
        assert!(resolve("x=1, x=2").is_err());
    }

    #[test]
    fn test_value_forms() {
        let subs = resolve("a=-1e-3, b=.5, c=+4").unwrap();
        assert_relative_eq!(subs.get("a").unwrap(), -1e-3);
        assert_relative_eq!(subs.get("b").unwrap(), 0.5);
        assert_relative_eq!(subs.get("c").unwrap(), 4.0);
        assert!(resolve("x=inf").is_err());
        assert!(resolve("x=1=2").is_err());
        assert!(resolve("x=2 3").is_err());
    }

    #[test]
    fn test_greek_and_subscripted_names() {
        let subs = resolve("\\alpha=0.5, x_{1}=2, y_2=3").unwrap();
        assert!(subs.get("alpha").is_some());
        assert!(subs.get("x_1").is_some());
        assert!(subs.get("y_2").is_some());
    }

    #[test]
    fn test_var_map() {
        let map = resolve("x=1").unwrap().to_var_map();
        assert_eq!(map.get("x"), Some(&1.0));
    }
}
