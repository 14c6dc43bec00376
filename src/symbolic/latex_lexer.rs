//! Tokenizer for the restricted LaTeX-like markup.
//!
//! Letters are single-character tokens (`xy` is `x` times `y`, as in LaTeX math mode),
//! numbers are maximal runs of digits with an optional decimal point, commands are a
//! backslash followed by letters or by one punctuation character.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, multispace0, one_of, satisfy},
    combinator::{map, value},
    error::{Error, ErrorKind},
    sequence::preceded,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Letter(char),
    /// `\name` without the backslash; `\{` becomes `Command("{")`
    Command(String),
    /// single operator or bracket character
    Symbol(char),
    /// `\\`
    LineBreak,
    /// spacing commands (`\,`, `\;`, `\quad`, ...), dropped by `tokenize`
    Space,
}

/// spacing commands that carry no meaning for computation
const SPACING_COMMANDS: [&str; 7] = [
    "quad",
    "qquad",
    "limits",
    "displaystyle",
    "textstyle",
    "mathrm",
    "nolimits",
];

/// possibly empty run of ASCII digits
fn digit_run(input: &str) -> IResult<&str, &str> {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, rest) = input.split_at(end);
    Ok((rest, digits))
}

/// `12`, `1.5`, `1.` or `.5`, at any position including the end of the input
fn parse_number(input: &str) -> IResult<&str, Token> {
    let (after_integer, integer) = digit_run(input)?;
    let (rest, fraction) = match after_integer.strip_prefix('.') {
        Some(after_point) => {
            let (rest, fraction) = digit_run(after_point)?;
            (rest, Some(fraction))
        }
        None => (after_integer, None),
    };
    if integer.is_empty() && fraction.is_none_or(str::is_empty) {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Digit)));
    }
    let literal = format!(
        "{}.{}",
        if integer.is_empty() { "0" } else { integer },
        fraction.filter(|f| !f.is_empty()).unwrap_or("0")
    );
    let value = literal
        .parse::<f64>()
        .map_err(|_| nom::Err::Error(Error::new(input, ErrorKind::Float)))?;
    Ok((rest, Token::Number(value)))
}

fn parse_command(input: &str) -> IResult<&str, Token> {
    let named = map(alpha1, |name: &str| {
        if SPACING_COMMANDS.contains(&name) {
            Token::Space
        } else {
            Token::Command(name.to_string())
        }
    });
    let line_break = value(Token::LineBreak, char('\\'));
    let spacing = value(Token::Space, one_of(",;:! "));
    let escaped = map(one_of("{}|%#$&_"), |c: char| Token::Command(c.to_string()));
    let mut parser = preceded(char('\\'), alt((named, line_break, spacing, escaped)));
    parser.parse(input)
}

fn parse_letter(input: &str) -> IResult<&str, Token> {
    let mut parser = map(satisfy(|c: char| c.is_ascii_alphabetic()), Token::Letter);
    parser.parse(input)
}

fn parse_symbol(input: &str) -> IResult<&str, Token> {
    let mut parser = map(one_of("+-*/^_=()[]{},|!<>&'.:;"), Token::Symbol);
    parser.parse(input)
}

/// a few unicode characters users paste from other editors
fn parse_unicode(input: &str) -> IResult<&str, Token> {
    let mut parser = alt((
        value(Token::Symbol('*'), alt((tag("×"), tag("·"), tag("⋅")))),
        value(Token::Symbol('/'), tag("÷")),
        value(Token::Symbol('-'), tag("−")),
        value(Token::Command("pi".to_string()), tag("π")),
        value(Token::Command("infty".to_string()), tag("∞")),
    ));
    parser.parse(input)
}

fn parse_token(input: &str) -> IResult<&str, Token> {
    let (input, _) = multispace0(input)?;
    let mut parser = alt((parse_number, parse_command, parse_letter, parse_symbol, parse_unicode));
    parser.parse(input)
}

/// Splits markup into tokens. Spacing commands and whitespace are dropped.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        match parse_token(trimmed) {
            Ok((remaining, token)) => {
                if token != Token::Space {
                    tokens.push(token);
                }
                rest = remaining;
            }
            Err(_) => {
                let position = input.len() - trimmed.len();
                let bad = trimmed.chars().next().unwrap_or(' ');
                return Err(format!(
                    "unexpected character '{}' at position {}",
                    bad, position
                ));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers_and_letters() {
        let tokens = tokenize("2xy + 3.5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.0),
                Token::Letter('x'),
                Token::Letter('y'),
                Token::Symbol('+'),
                Token::Number(3.5),
            ]
        );
    }

    #[test]
    fn test_decimal_at_end_of_input() {
        assert_eq!(tokenize("1.5").unwrap(), vec![Token::Number(1.5)]);
        assert_eq!(tokenize("0.2").unwrap(), vec![Token::Number(0.2)]);
        assert_eq!(tokenize(".25").unwrap(), vec![Token::Number(0.25)]);
        assert_eq!(tokenize("3.").unwrap(), vec![Token::Number(3.0)]);
        assert_eq!(
            tokenize("0.1 + 0.2").unwrap(),
            vec![Token::Number(0.1), Token::Symbol('+'), Token::Number(0.2)]
        );
        // a lone point is punctuation, not a number
        assert_eq!(tokenize(".").unwrap(), vec![Token::Symbol('.')]);
    }

    #[test]
    fn test_tokenize_commands() {
        let tokens = tokenize("\\frac{1}{x}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Command("frac".to_string()),
                Token::Symbol('{'),
                Token::Number(1.0),
                Token::Symbol('}'),
                Token::Symbol('{'),
                Token::Letter('x'),
                Token::Symbol('}'),
            ]
        );
    }

    #[test]
    fn test_tokenize_escaped_brace_and_line_break() {
        let tokens = tokenize("\\left\\{ a \\\\ b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Command("left".to_string()),
                Token::Command("{".to_string()),
                Token::Letter('a'),
                Token::LineBreak,
                Token::Letter('b'),
            ]
        );
    }

    #[test]
    fn test_spacing_is_dropped() {
        let tokens = tokenize("x \\, dx \\quad").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Letter('x'), Token::Letter('d'), Token::Letter('x')]
        );
    }

    #[test]
    fn test_unicode_operators() {
        let tokens = tokenize("2 × π").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.0),
                Token::Symbol('*'),
                Token::Command("pi".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_an_error() {
        let result = tokenize("x ? y");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("position 2"));
    }
}
