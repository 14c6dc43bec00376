//! # Symbol Catalog
//!
//! Static table of button labels and the markup fragment each one inserts, grouped by
//! category. The catalog is data: a built-in table mirrors the usual formula-editor
//! palette, and extra categories can be read from a TOML file:
//!
//! ```toml
//! [[category]]
//! name = "Physics"
//! symbols = [
//!     { label = "hbar", fragment = "\\hbar " },
//!     { label = "E=mc²", fragment = "E = m c^{2}" },
//! ]
//! ```
//!
//! A placeholder marker is an empty group `{}`. Every entry records the offset (in
//! characters) just inside the last marker of its fragment, the place the cursor should
//! jump to after insertion.
use crate::Utils::settings::CatalogSettings;
use crate::formula::errors::FormulaError;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Empty group a user is expected to fill in.
pub const PLACEHOLDER_MARKER: &str = "{}";

/// Character offset just inside the rightmost placeholder marker of `fragment`.
pub fn placeholder_offset(fragment: &str) -> Option<usize> {
    fragment
        .rfind(PLACEHOLDER_MARKER)
        .map(|byte_index| fragment[..byte_index].chars().count() + 1)
}

/// True when the grouping braces of `fragment` are balanced. Escaped braces
/// (`\{`, `\}`) are literal characters, not groups.
pub fn groups_balanced(fragment: &str) -> bool {
    let mut depth: i64 = 0;
    let mut escaped = false;
    for ch in fragment.chars() {
        match ch {
            '\\' => {
                escaped = !escaped;
                continue;
            }
            '{' if !escaped => depth += 1,
            '}' if !escaped => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
        escaped = false;
    }
    depth == 0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub label: String,
    pub fragment: String,
    pub placeholder: Option<usize>,
}

impl SymbolEntry {
    /// Builds an entry; doubled markers `{{}}` (a common escaping slip) collapse to `{}`.
    pub fn new(label: &str, fragment: &str) -> Result<SymbolEntry, FormulaError> {
        let fragment = fragment.replace("{{}}", PLACEHOLDER_MARKER);
        if !groups_balanced(&fragment) {
            return Err(FormulaError::Config(format!(
                "fragment of symbol '{}' has unbalanced groups: {}",
                label, fragment
            )));
        }
        Ok(SymbolEntry {
            label: label.to_string(),
            placeholder: placeholder_offset(&fragment),
            fragment,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolCategory {
    pub name: String,
    pub symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolCatalog {
    pub categories: Vec<SymbolCategory>,
}

#[derive(Deserialize)]
struct RawSymbol {
    label: String,
    fragment: String,
}

#[derive(Deserialize)]
struct RawCategory {
    name: String,
    #[serde(default)]
    symbols: Vec<RawSymbol>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "category")]
    categories: Vec<RawCategory>,
}

const BUILTIN: &[(&str, &[(&str, &str)])] = &[
    (
        "Basic Operators",
        &[
            ("+", "+ "),
            ("-", "- "),
            ("×", "\\times "),
            ("÷", "\\div "),
            ("=", "= "),
            ("(", "\\left( "),
            (")", "\\right) "),
            ("[", "\\left[ "),
            ("]", "\\right] "),
            ("{", "\\left\\{ "),
            ("}", "\\right\\} "),
        ],
    ),
    (
        "Superscript/Subscript",
        &[("^", "^{}"), ("²", "^{2}"), ("³", "^{3}"), ("_", "_{}")],
    ),
    (
        "Roots & Fractions",
        &[
            ("√", "\\sqrt{}"),
            ("ⁿ√", "\\sqrt[{}]{}"),
            ("frac", "\\frac{}{}"),
        ],
    ),
    (
        "Calculus",
        &[
            ("∫", "\\int "),
            ("∫ dx", "\\int dx "),
            ("∬", "\\iint "),
            ("∮", "\\oint "),
            ("d/dx", "\\frac{d}{dx} "),
            ("∂", "\\partial "),
            ("lim", "\\lim_{ \\to } "),
        ],
    ),
    (
        "Sums & Products",
        &[("∑", "\\sum_{}^{} "), ("∏", "\\prod_{}^{} ")],
    ),
    (
        "Logs & Trig",
        &[
            ("log", "\\log_{} "),
            ("ln", "\\ln "),
            ("sin", "\\sin "),
            ("cos", "\\cos "),
            ("tan", "\\tan "),
            ("arcsin", "\\arcsin "),
            ("arccos", "\\arccos "),
            ("arctan", "\\arctan "),
        ],
    ),
    (
        "Greek Letters",
        &[
            ("α", "\\alpha "),
            ("β", "\\beta "),
            ("γ", "\\gamma "),
            ("δ", "\\delta "),
            ("Δ", "\\Delta "),
            ("θ", "\\theta "),
            ("φ", "\\phi "),
            ("π", "\\pi "),
            ("σ", "\\sigma "),
            ("μ", "\\mu "),
            ("λ", "\\lambda "),
            ("ω", "\\omega "),
            ("ψ", "\\psi "),
            ("ξ", "\\xi "),
        ],
    ),
    (
        "Relations & Symbols",
        &[
            ("≠", "\\neq "),
            ("≈", "\\approx "),
            ("<", "< "),
            (">", "> "),
            ("≤", "\\leq "),
            ("≥", "\\geq "),
            ("∈", "\\in "),
            ("∀", "\\forall "),
            ("∃", "\\exists "),
            ("∞", "\\infty "),
            ("∪", "\\cup "),
            ("∩", "\\cap "),
            ("→", "\\rightarrow "),
            ("⇒", "\\Rightarrow "),
            ("∧", "\\land "),
            ("∨", "\\lor "),
            ("⟹", "\\implies "),
        ],
    ),
    (
        "Matrices",
        &[
            ("2×2 matrix", "\\begin{matrix} a & b \\\\ c & d \\end{matrix}"),
            (
                "3×3 matrix",
                "\\begin{matrix} a & b & c \\\\ d & e & f \\\\ g & h & i \\end{matrix}",
            ),
            ("pmatrix", "\\begin{pmatrix}  &  \\\\  &  \\end{pmatrix}"),
        ],
    ),
    (
        "Templates",
        &[
            ("quadratic formula", "x = \\frac{-b \\pm \\sqrt{b^{2} - 4 a c}}{2 a}"),
            ("Pythagorean theorem", "a^{2} + b^{2} = c^{2}"),
            ("Euler identity", "e^{i \\pi} + 1 = 0"),
            ("binomial square", "\\left(a + b\\right)^{2} = a^{2} + 2 a b + b^{2}"),
            ("derivative", "\\frac{d}{dx} {}"),
            ("indefinite integral", "\\int {} \\, dx"),
            ("definite integral", "\\int_{}^{} {} \\, dx"),
        ],
    ),
];

impl SymbolCatalog {
    /// The built-in palette.
    pub fn builtin() -> SymbolCatalog {
        let categories = BUILTIN
            .iter()
            .map(|(name, symbols)| SymbolCategory {
                name: name.to_string(),
                symbols: symbols
                    .iter()
                    .map(|(label, fragment)| SymbolEntry {
                        label: label.to_string(),
                        fragment: fragment.to_string(),
                        placeholder: placeholder_offset(fragment),
                    })
                    .collect(),
            })
            .collect();
        SymbolCatalog { categories }
    }

    pub fn from_toml_str(content: &str) -> Result<SymbolCatalog, FormulaError> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| FormulaError::Config(format!("invalid catalog: {}", e)))?;
        let mut categories = Vec::with_capacity(file.categories.len());
        for raw in file.categories {
            let symbols = raw
                .symbols
                .iter()
                .map(|s| SymbolEntry::new(&s.label, &s.fragment))
                .collect::<Result<Vec<_>, _>>()?;
            categories.push(SymbolCategory {
                name: raw.name,
                symbols,
            });
        }
        Ok(SymbolCatalog { categories })
    }

    pub fn from_file(path: &Path) -> Result<SymbolCatalog, FormulaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            FormulaError::Config(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        let catalog = SymbolCatalog::from_toml_str(&content)?;
        info!(
            "loaded {} symbol categories from {}",
            catalog.categories.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Catalog described by the `[catalog]` settings: the built-in table, the file
    /// categories, or the built-in table followed by the file categories.
    pub fn load(settings: &CatalogSettings) -> Result<SymbolCatalog, FormulaError> {
        let mut catalog = if settings.include_builtin {
            SymbolCatalog::builtin()
        } else {
            SymbolCatalog::default()
        };
        if let Some(path) = &settings.path {
            catalog.merge(SymbolCatalog::from_file(path)?);
        }
        Ok(catalog)
    }

    /// Appends the categories of `other`; symbols of a category that already exists
    /// are added to it unless their label is taken.
    pub fn merge(&mut self, other: SymbolCatalog) {
        for category in other.categories {
            match self.categories.iter_mut().find(|c| c.name == category.name) {
                Some(existing) => {
                    for symbol in category.symbols {
                        if existing.symbols.iter().any(|s| s.label == symbol.label) {
                            debug!("symbol '{}' already in '{}'", symbol.label, existing.name);
                            continue;
                        }
                        existing.symbols.push(symbol);
                    }
                }
                None => self.categories.push(category),
            }
        }
    }

    /// First entry with the given label, in category order.
    pub fn find(&self, label: &str) -> Option<&SymbolEntry> {
        self.categories
            .iter()
            .flat_map(|c| c.symbols.iter())
            .find(|s| s.label == label)
    }

    pub fn find_in(&self, category: &str, label: &str) -> Option<&SymbolEntry> {
        self.categories
            .iter()
            .find(|c| c.name == category)?
            .symbols
            .iter()
            .find(|s| s.label == label)
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_fragments_are_balanced() {
        let catalog = SymbolCatalog::builtin();
        assert_eq!(catalog.categories.len(), 10);
        for category in &catalog.categories {
            for symbol in &category.symbols {
                assert!(
                    groups_balanced(&symbol.fragment),
                    "{} / {}",
                    category.name,
                    symbol.label
                );
            }
        }
    }

    #[test]
    fn test_placeholder_offsets() {
        let catalog = SymbolCatalog::builtin();
        assert_eq!(catalog.find("^").unwrap().placeholder, Some(2));
        // \frac{}{} -> inside the denominator
        assert_eq!(catalog.find("frac").unwrap().placeholder, Some(8));
        assert_eq!(catalog.find("sin").unwrap().placeholder, None);
        assert_eq!(catalog.find("ⁿ√").unwrap().placeholder, Some(10));
    }

    #[test]
    fn test_find_in_category() {
        let catalog = SymbolCatalog::builtin();
        let pi = catalog.find_in("Greek Letters", "π").unwrap();
        assert_eq!(pi.fragment, "\\pi ");
        assert!(catalog.find_in("Calculus", "π").is_none());
    }

    #[test]
    fn test_groups_balanced_ignores_escaped_braces() {
        assert!(groups_balanced("\\left\\{ "));
        assert!(groups_balanced("\\frac{a}{b}"));
        assert!(!groups_balanced("\\frac{a}{b"));
        assert!(!groups_balanced("}{"));
    }

    #[test]
    fn test_catalog_from_toml() {
        let content = r#"
[[category]]
name = "Physics"
symbols = [
    { label = "hbar", fragment = "\\hbar " },
    { label = "square", fragment = "^{{}}" },
]
"#;
        let catalog = SymbolCatalog::from_toml_str(content).unwrap();
        assert_eq!(catalog.len(), 2);
        let square = catalog.find("square").unwrap();
        assert_eq!(square.fragment, "^{}");
        assert_eq!(square.placeholder, Some(2));
    }

    #[test]
    fn test_unbalanced_fragment_is_a_config_error() {
        let content = r#"
[[category]]
name = "Broken"
symbols = [{ label = "bad", fragment = "\\frac{" }]
"#;
        let err = SymbolCatalog::from_toml_str(content).unwrap_err();
        assert!(matches!(err, FormulaError::Config(_)));
    }

    #[test]
    fn test_load_merges_file_after_builtin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symbols.toml");
        fs::write(
            &path,
            "[[category]]\nname = \"Greek Letters\"\nsymbols = [{ label = \"η\", fragment = \"\\\\eta \" }, { label = \"π\", fragment = \"\\\\varpi \" }]\n",
        )
        .unwrap();
        let settings = CatalogSettings {
            path: Some(PathBuf::from(&path)),
            include_builtin: true,
        };
        let catalog = SymbolCatalog::load(&settings).unwrap();
        let greek = catalog
            .categories
            .iter()
            .find(|c| c.name == "Greek Letters")
            .unwrap();
        assert_eq!(greek.symbols.last().unwrap().label, "η");
        // the built-in π is kept
        assert_eq!(catalog.find("π").unwrap().fragment, "\\pi ");
    }

    #[test]
    fn test_missing_catalog_file() {
        let settings = CatalogSettings {
            path: Some(PathBuf::from("/nonexistent/symbols.toml")),
            include_builtin: false,
        };
        assert!(SymbolCatalog::load(&settings).is_err());
    }
}
