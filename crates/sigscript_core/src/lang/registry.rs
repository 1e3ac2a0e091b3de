//! Shareable metadata for `sigscript_core::lang` registries.
//!
//! The `sigscript_core::lang` module is a set of **registry-first** vocabularies: operators, grammars,
//! punctuation and messages. This submodule provides the small, dependency-free metadata types that are reused
//! across those registries.
//!
//! ## Notes
//! - These types are intentionally lightweight and `Copy`-friendly so registries can live in `const` tables.
//! - Metadata is meant for tooling/docs/diagnostics; enforcement of syntax rules still lives in the tokenizer and
//!   parsers.

/// Identify the engine version a vocabulary item is available since.
pub type SinceVersion = &'static str;

/// Describe the lifecycle status of a language vocabulary item.
///
/// ## Notes
/// - `Deprecated` items still parse; tooling may warn about them.
///
/// ## Examples
/// ```rust
/// use sigscript_core::lang::registry::Stability;
///
/// let s = Stability::Stable;
/// assert_eq!(format!("{s:?}"), "Stable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Draft,
    Deprecated,
}

/// A small example snippet for documentation, in both grammars.
#[derive(Debug, Clone, Copy)]
pub struct Example {
    pub prefix: &'static str,
    pub infix: &'static str,
}

/// Operand count accepted by an operator.
///
/// ## Examples
/// ```rust
/// use sigscript_core::lang::registry::Arity;
///
/// assert!(Arity::at_least(2).accepts(5));
/// assert!(!Arity::exact(1).accepts(0));
/// assert_eq!(Arity::range(1, 2).to_string(), "1 to 2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}
