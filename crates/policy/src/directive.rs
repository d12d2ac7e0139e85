//! Cache-Control directive values.
//!
//! A directive is configured either as literal header text or as a structured
//! value that renders to canonical header text:
//!
//! ```
//! use rusty_cache_control_policy::{CacheDirective, Cacheability};
//!
//! let directive = CacheDirective {
//!     cacheability: Some(Cacheability::Public),
//!     max_age: Some(2_592_000),
//!     ..Default::default()
//! };
//! assert_eq!(directive.render(), "public, max-age=2592000");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Who may cache a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cacheability {
    Public,
    Private,
    NoCache,
    NoStore,
}

impl Cacheability {
    fn as_str(self) -> &'static str {
        match self {
            Cacheability::Public => "public",
            Cacheability::Private => "private",
            Cacheability::NoCache => "no-cache",
            Cacheability::NoStore => "no-store",
        }
    }
}

/// Structured Cache-Control directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheDirective {
    /// Leading cacheability token.
    pub cacheability: Option<Cacheability>,
    /// `max-age` in seconds.
    pub max_age: Option<u64>,
    /// `s-maxage` in seconds (shared caches only).
    pub s_maxage: Option<u64>,
    /// Append `must-revalidate`.
    pub must_revalidate: bool,
    /// Append `no-transform`.
    pub no_transform: bool,
    /// Append `immutable`.
    pub immutable: bool,
}

impl CacheDirective {
    /// Render to header text, tokens joined by `", "`.
    ///
    /// Returns an empty string when no token is set.
    pub fn render(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        if let Some(c) = self.cacheability {
            tokens.push(c.as_str().to_string());
        }
        if let Some(age) = self.max_age {
            tokens.push(format!("max-age={}", age));
        }
        if let Some(age) = self.s_maxage {
            tokens.push(format!("s-maxage={}", age));
        }
        if self.must_revalidate {
            tokens.push("must-revalidate".to_string());
        }
        if self.no_transform {
            tokens.push("no-transform".to_string());
        }
        if self.immutable {
            tokens.push("immutable".to_string());
        }
        tokens.join(", ")
    }

    /// Reject combinations that contradict each other.
    fn validate(&self, rule: &str) -> Result<(), PolicyError> {
        if self.cacheability == Some(Cacheability::NoStore)
            && (self.max_age.is_some() || self.s_maxage.is_some() || self.immutable)
        {
            return Err(PolicyError::InvalidDirective {
                rule: rule.to_string(),
                reason: "no-store cannot be combined with freshness tokens".to_string(),
            });
        }
        Ok(())
    }
}

/// Directive as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    /// Literal header text, used verbatim after trimming.
    Raw(String),
    /// Structured form rendered by [`CacheDirective::render`].
    Structured(CacheDirective),
}

impl DirectiveValue {
    /// Header text for this directive, `None` if it renders empty.
    ///
    /// # Arguments
    /// * `rule` - Rule label used in error messages
    ///
    /// # Errors
    /// Returns error if a structured directive is contradictory.
    pub fn to_header_value(&self, rule: &str) -> Result<Option<String>, PolicyError> {
        let text: String = match self {
            DirectiveValue::Raw(raw) => raw.trim().to_string(),
            DirectiveValue::Structured(directive) => {
                directive.validate(rule)?;
                directive.render()
            }
        };
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

impl From<&str> for DirectiveValue {
    fn from(raw: &str) -> Self {
        DirectiveValue::Raw(raw.to_string())
    }
}

impl From<CacheDirective> for DirectiveValue {
    fn from(directive: CacheDirective) -> Self {
        DirectiveValue::Structured(directive)
    }
}
