//! Rule table configuration.

use serde::{Deserialize, Serialize};

use crate::directive::DirectiveValue;

/// Which files a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    /// Originals and derivatives alike.
    #[default]
    Any,
    /// Only original files.
    Original,
    /// Only derived files (thumbnails, crops, ...).
    Derived,
}

impl RuleTarget {
    /// Check whether a file with the given derived flag is targeted.
    pub fn accepts(self, derived: bool) -> bool {
        match self {
            RuleTarget::Any => true,
            RuleTarget::Original => !derived,
            RuleTarget::Derived => derived,
        }
    }
}

/// A single entry of the rule table.
///
/// All configured criteria must match. A rule without criteria matches every
/// file accepted by `applies_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Label used in logs and errors.
    #[serde(default)]
    pub name: Option<String>,
    /// File extensions without leading dot, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns the path must match (any of them).
    #[serde(default)]
    pub path_patterns: Vec<String>,
    /// Glob patterns the path must not match.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Originals, derivatives or both.
    #[serde(default)]
    pub applies_to: RuleTarget,
    /// Directive for matching files. An empty directive means "leave alone".
    pub directive: DirectiveValue,
}

impl PolicyRule {
    /// Create a rule that matches every file.
    pub fn new(directive: impl Into<DirectiveValue>) -> Self {
        Self {
            name: None,
            extensions: Vec::new(),
            path_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            applies_to: RuleTarget::Any,
            directive: directive.into(),
        }
    }

    /// Set the rule label.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict to the given extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to paths matching any of the given globs.
    pub fn with_path_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Exclude paths matching any of the given globs.
    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to originals or derivatives.
    pub fn applies_to(mut self, target: RuleTarget) -> Self {
        self.applies_to = target;
        self
    }

    /// Label for logs: the configured name or the rule's position.
    pub(crate) fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("rule #{}", index + 1))
    }
}

/// Ordered rule table plus the explicit fallback.
///
/// The default configuration has no rules and no fallback, so nothing is
/// ever touched until policy is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Rules evaluated in order; the first match wins.
    pub rules: Vec<PolicyRule>,
    /// Directive for files no rule matches. `None` means "no directive".
    pub default_directive: Option<DirectiveValue>,
}

impl PolicyConfig {
    /// Configuration applying one directive to every file.
    pub fn uniform(directive: impl Into<DirectiveValue>) -> Self {
        Self {
            rules: Vec::new(),
            default_directive: Some(directive.into()),
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the fallback directive.
    pub fn with_default(mut self, directive: impl Into<DirectiveValue>) -> Self {
        self.default_directive = Some(directive.into());
        self
    }
}
