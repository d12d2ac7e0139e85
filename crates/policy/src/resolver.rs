//! Cache-Control policy resolution.
//!
//! The resolver is a pure function of (path, derived flag, rule table). It is
//! compiled once from a [`PolicyConfig`] and never performs I/O.

use rusty_cache_control_common::extension_of;

use crate::error::PolicyError;
use crate::glob::GlobFilter;
use crate::rules::{PolicyConfig, PolicyRule, RuleTarget};

/// Desired Cache-Control state for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    /// Header value the object should carry.
    Directive(String),
    /// No opinion; the object must not be touched.
    NoDirective,
}

impl CachePolicy {
    /// Header value, if any.
    pub fn as_directive(&self) -> Option<&str> {
        match self {
            CachePolicy::Directive(value) => Some(value.as_str()),
            CachePolicy::NoDirective => None,
        }
    }
}

/// Rule with its glob patterns compiled and directive rendered.
#[derive(Debug, Clone)]
struct CompiledRule {
    label: String,
    extensions: Vec<String>,
    filter: GlobFilter,
    applies_to: RuleTarget,
    directive: Option<String>,
}

impl CompiledRule {
    fn compile(rule: &PolicyRule, index: usize) -> Result<Self, PolicyError> {
        let label: String = rule.label(index);
        let extensions: Vec<String> = rule
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        let filter: GlobFilter =
            GlobFilter::with_patterns(rule.path_patterns.clone(), rule.exclude_patterns.clone())?;
        let directive: Option<String> = rule.directive.to_header_value(&label)?;

        Ok(Self {
            label,
            extensions,
            filter,
            applies_to: rule.applies_to,
            directive,
        })
    }

    fn matches(&self, path: &str, extension: Option<&str>, derived: bool) -> bool {
        if !self.applies_to.accepts(derived) {
            return false;
        }
        if !self.extensions.is_empty() {
            match extension {
                Some(ext) if self.extensions.iter().any(|e| e == ext) => {}
                _ => return false,
            }
        }
        self.filter.matches(path)
    }
}

/// Compiled rule table.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver {
    rules: Vec<CompiledRule>,
    default_directive: Option<String>,
}

impl PolicyResolver {
    /// Compile a rule table.
    ///
    /// # Arguments
    /// * `config` - Rule table and fallback directive
    ///
    /// # Errors
    /// Returns error if a glob pattern or structured directive is invalid.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicyError> {
        let rules: Vec<CompiledRule> = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::compile(rule, index))
            .collect::<Result<_, _>>()?;

        let default_directive: Option<String> = match &config.default_directive {
            Some(value) => value.to_header_value("default")?,
            None => None,
        };

        Ok(Self {
            rules,
            default_directive,
        })
    }

    /// Resolver that never yields a directive.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Resolve the desired directive for a file.
    ///
    /// For a derivative, pass the path of its original file with
    /// `derived = true`: derivatives inherit the original's policy but may be
    /// targeted by derived-only rules.
    ///
    /// # Arguments
    /// * `path` - POSIX-style path the rules are matched against
    /// * `derived` - Whether the object is a derivative
    pub fn resolve(&self, path: &str, derived: bool) -> CachePolicy {
        let extension: Option<String> = extension_of(path);

        for rule in &self.rules {
            if rule.matches(path, extension.as_deref(), derived) {
                log::debug!("Cache policy for {} matched {}", path, rule.label);
                return match &rule.directive {
                    Some(value) => CachePolicy::Directive(value.clone()),
                    None => CachePolicy::NoDirective,
                };
            }
        }

        match &self.default_directive {
            Some(value) => CachePolicy::Directive(value.clone()),
            None => CachePolicy::NoDirective,
        }
    }

    /// Number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
