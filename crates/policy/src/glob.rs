//! Glob pattern matching for policy rules.
//!
//! Rules select files with standard glob syntax:
//! - Recursive matching with `**`
//! - Brace expansion like `*.{png,jpg}`
//! - Character classes like `[abc]`
//!
//! Paths are matched without a leading separator, so `images/**` matches the
//! file identified as `/images/logo.png`.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::PolicyError;

/// Include/exclude pattern pair used by a single policy rule.
#[derive(Debug, Clone, Default)]
pub struct GlobFilter {
    /// Patterns for paths to include (empty = include all).
    include: Vec<String>,
    /// Patterns for paths to exclude.
    exclude: Vec<String>,
    /// Compiled include patterns.
    include_set: Option<GlobSet>,
    /// Compiled exclude patterns.
    exclude_set: Option<GlobSet>,
}

impl GlobFilter {
    /// Create a new filter with no patterns (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with both include and exclude patterns.
    ///
    /// # Arguments
    /// * `include` - Glob patterns for paths to include
    /// * `exclude` - Glob patterns for paths to exclude
    ///
    /// # Errors
    /// Returns error if any pattern is invalid.
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Result<Self, PolicyError> {
        let include_set: Option<GlobSet> = compile_set(&include)?;
        let exclude_set: Option<GlobSet> = compile_set(&exclude)?;
        Ok(Self {
            include,
            exclude,
            include_set,
            exclude_set,
        })
    }

    /// Check if a path matches the filter criteria.
    ///
    /// # Arguments
    /// * `path` - POSIX-style path, leading separator optional
    ///
    /// # Returns
    /// `true` if the path is included and not excluded.
    pub fn matches(&self, path: &str) -> bool {
        let path: &str = path.trim_start_matches('/');

        let included: bool = match &self.include_set {
            Some(set) => set.is_match(path),
            None => true,
        };

        let excluded: bool = match &self.exclude_set {
            Some(set) => set.is_match(path),
            None => false,
        };

        included && !excluded
    }

    /// Check if the filter has any patterns.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Compile patterns into a GlobSet, `None` when there are no patterns.
fn compile_set(patterns: &[String]) -> Result<Option<GlobSet>, PolicyError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder: GlobSetBuilder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob: Glob = Glob::new(pattern).map_err(|e| PolicyError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }

    let set: GlobSet = builder.build().map_err(|e| PolicyError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })?;
    Ok(Some(set))
}
