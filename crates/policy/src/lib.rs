//! Cache-Control policy for files stored in object stores.
//!
//! Given a file path and whether the file is a derivative (thumbnail, crop,
//! ...), the [`PolicyResolver`] returns the `Cache-Control` value the remote
//! object should carry, or [`CachePolicy::NoDirective`] when the object must
//! be left alone.
//!
//! # Rule tables
//!
//! Rules are evaluated in order and the first match wins. A rule may select
//! files by extension, by glob path pattern and by original/derived flag. Files
//! no rule matches fall back to an explicit `default_directive`; without one
//! they get no directive at all.
//!
//! ```
//! use rusty_cache_control_policy::{PolicyConfig, PolicyResolver, PolicyRule};
//!
//! let config = PolicyConfig::default()
//!     .with_rule(PolicyRule::new("public, max-age=2592000").with_extensions(["png"]));
//! let resolver = PolicyResolver::from_config(&config).unwrap();
//!
//! assert_eq!(
//!     resolver.resolve("/images/logo.png", false).as_directive(),
//!     Some("public, max-age=2592000")
//! );
//! ```

mod directive;
mod error;
pub mod glob;
mod resolver;
mod rules;

pub use directive::{CacheDirective, Cacheability, DirectiveValue};
pub use error::PolicyError;
pub use glob::GlobFilter;
pub use resolver::{CachePolicy, PolicyResolver};
pub use rules::{PolicyConfig, PolicyRule, RuleTarget};
