//! Template name resolution.
//!
//! # Responsibilities
//! - Validate the configured pattern (exactly one capture group)
//! - Strip the mount prefix so matching sees the app-relative path
//! - Derive a stable template name from a matching path
//!
//! # Design Decisions
//! - Matching is anchored to the app-relative path, never the absolute URL,
//!   so remounting the application does not change template names
//! - A leading slash in the captured text is trimmed: `/app/template/foo.dust.js`
//!   under mount `/app` names `template/foo`

use regex::Regex;
use thiserror::Error;

/// Default pattern: any path ending in the dust template suffix.
pub const DEFAULT_NAME_PATTERN: &str = r"(.*)\.dust\.js$";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid template name pattern: {0}")]
    Invalid(#[from] regex::Error),

    #[error("template name pattern must contain exactly one capture group, found {found}")]
    CaptureGroups { found: usize },
}

/// Compiled name-extraction pattern with exactly one capture group.
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern)?;
        // captures_len includes the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(PatternError::CaptureGroups { found: groups });
        }
        Ok(Self { regex })
    }

    /// Derive the template name from an app-relative path, or None if the
    /// path is not a compilable template.
    pub fn template_name(&self, relative_path: &str) -> Option<String> {
        let caps = self.regex.captures(relative_path)?;
        let name = caps.get(1)?.as_str().trim_start_matches('/');
        Some(name.to_string())
    }
}

/// The path relative to the application mount, or None when the request is
/// outside the mount entirely.
pub fn relative_path<'a>(path: &'a str, mount_prefix: &str) -> Option<&'a str> {
    if mount_prefix.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(mount_prefix) {
        // `/app` must not claim `/application/...`
        Some(rest) if rest.is_empty() || rest.starts_with('/') => Some(rest),
        _ => None,
    }
}
