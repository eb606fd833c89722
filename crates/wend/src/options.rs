//! Walk configuration.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::error::{Result, WalkError};

/// The canonical extension-fallback ordering from Node's file-module rules.
/// A configured list must be a prefix of this one.
pub const EXTS_NODE: [&str; 3] = [".js", ".json", ".node"];

/// Configuration for a [`Walker`](crate::Walker).
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// When false, a detected cycle terminates the walk with
    /// `CYCLIC_DEPENDENCY`; when true it is reported as a warning and the
    /// edge is still recorded.
    pub allow_cyclic: bool,

    /// When false, a dynamic (non-string-literal) reference argument is
    /// fatal; when true such references are silently skipped.
    pub allow_non_literal_require: bool,

    /// When false, a specifier beginning with `/` is fatal
    /// (`NOT_ALLOW_ABSOLUTE_PATH`); when true it is reported as a warning
    /// and the edge is skipped.
    pub allow_absolute_path: bool,

    /// A module requiring itself is never a cycle. When this is false the
    /// walker still records the edge but emits a `SELF_REFERENCE` warning.
    pub allow_self_reference: bool,

    /// Scan comments for `@require(...)` / `@require.resolve(...)` /
    /// `@require.async(...)` annotations in addition to call expressions.
    pub comment_require: bool,

    /// Track `require.resolve(...)` references as `resolve` edges.
    pub require_resolve: bool,

    /// Track `require.async(...)` references as `async` edges.
    pub require_async: bool,

    /// Ordered extension fallbacks; must be a prefix of [`EXTS_NODE`].
    pub extensions: Vec<String>,

    /// Alias table: bare specifier -> rewrite target. Relative targets are
    /// interpreted against [`WalkOptions::cwd`].
    pub aliases: FxHashMap<String, String>,

    /// Project root for alias targets and entry normalization. Falls back
    /// to the runtime's working directory when unset.
    pub cwd: Option<PathBuf>,

    /// Maximum simultaneously in-flight parse tasks.
    pub concurrency: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            allow_cyclic: true,
            allow_non_literal_require: true,
            allow_absolute_path: false,
            allow_self_reference: true,
            comment_require: true,
            require_resolve: true,
            require_async: true,
            extensions: EXTS_NODE.iter().map(|ext| ext.to_string()).collect(),
            aliases: FxHashMap::default(),
            cwd: None,
            concurrency: 100,
        }
    }
}

impl WalkOptions {
    /// Check the option set for construction-time errors.
    ///
    /// The extension list is only configurable as an ordered prefix of the
    /// canonical `['.js', '.json', '.node']`; anything else is rejected
    /// here rather than surfacing as a confusing resolution failure later.
    pub fn validate(&self) -> Result<()> {
        let is_prefix = self
            .extensions
            .iter()
            .enumerate()
            .all(|(index, ext)| EXTS_NODE.get(index) == Some(&ext.as_str()));
        if !is_prefix {
            return Err(WalkError::InvalidConfig(format!(
                "Invalid value of `extensions`: expected a prefix of {EXTS_NODE:?}, got {:?}",
                self.extensions
            )));
        }

        if self.concurrency == 0 {
            return Err(WalkError::InvalidConfig(
                "`concurrency` must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let options = WalkOptions::default();
        assert!(options.allow_cyclic);
        assert!(options.allow_non_literal_require);
        assert!(!options.allow_absolute_path);
        assert_eq!(options.extensions, vec![".js", ".json", ".node"]);
        assert_eq!(options.concurrency, 100);
        options.validate().unwrap();
    }

    #[test]
    fn extension_prefixes_are_accepted() {
        for prefix in [vec![], vec![".js"], vec![".js", ".json"]] {
            let options = WalkOptions {
                extensions: prefix.into_iter().map(String::from).collect(),
                ..WalkOptions::default()
            };
            options.validate().unwrap();
        }
    }

    #[test]
    fn non_prefix_extension_lists_are_rejected() {
        for bad in [vec![".json"], vec![".js", ".node"], vec![".ts"]] {
            let options = WalkOptions {
                extensions: bad.into_iter().map(String::from).collect(),
                ..WalkOptions::default()
            };
            assert!(matches!(
                options.validate(),
                Err(WalkError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let options = WalkOptions {
            concurrency: 0,
            ..WalkOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
