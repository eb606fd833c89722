//! Alias rewriting for bare specifiers.
//!
//! A project may map a top-level bare id onto a file of its own tree:
//!
//! ```json
//! { "as": { "abc": "./vendor/abc.js" } }
//! ```
//!
//! `require('abc')` anywhere in the tree then resolves as if the file had
//! written the correct relative path itself. Only top-level ids are mapped
//! and rewriting is single-level: an alias target that is itself aliased is
//! not chased.

use std::path::{Component, Path};

use path_clean::PathClean;
use rustc_hash::FxHashMap;
use wend_graph::pathspec::is_relative_specifier;

/// Rewrite `specifier` through the alias table.
///
/// Returns `None` when no rewrite applies (no table entry, or a relative
/// target without a configured project root — the specifier then passes
/// through unchanged). A non-relative target is returned as-is, remapping
/// one foreign id onto another. A relative target is interpreted against
/// `cwd` and re-expressed relative to the containing file's directory so
/// downstream resolution proceeds exactly as for an ordinary relative
/// specifier.
pub fn solve_alias(
    specifier: &str,
    aliases: &FxHashMap<String, String>,
    cwd: Option<&Path>,
    containing_file: &Path,
) -> Option<String> {
    let target = aliases.get(specifier)?;

    if !is_relative_specifier(target) {
        return Some(target.clone());
    }

    let cwd = cwd?;
    let absolute = cwd.join(target).clean();
    let containing_dir = containing_file.parent().unwrap_or(Path::new("/"));

    let mut relative = relative_to(containing_dir, &absolute);
    if !relative.starts_with('.') {
        relative = format!("./{relative}");
    }
    Some(relative)
}

/// Express `target` relative to `base_dir`, forward-slash separated.
/// Both paths must be absolute and normalized.
fn relative_to(base_dir: &Path, target: &Path) -> String {
    let base: Vec<Component<'_>> = base_dir.components().collect();
    let dest: Vec<Component<'_>> = target.components().collect();

    let common = base
        .iter()
        .zip(dest.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base.len() - common];
    parts.extend(
        dest[common..]
            .iter()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_entry_means_no_rewrite() {
        let table = aliases(&[("abc", "./abc.js")]);
        assert_eq!(
            solve_alias("xyz", &table, Some(Path::new("/proj")), Path::new("/proj/a.js")),
            None
        );
    }

    #[test]
    fn relative_target_is_rebased_onto_the_containing_file() {
        let table = aliases(&[("abc", "./vendor/abc.js")]);
        let rewritten = solve_alias(
            "abc",
            &table,
            Some(Path::new("/proj")),
            Path::new("/proj/src/deep/mod.js"),
        )
        .unwrap();
        assert_eq!(rewritten, "../../vendor/abc.js");
    }

    #[test]
    fn sibling_target_gains_a_dot_prefix() {
        let table = aliases(&[("abc", "./abc.js")]);
        let rewritten = solve_alias(
            "abc",
            &table,
            Some(Path::new("/proj")),
            Path::new("/proj/main.js"),
        )
        .unwrap();
        assert_eq!(rewritten, "./abc.js");
    }

    #[test]
    fn bare_target_remaps_foreign_to_foreign() {
        let table = aliases(&[("abc", "abc-shim")]);
        assert_eq!(
            solve_alias("abc", &table, Some(Path::new("/proj")), Path::new("/proj/a.js")),
            Some("abc-shim".to_string())
        );
    }

    #[test]
    fn relative_target_without_cwd_passes_through() {
        let table = aliases(&[("abc", "./abc.js")]);
        assert_eq!(
            solve_alias("abc", &table, None, Path::new("/proj/a.js")),
            None
        );
    }
}
