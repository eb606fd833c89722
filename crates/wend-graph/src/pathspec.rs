//! Specifier classification.
//!
//! Pure predicates over raw specifier strings. These deliberately operate on
//! strings, not `Path`s: a specifier comes straight out of a `require()`
//! argument and uses forward slashes on every platform.

use std::path::Path;

use path_clean::clean;

/// True iff normalizing `p` yields `p` itself, ignoring trailing separators.
///
/// `/a/b/` is absolute; `/a/../b` is not (it does not survive
/// normalization), and neither is any relative or bare specifier.
pub fn is_absolute_path(p: &str) -> bool {
    if !Path::new(p).is_absolute() {
        return false;
    }
    let trimmed = p.trim_end_matches('/');
    clean(p) == Path::new(trimmed)
}

/// A foreign id is anything that is not an absolute path: a bare package
/// name such as `lodash` or `some-pkg/sub`.
pub fn is_foreign_id(id: &str) -> bool {
    !is_absolute_path(id)
}

/// True iff `s` is exactly `.`, exactly `..`, or starts with `./` / `../`.
///
/// A bare word like `abc` is NOT relative even though it contains no
/// separator: it names a foreign package.
pub fn is_relative_specifier(s: &str) -> bool {
    s == "." || s == ".." || s.starts_with("./") || s.starts_with("../")
}
