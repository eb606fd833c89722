//! Reference extraction.
//!
//! The walker only needs the contract: given transformed JavaScript text,
//! produce the ordered literal specifiers per reference kind. The built-in
//! [`CommonJsScanner`] is a lexical implementation of that contract — it
//! tokenizes just enough (strings, comments) to find
//! `require`/`require.resolve`/`require.async` call sites and comment
//! annotations without a full parser. An AST-based extractor can be swapped
//! in through the same trait.

use std::path::Path;

use regex::Regex;
use thiserror::Error;
use wend_graph::EdgeKind;

/// Extraction strictness and feature toggles, derived from the walk options.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub comment_require: bool,
    pub require_resolve: bool,
    pub require_async: bool,
    pub allow_non_literal_require: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            comment_require: true,
            require_resolve: true,
            require_async: true,
            allow_non_literal_require: true,
        }
    }
}

/// Ordered literal specifiers found in one file, per reference kind.
/// Duplicates are dropped, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub require: Vec<String>,
    pub resolve: Vec<String>,
    pub deferred: Vec<String>,
}

impl Extraction {
    pub fn by_kind(&self, kind: EdgeKind) -> &[String] {
        match kind {
            EdgeKind::Require => &self.require,
            EdgeKind::Resolve => &self.resolve,
            EdgeKind::Async => &self.deferred,
        }
    }

    fn push_unique(&mut self, kind: EdgeKind, specifier: String) {
        let bucket = match kind {
            EdgeKind::Require => &mut self.require,
            EdgeKind::Resolve => &mut self.resolve,
            EdgeKind::Async => &mut self.deferred,
        };
        if !bucket.contains(&specifier) {
            bucket.push(specifier);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.require.is_empty() && self.resolve.is_empty() && self.deferred.is_empty()
    }
}

/// Extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source could not be lexed/parsed.
    #[error("{message}")]
    Parse { message: String },

    /// Malformed reference call under strict options.
    #[error("{message}")]
    WrongUsage { message: String },
}

/// Collaborator boundary: source text in, specifiers-by-kind out.
pub trait ReferenceExtractor: Send + Sync {
    fn extract(
        &self,
        path: &Path,
        content: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError>;
}

/// Built-in lexical scanner for CommonJS reference expressions.
#[derive(Debug)]
pub struct CommonJsScanner {
    call: Regex,
    comment_require: Regex,
    comment_resolve: Regex,
    comment_async: Regex,
}

impl Default for CommonJsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonJsScanner {
    pub fn new() -> Self {
        // The annotation grammar admits the same character set as the
        // original `@require(...)` convention; backreferences are not
        // available so both quote styles get their own capture.
        const SPEC: &str = r"(?:'([A-Za-z0-9_/.\-]+)'|\x22([A-Za-z0-9_/.\-]+)\x22)";
        Self {
            call: Regex::new(r"\brequire(?:\s*\.\s*(resolve|async))?\s*\(")
                .expect("static pattern"),
            comment_require: Regex::new(&format!(r"@require\s*\(\s*{SPEC}\s*\)"))
                .expect("static pattern"),
            comment_resolve: Regex::new(&format!(r"@require\.resolve\s*\(\s*{SPEC}\s*\)"))
                .expect("static pattern"),
            comment_async: Regex::new(&format!(r"@require\.async\s*\(\s*{SPEC}"))
                .expect("static pattern"),
        }
    }

    fn scan_calls(
        &self,
        code: &str,
        options: &ExtractOptions,
        out: &mut Extraction,
    ) -> Result<(), ExtractError> {
        for captures in self.call.captures_iter(code) {
            let kind = match captures.get(1).map(|m| m.as_str()) {
                None => EdgeKind::Require,
                Some("resolve") if options.require_resolve => EdgeKind::Resolve,
                Some("async") if options.require_async => EdgeKind::Async,
                Some(_) => continue,
            };

            let whole = captures.get(0).expect("match");
            match read_literal_argument(&code[whole.end()..]) {
                Argument::Literal(specifier) => out.push_unique(kind, specifier),
                Argument::NonLiteral | Argument::Empty => {
                    if !options.allow_non_literal_require {
                        let (line, column) = position_of(code, whole.start());
                        return Err(ExtractError::WrongUsage {
                            message: format!(
                                "Line {line}: Column {column}: Method `require` only accepts a string literal."
                            ),
                        });
                    }
                }
                Argument::Unterminated => {
                    let (line, column) = position_of(code, whole.start());
                    return Err(ExtractError::Parse {
                        message: format!(
                            "Line {line}: Column {column}: unterminated string literal in `require`."
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn scan_comments(&self, comments: &[String], options: &ExtractOptions, out: &mut Extraction) {
        for comment in comments {
            for captures in self.comment_require.captures_iter(comment) {
                if let Some(specifier) = annotation_spec(&captures) {
                    out.push_unique(EdgeKind::Require, specifier);
                }
            }
            if options.require_resolve {
                for captures in self.comment_resolve.captures_iter(comment) {
                    if let Some(specifier) = annotation_spec(&captures) {
                        out.push_unique(EdgeKind::Resolve, specifier);
                    }
                }
            }
            if options.require_async {
                for captures in self.comment_async.captures_iter(comment) {
                    if let Some(specifier) = annotation_spec(&captures) {
                        out.push_unique(EdgeKind::Async, specifier);
                    }
                }
            }
        }
    }
}

impl ReferenceExtractor for CommonJsScanner {
    fn extract(
        &self,
        _path: &Path,
        content: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        let (code, comments) = split_comments(content);

        let mut out = Extraction::default();
        self.scan_calls(&code, options, &mut out)?;
        if options.comment_require {
            self.scan_comments(&comments, options, &mut out);
        }
        Ok(out)
    }
}

fn annotation_spec(captures: &regex::Captures<'_>) -> Option<String> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

enum Argument {
    Literal(String),
    NonLiteral,
    Empty,
    Unterminated,
}

/// Read the first argument right after an opening parenthesis.
fn read_literal_argument(rest: &str) -> Argument {
    let trimmed = rest.trim_start();
    let mut chars = trimmed.char_indices();

    match chars.next() {
        Some((_, ')')) => Argument::Empty,
        Some((_, quote @ ('\'' | '"'))) => {
            let mut specifier = String::new();
            let mut escaped = false;
            for (index, c) in chars {
                if escaped {
                    specifier.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    // `require('a' + b)` is not a literal reference
                    let after = trimmed[index + c.len_utf8()..].trim_start();
                    return match after.chars().next() {
                        Some(')' | ',') => Argument::Literal(specifier),
                        _ => Argument::NonLiteral,
                    };
                } else {
                    specifier.push(c);
                }
            }
            Argument::Unterminated
        }
        _ => Argument::NonLiteral,
    }
}

/// 1-based line/column of a byte offset.
fn position_of(code: &str, offset: usize) -> (usize, usize) {
    let before = &code[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(offset, |newline| offset - newline - 1);
    (line, column)
}

/// Blank comments out of the source (preserving offsets) and collect their
/// text for annotation scanning. String literals are honored so `//` inside
/// a string does not start a comment.
fn split_comments(source: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = source.chars().collect();
    let mut code = String::with_capacity(source.len());
    let mut comments = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '/' if chars.get(i + 1) == Some(&'/') => {
                let start = i;
                while i < chars.len() && chars[i] != '\n' {
                    code.push(' ');
                    i += 1;
                }
                comments.push(chars[start..i].iter().collect());
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let start = i;
                code.push_str("  ");
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    code.push(if chars[i] == '\n' { '\n' } else { ' ' });
                    i += 1;
                }
                let end = (i + 2).min(chars.len());
                comments.push(chars[start..end].iter().collect());
                if i < chars.len() {
                    code.push_str("  ");
                    i += 2;
                }
            }
            quote @ ('\'' | '"' | '`') => {
                code.push(quote);
                i += 1;
                let mut escaped = false;
                while i < chars.len() {
                    let s = chars[i];
                    code.push(s);
                    i += 1;
                    if escaped {
                        escaped = false;
                    } else if s == '\\' {
                        escaped = true;
                    } else if s == quote {
                        break;
                    }
                }
            }
            other => {
                code.push(other);
                i += 1;
            }
        }
    }

    (code, comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str) -> Extraction {
        CommonJsScanner::new()
            .extract(Path::new("/p/a.js"), content, &ExtractOptions::default())
            .unwrap()
    }

    fn scan_with(content: &str, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
        CommonJsScanner::new().extract(Path::new("/p/a.js"), content, options)
    }

    #[test]
    fn extracts_require_calls_in_order() {
        let out = scan("var a = require('./a');\nvar b = require(\"b-pkg\");\nrequire('./a');");
        assert_eq!(out.require, vec!["./a", "b-pkg"]);
    }

    #[test]
    fn separates_reference_kinds() {
        let out = scan(
            "require('./a');\nrequire.resolve('./r');\nrequire.async('./lazy');\nrequire . resolve('./r2');",
        );
        assert_eq!(out.require, vec!["./a"]);
        assert_eq!(out.resolve, vec!["./r", "./r2"]);
        assert_eq!(out.deferred, vec!["./lazy"]);
    }

    #[test]
    fn disabled_kinds_are_not_tracked() {
        let options = ExtractOptions {
            require_resolve: false,
            require_async: false,
            ..ExtractOptions::default()
        };
        let out = scan_with("require('./a'); require.resolve('./r'); require.async('./l');", &options)
            .unwrap();
        assert_eq!(out.require, vec!["./a"]);
        assert!(out.resolve.is_empty());
        assert!(out.deferred.is_empty());
    }

    #[test]
    fn other_members_and_lookalike_identifiers_are_ignored() {
        let out = scan("require.cache('./x'); my_require('./y'); requires('./z');");
        assert!(out.is_empty());
    }

    #[test]
    fn calls_inside_comments_are_not_calls() {
        let options = ExtractOptions {
            comment_require: false,
            ..ExtractOptions::default()
        };
        let out = scan_with(
            "// require('./commented')\n/* require('./blocked') */\nrequire('./real');",
            &options,
        )
        .unwrap();
        assert_eq!(out.require, vec!["./real"]);
    }

    #[test]
    fn comment_annotations_are_additive() {
        let out = scan(
            "// @require('./styles.css')\n/* @require.resolve(\"./conf\") @require.async('./lazy' */\nrequire('./a');",
        );
        // call expressions are scanned first, annotations are additive
        assert_eq!(out.require, vec!["./a", "./styles.css"]);
        assert_eq!(out.resolve, vec!["./conf"]);
        assert_eq!(out.deferred, vec!["./lazy"]);
    }

    #[test]
    fn slashes_inside_strings_do_not_open_comments() {
        let out = scan("var url = 'http://x'; require('./a');");
        assert_eq!(out.require, vec!["./a"]);
    }

    #[test]
    fn non_literal_arguments_are_skipped_when_lenient() {
        let out = scan("require(name); require('./pre' + 'fix'); require('./a');");
        assert_eq!(out.require, vec!["./a"]);
    }

    #[test]
    fn non_literal_arguments_fail_when_strict() {
        let options = ExtractOptions {
            allow_non_literal_require: false,
            ..ExtractOptions::default()
        };
        let err = scan_with("require(name);", &options).unwrap_err();
        assert!(matches!(err, ExtractError::WrongUsage { .. }));
        assert!(err.to_string().contains("string literal"));
    }

    #[test]
    fn empty_argument_list_fails_when_strict() {
        let options = ExtractOptions {
            allow_non_literal_require: false,
            ..ExtractOptions::default()
        };
        assert!(matches!(
            scan_with("require();", &options),
            Err(ExtractError::WrongUsage { .. })
        ));
    }

    #[test]
    fn unterminated_literal_is_a_parse_error() {
        let err = scan_with("require('./a", &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn positions_are_one_based() {
        let options = ExtractOptions {
            allow_non_literal_require: false,
            ..ExtractOptions::default()
        };
        let err = scan_with("\n\n  require(name);", &options).unwrap_err();
        assert!(err.to_string().contains("Line 3"));
    }
}
