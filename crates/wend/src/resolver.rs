//! Specifier resolution.
//!
//! Turns a relative specifier plus its containing directory into a concrete
//! file, following Node's file-module rules with one deliberate tightening:
//! a specifier that names an extension gets exactly that file or nothing —
//! an explicit extension never falls back.
//!
//! ```text
//! ./a      -> a, a.js, a.json, a.node, (directory a -> main/index)
//! ./a.js   -> a.js or MODULE_NOT_FOUND
//! ./dir    -> dir/package.json "main" with fallbacks, then dir/index.*
//! ```

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::Deserialize;

use crate::runtime::Runtime;

/// Minimal `package.json` view: directory resolution only consults `main`.
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    main: Option<String>,
}

/// Resolves relative specifiers against a runtime.
#[derive(Debug, Clone)]
pub struct SpecifierResolver {
    extensions: Vec<String>,
}

impl SpecifierResolver {
    /// `extensions` is the ordered fallback list, already validated as a
    /// prefix of the canonical `['.js', '.json', '.node']`.
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Resolve `specifier` from `containing_dir`. Returns `None` when every
    /// attempt fails; the caller surfaces `MODULE_NOT_FOUND`.
    pub async fn resolve(
        &self,
        specifier: &str,
        containing_dir: &Path,
        runtime: &dyn Runtime,
    ) -> Option<PathBuf> {
        let candidate = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier).clean()
        } else {
            containing_dir.join(specifier).clean()
        };

        // An explicit, recognized extension asks for exactly that file.
        if self
            .extensions
            .iter()
            .any(|ext| specifier.ends_with(ext.as_str()))
        {
            return self.is_file(runtime, &candidate).await.then_some(candidate);
        }

        // An extension outside the configured list never falls back either.
        if Path::new(specifier).extension().is_some() {
            return None;
        }

        for path in self.file_fallbacks(&candidate) {
            if self.is_dir(runtime, &path).await {
                if let Some(found) = self.resolve_dir(&path, runtime).await {
                    return Some(found);
                }
            } else if self.is_file(runtime, &path).await {
                return Some(path);
            }
        }
        None
    }

    /// Resolve a directory: `package.json` `main` first (extension fallback
    /// applies), then `index` with the same fallback sequence.
    async fn resolve_dir(&self, dir: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
        let mut stems = Vec::new();
        if let Some(main) = self.package_main(dir, runtime).await {
            stems.push(dir.join(main).clean());
        }
        stems.push(dir.join("index"));

        for stem in stems {
            for path in self.file_fallbacks(&stem) {
                if self.is_file(runtime, &path).await {
                    return Some(path);
                }
            }
        }
        None
    }

    /// The `main` field of `dir/package.json`, if the file exists, parses,
    /// and declares one. Anything else falls through to `index`.
    async fn package_main(&self, dir: &Path, runtime: &dyn Runtime) -> Option<String> {
        let manifest = dir.join("package.json");
        let bytes = runtime.read_file(&manifest).await.ok()?;
        let parsed: PackageJson = serde_json::from_slice(&bytes).ok()?;
        parsed.main.filter(|main| !main.is_empty())
    }

    /// `stem` followed by `stem` + each fallback extension, declared order.
    fn file_fallbacks(&self, stem: &Path) -> Vec<PathBuf> {
        let mut tries = vec![stem.to_path_buf()];
        for ext in &self.extensions {
            tries.push(append_suffix(stem, ext));
        }
        tries
    }

    async fn is_file(&self, runtime: &dyn Runtime, path: &Path) -> bool {
        runtime.exists(path)
            && runtime
                .metadata(path)
                .await
                .is_ok_and(|metadata| metadata.is_file)
    }

    async fn is_dir(&self, runtime: &dyn Runtime, path: &Path) -> bool {
        runtime.exists(path)
            && runtime
                .metadata(path)
                .await
                .is_ok_and(|metadata| metadata.is_dir)
    }
}

/// `append_suffix("/p/a.js", ".json")` is `/p/a.js.json`, not `/p/a.json`:
/// fallbacks append, they never replace.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::{TestRuntime, create_tree};
    use tempfile::TempDir;

    fn resolver() -> SpecifierResolver {
        SpecifierResolver::new(vec![".js".into(), ".json".into(), ".node".into()])
    }

    #[tokio::test]
    async fn fallback_extensions_in_declared_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(&root, &[("foo.json", "{}")]);
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./foo", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("foo.json"));

        // once foo.js exists it wins: .js precedes .json
        create_tree(&root, &[("foo.js", "1")]);
        let resolved = resolver().resolve("./foo", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("foo.js"));
    }

    #[tokio::test]
    async fn explicit_extension_requires_the_exact_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(&root, &[("a.js.js", "1")]);
        let runtime = TestRuntime::new(root.clone());

        // a.js does not exist; a.js.js must not be considered
        assert!(resolver().resolve("./a.js", &root, &runtime).await.is_none());
    }

    #[tokio::test]
    async fn unconfigured_extension_fails_even_when_present() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(&root, &[("foo.node", "\0")]);
        let runtime = TestRuntime::new(root.clone());

        let short = SpecifierResolver::new(vec![".js".into(), ".json".into()]);
        assert!(short.resolve("./foo.node", &root, &runtime).await.is_none());

        // with the full canonical list the same specifier resolves
        let resolved = resolver()
            .resolve("./foo.node", &root, &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, root.join("foo.node"));
    }

    #[tokio::test]
    async fn directory_resolves_through_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(&root, &[("lib/index.js", "1")]);
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./lib", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("lib/index.js"));
    }

    #[tokio::test]
    async fn package_main_beats_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(
            &root,
            &[
                ("pkg/package.json", r#"{ "main": "lib/entry.js" }"#),
                ("pkg/lib/entry.js", "1"),
                ("pkg/index.js", "1"),
            ],
        );
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./pkg", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("pkg/lib/entry.js"));
    }

    #[tokio::test]
    async fn missing_main_falls_back_to_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(
            &root,
            &[
                ("pkg/package.json", r#"{ "main": "gone.js" }"#),
                ("pkg/index.js", "1"),
            ],
        );
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./pkg", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("pkg/index.js"));
    }

    #[tokio::test]
    async fn main_without_extension_uses_fallbacks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(
            &root,
            &[
                ("pkg/package.json", r#"{ "main": "lib/entry" }"#),
                ("pkg/lib/entry.json", "{}"),
            ],
        );
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./pkg", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("pkg/lib/entry.json"));
    }

    #[tokio::test]
    async fn malformed_package_json_is_ignored() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(
            &root,
            &[("pkg/package.json", "not json"), ("pkg/index.js", "1")],
        );
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver().resolve("./pkg", &root, &runtime).await.unwrap();
        assert_eq!(resolved, root.join("pkg/index.js"));
    }

    #[tokio::test]
    async fn exhausted_fallbacks_fail() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let runtime = TestRuntime::new(root.clone());

        assert!(
            resolver()
                .resolve("./missing", &root, &runtime)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn parent_relative_specifiers_resolve() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        create_tree(&root, &[("shared.js", "1"), ("src/unused.js", "1")]);
        let runtime = TestRuntime::new(root.clone());

        let resolved = resolver()
            .resolve("../shared", &root.join("src"), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, root.join("shared.js"));
    }
}
