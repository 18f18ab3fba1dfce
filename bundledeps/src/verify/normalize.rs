//! Version-agnostic path normalization.
//!
//! A normalized key is a path string with its version-bearing parts replaced
//! by `*`. Rules run in order; later rules assume earlier ones have already
//! collapsed the directory shape.

use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// One declarative rewrite: every match of `pattern` is replaced with
/// `replacement` (`${n}` refers to capture groups).
///
/// # Examples
///
/// ```
/// use bundledeps::verify::RewriteRule;
///
/// let rule = RewriteRule::new("cellar-version", r"(/Cellar/[^/]+)/[^/]+(/.*)?$", "${1}/*${2}").unwrap();
/// assert_eq!(rule.apply("/r/Cellar/qemu/9.0.2/bin/qemu-img"), "/r/Cellar/qemu/*/bin/qemu-img");
/// ```
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compiles a rule.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if `pattern` is not a valid regex.
    pub fn new(name: impl Into<String>, pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Short identifier of the rule.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the rule to `input`.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.name, self.pattern, self.replacement)
    }
}

/// Ordered list of [`RewriteRule`]s.
///
/// # Examples
///
/// ```
/// use bundledeps::verify::Normalizer;
/// use std::path::Path;
///
/// let normalizer = Normalizer::for_root(Path::new("/opt/homebrew")).unwrap();
/// assert_eq!(
///     normalizer.normalize(Path::new("/opt/homebrew/opt/icu4c@76")),
///     "/opt/homebrew/opt/icu4c@*"
/// );
/// assert_eq!(
///     normalizer.normalize(Path::new("/opt/homebrew/Cellar/glib/2.82.4/lib/libglib-2.0.0.dylib")),
///     "/opt/homebrew/Cellar/glib/*/lib/libglib-2.0.*.dylib"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<RewriteRule>,
}

impl Normalizer {
    /// Builds a normalizer from explicit rules.
    #[must_use]
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// The standard rule list for an installation root.
    ///
    /// # Errors
    ///
    /// Returns an error only if a rule fails to compile.
    pub fn for_root(root: &Path) -> Result<Self> {
        let root = regex::escape(&root.to_string_lossy());
        let dylib = RewriteRule::new(
            "dylib-version",
            r"/lib([^/]+)\.(\d+(?:\.\d+)*)(\.dylib)$",
            "/lib${1}.*${3}",
        )?;
        Ok(Self::new(vec![
            RewriteRule::new(
                "opt-version",
                &format!(r"({root}/opt/[^@]+@)\d+(\.\d+)*$"),
                "${1}*",
            )?,
            RewriteRule::new(
                "cellar-version",
                r"(/Cellar/[^/]+)/[^/]+(/.*)?$",
                "${1}/*${2}",
            )?,
            dylib.clone(),
            dylib,
        ]))
    }

    /// The rules, in application order.
    #[must_use]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Normalizes a path string.
    #[must_use]
    pub fn normalize_str(&self, path: &str) -> String {
        self.rules
            .iter()
            .fold(path.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// Normalizes a path.
    #[must_use]
    pub fn normalize(&self, path: &Path) -> String {
        self.normalize_str(&path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::for_root(Path::new("/root")).unwrap()
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = normalizer().rules().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["opt-version", "cellar-version", "dylib-version", "dylib-version"]
        );
    }

    #[test]
    fn test_opt_version_rule() {
        let binding = normalizer();
        let rule = &binding.rules()[0];
        assert_eq!(rule.apply("/root/opt/foo@3"), "/root/opt/foo@*");
        assert_eq!(rule.apply("/root/opt/python@3.12"), "/root/opt/python@*");
        // Only the final component is versioned.
        assert_eq!(rule.apply("/root/opt/foo@3/lib"), "/root/opt/foo@3/lib");
        // Anchored to this root.
        assert_eq!(rule.apply("/other/opt/foo@3"), "/other/opt/foo@3");
    }

    #[test]
    fn test_root_is_escaped() {
        let normalizer = Normalizer::for_root(Path::new("/a.b")).unwrap();
        assert_eq!(normalizer.normalize_str("/a.b/opt/x@1"), "/a.b/opt/x@*");
        assert_eq!(normalizer.normalize_str("/axb/opt/x@1"), "/axb/opt/x@1");
    }

    #[test]
    fn test_cellar_rule() {
        let binding = normalizer();
        let rule = &binding.rules()[1];
        assert_eq!(rule.apply("/root/Cellar/qemu/9.0.2"), "/root/Cellar/qemu/*");
        assert_eq!(
            rule.apply("/root/Cellar/qemu/9.0.2/share/qemu"),
            "/root/Cellar/qemu/*/share/qemu"
        );
        assert_eq!(rule.apply("/root/Cellar/qemu"), "/root/Cellar/qemu");
    }

    #[test]
    fn test_dylib_rule() {
        let binding = normalizer();
        let rule = &binding.rules()[2];
        assert_eq!(rule.apply("/root/lib/libssl.3.dylib"), "/root/lib/libssl.*.dylib");
        assert_eq!(rule.apply("/root/lib/libssl.dylib"), "/root/lib/libssl.dylib");
        assert_eq!(rule.apply("/root/lib/libssl.3.so"), "/root/lib/libssl.3.so");
    }

    #[test]
    fn test_full_pipeline() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Path::new("/root/Cellar/zstd/1.5.6/lib/libzstd.1.dylib")),
            "/root/Cellar/zstd/*/lib/libzstd.*.dylib"
        );
        assert_eq!(n.normalize(Path::new("/root/bin/tool")), "/root/bin/tool");
    }

    #[test]
    fn test_idempotent_on_examples() {
        let n = normalizer();
        for path in [
            "/root/opt/foo@3",
            "/root/Cellar/glib/2.82.4/lib/libglib-2.0.0.dylib",
            "/root/lib/libpixman-1.0.42.2.dylib",
            "/root/share/qemu",
        ] {
            let once = n.normalize_str(path);
            assert_eq!(n.normalize_str(&once), once, "{path}");
        }
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RewriteRule::new("bad", "(", "x").is_err());
    }
}
