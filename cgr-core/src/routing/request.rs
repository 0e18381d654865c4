//! Change context - the input to routing

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::context::normalize_path;

/// Identifiers that look like a function name in a hunk header but are not
const C_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "return", "sizeof", "goto", "typeof",
];

/// The paths and symbols describing one code change
///
/// Sets are ordered so that every traversal, and therefore every routing
/// decision, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChangeContextInput")]
pub struct ChangeContext {
    paths: BTreeSet<String>,
    symbols: BTreeSet<String>,
    explicit_requests: BTreeSet<String>,
}

/// Wire form; `paths` and `symbols` are required (may be empty, never absent)
#[derive(Deserialize)]
struct ChangeContextInput {
    paths: Vec<String>,
    symbols: Vec<String>,
    #[serde(default)]
    explicit_requests: Vec<String>,
}

impl From<ChangeContextInput> for ChangeContext {
    fn from(input: ChangeContextInput) -> Self {
        ChangeContext::new()
            .with_paths(input.paths)
            .with_symbols(input.symbols)
            .with_requests(input.explicit_requests)
    }
}

impl ChangeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a touched path; leading `./` and `/` are stripped, blanks ignored
    pub fn add_path(&mut self, path: &str) {
        let path = normalize_path(path);
        if !path.is_empty() {
            self.paths.insert(path.to_string());
        }
    }

    pub fn add_symbol(&mut self, symbol: &str) {
        let symbol = symbol.trim();
        if !symbol.is_empty() {
            self.symbols.insert(symbol.to_string());
        }
    }

    /// Opt in to an `on_request` rule
    pub fn add_request(&mut self, rule_id: &str) {
        let rule_id = rule_id.trim();
        if !rule_id.is_empty() {
            self.explicit_requests.insert(rule_id.to_string());
        }
    }

    pub fn with_path(mut self, path: impl AsRef<str>) -> Self {
        self.add_path(path.as_ref());
        self
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.add_path(path.as_ref());
        }
        self
    }

    pub fn with_symbol(mut self, symbol: impl AsRef<str>) -> Self {
        self.add_symbol(symbol.as_ref());
        self
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for symbol in symbols {
            self.add_symbol(symbol.as_ref());
        }
        self
    }

    pub fn with_request(mut self, rule_id: impl AsRef<str>) -> Self {
        self.add_request(rule_id.as_ref());
        self
    }

    pub fn with_requests<I, S>(mut self, rule_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for rule_id in rule_ids {
            self.add_request(rule_id.as_ref());
        }
        self
    }

    /// Touched paths, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Observed symbols, sorted
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Explicitly requested rule ids, sorted
    pub fn explicit_requests(&self) -> impl Iterator<Item = &str> {
        self.explicit_requests.iter().map(String::as_str)
    }

    pub fn is_requested(&self, rule_id: &str) -> bool {
        self.explicit_requests.contains(rule_id)
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn request_count(&self) -> usize {
        self.explicit_requests.len()
    }

    /// No paths, no symbols and no requests
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.symbols.is_empty() && self.explicit_requests.is_empty()
    }

    /// Build a context from a unified diff (`git show` / `git diff` output)
    ///
    /// Collects both sides of every `diff --git` header (and `---`/`+++`
    /// headers for plain diffs, skipping `/dev/null`), plus the function
    /// named in each hunk header's trailing context. Hunk bodies are not
    /// inspected.
    pub fn from_unified_diff(diff: &str) -> Self {
        let mut context = Self::new();
        let mut old_remaining = 0usize;
        let mut new_remaining = 0usize;

        for line in diff.lines() {
            let in_hunk = old_remaining > 0 || new_remaining > 0;

            if in_hunk {
                match line.as_bytes().first().copied() {
                    Some(b'+') => new_remaining = new_remaining.saturating_sub(1),
                    Some(b'-') => old_remaining = old_remaining.saturating_sub(1),
                    Some(b'\\') => {}
                    _ => {
                        old_remaining = old_remaining.saturating_sub(1);
                        new_remaining = new_remaining.saturating_sub(1);
                    }
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("diff --git ") {
                if let Some((old, new)) = split_git_header(rest) {
                    context.add_path(old);
                    context.add_path(new);
                }
            } else if let Some(path) = line
                .strip_prefix("--- ")
                .or_else(|| line.strip_prefix("+++ "))
            {
                let path = path.split('\t').next().unwrap_or(path).trim();
                if path != "/dev/null" {
                    context.add_path(strip_side_prefix(path));
                }
            } else if line.starts_with("@@ ") {
                if let Some((old, new)) = hunk_line_counts(line) {
                    old_remaining = old;
                    new_remaining = new;
                }
                if let Some(function) = function_from_hunk_header(line) {
                    context.add_symbol(function);
                }
            }
        }

        context
    }
}

/// `a/old/path b/new/path` → (`old/path`, `new/path`)
fn split_git_header(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.strip_prefix("a/")?;
    let split = rest.find(" b/")?;
    Some((&rest[..split], &rest[split + 3..]))
}

fn strip_side_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

/// `@@ -12,5 +12,7 @@ ...` → (5, 7); a missing count means 1
fn hunk_line_counts(header: &str) -> Option<(usize, usize)> {
    let mut ranges = header.strip_prefix("@@ ")?.split_whitespace();
    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;

    let count = |range: &str| -> Option<usize> {
        match range.split_once(',') {
            Some((_, count)) => count.parse().ok(),
            None => Some(1),
        }
    };

    Some((count(old)?, count(new)?))
}

/// The function named in a hunk header's trailing context, if any
///
/// `@@ -10,6 +10,8 @@ static int foo_init(struct foo *f)` → `foo_init`
pub(crate) fn function_from_hunk_header(header: &str) -> Option<&str> {
    let mut parts = header.splitn(3, "@@");
    parts.next()?;
    parts.next()?;
    let function_context = parts.next()?.trim();

    let paren = function_context.find('(')?;
    if paren == 0 {
        return None;
    }

    let name = function_context[..paren]
        .split_whitespace()
        .last()?
        .trim_start_matches('*');

    let is_identifier = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if is_identifier && !C_KEYWORDS.contains(&name) {
        Some(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIFF: &str = "\
commit 0123456789abcdef
Author: Dev <dev@example.com>

    locking: fix lock ordering

diff --git a/kernel/locking/mutex.c b/kernel/locking/mutex.c
index 1111111..2222222 100644
--- a/kernel/locking/mutex.c
+++ b/kernel/locking/mutex.c
@@ -100,6 +100,6 @@ static int __mutex_lock_common(struct mutex *lock, long state)
 \tint ret;
-\told();
+\tnew();
+\tnewer();
 \tif (ret)
 \t\treturn ret;
 \treturn 0;
--- removed comment line that looks like a header
@@ -200,2 +201,2 @@ void mutex_unlock(struct mutex *lock)
 {
-\tunlock_old(lock);
+\tunlock_new(lock);
diff --git a/mm/old_name.c b/mm/new_name.c
similarity index 90%
rename from mm/old_name.c
rename to mm/new_name.c
";

    #[test]
    fn test_normalization() {
        let ctx = ChangeContext::new()
            .with_path("./net/core/dev.c")
            .with_path("/mm/slub.c")
            .with_path("   ")
            .with_symbol("  kfree ")
            .with_symbol("");

        let paths: Vec<&str> = ctx.paths().collect();
        assert_eq!(paths, vec!["mm/slub.c", "net/core/dev.c"]);
        let symbols: Vec<&str> = ctx.symbols().collect();
        assert_eq!(symbols, vec!["kfree"]);
    }

    #[test]
    fn test_deserialize_requires_paths_and_symbols() {
        let ctx: ChangeContext =
            serde_json::from_str(r#"{"paths": [], "symbols": ["mutex_lock"]}"#).unwrap();
        assert_eq!(ctx.symbol_count(), 1);
        assert_eq!(ctx.request_count(), 0);

        assert!(serde_json::from_str::<ChangeContext>(r#"{"symbols": []}"#).is_err());
        assert!(serde_json::from_str::<ChangeContext>(r#"{"paths": null, "symbols": []}"#).is_err());
    }

    #[test]
    fn test_serialize_roundtrip_keeps_requests() {
        let ctx = ChangeContext::new()
            .with_path("kernel/bpf/verifier.c")
            .with_request("bpf-verifier");
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: ChangeContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ctx);
        assert!(parsed.is_requested("bpf-verifier"));
    }

    #[test]
    fn test_function_from_hunk_header() {
        assert_eq!(
            function_from_hunk_header("@@ -1,3 +1,4 @@ static int foo_init(struct foo *f)"),
            Some("foo_init")
        );
        assert_eq!(
            function_from_hunk_header("@@ -1 +1 @@ struct page *alloc_pages(gfp_t gfp)"),
            Some("alloc_pages")
        );
        assert_eq!(function_from_hunk_header("@@ -1,3 +1,4 @@"), None);
        assert_eq!(function_from_hunk_header("@@ -1,3 +1,4 @@ struct foo {"), None);
        assert_eq!(function_from_hunk_header("@@ -1,3 +1,4 @@ if (x)"), None);
    }

    #[test]
    fn test_from_unified_diff() {
        let ctx = ChangeContext::from_unified_diff(SAMPLE_DIFF);

        let paths: Vec<&str> = ctx.paths().collect();
        assert_eq!(
            paths,
            vec!["kernel/locking/mutex.c", "mm/new_name.c", "mm/old_name.c"]
        );

        let symbols: Vec<&str> = ctx.symbols().collect();
        assert_eq!(symbols, vec!["__mutex_lock_common", "mutex_unlock"]);
    }

    #[test]
    fn test_from_plain_diff_skips_dev_null() {
        let diff = "\
--- /dev/null
+++ b/fs/btrfs/new.c\t2024-01-01 00:00:00
@@ -0,0 +1,2 @@
+int a;
+int b;
--- a/fs/inode.c
+++ b/fs/inode.c
@@ -5,1 +5,1 @@ void iput(struct inode *inode)
-old
+new
";
        let ctx = ChangeContext::from_unified_diff(diff);
        let paths: Vec<&str> = ctx.paths().collect();
        assert_eq!(paths, vec!["fs/btrfs/new.c", "fs/inode.c"]);
        let symbols: Vec<&str> = ctx.symbols().collect();
        assert_eq!(symbols, vec!["iput"]);
    }
}
