//! Member-visibility pattern matching.
//!
//! A pattern is either a single glob string, a list of globs (union match),
//! or an arbitrary predicate over names. Matching is a small hand-rolled
//! `*`/`?` matcher rather than a pulled-in glob crate, scanning by
//! character index rather than splitting into substrings.

use std::sync::Arc;

/// A match rule against capability member names.
#[derive(Clone)]
pub enum Pattern {
    /// A single glob string (`*`, `?`, literal segments).
    Glob(String),
    /// Union of globs: matches if any member matches.
    Any(Vec<String>),
    /// Arbitrary predicate over the candidate name.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Pattern {
    /// Build a pattern from a single glob string.
    pub fn glob(s: impl Into<String>) -> Self {
        Pattern::Glob(s.into())
    }

    /// Build a pattern matching everything (`*`).
    pub fn all() -> Self {
        Pattern::Glob("*".to_string())
    }

    /// Build a pattern from a list of globs (union match).
    pub fn any(globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Pattern::Any(globs.into_iter().map(Into::into).collect())
    }

    /// Build a pattern from an arbitrary predicate.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Pattern::Predicate(Arc::new(f))
    }

    /// Whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Glob(g) => glob_match(g, name),
            Pattern::Any(globs) => globs.iter().any(|g| glob_match(g, name)),
            Pattern::Predicate(f) => f(name),
        }
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Glob(g) => write!(f, "Pattern::Glob({g:?})"),
            Pattern::Any(gs) => write!(f, "Pattern::Any({gs:?})"),
            Pattern::Predicate(_) => write!(f, "Pattern::Predicate(<fn>)"),
        }
    }
}

/// Wildcard match: `*` matches any run of characters (including dots, so
/// `Cls.*` matches every member of `Cls`), `?` matches exactly one
/// character, everything else must match literally.
///
/// Standard backtracking two-pointer algorithm over char vectors, scanning
/// by index rather than splitting into substrings.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let c: Vec<char> = candidate.chars().collect();

    let (mut pi, mut ci) = (0usize, 0usize);
    let mut star_idx: Option<usize> = None;
    let mut star_match = 0usize;

    while ci < c.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == c[ci]) {
            pi += 1;
            ci += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star_idx = Some(pi);
            star_match = ci;
            pi += 1;
        } else if let Some(si) = star_idx {
            pi = si + 1;
            star_match += 1;
            ci = star_match;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        assert!(glob_match("foo", "foo"));
        assert!(!glob_match("foo", "bar"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("foo*", "foobar"));
        assert!(glob_match("*bar", "foobar"));
        assert!(glob_match("Vector.*", "Vector.normalize"));
        assert!(!glob_match("Vector.*", "Matrix.normalize"));
    }

    #[test]
    fn question_matches_one_char() {
        assert!(glob_match("f?o", "foo"));
        assert!(!glob_match("f?o", "fooo"));
    }

    #[test]
    fn union_pattern_matches_any_member() {
        let pat = Pattern::any(["sqrt", "pow"]);
        assert!(pat.matches("sqrt"));
        assert!(pat.matches("pow"));
        assert!(!pat.matches("log"));
    }

    #[test]
    fn predicate_pattern() {
        let pat = Pattern::predicate(|n: &str| n.starts_with('_'));
        assert!(pat.matches("_private"));
        assert!(!pat.matches("public"));
    }
}
