//! Path aliases
//!
//! An ordered list of URL rewrite rules. Rules are tried in the order they
//! were configured and the first match wins; later rules are never consulted
//! once one has matched, and the table is never reordered.

use regex::Regex;

use crate::storage::validation::normalize_path;

/// What an alias rule matches against.
#[derive(Debug, Clone)]
pub enum AliasFind {
    /// Matches URLs starting with the string.
    Prefix(String),
    /// Matches URLs the expression finds a match in.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct AliasRule {
    pub find: AliasFind,
    pub replacement: String,
}

impl AliasRule {
    pub fn prefix(find: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            find: AliasFind::Prefix(find.into()),
            replacement: replacement.into(),
        }
    }

    /// Pattern rule. `$1`/`${name}` in the replacement expand capture groups.
    pub fn pattern(find: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            find: AliasFind::Pattern(Regex::new(find)?),
            replacement: replacement.into(),
        })
    }

    /// Rewrite `url` if this rule matches, replacing the first matched portion.
    pub fn apply(&self, url: &str) -> Option<String> {
        match &self.find {
            AliasFind::Prefix(prefix) => url
                .strip_prefix(prefix.as_str())
                .map(|rest| format!("{}{}", self.replacement, rest)),
            AliasFind::Pattern(re) => re
                .is_match(url)
                .then(|| re.replace(url, self.replacement.as_str()).into_owned()),
        }
    }
}

/// Ordered alias rules plus the serving root they rewrite into.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
    root: String,
}

impl AliasTable {
    /// `root` is the serving root; rewrites that land on `<root>/...` have the
    /// root removed again so the result stays a URL path.
    pub fn new(rules: Vec<AliasRule>, root: &str) -> Self {
        Self {
            rules,
            root: normalize_path(root).trim_end_matches('/').to_string(),
        }
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Rewrite a decoded URL with the first matching rule.
    ///
    /// Returns `None` when no rule matches; the URL is then used unchanged.
    pub fn resolve(&self, url: &str) -> Option<String> {
        let rewritten = self.rules.iter().find_map(|rule| rule.apply(url))?;
        Some(self.strip_root(rewritten))
    }

    fn strip_root(&self, rewritten: String) -> String {
        if self.root.is_empty() {
            return rewritten;
        }
        match rewritten.strip_prefix(self.root.as_str()) {
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => rewritten,
        }
    }
}
