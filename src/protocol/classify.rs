//! URL classification
//!
//! Decides whether a request belongs to the static file layers at all. Import
//! requests (module-system metadata, marked by a query flag) and internal
//! requests (reserved client/runtime paths) are always left to other handlers.

use std::path::Path;

use regex::Regex;

use crate::storage::validation::clean_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not for this layer; hand the request to the next handler.
    Skip,
    Eligible,
}

#[derive(Debug, Clone)]
pub struct UrlClassifier {
    import_query: Regex,
    internal_prefixes: Vec<String>,
}

impl UrlClassifier {
    /// `import_marker` is the query flag (`?import`, `&import=`) tagging
    /// module imports; `internal_prefixes` are the reserved URL prefixes.
    pub fn new(import_marker: &str, internal_prefixes: Vec<String>) -> Result<Self, regex::Error> {
        let import_query = Regex::new(&format!(
            r"(?:\?|&){}=?(?:&|$)",
            regex::escape(import_marker)
        ))?;
        Ok(Self {
            import_query,
            internal_prefixes,
        })
    }

    pub fn is_import_request(&self, url: &str) -> bool {
        self.import_query.is_match(url)
    }

    pub fn is_internal_request(&self, url: &str) -> bool {
        self.internal_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }

    /// Import and internal requests are skipped, everything else is eligible.
    pub fn classify(&self, url: &str) -> Classification {
        if self.is_import_request(url) || self.is_internal_request(url) {
            Classification::Skip
        } else {
            Classification::Eligible
        }
    }

    /// Classification for the project-root static layer. On top of
    /// [`classify`](Self::classify), directory URLs and `.html` files are
    /// skipped so the HTML layer further down can serve them.
    pub fn classify_static(&self, url: &str) -> Classification {
        if self.classify(url) == Classification::Skip {
            return Classification::Skip;
        }

        let cleaned = clean_url(url);
        let is_html = Path::new(cleaned)
            .extension()
            .is_some_and(|ext| ext == "html");
        if cleaned.ends_with('/') || is_html {
            Classification::Skip
        } else {
            Classification::Eligible
        }
    }
}
