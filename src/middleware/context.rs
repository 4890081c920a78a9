//! Per-request path state for the static layer

use std::path::Path;

use crate::storage::AliasTable;
use crate::storage::validation::{
    collapse_leading_slashes, decode_url_path, encode_url_path, resolve_path, split_query,
};

/// Everything the static layer derives from one request URL.
///
/// Built fresh for each request and dropped once the request is served or
/// passed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub raw_url: String,
    pub decoded_url: String,
    /// Set when an alias rule rewrote `decoded_url`.
    pub resolved_alias_url: Option<String>,
    /// Absolute, normalized path the request maps to.
    pub file_path: String,
    pub is_directory_request: bool,
    suffix: String,
}

impl RequestContext {
    /// `None` if the URL path is not valid percent-encoded UTF-8.
    pub fn build(raw_url: &str, aliases: &AliasTable, root: &Path) -> Option<Self> {
        let (path, suffix) = split_query(raw_url);
        let decoded_url = collapse_leading_slashes(&decode_url_path(path)?);
        let resolved_alias_url = aliases.resolve(&decoded_url);

        let effective = resolved_alias_url.as_deref().unwrap_or(&decoded_url);
        let file_path = resolve_path(effective, root);
        let is_directory_request = effective.ends_with('/');

        Some(Self {
            raw_url: raw_url.to_string(),
            file_path,
            is_directory_request,
            suffix: suffix.to_string(),
            resolved_alias_url,
            decoded_url,
        })
    }

    /// The URL path used for resolution: the alias target if one matched.
    pub fn effective_url(&self) -> &str {
        self.resolved_alias_url.as_deref().unwrap_or(&self.decoded_url)
    }

    /// The re-encoded effective URL with query and hash kept. Resolving it
    /// again lands on `file_path`.
    pub fn request_url(&self) -> String {
        format!("{}{}", encode_url_path(self.effective_url()), self.suffix)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::storage::AliasRule;

    fn table() -> AliasTable {
        AliasTable::new(
            vec![AliasRule::prefix("/@assets/", "/src/assets/")],
            "/srv/app",
        )
    }

    #[test]
    fn test_plain_url() {
        let ctx = RequestContext::build("/src/main.ts?t=1", &table(), Path::new("/srv/app")).unwrap();
        assert_eq!(ctx.decoded_url, "/src/main.ts");
        assert_eq!(ctx.resolved_alias_url, None);
        assert_eq!(ctx.file_path, "/srv/app/src/main.ts");
        assert!(!ctx.is_directory_request);
        assert_eq!(ctx.request_url(), "/src/main.ts?t=1");
    }

    #[test]
    fn test_alias_rewrite_keeps_query() {
        let ctx = RequestContext::build("/@assets/my%20logo.png?v=3", &table(), Path::new("/srv/app"))
            .unwrap();
        assert_eq!(ctx.effective_url(), "/src/assets/my logo.png");
        assert_eq!(ctx.file_path, "/srv/app/src/assets/my logo.png");
        assert_eq!(ctx.request_url(), "/src/assets/my%20logo.png?v=3");
    }

    #[test]
    fn test_double_slash_stays_inside_root() {
        let ctx = RequestContext::build("//etc/passwd", &table(), Path::new("/srv/app")).unwrap();
        assert_eq!(ctx.file_path, "/srv/app/etc/passwd");
        assert_eq!(ctx.request_url(), "/etc/passwd");
    }

    #[test]
    fn test_encoded_slash_collapsed_after_decoding() {
        let ctx = RequestContext::build("/%2Fsrv/app/secret.txt?x", &table(), Path::new("/srv/app"))
            .unwrap();
        assert_eq!(ctx.decoded_url, "/srv/app/secret.txt");
        assert_eq!(ctx.file_path, "/srv/app/srv/app/secret.txt");
        assert_eq!(ctx.request_url(), "/srv/app/secret.txt?x");
    }

    #[test]
    fn test_undecodable_url() {
        assert_eq!(RequestContext::build("/%C3%28", &table(), Path::new("/srv/app")), None);
    }
}
