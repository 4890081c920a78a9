//! File permissions
//!
//! Decides whether a resolved path may be served. The answer is only ever a
//! boolean: callers that get "restricted" pass the request on to the next
//! handler, which ends in the same 404 a missing file gets. A client can
//! therefore not tell a blocked file from one that does not exist.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};

use crate::safe_paths::SafeModulePaths;
use crate::storage::validation::{
    clean_url, collapse_dot_segments, ensure_leading_slash, is_within, normalize_dir,
    normalize_path,
};
use crate::utils::WarnOnce;

/// How the allow list is applied.
///
/// Configured as `fs.strict = true | false | "disabled"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictMode {
    /// `true`: files outside the allow list are not served.
    #[default]
    Enforce,
    /// `false`: files outside the allow list are served with a one-time warning.
    Soft,
    /// `"disabled"`: no checks at all.
    Disabled,
}

impl<'de> Deserialize<'de> for StrictMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StrictVisitor;

        impl Visitor<'_> for StrictVisitor {
            type Value = StrictMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("true, false or \"disabled\"")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<StrictMode, E> {
                Ok(if v { StrictMode::Enforce } else { StrictMode::Soft })
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StrictMode, E> {
                match v.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(StrictMode::Enforce),
                    "false" => Ok(StrictMode::Soft),
                    "disabled" => Ok(StrictMode::Disabled),
                    _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(StrictVisitor)
    }
}

/// Strict mode plus the ordered list of directories files may be served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingPolicy {
    strict: StrictMode,
    allow: Vec<String>,
}

impl ServingPolicy {
    pub fn new<I, P>(strict: StrictMode, allow: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            strict,
            allow: allow.into_iter().map(|dir| normalize_dir(dir.as_ref())).collect(),
        }
    }

    pub fn strict(&self) -> StrictMode {
        self.strict
    }

    /// Allow-listed directories, slash-style, without trailing slashes.
    pub fn allow_list(&self) -> &[String] {
        &self.allow
    }

    /// Whether `file` is one of the allow-listed directories or inside one.
    pub fn allows(&self, file: &str) -> bool {
        self.allow.iter().any(|dir| is_within(file, dir))
    }
}

fn soft_strict_message(url: &str) -> String {
    format!(
        "Unrestricted file system access to \"{url}\". Files outside of the serving allow \
         list will stop being served once fs.strict is enabled."
    )
}

fn restricted_message(url: &str, allow: &[String]) -> String {
    let dirs = allow
        .iter()
        .map(|dir| format!("- {dir}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "The request url \"{url}\" is outside of the serving allow list:\n\n{dirs}\n\n\
         Add the directory to fs.allow to serve it."
    )
}

/// Any stat failure, permission errors included, counts as missing.
fn path_exists(file: &str) -> bool {
    fs::metadata(file).is_ok()
}

/// Whether serving `url` (an absolute filesystem path, possibly carrying a
/// query or hash) must be refused.
///
/// Checks run in order and stop at the first that decides:
/// strict mode disabled, path missing on disk, path known to the module graph,
/// path inside the allow list, soft strict mode. Only an existing file that
/// passes none of them is restricted.
pub fn is_restricted(
    url: &str,
    policy: &ServingPolicy,
    safe_paths: &dyn SafeModulePaths,
    warnings: &WarnOnce,
) -> bool {
    if policy.strict == StrictMode::Disabled {
        return false;
    }

    let file = collapse_dot_segments(&ensure_leading_slash(&normalize_path(clean_url(url))));

    if !path_exists(&file) {
        debug!("{} does not exist, leaving it to the next handler", file);
        return false;
    }

    if safe_paths.has(&file) {
        return false;
    }

    if policy.allows(&file) {
        return false;
    }

    if policy.strict == StrictMode::Soft {
        warnings.warn_once(&soft_strict_message(url));
        return false;
    }

    warnings.warn_once(&restricted_message(url, &policy.allow));
    true
}

/// [`is_restricted`] bound to the server's policy, safe path set and warnings.
#[derive(Clone)]
pub struct AccessGuard {
    policy: Arc<ServingPolicy>,
    safe_paths: Arc<dyn SafeModulePaths>,
    warnings: Arc<WarnOnce>,
}

impl AccessGuard {
    pub fn new(
        policy: Arc<ServingPolicy>,
        safe_paths: Arc<dyn SafeModulePaths>,
        warnings: Arc<WarnOnce>,
    ) -> Self {
        Self {
            policy,
            safe_paths,
            warnings,
        }
    }

    pub fn is_restricted(&self, url: &str) -> bool {
        is_restricted(url, &self.policy, self.safe_paths.as_ref(), &self.warnings)
    }

}

impl fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::{self, File};
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        project: String,
        outside: String,
    }

    /// <tmp>/project/src/main.ts and <tmp>/secrets/.env
    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        let secrets = tmp.path().join("secrets");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::create_dir_all(&secrets).unwrap();
        File::create(project.join("src/main.ts")).unwrap();
        File::create(secrets.join(".env")).unwrap();

        Fixture {
            project: normalize_dir(&project),
            outside: format!("{}/.env", normalize_dir(&secrets)),
            _tmp: tmp,
        }
    }

    fn check(url: &str, policy: &ServingPolicy, safe: &HashSet<String>, warnings: &WarnOnce) -> bool {
        is_restricted(url, policy, safe, warnings)
    }

    #[test]
    fn test_disabled_never_restricts() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Disabled, Vec::<&str>::new());
        assert!(!check(&fx.outside, &policy, &HashSet::new(), &warnings));
        assert!(warnings.emitted().is_empty());
    }

    #[test]
    fn test_missing_file_not_restricted() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&fx.project]);
        let missing = format!("{}/nope.txt", fx.outside);
        assert!(!check(&missing, &policy, &HashSet::new(), &warnings));
        assert!(warnings.emitted().is_empty());
    }

    #[test]
    fn test_allow_list_descendant_served() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&fx.project]);
        let main = format!("{}/src/main.ts", fx.project);
        assert!(!check(&main, &policy, &HashSet::new(), &warnings));
        assert!(!check(&format!("{main}?t=123"), &policy, &HashSet::new(), &warnings));
        assert!(!check(&fx.project, &policy, &HashSet::new(), &warnings));
    }

    #[test]
    fn test_safe_path_outside_allow_list_served() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&fx.project]);
        let safe: HashSet<String> = [fx.outside.clone()].into_iter().collect();
        assert!(!check(&fx.outside, &policy, &safe, &warnings));
    }

    #[test]
    fn test_outside_allow_list_restricted_and_warned_once() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&fx.project]);

        assert!(check(&fx.outside, &policy, &HashSet::new(), &warnings));
        assert!(check(&fx.outside, &policy, &HashSet::new(), &warnings));

        let emitted = warnings.emitted();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].contains(&fx.outside));
        assert!(emitted[0].contains(&format!("- {}", fx.project)));
    }

    #[test]
    fn test_sibling_directory_prefix_is_not_inside() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        // "<tmp>/secre" is a string prefix of "<tmp>/secrets/.env" but not a parent
        let sibling = fx.outside.trim_end_matches("ts/.env").to_string();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&sibling]);
        assert!(check(&fx.outside, &policy, &HashSet::new(), &warnings));
    }

    #[test]
    fn test_dot_segments_collapsed_before_allow_check() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Enforce, [&fx.project]);
        let escaped = format!("{}/../secrets/.env", fx.project);
        assert!(check(&escaped, &policy, &HashSet::new(), &warnings));
        assert!(warnings.emitted()[0].contains(&escaped));
    }

    #[test]
    fn test_soft_mode_warns_but_serves() {
        let fx = fixture();
        let warnings = WarnOnce::new();
        let policy = ServingPolicy::new(StrictMode::Soft, [&fx.project]);

        assert!(!check(&fx.outside, &policy, &HashSet::new(), &warnings));
        assert!(!check(&fx.outside, &policy, &HashSet::new(), &warnings));

        let emitted = warnings.emitted();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].starts_with("Unrestricted file system access"));
    }

    #[test]
    fn test_guard_shares_warnings() {
        let fx = fixture();
        let warnings = Arc::new(WarnOnce::new());
        let guard = AccessGuard::new(
            Arc::new(ServingPolicy::new(StrictMode::Enforce, [&fx.project])),
            Arc::new(HashSet::<String>::new()),
            Arc::clone(&warnings),
        );
        assert!(guard.is_restricted(&fx.outside));
        assert_eq!(warnings.emitted().len(), 1);
    }

    #[test]
    fn test_strict_mode_deserializes_all_forms() {
        use serde::de::IntoDeserializer;
        use serde::de::value::Error;

        let from_bool =
            |v: bool| StrictMode::deserialize(IntoDeserializer::<Error>::into_deserializer(v));
        let from_str =
            |v: &str| StrictMode::deserialize(IntoDeserializer::<Error>::into_deserializer(v));

        assert_eq!(from_bool(true).unwrap(), StrictMode::Enforce);
        assert_eq!(from_bool(false).unwrap(), StrictMode::Soft);
        assert_eq!(from_str("disabled").unwrap(), StrictMode::Disabled);
        assert_eq!(from_str("TRUE").unwrap(), StrictMode::Enforce);
        assert!(from_str("sometimes").is_err());
    }
}
