//! Raw filesystem middleware
//!
//! URLs under the reserved prefix (`/@fs/` by default) address files by their
//! absolute path on disk instead of relative to the serving root. They go
//! through the same access guard as project files.

use std::path::Path;

use log::debug;

use crate::middleware::{Middleware, Next};
use crate::protocol::{Request, Response};
use crate::storage::AccessGuard;
use crate::storage::validation::{decode_url_path, encode_url_path, resolve_path, split_query};
use crate::transfer::FileTransfer;

/// Drop a leading `X:` drive designator, leaving a drive-root-relative path.
pub fn strip_drive_designator(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &path[2..]
    } else {
        path
    }
}

/// Filesystem path addressed by a decoded raw URL path (`/@fs/home/me/a.ts`).
///
/// `None` if `path` does not start with `prefix`.
pub fn fs_path_from_url(path: &str, prefix: &str, drive_letter_paths: bool) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    let rest = if drive_letter_paths {
        strip_drive_designator(rest)
    } else {
        rest
    };
    Some(resolve_path(&format!("/{}", rest.trim_start_matches('/')), Path::new("/")))
}

pub struct RawFsGateway {
    prefix: String,
    drive_letter_paths: bool,
    guard: AccessGuard,
    transfer: Box<dyn FileTransfer>,
}

impl RawFsGateway {
    /// `transfer` must be rooted at the filesystem root.
    pub fn new(
        prefix: impl Into<String>,
        drive_letter_paths: bool,
        guard: AccessGuard,
        transfer: Box<dyn FileTransfer>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            drive_letter_paths,
            guard,
            transfer,
        }
    }
}

impl Middleware for RawFsGateway {
    fn name(&self) -> &'static str {
        "raw-fs"
    }

    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if !req.url.starts_with(self.prefix.as_str()) {
            return next.run(req, res);
        }

        let (path, suffix) = split_query(&req.url);
        let suffix = suffix.to_string();
        let file = decode_url_path(path)
            .and_then(|decoded| fs_path_from_url(&decoded, &self.prefix, self.drive_letter_paths));
        let Some(file) = file else {
            debug!("Undecodable raw fs url {}, passing on", req.url);
            return next.run(req, res);
        };

        if self.guard.is_restricted(&file) {
            debug!("{} is restricted, passing on", file);
            return next.run(req, res);
        }

        req.url = format!("{}{}", encode_url_path(&file), suffix);
        self.transfer.serve(req, res, next);
    }
}
