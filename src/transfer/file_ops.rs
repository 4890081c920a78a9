//! Module `file_ops`
//!
//! Sends file contents for requests that reached the end of a serving
//! middleware. The request URL is resolved under the transfer's root; paths
//! that do not name a regular file there fall through to the next handler.

use std::fs;
use std::path::PathBuf;

use log::{debug, error};

use crate::middleware::Next;
use crate::protocol::responses::{INTERNAL_ERROR, OK};
use crate::protocol::{Request, Response};
use crate::storage::validation::{
    collapse_leading_slashes, decode_url_path, is_within, normalize_dir, resolve_path, split_query,
};
use crate::transfer::FileTransfer;
use crate::transfer::mime::content_type_for;

/// Serves regular files found under `root`.
#[derive(Debug, Clone)]
pub struct DirectoryTransfer {
    root: PathBuf,
    root_key: String,
}

impl DirectoryTransfer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_key = normalize_dir(&root);
        Self { root, root_key }
    }

    /// The file `url` names under the root, if it is a regular file there.
    fn locate(&self, url: &str) -> Option<PathBuf> {
        let decoded = collapse_leading_slashes(&decode_url_path(split_query(url).0)?);
        let file = resolve_path(&decoded, &self.root);
        if !is_within(&file, &self.root_key) {
            return None;
        }
        let path = PathBuf::from(file);
        fs::metadata(&path)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
            .then_some(path)
    }
}

impl FileTransfer for DirectoryTransfer {
    fn serve(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if !req.is_read() {
            return next.run(req, res);
        }

        let Some(path) = self.locate(&req.url) else {
            debug!("No file for {} under {}", req.url, self.root.display());
            return next.run(req, res);
        };

        match fs::read(&path) {
            Ok(contents) => {
                debug!("Serving {} ({} bytes)", path.display(), contents.len());
                res.set_status(OK);
                res.set_header("Content-Type", content_type_for(&path));
                res.set_body(contents);
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                res.set_error(INTERNAL_ERROR);
            }
        }
    }
}
