//! Project-root static file middleware
//!
//! Serves files from the serving root after alias resolution, subject to the
//! access guard. Restricted paths are passed on exactly like missing ones.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::middleware::{Middleware, Next, RequestContext};
use crate::protocol::{Classification, Request, Response, UrlClassifier};
use crate::storage::{AccessGuard, AliasTable};
use crate::transfer::FileTransfer;

pub struct StaticFiles {
    root: PathBuf,
    classifier: Arc<UrlClassifier>,
    aliases: Arc<AliasTable>,
    guard: AccessGuard,
    transfer: Box<dyn FileTransfer>,
}

impl StaticFiles {
    pub fn new(
        root: impl Into<PathBuf>,
        classifier: Arc<UrlClassifier>,
        aliases: Arc<AliasTable>,
        guard: AccessGuard,
        transfer: Box<dyn FileTransfer>,
    ) -> Self {
        Self {
            root: root.into(),
            classifier,
            aliases,
            guard,
            transfer,
        }
    }
}

impl Middleware for StaticFiles {
    fn name(&self) -> &'static str {
        "static"
    }

    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if self.classifier.classify_static(&req.url) == Classification::Skip {
            return next.run(req, res);
        }

        let Some(ctx) = RequestContext::build(&req.url, &self.aliases, &self.root) else {
            debug!("Undecodable url {}, passing on", req.url);
            return next.run(req, res);
        };

        if self.guard.is_restricted(&ctx.file_path) {
            debug!("{} is restricted, passing on", ctx.file_path);
            return next.run(req, res);
        }

        // The transfer resolves req.url again; commit the URL the guard checked.
        let url = ctx.request_url();
        if url != req.url {
            debug!("Rewrote {} to {}", req.url, url);
            req.url = url;
        }

        self.transfer.serve(req, res, next);
    }
}
