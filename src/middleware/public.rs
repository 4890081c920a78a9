//! Public directory middleware
//!
//! Files in the public directory are served as-is under `/`, without aliases
//! or access checks: the directory is trusted by configuration.

use std::sync::Arc;

use crate::middleware::{Middleware, Next};
use crate::protocol::{Classification, Request, Response, UrlClassifier};
use crate::transfer::FileTransfer;

pub struct PublicFiles {
    classifier: Arc<UrlClassifier>,
    transfer: Box<dyn FileTransfer>,
}

impl PublicFiles {
    /// `transfer` must be rooted at the public directory.
    pub fn new(classifier: Arc<UrlClassifier>, transfer: Box<dyn FileTransfer>) -> Self {
        Self {
            classifier,
            transfer,
        }
    }
}

impl Middleware for PublicFiles {
    fn name(&self) -> &'static str {
        "public"
    }

    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        match self.classifier.classify(&req.url) {
            Classification::Skip => next.run(req, res),
            Classification::Eligible => self.transfer.serve(req, res, next),
        }
    }
}
