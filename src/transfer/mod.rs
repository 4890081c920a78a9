//! Transfer module
//!
//! The byte-serving end of the static layers: once a middleware has decided a
//! request may be served, a [`FileTransfer`] sends the file or passes the
//! request on.

pub mod file_ops;
pub mod mime;

pub use file_ops::DirectoryTransfer;

use crate::middleware::Next;
use crate::protocol::{Request, Response};

pub trait FileTransfer: Send + Sync {
    /// Answer `req` with the file its URL names, or run `next`.
    fn serve(&self, req: &mut Request, res: &mut Response, next: Next<'_>);
}
