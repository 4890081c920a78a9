//! Server middleware
//!
//! Middlewares run in order. Each one either answers the request itself or
//! hands it to the rest of the chain through [`Next`]; the end of the chain
//! answers 404. `Next` is consumed when run, so a middleware cannot both pass a
//! request on and serve it.

pub mod context;
pub mod logging;
pub mod public;
pub mod raw_fs;
pub mod static_files;

pub use context::RequestContext;
pub use public::PublicFiles;
pub use raw_fs::RawFsGateway;
pub use static_files::StaticFiles;

use crate::protocol::responses::NOT_FOUND;
use crate::protocol::{Request, Response};

pub trait Middleware: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>);
}

/// The remainder of the middleware chain.
pub struct Next<'a> {
    layers: &'a [Box<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(layers: &'a [Box<dyn Middleware>]) -> Self {
        Self { layers }
    }

    /// A chain with nothing left in it; running it answers 404.
    pub fn end() -> Next<'static> {
        Next { layers: &[] }
    }

    pub fn run(self, req: &mut Request, res: &mut Response) {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.handle(req, res, Next::new(rest)),
            None => res.set_error(NOT_FOUND),
        }
    }
}

/// Ordered middleware chain.
#[derive(Default)]
pub struct Pipeline {
    layers: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: impl Middleware + 'static) {
        self.layers.push(Box::new(layer));
    }

    pub fn with(mut self, layer: impl Middleware + 'static) -> Self {
        self.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Run `req` through the chain and return the response it produced.
    pub fn dispatch(&self, req: &mut Request) -> Response {
        let mut res = Response::new();
        Next::new(&self.layers).run(req, &mut res);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
            req.url.push_str(self.0);
            next.run(req, res);
        }
    }

    struct Answer;

    impl Middleware for Answer {
        fn name(&self) -> &'static str {
            "answer"
        }

        fn handle(&self, _req: &mut Request, res: &mut Response, _next: Next<'_>) {
            res.set_body(b"answered".to_vec());
        }
    }

    #[test]
    fn test_layers_run_in_order_and_end_in_404() {
        let pipeline = Pipeline::new().with(Tag("a")).with(Tag("b"));
        let mut req = Request::get("/");
        let res = pipeline.dispatch(&mut req);
        assert_eq!(req.url, "/ab");
        assert_eq!(res.status(), NOT_FOUND);
        assert_eq!(pipeline.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_answering_layer_stops_chain() {
        let pipeline = Pipeline::new().with(Answer).with(Tag("never"));
        let mut req = Request::get("/");
        let res = pipeline.dispatch(&mut req);
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), b"answered");
        assert_eq!(req.url, "/");
    }
}
