#![cfg(test)]

mod web;

use axum::body::{to_bytes, Body, Bytes};
use http::{header, request::Builder, Request, Response, StatusCode};
use scraper::{Html, Selector};
use std::sync::Arc;
use tower::{Service, ServiceExt}; // for `call`, `oneshot`, and `ready`

use super::state::*;
use super::*;
use crate::config::MadangConfig;

// Right, here's the ground rules for tests in this module. We're taking as
// axiomatic that the db methods work as advertised, bc they're tested over in
// db_tests. We mostly care about validation, notices, status codes, and
// whether the right writes happened (or didn't) here.
//
// This file has test helpers. The web file has tests.

// SHORTCUTS FOR MAKING THINGS

async fn test_state() -> MadangState {
    let db = crate::db::Db::new_test_db().await;
    let config = MadangConfig::test_config().unwrap();
    let templates = load_templates().unwrap();
    let inner = MSInner {
        db,
        config,
        templates,
    };
    Arc::new(inner)
}

/// A test state with two customers (Kim, Lee) and two books (Dune, Emma),
/// and nothing else.
async fn seeded_state() -> MadangState {
    let state = test_state().await;
    state
        .db
        .seed(&[(1, "Kim"), (2, "Lee")], &[(1, "Dune"), (2, "Emma")], &[])
        .await
        .unwrap();
    state
}

/// Shortcut for request builder w/ method and URI.
fn new_req(method: impl AsRef<str>, uri: impl AsRef<str>) -> Builder {
    Request::builder().method(method.as_ref()).uri(uri.as_ref())
}

// Since https://github.com/tokio-rs/axum/pull/1751, axum routers can't handle
// type inferrence for the ServiceExt methods because they're no longer generic
// over the body type. So you have to use the uniform function call syntax, which
// makes a minor mess... which I am choosing to corral into this thing.
async fn do_req(app: &mut axum::Router, req: Request<Body>) -> Response<Body> {
    // gotta love a double-unwrap
    ServiceExt::<Request<Body>>::ready(app)
        .await
        .unwrap()
        .call(req)
        .await
        .unwrap()
}

/// One-shot CSS selector construction
fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

/// A few little extension methods for request::Builder.
trait TestRequestBuilder {
    /// Finishes the request with an empty body.
    fn empty(self) -> Request<Body>;
    /// Finishes the request with an already-urlencoded form body.
    fn form(self, body: &'static str) -> Request<Body>;
}

impl TestRequestBuilder for Builder {
    fn empty(self) -> Request<Body> {
        self.body(Body::empty()).unwrap()
    }
    fn form(self, body: &'static str) -> Request<Body> {
        self.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }
}

/// Convenience extension methods for scraper::Html.
trait HasSelector {
    fn has(&self, selector: &str) -> bool;
    fn count(&self, selector: &str) -> usize;
    /// Text content of the first match, or empty string.
    fn text_of(&self, selector: &str) -> String;
}

impl HasSelector for Html {
    fn has(&self, selector: &str) -> bool {
        self.select(&sel(selector)).next().is_some()
    }
    fn count(&self, selector: &str) -> usize {
        self.select(&sel(selector)).count()
    }
    fn text_of(&self, selector: &str) -> String {
        self.select(&sel(selector))
            .next()
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default()
    }
}

// TRANSFORMING FORMATS

/// Consumes a response to return the body as a Bytes.
async fn body_bytes(resp: Response<Body>) -> Bytes {
    to_bytes(resp.into_body(), usize::MAX).await.unwrap()
}

/// Borrows a Bytes as a &str for quick .contains() checks. Panics on non-utf8.
fn bytes_str(b: &Bytes) -> &str {
    std::str::from_utf8(b.as_ref()).unwrap()
}

/// Consumes a response, panics unless the status matches, and returns the
/// body as an HTML document.
async fn page_with_status(resp: Response<Body>, status: StatusCode) -> Html {
    assert_eq!(resp.status(), status);
    let body = body_bytes(resp).await;
    Html::parse_document(bytes_str(&body))
}

// TESTING OUTCOMES

/// Panics unless the page has a notice of the given kind whose text
/// contains `substr`.
fn assert_notice(doc: &Html, kind: &str, substr: &str) {
    let selector = format!("#notice.notice-{}", kind);
    assert!(doc.has(&selector), "expected a {} notice", kind);
    let text = doc.text_of(&selector);
    assert!(
        text.contains(substr),
        "notice {:?} doesn't mention {:?}",
        text,
        substr
    );
}

/// Row count in the Orders table, straight from the db.
async fn order_count(state: &MadangState) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM Orders;")
        .fetch_one(&state.db.pool)
        .await
        .unwrap()
}
