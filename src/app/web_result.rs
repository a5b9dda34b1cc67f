//! Right, so the story here goes something like this.
//!
//! - Anything the user did wrong, or that the database refused to do, gets
//!   shown inline on the tab they were using. Those never come through here.
//! - But rendering the tab is itself fallible (template fetch+render), and
//!   when THAT goes wrong there's no tab to put a notice on.
//!
//! So routes return a Result whose Error type implements IntoResponse, with a
//! blanket From impl so `?` works on whatever library error. And since this
//! is the last line of defense, the error page can't be a template: it's a
//! duplicated partial page skeleton and a `format!()` call.
//!
//! The concept here is adapted from this blog post:
//! https://fasterthanli.me/series/updating-fasterthanli-me-for-2022/part-2

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::error::Error;
use tracing::error;

/// An IntoResponse type that any error can be converted to, for displaying
/// HTML error pages from a route.
#[derive(Debug)]
pub struct WebError {
    pub message: String,
    pub status: StatusCode,
}

/// A convenience type for returning probably an Ok(IntoResponse), or maybe
/// an error page, from a route.
pub type WebResult<T> = Result<T, WebError>;

impl<E: Error> From<E> for WebError {
    // Build an html-fragment description of the error, to be included
    // in an error page later.
    fn from(value: E) -> Self {
        let mut message = String::new();
        // if the error happens to have nested source errors, list em all.
        let mut err: &dyn Error = &value;
        loop {
            message.push_str("<p>");
            html_escape::encode_safe_to_string(err.to_string(), &mut message);
            message.push_str("</p>");
            if let Some(next) = err.source() {
                err = next;
            } else {
                break;
            }
        }
        error!(%message, "serving an error page");

        Self {
            message,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let page = format!(include_str!("../../templates/_error.html"), &self.message);
        (self.status, Html(page)).into_response()
    }
}
