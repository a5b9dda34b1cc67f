use crate::{
    db::{Book, Customer, OrderLine},
    util::{group_digits, IntoHandlerError, ValidationError},
    version,
};
use http::StatusCode;
use serde::Serialize;

// Right, so here's my theory of template data. Making a struct for every
// page would be kind of silly, so each page's context! is assembled from a
// few typed chunks: the common layout stuff, an optional notice, and the
// page's own data.

/// The three tabs along the top of every page.
#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Search,
    Order,
    Register,
}

/// Template data that every page needs for the main layout.
#[derive(Serialize)]
pub struct Common<'a> {
    pub title: &'a str,
    pub tab: Tab,
    pub version: &'static str,
}

impl<'a> Common<'a> {
    pub fn new(title: &'a str, tab: Tab) -> Self {
        Self {
            title,
            tab,
            version: version::short_sha(),
        }
    }
}

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

/// A message shown inline at the top of a tab, for the outcome of whatever
/// the user just tried.
#[derive(Serialize, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: String) -> Self {
        Self {
            kind: NoticeKind::Success,
            message,
        }
    }

    /// Turn any user-facing error into a notice plus the status code to
    /// serve the page with.
    pub fn from_error(err: &impl IntoHandlerError) -> (StatusCode, Self) {
        let (status, message) = err.status_and_message();
        (
            status,
            Self {
                kind: NoticeKind::Error,
                message,
            },
        )
    }

    /// Same as from_error, except some validation failures are only warnings.
    pub fn from_validation(err: &ValidationError) -> (StatusCode, Self) {
        let (status, mut notice) = Self::from_error(err);
        if err.is_warning() {
            notice.kind = NoticeKind::Warning;
        }
        (status, notice)
    }
}

#[derive(Serialize)]
pub struct SearchPage<'a> {
    pub name: &'a str,
    /// None means no search ran (fresh page, blank input, or a failure).
    pub results: Option<&'a [OrderLine]>,
}

/// The existing-customer order tab. `books` is only populated once a
/// customer is chosen.
#[derive(Serialize)]
pub struct OrderPage<'a> {
    pub customers: &'a [Customer],
    pub books: &'a [Book],
    pub custid: Option<i64>,
    pub bookid: Option<i64>,
    pub price: &'a str,
}

#[derive(Serialize)]
pub struct RegisterPage<'a> {
    pub name: &'a str,
    pub bookname: &'a str,
    pub price: &'a str,
}

// This one's kind of silly, but my theory is that I'll benefit if everything
// *inside* the freeform context has a known type.
#[derive(Serialize)]
pub struct ErrorPage<'a> {
    pub error: &'a str,
}

// For now, I'm just gonna load all the templates statically and compile em
// in to the app.
pub fn load_templates() -> anyhow::Result<minijinja::Environment<'static>> {
    let mut env = minijinja::Environment::new();
    env.add_template(
        "_layout.html.j2",
        include_str!("../../templates/_layout.html.j2"),
    )?;
    env.add_template(
        "error.html.j2",
        include_str!("../../templates/error.html.j2"),
    )?;
    env.add_template(
        "order.html.j2",
        include_str!("../../templates/order.html.j2"),
    )?;
    env.add_template(
        "register.html.j2",
        include_str!("../../templates/register.html.j2"),
    )?;
    env.add_template(
        "search.html.j2",
        include_str!("../../templates/search.html.j2"),
    )?;
    // prices: 15000 -> 15,000
    env.add_filter("won", group_digits);
    Ok(env)
}
