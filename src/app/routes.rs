use super::order_draft::OrderDraft;
use super::state::MadangState;
use super::templates::*;
use super::web_result::WebResult;
use crate::db::{Book, Customer};
use crate::util::{clean_form_field, parse_price, parse_selection, StoreError, ValidationError};

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use minijinja::context;
use serde::Deserialize;
use tracing::{error, info, warn};

/// What every tab route hands back: the page, plus a status that reflects
/// whatever notice is on it.
type TabResponse = WebResult<(StatusCode, Html<String>)>;

/// Log a failure that's about to be shown to the user, and make a notice out of it.
fn store_failure(context: &'static str, err: &StoreError) -> (StatusCode, Notice) {
    if err.is_constraint_violation() {
        warn!(error = %err, "{}", context);
    } else {
        error!(error = %err, "{}", context);
    }
    Notice::from_error(err)
}

/// The search tab is the front page.
pub async fn root() -> Redirect {
    Redirect::to("/search")
}

/// Health check.
pub async fn status() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// The search tab. No `name` param means a fresh page; a blank one gets a
/// warning and no query.
pub async fn search(
    State(state): State<MadangState>,
    Query(query): Query<SearchQuery>,
) -> TabResponse {
    let raw_name = query.name.as_deref().unwrap_or("");
    let mut status = StatusCode::OK;
    let mut notice = None;
    let mut results = None;

    if query.name.is_some() {
        match clean_form_field(raw_name) {
            None => {
                let (s, n) = Notice::from_validation(&ValidationError::BlankSearch);
                status = s;
                notice = Some(n);
            }
            // Trimming only decides blankness; search for exactly what was typed.
            Some(_) => match state.db.orders().search_by_customer_name(raw_name).await {
                Ok(lines) => results = Some(lines),
                Err(e) => {
                    let (s, n) = store_failure("order search failed", &e);
                    status = s;
                    notice = Some(n);
                }
            },
        }
    }

    let common = Common::new("Search orders", Tab::Search);
    let search_page = SearchPage {
        name: raw_name,
        results: results.as_deref(),
    };
    let ctx = context! {common, notice, search_page};
    Ok((status, Html(state.render_view("search.html.j2", ctx)?)))
}

#[derive(Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub custid: String,
}

#[derive(Deserialize)]
pub struct OrderParams {
    #[serde(default)]
    pub custid: String,
    #[serde(default)]
    pub bookid: String,
    #[serde(default)]
    pub price: String,
}

/// Values to put back into the order form's inputs when re-rendering it.
#[derive(Default)]
struct OrderInputs<'a> {
    bookid: Option<i64>,
    price: &'a str,
}

/// Work out which customer (if any) the user picked, making sure they exist.
async fn choose_customer(
    state: &MadangState,
    custid: Option<i64>,
) -> Result<OrderDraft, (StatusCode, Notice)> {
    let draft = OrderDraft::new();
    let Some(custid) = custid else {
        return Ok(draft);
    };
    match state.db.customers().get(custid).await {
        Ok(Some(customer)) => Ok(draft.select_customer(customer.custid)),
        Ok(None) => Err(Notice::from_validation(&ValidationError::UnknownCustomer {
            custid,
        })),
        Err(e) => Err(store_failure("customer lookup failed", &e)),
    }
}

async fn order_lists(
    state: &MadangState,
    with_books: bool,
) -> Result<(Vec<Customer>, Vec<Book>), StoreError> {
    let customers = state.db.customers().list().await?;
    let books = if with_books {
        state.db.books().list().await?
    } else {
        Vec::new()
    };
    Ok((customers, books))
}

/// Render the order tab for a given draft. The customer list is always
/// loaded; the book list only once a customer is chosen.
async fn order_page(
    state: &MadangState,
    draft: OrderDraft,
    inputs: OrderInputs<'_>,
    mut status: StatusCode,
    mut notice: Option<Notice>,
) -> TabResponse {
    let (customers, books) = match order_lists(state, draft.custid().is_some()).await {
        Ok(lists) => lists,
        Err(e) => {
            // A listing failure outranks whatever we were going to say.
            let (s, n) = store_failure("listing customers/books failed", &e);
            status = s;
            notice = Some(n);
            (Vec::new(), Vec::new())
        }
    };

    let common = Common::new("Place an order", Tab::Order);
    let order_page = OrderPage {
        customers: &customers,
        books: &books,
        custid: draft.custid(),
        bookid: inputs.bookid,
        price: inputs.price,
    };
    let ctx = context! {common, notice, order_page};
    Ok((status, Html(state.render_view("order.html.j2", ctx)?)))
}

/// The order tab, in its "no customer" or "customer chosen" state.
pub async fn order(
    State(state): State<MadangState>,
    Query(query): Query<OrderQuery>,
) -> TabResponse {
    let custid = match parse_selection(&query.custid, "customer") {
        Ok(c) => c,
        Err(e) => {
            let (status, notice) = Notice::from_validation(&e);
            return order_page(&state, OrderDraft::new(), OrderInputs::default(), status, Some(notice))
                .await;
        }
    };
    match choose_customer(&state, custid).await {
        Ok(draft) => order_page(&state, draft, OrderInputs::default(), StatusCode::OK, None).await,
        Err((status, notice)) => {
            order_page(&state, OrderDraft::new(), OrderInputs::default(), status, Some(notice)).await
        }
    }
}

/// Commit an order for an existing customer. Anything short of a ready
/// draft gets bounced back with a validation notice, without touching the
/// orders table. On success, the customer stays selected and the book and
/// price reset.
pub async fn post_order(
    State(state): State<MadangState>,
    Form(params): Form<OrderParams>,
) -> TabResponse {
    let selections = parse_selection(&params.custid, "customer")
        .and_then(|c| Ok((c, parse_selection(&params.bookid, "book")?)));
    let (custid, bookid) = match selections {
        Ok(s) => s,
        Err(e) => {
            let (status, notice) = Notice::from_validation(&e);
            return order_page(&state, OrderDraft::new(), OrderInputs::default(), status, Some(notice))
                .await;
        }
    };
    let draft = match custid {
        Some(custid) => OrderDraft::new().select_customer(custid),
        None => OrderDraft::new(),
    };
    let inputs = OrderInputs {
        bookid,
        price: &params.price,
    };

    // Validate everything typed in before going anywhere near the db.
    let ready = match draft.fill(bookid, &params.price).and_then(OrderDraft::commit) {
        Ok(ready) => ready,
        Err(e) => {
            let (status, notice) = Notice::from_validation(&e);
            return order_page(&state, draft, inputs, status, Some(notice)).await;
        }
    };
    if let Err((status, notice)) = choose_customer(&state, Some(ready.custid)).await {
        return order_page(&state, OrderDraft::new(), OrderInputs::default(), status, Some(notice))
            .await;
    }

    match state
        .db
        .orders()
        .place(ready.custid, ready.bookid, ready.saleprice)
        .await
    {
        Ok(order) => {
            let notice = Notice::success(format!(
                "Order #{} saved: customer #{}, book #{}, {} on {}.",
                order.orderid, order.custid, order.bookid, order.saleprice, order.orderdate
            ));
            order_page(&state, draft, OrderInputs::default(), StatusCode::OK, Some(notice)).await
        }
        Err(e) => {
            let (status, notice) = store_failure("placing order failed", &e);
            order_page(&state, draft, inputs, status, Some(notice)).await
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bookname: String,
    #[serde(default)]
    pub price: String,
}

/// Validated registration input: trimmed names and a parsed price.
struct NewRegistration<'a> {
    name: &'a str,
    bookname: &'a str,
    saleprice: i64,
}

/// Check all three fields, reporting every problem at once.
fn validate_registration(params: &RegisterParams) -> Result<NewRegistration, ValidationError> {
    let name = clean_form_field(&params.name);
    let bookname = clean_form_field(&params.bookname);
    let saleprice = parse_price(&params.price);

    match (name, bookname, saleprice) {
        (Some(name), Some(bookname), Ok(saleprice)) => Ok(NewRegistration {
            name,
            bookname,
            saleprice,
        }),
        (name, bookname, saleprice) => {
            let mut problems = Vec::new();
            if name.is_none() {
                problems.push(ValidationError::BlankCustomerName);
            }
            if bookname.is_none() {
                problems.push(ValidationError::BlankBookName);
            }
            if let Err(e) = saleprice {
                problems.push(e);
            }
            Err(ValidationError::Incomplete(problems))
        }
    }
}

fn register_page(
    state: &MadangState,
    register_page: RegisterPage,
    status: StatusCode,
    notice: Option<Notice>,
) -> TabResponse {
    let common = Common::new("Register a new customer", Tab::Register);
    let ctx = context! {common, notice, register_page};
    Ok((status, Html(state.render_view("register.html.j2", ctx)?)))
}

const BLANK_REGISTRATION: RegisterPage<'static> = RegisterPage {
    name: "",
    bookname: "",
    price: "",
};

/// The new-customer tab.
pub async fn register(State(state): State<MadangState>) -> TabResponse {
    register_page(&state, BLANK_REGISTRATION, StatusCode::OK, None)
}

/// Register a new customer, a new book, and an order tying them together.
/// Either all three rows land or none do.
pub async fn post_register(
    State(state): State<MadangState>,
    Form(params): Form<RegisterParams>,
) -> TabResponse {
    let entered = RegisterPage {
        name: &params.name,
        bookname: &params.bookname,
        price: &params.price,
    };
    let reg = match validate_registration(&params) {
        Ok(reg) => reg,
        Err(e) => {
            let (status, notice) = Notice::from_validation(&e);
            return register_page(&state, entered, status, Some(notice));
        }
    };

    match state
        .db
        .orders()
        .register_new_customer(reg.name, reg.bookname, reg.saleprice)
        .await
    {
        Ok(ids) => {
            info!(custid = ids.custid, "new customer via registration form");
            let notice = Notice::success(format!(
                "Registered '{}' as customer #{}, added '{}' as book #{}, and saved order #{} for {}.",
                reg.name, ids.custid, reg.bookname, ids.bookid, ids.orderid, reg.saleprice
            ));
            register_page(&state, BLANK_REGISTRATION, StatusCode::OK, Some(notice))
        }
        Err(e) => {
            let (status, notice) = store_failure("registration failed", &e);
            register_page(&state, entered, status, Some(notice))
        }
    }
}

/// Fallback route for anything we don't recognize.
pub async fn four_oh_four(State(state): State<MadangState>) -> TabResponse {
    let common = Common::new("Not found", Tab::Search);
    let error_page = ErrorPage {
        error: "Nothing lives at that address.",
    };
    let ctx = context! {common, error_page};
    Ok((
        StatusCode::NOT_FOUND,
        Html(state.render_view("error.html.j2", ctx)?),
    ))
}
