use crate::util::today;

use super::*;

/// /, /public, /status, and the 404 fallback.
#[tokio::test]
async fn app_basics() {
    let state = test_state().await;
    let mut app = madang_app(state.clone());

    // Front page goes to the search tab
    {
        let req = new_req("GET", "/").empty();
        let resp = do_req(&mut app, req).await;
        assert!(resp.status().is_redirection());
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/search");
    }

    // Static file serving is hooked up right
    {
        let req = new_req("GET", "/public/style.css").empty();
        let resp = do_req(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_bytes(resp).await;
        assert!(bytes_str(&body).contains("--color-background"));
    }

    // Status is hooked up right
    {
        let req = new_req("GET", "/status").empty();
        let resp = do_req(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    // 404s, inside and outside /public
    for uri in ["/nowhere", "/public/nothing.css"] {
        let req = new_req("GET", uri).empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::NOT_FOUND).await;
        assert!(doc.has("#error"));
    }
}

#[tokio::test]
async fn search_tab() {
    let state = seeded_state().await;
    let mut app = madang_app(state.clone());
    state.db.orders().place(1, 1, 15000).await.unwrap();
    state.db.orders().place(1, 2, 8000).await.unwrap();

    // Fresh page: just the form.
    {
        let req = new_req("GET", "/search").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(doc.has("form#search"));
        assert!(doc.has("#tabs a.current[href='/search']"));
        assert!(!doc.has("#notice"));
        assert!(!doc.has("#results"));
    }

    // Blank search: warning, no results at all.
    for uri in ["/search?name=", "/search?name=%20%20%20"] {
        let req = new_req("GET", uri).empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert_notice(&doc, "warning", "customer name");
        assert!(!doc.has("#results"));
        assert!(!doc.has("#no-results"));
    }

    // Substring search: both of Kim's orders, newest-recorded first.
    {
        let req = new_req("GET", "/search?name=Ki").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(!doc.has("#notice"));
        assert_eq!(doc.count("#results tbody tr"), 2);
        let first_row = doc.text_of("#results tbody tr");
        assert!(first_row.contains("Emma"));
        assert!(first_row.contains("8,000"));
        assert!(first_row.contains(&today().to_string()));
        // Search box keeps what you typed.
        let input = doc
            .select(&sel("#search-name"))
            .next()
            .expect("must be present");
        assert_eq!(input.attr("value"), Some("Ki"));
    }

    // Lee exists, but has no orders: empty result, not an error.
    {
        let req = new_req("GET", "/search?name=Lee").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(!doc.has("#notice"));
        assert!(!doc.has("#results"));
        assert!(doc.has("#no-results"));
    }

    // The text goes to the search as typed: stray spaces count, and % and _
    // are wildcards.
    for (uri, rows) in [
        ("/search?name=Ki%20", 0),
        ("/search?name=%20Kim", 0),
        ("/search?name=K_m", 2),
        ("/search?name=K%25m", 2),
    ] {
        let req = new_req("GET", uri).empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(!doc.has("#notice"), "{uri}");
        assert_eq!(doc.count("#results tbody tr"), rows, "{uri}");
    }

    // Store falls over: error notice, and the results table goes away.
    sqlx::query("DROP TABLE Orders;")
        .execute(&state.db.pool)
        .await
        .unwrap();
    {
        let req = new_req("GET", "/search?name=Kim").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::INTERNAL_SERVER_ERROR).await;
        assert_notice(&doc, "error", "Storage error");
        assert!(!doc.has("#results"));
        assert!(!doc.has("#no-results"));
    }
}

#[tokio::test]
async fn order_tab_cascade() {
    let state = seeded_state().await;
    let mut app = madang_app(state.clone());

    // No customer chosen: customer list (plus the "choose" option), no order form.
    {
        let req = new_req("GET", "/order").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert_eq!(doc.count("#order-customer option"), 3);
        let first = doc
            .select(&sel("#order-customer option"))
            .next()
            .expect("must be present");
        assert_eq!(first.attr("value"), Some(""));
        assert!(!doc.has("form#place-order"));
    }

    // Customer chosen: book list and price field show up.
    {
        let req = new_req("GET", "/order?custid=2").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(doc.has("#order-customer option[value='2'][selected]"));
        assert!(doc.has("form#place-order"));
        assert!(doc.has("form#place-order input[name='custid'][value='2']"));
        assert_eq!(doc.count("#order-book option"), 3);
        assert!(doc.has("#order-price"));
    }

    // Sentinel choice is the same as no choice.
    {
        let req = new_req("GET", "/order?custid=").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(!doc.has("form#place-order"));
    }

    // Customers that don't exist, or garbage.
    for (uri, complaint) in [
        ("/order?custid=99", "no customer"),
        ("/order?custid=abc", "mangled"),
    ] {
        let req = new_req("GET", uri).empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert_notice(&doc, "error", complaint);
        assert!(!doc.has("form#place-order"));
    }
}

#[tokio::test]
async fn placing_orders() {
    let state = seeded_state().await;
    let mut app = madang_app(state.clone());

    // Anything short of ready gets rejected without writing anything.
    for (body, complaint) in [
        ("custid=&bookid=1&price=100", "customer first"),
        ("bookid=1&price=100", "customer first"),
        ("custid=1&bookid=&price=100", "Choose a book"),
        ("custid=1&bookid=1&price=", "whole digits"),
        ("custid=1&bookid=1&price=12.5", "12.5"),
        ("custid=1&bookid=1&price=-5", "-5"),
        ("custid=1&bookid=1&price=abc", "abc"),
        ("custid=1&bookid=1&price=1%2C000", "1,000"),
        ("custid=99&bookid=1&price=100", "no customer"),
    ] {
        let req = new_req("POST", "/order").form(body);
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert_notice(&doc, "error", complaint);
    }
    assert_eq!(order_count(&state).await, 0);

    // Bad price keeps the book selection around for another try.
    {
        let req = new_req("POST", "/order").form("custid=1&bookid=2&price=twelve");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert!(doc.has("#order-book option[value='2'][selected]"));
        assert!(doc.has("#order-price[value='twelve']"));
    }

    // Ready: saved, customer stays selected, book and price reset.
    {
        let req = new_req("POST", "/order").form("custid=1&bookid=1&price=9999");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert_notice(&doc, "success", "Order #1");
        assert!(doc.has("#order-customer option[value='1'][selected]"));
        assert!(doc.has("form#place-order"));
        assert!(!doc.has("#order-book option[selected]"));
        assert!(doc.has("#order-price[value='']"));
    }
    assert_eq!(order_count(&state).await, 1);
    let lines = state
        .db
        .orders()
        .search_by_customer_name("Kim")
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].orderid, 1);
    assert_eq!(lines[0].custid, 1);
    assert_eq!(lines[0].bookname, "Dune");
    assert_eq!(lines[0].saleprice, 9999);
    assert_eq!(lines[0].orderdate, today());

    // A book that doesn't exist gets past validation, but the store says no.
    {
        let req = new_req("POST", "/order").form("custid=2&bookid=42&price=100");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::CONFLICT).await;
        assert_notice(&doc, "error", "Constraint violation");
    }
    assert_eq!(order_count(&state).await, 1);

    // Next order gets the next ID.
    {
        let req = new_req("POST", "/order").form("custid=2&bookid=2&price=500");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert_notice(&doc, "success", "Order #2");
    }
}

#[tokio::test]
async fn registering_customers() {
    let state = test_state().await;
    let mut app = madang_app(state.clone());

    // Blank tab.
    {
        let req = new_req("GET", "/register").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(doc.has("form#register"));
        assert!(doc.has("#tabs a.current[href='/register']"));
    }

    // Everything wrong at once: one notice that lists every problem.
    {
        let req = new_req("POST", "/register").form("name=%20&bookname=&price=12.5");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert_eq!(doc.count("#notice"), 1);
        assert_notice(&doc, "error", "customer's name");
        assert_notice(&doc, "error", "book's name");
        assert_notice(&doc, "error", "12.5");
    }

    // Just one thing wrong; what you typed stays put.
    {
        let req = new_req("POST", "/register").form("name=Kim&bookname=Dune&price=15%2C000");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::BAD_REQUEST).await;
        assert_notice(&doc, "error", "15,000");
        assert!(doc.has("#register-name[value='Kim']"));
        assert!(doc.has("#register-book[value='Dune']"));
    }
    assert!(state.db.customers().list().await.unwrap().is_empty());
    assert!(state.db.books().list().await.unwrap().is_empty());
    assert_eq!(order_count(&state).await, 0);

    // Empty store, good input: everything gets ID 1. Names are trimmed.
    {
        let req = new_req("POST", "/register").form("name=%20Kim%20&bookname=Dune&price=15000");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert_notice(&doc, "success", "'Kim' as customer #1");
        assert_notice(&doc, "success", "book #1");
        assert_notice(&doc, "success", "order #1");
        // form is cleared for the next one
        assert!(doc.has("#register-name[value='']"));
    }
    let customers = state.db.customers().list().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!((customers[0].custid, customers[0].name.as_str()), (1, "Kim"));
    let books = state.db.books().list().await.unwrap();
    assert_eq!((books[0].bookid, books[0].bookname.as_str()), (1, "Dune"));
    let lines = state
        .db
        .orders()
        .search_by_customer_name("Kim")
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        (lines[0].orderid, lines[0].custid, lines[0].saleprice),
        (1, 1, 15000)
    );
    assert_eq!(lines[0].orderdate, today());

    // The new customer shows up on the order tab right away.
    {
        let req = new_req("GET", "/order").empty();
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::OK).await;
        assert!(doc.has("#order-customer option[value='1']"));
    }

    // The store refuses the order row: the engine's message comes back, and
    // the customer and book that went in ahead of it are gone too.
    sqlx::query(
        r#"
            CREATE TRIGGER closed_for_inventory BEFORE INSERT ON Orders
            BEGIN SELECT RAISE(ABORT, 'closed for inventory'); END;
        "#,
    )
    .execute(&state.db.pool)
    .await
    .unwrap();
    {
        let req = new_req("POST", "/register").form("name=Lee&bookname=Emma&price=8000");
        let resp = do_req(&mut app, req).await;
        let doc = page_with_status(resp, StatusCode::INTERNAL_SERVER_ERROR).await;
        assert_notice(&doc, "error", "closed for inventory");
        // What was typed stays put for another try.
        assert!(doc.has("#register-name[value='Lee']"));
    }
    assert_eq!(state.db.customers().list().await.unwrap().len(), 1);
    assert_eq!(state.db.books().list().await.unwrap().len(), 1);
    assert_eq!(order_count(&state).await, 1);
}
