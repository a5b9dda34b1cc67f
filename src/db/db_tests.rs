#![cfg(test)]
//! This module collects a bunch of tests that slam the actual database, to
//! verify expected application-level behaviors. Each test gets its own
//! in-memory sqlite with the real migrations applied.

use super::*;
use crate::util::today;
use sqlx::query;
use time::macros::date;

/// Row counts for (Customer, Book, Orders).
async fn counts(db: &Db) -> (usize, usize, usize) {
    let customers = db.customers().list().await.unwrap().len();
    let books = db.books().list().await.unwrap().len();
    let orders = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM Orders;")
        .fetch_one(&db.pool)
        .await
        .unwrap() as usize;
    (customers, books, orders)
}

/// Kim has three orders (two of them on the same day), Lee has none, and
/// Kimberly shares a substring with Kim.
async fn seeded_db() -> Db {
    let db = Db::new_test_db().await;
    db.seed(
        &[(1, "Kim"), (2, "Lee"), (3, "Kimberly")],
        &[(1, "Dune"), (2, "Emma"), (3, "Solaris")],
        &[
            (1, 1, 1, 15000, date!(2024 - 03 - 01)),
            (2, 1, 2, 8000, date!(2024 - 05 - 20)),
            (3, 3, 3, 12000, date!(2024 - 04 - 10)),
            (4, 1, 3, 9000, date!(2024 - 05 - 20)),
        ],
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn next_id_starts_at_one() {
    let db = Db::new_test_db().await;
    assert_eq!(db.customers().next_id().await.unwrap(), 1);
    assert_eq!(db.books().next_id().await.unwrap(), 1);
    assert_eq!(db.orders().next_id().await.unwrap(), 1);

    // Gaps don't get filled: it's max plus one, not count plus one.
    db.customers().insert(7, "Seven").await.unwrap();
    assert_eq!(db.customers().next_id().await.unwrap(), 8);
}

#[tokio::test]
async fn listings_are_alphabetical() {
    let db = Db::new_test_db().await;
    db.seed(
        &[(1, "Park"), (2, "Choi"), (3, "Park"), (4, "Ahn")],
        &[(1, "Zorba"), (2, "Anna Karenina")],
        &[],
    )
    .await
    .unwrap();

    let customers = db.customers().list().await.unwrap();
    let ids: Vec<i64> = customers.iter().map(|c| c.custid).collect();
    // Duplicate names fall back to ID order.
    assert_eq!(ids, vec![4, 2, 1, 3]);

    let books = db.books().list().await.unwrap();
    assert_eq!(books[0].bookname, "Anna Karenina");
    assert_eq!(books[1].bookname, "Zorba");

    assert_eq!(
        db.customers().get(2).await.unwrap(),
        Some(Customer {
            custid: 2,
            name: "Choi".to_string()
        })
    );
    assert!(db.customers().get(99).await.unwrap().is_none());
}

#[tokio::test]
async fn search_by_substring() {
    let db = seeded_db().await;
    let orders = db.orders();

    // "Kim" matches both Kim and Kimberly, newest first. The two orders on
    // 2024-05-20 come out highest orderid first.
    let lines = orders.search_by_customer_name("Kim").await.unwrap();
    let ids: Vec<i64> = lines.iter().map(|l| l.orderid).collect();
    assert_eq!(ids, vec![4, 2, 3, 1]);
    assert_eq!(lines[0].name, "Kim");
    assert_eq!(lines[0].bookname, "Solaris");
    assert_eq!(lines[0].saleprice, 9000);
    assert_eq!(lines[0].orderdate, date!(2024 - 05 - 20));

    // Any substring of Kimberly's name gets just her orders.
    for pattern in ["berly", "mber", "Kimberly", "y"] {
        let lines = orders.search_by_customer_name(pattern).await.unwrap();
        assert_eq!(lines.len(), 1, "pattern {pattern:?}");
        assert_eq!(lines[0].custid, 3);
        assert_eq!(lines[0].bookname, "Solaris");
    }

    // Case matters.
    assert!(orders.search_by_customer_name("kim").await.unwrap().is_empty());
    assert!(orders.search_by_customer_name("KIM").await.unwrap().is_empty());

    // % and _ in the pattern are wildcards.
    let lines = orders.search_by_customer_name("K_m").await.unwrap();
    assert_eq!(lines.len(), 4);
    let lines = orders.search_by_customer_name("Ki%ly").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].custid, 3);
    assert!(orders.search_by_customer_name("L_m").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_without_orders_is_empty() {
    let db = seeded_db().await;
    // Lee exists but never bought anything.
    let lines = db.orders().search_by_customer_name("Lee").await.unwrap();
    assert!(lines.is_empty());
    // Nobody by this name at all.
    let lines = db.orders().search_by_customer_name("Nobody").await.unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn register_into_empty_store() {
    let db = Db::new_test_db().await;
    let reg = db
        .orders()
        .register_new_customer("Kim", "Dune", 15000)
        .await
        .unwrap();
    assert_eq!(
        reg,
        Registration {
            custid: 1,
            bookid: 1,
            orderid: 1
        }
    );

    assert_eq!(
        db.customers().list().await.unwrap(),
        vec![Customer {
            custid: 1,
            name: "Kim".to_string()
        }]
    );
    assert_eq!(
        db.books().list().await.unwrap(),
        vec![Book {
            bookid: 1,
            bookname: "Dune".to_string()
        }]
    );
    let lines = db.orders().search_by_customer_name("Kim").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].orderid, 1);
    assert_eq!(lines[0].saleprice, 15000);
    assert_eq!(lines[0].orderdate, today());
}

#[tokio::test]
async fn customer_ids_keep_climbing() {
    let db = Db::new_test_db().await;
    let mut custids = Vec::new();
    for i in 0..6 {
        let reg = db
            .orders()
            .register_new_customer(&format!("Customer {i}"), "Same Book", 100)
            .await
            .unwrap();
        custids.push(reg.custid);
    }
    assert_eq!(custids, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn place_order_for_existing_customer() {
    let db = Db::new_test_db().await;
    db.seed(&[(1, "Kim"), (2, "Lee")], &[(1, "Dune")], &[])
        .await
        .unwrap();

    let order = db.orders().place(1, 1, 9999).await.unwrap();
    assert_eq!(
        order,
        Order {
            orderid: 1,
            custid: 1,
            bookid: 1,
            saleprice: 9999,
            orderdate: today(),
        }
    );
    let second = db.orders().place(2, 1, 500).await.unwrap();
    assert_eq!(second.orderid, 2);
    assert_eq!(counts(&db).await, (2, 1, 2));
}

#[tokio::test]
async fn constraint_violations() {
    let db = seeded_db().await;

    // Duplicate primary keys.
    let err = db.customers().insert(1, "Impostor").await.unwrap_err();
    assert!(err.is_constraint_violation());
    let err = db.books().insert(2, "Also Emma").await.unwrap_err();
    assert!(err.is_constraint_violation());

    // Dangling references.
    let err = db.orders().place(99, 1, 1000).await.unwrap_err();
    assert!(err.is_constraint_violation());
    let err = db.orders().place(1, 99, 1000).await.unwrap_err();
    assert!(err.is_constraint_violation());

    // Nothing got in.
    assert_eq!(counts(&db).await, (3, 3, 4));
}

#[tokio::test]
async fn failed_registration_leaves_no_trace() {
    let db = seeded_db().await;
    let before = counts(&db).await;

    // Sabotage the book insert; the customer insert ahead of it succeeds.
    query(
        r#"
            CREATE TRIGGER no_cursed_books BEFORE INSERT ON Book
            WHEN NEW.bookname = 'Necronomicon'
            BEGIN SELECT RAISE(ABORT, 'cursed book'); END;
        "#,
    )
    .execute(&db.pool)
    .await
    .unwrap();
    let err = db
        .orders()
        .register_new_customer("Choi", "Necronomicon", 666)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cursed book"));
    assert_eq!(counts(&db).await, before);

    // Sabotage the order insert; customer and book both got in first.
    query(
        r#"
            CREATE TRIGGER no_free_lunch BEFORE INSERT ON Orders
            WHEN NEW.saleprice = 0
            BEGIN SELECT RAISE(ABORT, 'no free lunch'); END;
        "#,
    )
    .execute(&db.pool)
    .await
    .unwrap();
    let err = db
        .orders()
        .register_new_customer("Choi", "Dune Messiah", 0)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no free lunch"));
    assert_eq!(counts(&db).await, before);
    assert!(db
        .customers()
        .list()
        .await
        .unwrap()
        .iter()
        .all(|c| c.name != "Choi"));

    // And the IDs that would've been used are still up for grabs.
    let reg = db
        .orders()
        .register_new_customer("Choi", "Dune Messiah", 7000)
        .await
        .unwrap();
    assert_eq!(
        reg,
        Registration {
            custid: 4,
            bookid: 4,
            orderid: 5
        }
    );
}

#[tokio::test]
async fn migrations_check_out() {
    let db = Db::new_test_db().await;
    db.migrations().validate().await.unwrap();
    let statuses = db.migrations().info().await.unwrap();
    assert!(!statuses.is_empty());
    assert!(statuses
        .iter()
        .all(|s| matches!(s, migrations::Status::Applied { .. })));
}
