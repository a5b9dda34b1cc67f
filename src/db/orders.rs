use super::books::insert_book;
use super::core::Db;
use super::customers::insert_customer;
use super::ids::{next_id, IdTable};
use crate::util::{today, StoreError};

use serde::Serialize;
use sqlx::{query, query_as, Executor, FromRow, Sqlite, SqlitePool};
use time::Date;
use tracing::info;

// Order dates go to templates as plain YYYY-MM-DD, same as the column.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// A query helper type for operating on [Order]s. Usually rented from a [Db].
#[derive(Debug)]
pub struct Orders<'a> {
    db: &'a Db,
}

/// Record struct for a sale. `saleprice` is in whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
    pub orderid: i64,
    pub custid: i64,
    pub bookid: i64,
    pub saleprice: i64,
    #[serde(with = "iso_date")]
    pub orderdate: Date,
}

/// One row of an order search: an order joined with its customer and book.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrderLine {
    pub orderid: i64,
    pub custid: i64,
    pub name: String,
    pub bookname: String,
    #[serde(with = "iso_date")]
    pub orderdate: Date,
    pub saleprice: i64,
}

/// The IDs handed out by a new-customer registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Registration {
    pub custid: i64,
    pub bookid: i64,
    pub orderid: i64,
}

pub(super) async fn insert_order<'e, E>(e: E, order: &Order) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    query(
        r#"
            INSERT INTO Orders (orderid, custid, bookid, saleprice, orderdate)
            VALUES (?1, ?2, ?3, ?4, ?5);
        "#,
    )
    .bind(order.orderid)
    .bind(order.custid)
    .bind(order.bookid)
    .bind(order.saleprice)
    .bind(order.orderdate)
    .execute(e)
    .await?;
    Ok(())
}

// search_by_customer_name, next_id, insert, place, register_new_customer
impl<'a> Orders<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }
    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Find every order placed by a customer whose name contains `pattern`.
    /// The match is a case-sensitive LIKE with the pattern wrapped in `%`, so
    /// any `%` or `_` in the pattern work as wildcards too. Newest orders first; same-day orders come
    /// out newest-recorded (highest orderid) first. No matches is an empty
    /// list, not an error. An empty pattern matches everybody, so callers
    /// should refuse blank searches before getting here.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_customer_name(
        &self,
        pattern: &str,
    ) -> Result<Vec<OrderLine>, StoreError> {
        let lines = query_as::<_, OrderLine>(
            r#"
                SELECT o.orderid, c.custid, c.name, b.bookname, o.orderdate, o.saleprice
                FROM Customer c
                JOIN Orders o ON c.custid = o.custid
                JOIN Book b ON b.bookid = o.bookid
                WHERE c.name LIKE '%' || ?1 || '%'
                ORDER BY o.orderdate DESC, o.orderid DESC;
            "#,
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(lines)
    }

    pub async fn next_id(&self) -> Result<i64, StoreError> {
        Ok(next_id(IdTable::Orders, self.pool()).await?)
    }

    /// Insert a fully-specified order. Duplicate IDs and references to
    /// customers or books that don't exist are constraint violations.
    #[tracing::instrument(skip_all)]
    pub async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        insert_order(self.pool(), order).await
    }

    /// Record a sale to an existing customer, dated today. The order ID is
    /// read and used inside one transaction.
    #[tracing::instrument(skip(self))]
    pub async fn place(&self, custid: i64, bookid: i64, saleprice: i64) -> Result<Order, StoreError> {
        let mut tx = self.pool().begin().await?;
        let orderid = next_id(IdTable::Orders, &mut *tx).await?;
        let order = Order {
            orderid,
            custid,
            bookid,
            saleprice,
            orderdate: today(),
        };
        insert_order(&mut *tx, &order).await?;
        tx.commit().await?;

        info!(orderid, custid, bookid, saleprice, "placed order");
        Ok(order)
    }

    /// Register a brand new customer and a brand new book, and record the
    /// customer buying that book today. All three rows land in one
    /// transaction: if any insert fails, the transaction drops without
    /// committing and none of them persist.
    #[tracing::instrument(skip(self))]
    pub async fn register_new_customer(
        &self,
        name: &str,
        bookname: &str,
        saleprice: i64,
    ) -> Result<Registration, StoreError> {
        let mut tx = self.pool().begin().await?;

        let custid = next_id(IdTable::Customer, &mut *tx).await?;
        insert_customer(&mut *tx, custid, name).await?;

        let bookid = next_id(IdTable::Book, &mut *tx).await?;
        insert_book(&mut *tx, bookid, bookname).await?;

        let orderid = next_id(IdTable::Orders, &mut *tx).await?;
        let order = Order {
            orderid,
            custid,
            bookid,
            saleprice,
            orderdate: today(),
        };
        insert_order(&mut *tx, &order).await?;

        tx.commit().await?;

        info!(custid, bookid, orderid, "registered new customer");
        Ok(Registration {
            custid,
            bookid,
            orderid,
        })
    }
}
