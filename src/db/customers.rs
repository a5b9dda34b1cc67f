use super::core::Db;
use super::ids::{next_id, IdTable};
use crate::util::StoreError;

use serde::Serialize;
use sqlx::{query, query_as, Executor, FromRow, Sqlite, SqlitePool};

/// A query helper type for operating on [Customer]s. Usually rented from a [Db].
#[derive(Debug)]
pub struct Customers<'a> {
    db: &'a Db,
}

/// Record struct for bookstore customers. Names aren't unique.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Customer {
    pub custid: i64,
    pub name: String,
}

/// Insert a customer row with a caller-chosen ID.
pub(super) async fn insert_customer<'e, E>(e: E, custid: i64, name: &str) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    query(
        r#"
            INSERT INTO Customer (custid, name)
            VALUES (?1, ?2);
        "#,
    )
    .bind(custid)
    .bind(name)
    .execute(e)
    .await?;
    Ok(())
}

// list, get, next_id, insert
impl<'a> Customers<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }
    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Every customer, alphabetical. Same-name customers come out in ID order.
    #[tracing::instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let customers = query_as::<_, Customer>(
            r#"
                SELECT custid, name
                FROM Customer
                ORDER BY name ASC, custid ASC;
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(customers)
    }

    /// Look up one customer. Ok(None) on not-found.
    #[tracing::instrument(skip_all)]
    pub async fn get(&self, custid: i64) -> Result<Option<Customer>, StoreError> {
        let customer = query_as::<_, Customer>(
            r#"
                SELECT custid, name
                FROM Customer
                WHERE custid = ?;
            "#,
        )
        .bind(custid)
        .fetch_optional(self.pool())
        .await?;
        Ok(customer)
    }

    /// The ID the next new customer would get.
    pub async fn next_id(&self) -> Result<i64, StoreError> {
        Ok(next_id(IdTable::Customer, self.pool()).await?)
    }

    /// Insert a customer with an explicit ID. Fails with a constraint violation
    /// if the ID is taken.
    #[tracing::instrument(skip_all)]
    pub async fn insert(&self, custid: i64, name: &str) -> Result<(), StoreError> {
        insert_customer(self.pool(), custid, name).await
    }
}
