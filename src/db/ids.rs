//! Max-plus-one primary keys. Every table in the store hands out IDs by
//! looking at the current max and adding one, with 1 for an empty table.
//! There's no reservation step: read the next ID right before the insert that
//! uses it, on the same connection (ideally in the same transaction).
//!
//! This is only sound with a single writer. Two writers can read the same
//! max and then collide on insert, and the loser gets a constraint violation.

use sqlx::{query_scalar, Executor, Sqlite};

/// The tables that hand out max-plus-one IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdTable {
    Customer,
    Book,
    Orders,
}

impl IdTable {
    // Table and column names can't be bound as parameters, so each table gets
    // its own static statement.
    fn next_id_sql(self) -> &'static str {
        match self {
            IdTable::Customer => "SELECT COALESCE(MAX(custid), 0) + 1 FROM Customer;",
            IdTable::Book => "SELECT COALESCE(MAX(bookid), 0) + 1 FROM Book;",
            IdTable::Orders => "SELECT COALESCE(MAX(orderid), 0) + 1 FROM Orders;",
        }
    }
}

/// Read the next free ID for a table. Takes any executor, so it works
/// against the pool or inside a transaction.
pub async fn next_id<'e, E>(table: IdTable, e: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    query_scalar::<_, i64>(table.next_id_sql())
        .fetch_one(e)
        .await
}
