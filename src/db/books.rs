use super::core::Db;
use super::ids::{next_id, IdTable};
use crate::util::StoreError;

use serde::Serialize;
use sqlx::{query, query_as, Executor, FromRow, Sqlite, SqlitePool};

/// A query helper type for operating on [Book]s. Usually rented from a [Db].
#[derive(Debug)]
pub struct Books<'a> {
    db: &'a Db,
}

/// Record struct for the book catalog.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Book {
    pub bookid: i64,
    pub bookname: String,
}

pub(super) async fn insert_book<'e, E>(e: E, bookid: i64, bookname: &str) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    query(
        r#"
            INSERT INTO Book (bookid, bookname)
            VALUES (?1, ?2);
        "#,
    )
    .bind(bookid)
    .bind(bookname)
    .execute(e)
    .await?;
    Ok(())
}

impl<'a> Books<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }
    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// The whole catalog, alphabetical.
    #[tracing::instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let books = query_as::<_, Book>(
            r#"
                SELECT bookid, bookname
                FROM Book
                ORDER BY bookname ASC, bookid ASC;
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(books)
    }

    pub async fn next_id(&self) -> Result<i64, StoreError> {
        Ok(next_id(IdTable::Book, self.pool()).await?)
    }

    #[tracing::instrument(skip_all)]
    pub async fn insert(&self, bookid: i64, bookname: &str) -> Result<(), StoreError> {
        insert_book(self.pool(), bookid, bookname).await
    }
}
