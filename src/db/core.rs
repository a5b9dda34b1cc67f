use super::books::Books;
use super::customers::Customers;
use super::migrations::Migrations;
use super::orders::Orders;
use sqlx::Sqlite;
use sqlx::{
    pool::PoolOptions,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// The app's storage gateway. One of these goes in the app state, and you
/// can use it to access all the various resource methods, namespaced for
/// readability: `db.customers().list()` and so on.
///
/// Wraps a pool, but the pool is capped at exactly one connection that's
/// held open for the life of the process. Every max-plus-one ID assignment
/// depends on there being a single writer, and that single connection is how
/// we keep our own requests from racing each other. (Some *other* process
/// writing the same file can still race us; don't do that.)
#[derive(Clone, Debug)]
pub struct Db {
    pub pool: SqlitePool,
}

fn connect_options(opts: SqliteConnectOptions) -> SqliteConnectOptions {
    opts.journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .pragma("temp_store", "memory")
        .optimize_on_close(true, 400)
        .synchronous(SqliteSynchronous::Normal) // usually fine w/ wal
        .foreign_keys(true)
        // Name searches use LIKE, and they have to respect case.
        .pragma("case_sensitive_like", "ON")
}

fn single_connection() -> PoolOptions<Sqlite> {
    PoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        // Opened once, kept until shutdown.
        .idle_timeout(None)
        .max_lifetime(None)
}

impl Db {
    /// yeah.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file and hold a connection to it.
    #[tracing::instrument]
    pub async fn open(db_file: &Path) -> Result<Self, sqlx::Error> {
        let db_opts = connect_options(
            SqliteConnectOptions::new()
                .filename(db_file)
                .create_if_missing(true),
        );
        let pool = single_connection().connect_with(db_opts).await?;
        Ok(Self::new(pool))
    }

    /// Release the connection. Call this on the way out.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn customers(&self) -> Customers {
        Customers::new(self)
    }

    pub fn books(&self) -> Books {
        Books::new(self)
    }

    pub fn orders(&self) -> Orders {
        Orders::new(self)
    }

    pub fn migrations(&self) -> Migrations {
        Migrations::new(self)
    }
}

// Test stuff, kept a lil separate from the main stuff.
impl Db {
    // this is for tests, of course it's dead in real builds.
    #[allow(dead_code)]
    pub async fn new_test_db() -> Self {
        // Match the connect options from normal operation. An in-memory db
        // only lives as long as its one connection, which is another reason
        // the pool can't grow.
        let db_opts = connect_options(SqliteConnectOptions::from_str("sqlite::memory:").unwrap());
        let pool = single_connection().connect_with(db_opts).await.unwrap();
        let db = Self::new(pool);
        db.migrations()
            .run()
            .await
            .expect("sqlx-ploded during migrations");
        db
    }

    /// Test helper. Seed the store with customers, books, and orders, using
    /// explicit IDs. Orders are (orderid, custid, bookid, saleprice, orderdate).
    #[allow(dead_code)]
    pub async fn seed(
        &self,
        customers: &[(i64, &str)],
        books: &[(i64, &str)],
        orders: &[(i64, i64, i64, i64, time::Date)],
    ) -> anyhow::Result<()> {
        for &(custid, name) in customers {
            self.customers().insert(custid, name).await?;
        }
        for &(bookid, bookname) in books {
            self.books().insert(bookid, bookname).await?;
        }
        for &(orderid, custid, bookid, saleprice, orderdate) in orders {
            self.orders()
                .insert(&super::Order {
                    orderid,
                    custid,
                    bookid,
                    saleprice,
                    orderdate,
                })
                .await?;
        }
        Ok(())
    }
}
