//! Ok, how about this. We make a Db type that wraps a pool, and a bunch
//! of pluralized collection types (Customers, etc.) that just hold a reference
//! to the Db, and methods on Db that return those collections. So then it's
//! like `db.orders().place(...)`. Seems ok.
mod books;
mod core;
mod customers;
mod db_tests;
mod ids;
mod migrations;
mod orders;

pub use self::core::Db;
pub use books::Book;
pub use customers::Customer;
pub use orders::{Order, OrderLine, Registration};
