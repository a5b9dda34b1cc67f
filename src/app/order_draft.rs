//! The existing-customer order tab is a little cascade: pick a customer, then
//! the book list and price field show up, then you can commit. Rather than
//! juggle a pile of "is this set yet" flags, the form's progress is an enum,
//! and the only way to get something committable out of it is from the
//! `Ready` state.

use crate::util::{parse_price, ValidationError};

/// Everything needed to record a sale to an existing customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyOrder {
    pub custid: i64,
    pub bookid: i64,
    pub saleprice: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDraft {
    /// Initial state; only the customer list is on offer.
    NoCustomer,
    /// The book list and price field are available.
    CustomerChosen { custid: i64 },
    /// Book chosen and price valid. Committable.
    Ready(ReadyOrder),
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::NoCustomer
    }

    /// Choose (or change) the customer. Changing customers throws away any
    /// book and price chosen for the previous one.
    pub fn select_customer(self, custid: i64) -> Self {
        Self::CustomerChosen { custid }
    }

    pub fn custid(&self) -> Option<i64> {
        match self {
            Self::NoCustomer => None,
            Self::CustomerChosen { custid } => Some(*custid),
            Self::Ready(ready) => Some(ready.custid),
        }
    }

    /// Fill in the book and price. Both have to be good to move on; a missing
    /// book is reported ahead of a bad price.
    pub fn fill(self, bookid: Option<i64>, price: &str) -> Result<Self, ValidationError> {
        let Some(custid) = self.custid() else {
            return Err(ValidationError::NoCustomer);
        };
        let Some(bookid) = bookid else {
            return Err(ValidationError::NoBook);
        };
        let saleprice = parse_price(price)?;
        Ok(Self::Ready(ReadyOrder {
            custid,
            bookid,
            saleprice,
        }))
    }

    /// Hand over the committable order, or explain what's still missing.
    pub fn commit(self) -> Result<ReadyOrder, ValidationError> {
        match self {
            Self::Ready(ready) => Ok(ready),
            Self::NoCustomer => Err(ValidationError::NoCustomer),
            Self::CustomerChosen { .. } => Err(ValidationError::NoBook),
        }
    }
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let draft = OrderDraft::new();
        assert_eq!(draft.custid(), None);
        let draft = draft.select_customer(1);
        assert_eq!(draft, OrderDraft::CustomerChosen { custid: 1 });
        let ready = draft.fill(Some(3), "9999").unwrap().commit().unwrap();
        assert_eq!(
            ready,
            ReadyOrder {
                custid: 1,
                bookid: 3,
                saleprice: 9999
            }
        );
    }

    #[test]
    fn commit_too_early() {
        assert_eq!(
            OrderDraft::new().commit(),
            Err(ValidationError::NoCustomer)
        );
        assert_eq!(
            OrderDraft::new().select_customer(2).commit(),
            Err(ValidationError::NoBook)
        );
    }

    #[test]
    fn fill_rejects_incomplete_input() {
        assert_eq!(
            OrderDraft::new().fill(Some(1), "100"),
            Err(ValidationError::NoCustomer)
        );
        let chosen = OrderDraft::new().select_customer(2);
        assert_eq!(chosen.fill(None, "100"), Err(ValidationError::NoBook));
        assert_eq!(chosen.fill(None, "oops"), Err(ValidationError::NoBook));
        for price in ["", "12.5", "-5", "abc"] {
            assert!(matches!(
                chosen.fill(Some(1), price),
                Err(ValidationError::BadPrice { .. })
            ));
        }
    }

    #[test]
    fn changing_customer_resets() {
        let ready = OrderDraft::new()
            .select_customer(1)
            .fill(Some(1), "100")
            .unwrap();
        let changed = ready.select_customer(2);
        assert_eq!(changed, OrderDraft::CustomerChosen { custid: 2 });
        assert_eq!(changed.commit(), Err(ValidationError::NoBook));
    }
}
