//! Public mutation surface of the [`Db`](crate::db::Db).
//!
//! Each method is one transaction: sanitize, validate, plan the counter
//! batch against the pre-write state, then write the row and apply the
//! batch. A returned error means nothing was written.

mod organizations;
mod territories;
mod workflow;

#[cfg(test)]
mod tests;
