//! Async REST client for the Cakung Barat backend.
//!
//! Every authenticated call goes through one [`session::Session`], which
//! owns the access/refresh token pair and retries a request once after a
//! silent refresh when the backend answers 401. The endpoint wrappers take
//! the session explicitly in their constructors.

pub mod admins;
pub mod cache;
pub mod config;
pub mod error;
pub mod org_chart;
pub mod organization;
pub mod postings;
pub mod session;
pub mod token_store;
pub mod transport;
