//! Domain types and pure logic for the Cakung Barat admin dashboard.
//!
//! Nothing in this crate performs I/O. The organization-chart layout engine,
//! hierarchy helpers, credential rules and photo normalization all live here
//! so the client crate and the CLI share one definition of each.

pub mod credentials;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod organization;
pub mod photo;
pub mod posting;
pub mod svg;
pub mod types;
