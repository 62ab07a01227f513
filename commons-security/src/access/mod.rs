//! Session principals and the authorization pipeline.

mod pipeline;
mod principal;

pub use pipeline::{Authenticated, Authorized, Guard, authenticate};
pub use principal::{Principal, Role};
