// Not every test binary uses every helper.
#![allow(dead_code)]

pub mod connection;
pub mod fixtures;

#[allow(unused_imports)]
pub use connection::*;
#[allow(unused_imports)]
pub use fixtures::*;
