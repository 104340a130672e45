#![allow(dead_code)]

mod test_server;

pub use test_server::{API_KEY, TestServer};
