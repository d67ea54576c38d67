#![deny(clippy::all)]
#![deny(rust_2018_idioms)]

//! The Ad Store - the backend service of record for advertisements
//! and their impression/click counters.

pub mod application;
pub mod db;
pub mod response;
pub mod routes {
    pub mod ads;
    pub mod analytics;
}

pub use application::Application;
