//! End-to-end tests driving a real server over TCP with a chunk level
//! client built from the core crates.

mod scenarios;
mod utils;
