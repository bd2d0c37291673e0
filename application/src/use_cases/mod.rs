//! Use cases (application services)

pub mod evaluate;
