//! Terminal front end for the search result viewer.
pub mod render;
pub mod repl;
