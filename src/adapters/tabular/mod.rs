//! Tabular file I/O
//!
//! Lenient CSV reading and header-first CSV writing over the `csv` crate.
//! Tables merge by column name, so files with drifting columns can still be
//! concatenated.

pub mod table;

pub use table::{read_table, write_table, ReadReport, Table};
