//! Reusable page components.

pub mod data_table;

pub use data_table::{ListQuery, Page, SortDir, TableColumn, TableRow, paginate};
