//! View components shared by console pages.

pub mod layout;
pub mod pagination;

pub use layout::ConsoleView;
pub use pagination::Pagination;
