pub mod batch;
pub mod catalog;
pub mod download;
pub mod filename;
pub mod page;
pub mod worker;
