//! Request pipeline for listing check-in images, leaf modules first.

pub mod object_store;
pub mod month_scanner;
pub mod header_decoder;
pub mod metadata_collector;
pub mod page_assembler;
pub mod gallery_service;
