//! Processor module for the sync pipeline.
//!
//! Decodes raw source records and change events into typed search documents.

mod document_processor;

pub use document_processor::{DocumentProcessor, ProcessedEvent};
