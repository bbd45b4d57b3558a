pub mod cache;
pub mod document_service;
pub mod storage;
pub mod summarizer;
pub mod worker;
