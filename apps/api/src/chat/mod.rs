// Query service: filtered retrieval, prompt stuffing and the grounded answer.

pub mod handlers;
pub mod service;
