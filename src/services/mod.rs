pub mod ingest;
pub mod processor;
pub mod stock;
