//! Quota mutation service

mod service;

pub use service::QuotaService;
