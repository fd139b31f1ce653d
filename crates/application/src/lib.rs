#![forbid(unsafe_code)]

pub mod alert_service_impl;
