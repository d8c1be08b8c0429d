pub mod direct;
pub mod gateway;
pub mod http;
pub mod service;
