// Mapper module - inbound envelope normalization

pub mod request;

pub use request::{parse_envelope, ProxyEnvelope, ProxyRequest};
