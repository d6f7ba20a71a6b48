//! Boleto issuance (C3): barcode and digitable-line computation, per-bank
//! nosso-número formatting, and optional PDF rendering.

mod barcode;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use barcode::*;
