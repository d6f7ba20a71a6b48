//! # receba
//!
//! Brazilian receivables middleware core: fiscal XML ingestion (NFe/CTe),
//! Febraban boleto issuance (barcode, digitable line, PDF), nosso-número
//! sequencing, and CNAB remittance emission for two bank dialects.
//!
//! All monetary values are integer cents ([`core::Cents`]) — floating point
//! only ever touches a value at the XML-ingest boundary, and is converted
//! immediately with explicit half-to-even rounding.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use receba::core::*;
//! use receba::service::create_boleto_batch;
//!
//! let tenant = TenantBuilder::new("ACME LTDA", "11222333000181")
//!     .build()
//!     .unwrap();
//!
//! let profile = BankProfileBuilder::new(
//!     BankKind::BankA,
//!     "1234",
//!     Account { body: "456789".into(), check_digit: "0".into() },
//! )
//! .wallet("101")
//! .agreement("998877")
//! .nosso_numero_bounds(1, 999_999_999, 1)
//! .build()
//! .unwrap();
//!
//! let sequencer = NossoNumeroSequencer::new();
//! sequencer.register(
//!     CounterKey::new(tenant.cnpj.clone(), profile.bank.code()),
//!     profile.min_nosso_numero,
//!     profile.max_nosso_numero,
//!     profile.current_nosso_numero,
//! );
//!
//! let invoice = Invoice {
//!     source: SourceKind::Manual,
//!     original_file_path: None,
//!     payer_name: "Fulano de Tal".into(),
//!     payer_tax_id: "52998224725".into(),
//!     payer_address: AddressBuilder::new("Sao Paulo", "01310100").build(),
//!     amount_cents: 123_456,
//!     issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!     document_number: "789".into(),
//!     species: "DM".into(),
//!     status: InvoiceStatus::Pending,
//!     linked_boleto_id: None,
//!     deleted_at: None,
//! };
//!
//! let boletos = create_boleto_batch(
//!     &tenant,
//!     &profile,
//!     &sequencer,
//!     &[invoice],
//!     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(boletos.len(), 1);
//! assert_eq!(boletos[0].barcode.len(), 44);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Data model, check digits, sequencers, validators, boleto barcode/digitable-line math, CNAB emission, orchestration |
//! | `fiscal-xml` | NFe/CTe XML extraction via `quick-xml` |
//! | `pdf` | Boleto PDF rendering via `lopdf` |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod boleto;

#[cfg(feature = "core")]
pub mod cnab;

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "fiscal-xml")]
pub mod fiscal_xml;

#[cfg(feature = "core")]
pub mod service;

// Re-export core types at crate root for convenience.
#[cfg(feature = "core")]
pub use crate::core::*;
