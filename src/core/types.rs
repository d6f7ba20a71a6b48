use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use super::error::ReceivablesError;

/// An amount in integer cents. All money in this crate is cents; `Decimal`
/// is used only at the boundary where a human or an external document
/// supplies a value with a fractional part.
pub type Cents = i64;

/// Convert a decimal amount (as read from a fiscal XML document or entered
/// by hand) into integer cents, rounding half-to-even on the third decimal
/// digit and beyond.
pub fn cents_from_decimal(amount: Decimal) -> Result<Cents, ReceivablesError> {
    if amount.is_sign_negative() {
        return Err(ReceivablesError::MissingRequired(
            "amount must not be negative".into(),
        ));
    }
    let scaled = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    scaled
        .to_string()
        .parse::<Cents>()
        .map_err(|_| ReceivablesError::MissingRequired("amount out of range".into()))
}

/// Convert integer cents back into a two-decimal `Decimal`, e.g. for display.
pub fn decimal_from_cents(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// The two banks this crate knows how to speak to. Each has its own barcode
/// free-field layout, nosso-número check digit rule, and CNAB dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankKind {
    /// Febraban bank code 033 (240-column layered CNAB, mod11/base9/r0 DV).
    BankA,
    /// Febraban bank code 274 (400-column flat CNAB, "P"-fallback DV).
    BankB,
}

impl BankKind {
    /// Three-digit Febraban bank code used in barcodes and CNAB files.
    pub fn code(self) -> &'static str {
        match self {
            Self::BankA => "033",
            Self::BankB => "274",
        }
    }

    /// Legal name of the bank as printed on CNAB file headers.
    pub fn legal_name(self) -> &'static str {
        match self {
            Self::BankA => "BANCO SANTANDER",
            Self::BankB => "BMP MONEY PLUS",
        }
    }
}

/// A postal address, shared by tenants and payers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter state abbreviation (e.g. "SP").
    pub state: String,
    /// Digits-only postal code (CEP), 8 digits.
    pub postal_code: String,
}

/// The account number split the way Brazilian bank manuals expect it: the
/// body and its own single check digit, kept apart because the two are
/// formatted into different CNAB columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Digits-only account number, without its check digit.
    pub body: String,
    /// Single check digit character, as issued by the bank (not recomputed
    /// by this crate — it belongs to the account, not to a boleto).
    pub check_digit: String,
}

/// Per-bank financial-instruction policy attached to a boleto at emission
/// time: interest, protest, and automatic write-off behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionPolicy {
    /// Monthly interest rate as a percentage (e.g. `dec!(1.0)` = 1%/month).
    pub monthly_interest_percent: Option<Decimal>,
    /// Fine percentage applied once past due.
    pub fine_percent: Option<Decimal>,
    /// Days past due before the bank is instructed to protest.
    pub protest_days: Option<u32>,
    /// Days past due before the bank is instructed to write off
    /// (baixar) the boleto automatically.
    pub writeoff_days: Option<u32>,
}

/// An issuing party (cedente): the tenant of this middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub display_name: String,
    pub legal_name: String,
    /// 14-digit CNPJ, digits only.
    pub cnpj: String,
    pub address: Address,
}

/// Per-(Tenant, BankKind) configuration: everything C3/C4/C5 need to build
/// a boleto or emit a remittance file for this bank, without reaching back
/// into a database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankProfile {
    pub bank: BankKind,
    pub agency: String,
    pub account: Account,
    /// Wallet/carteira code (e.g. "101" for BankA, "109" for BankB).
    pub wallet: String,
    /// Agreement/convênio code.
    pub agreement: String,
    /// Explicit transmission code, if the bank assigned one; otherwise
    /// CNAB header generation derives one from agency + account.
    pub transmission_code: Option<String>,
    /// Lowest nosso-número this profile may allocate.
    pub min_nosso_numero: u64,
    /// Highest nosso-número this profile may allocate (inclusive).
    pub max_nosso_numero: u64,
    /// Next nosso-número to be allocated. Mutated only through the
    /// sequencer (`core::sequencer`), never written directly.
    pub current_nosso_numero: u64,
    pub active: bool,
    pub instructions: InstructionPolicy,
}

/// Where an [`Invoice`]'s data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Nfe,
    Cte,
    Manual,
}

/// Lifecycle status of an [`Invoice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Linked,
    Void,
}

/// One fiscal document: an electronic invoice (NFe), transport note (CTe),
/// or a manually entered receivable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub source: SourceKind,
    pub original_file_path: Option<String>,
    pub payer_name: String,
    /// Digits-only CPF (11) or CNPJ (14).
    pub payer_tax_id: String,
    pub payer_address: Address,
    pub amount_cents: Cents,
    pub issue_date: NaiveDate,
    pub document_number: String,
    /// Species (espécie) code, e.g. "DM" (duplicata mercantil). Defaults
    /// to "DM" when not supplied by the source document.
    pub species: String,
    pub status: InvoiceStatus,
    pub linked_boleto_id: Option<String>,
    pub deleted_at: Option<chrono::NaiveDateTime>,
}

/// Lifecycle status of a [`Boleto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoletoStatus {
    Pending,
    Approved,
    Registered,
    Cancelled,
}

/// A bank slip, aggregating one or more invoices sharing the same tenant
/// and payer tax id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boleto {
    pub id: String,
    pub bank: BankKind,
    pub payer_name: String,
    pub payer_tax_id: String,
    pub payer_address: Address,
    pub amount_cents: Cents,
    pub due_date: NaiveDate,
    pub issue_date: NaiveDate,
    pub species: String,
    /// Raw numeric nosso-número, without bank-specific check digit.
    pub nosso_numero: u64,
    /// Formatted nosso-número, including its check digit (e.g.
    /// "000000000001-0" for BankA).
    pub nosso_numero_formatted: String,
    /// 44-digit Febraban barcode.
    pub barcode: String,
    /// 47-character digitable line (with separators).
    pub digitable_line: String,
    pub status: BoletoStatus,
    pub deleted_at: Option<chrono::NaiveDateTime>,
}

/// An emitted remittance file: an opaque byte sequence plus the filename
/// and per-(tenant, bank) sequence number it was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemittanceFile {
    pub filename: String,
    pub sequence: u32,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cents_from_decimal_basic() {
        assert_eq!(cents_from_decimal(dec!(1234.56)).unwrap(), 123456);
        assert_eq!(cents_from_decimal(dec!(0.00)).unwrap(), 0);
    }

    #[test]
    fn cents_from_decimal_rounds_half_to_even() {
        // 1.005 rounds to the nearest even cent (1.00), not always up.
        assert_eq!(cents_from_decimal(dec!(1.005)).unwrap(), 100);
        assert_eq!(cents_from_decimal(dec!(1.015)).unwrap(), 102);
    }

    #[test]
    fn cents_from_decimal_rejects_negative() {
        assert!(cents_from_decimal(dec!(-1.00)).is_err());
    }

    #[test]
    fn decimal_from_cents_roundtrip() {
        assert_eq!(decimal_from_cents(123456), dec!(1234.56));
    }

    #[test]
    fn bank_kind_codes() {
        assert_eq!(BankKind::BankA.code(), "033");
        assert_eq!(BankKind::BankB.code(), "274");
    }
}
