//! Febraban barcode, digitable line, and per-bank nosso-número formatting
//! (C3's pure core — PDF rendering lives in [`super::pdf`]).

use chrono::NaiveDate;

use crate::core::{BankKind, ReceivablesError, bank_b_nn_dv, mod10, mod11};

/// Epoch for the "fator vencimento" — days since this date encode the due
/// date inside the barcode (Febraban standard).
const FATOR_VENCIMENTO_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1997, 10, 7) {
    Some(d) => d,
    None => unreachable!(),
};

/// Days between the fator-vencimento epoch and `due_date`, zero-padded to 4
/// digits. Dates before the epoch are rejected; dates whose factor would
/// overflow 4 digits are out of scope per the governing standard.
fn fator_vencimento(due_date: NaiveDate) -> Result<String, ReceivablesError> {
    let days = (due_date - FATOR_VENCIMENTO_EPOCH).num_days();
    if days < 0 {
        return Err(ReceivablesError::Builder(format!(
            "due date {due_date} precedes the fator-vencimento epoch 1997-10-07"
        )));
    }
    if days > 9999 {
        return Err(ReceivablesError::Builder(format!(
            "due date {due_date} overflows the 4-digit fator vencimento"
        )));
    }
    Ok(format!("{days:04}"))
}

/// The 25-digit bank-specific free field (barcode positions 20-44).
///
/// Both banks this crate speaks to share the same shape — literal `'9'` +
/// wallet(3) + nosso-número(12) + trailing zeros — since neither bank
/// manual defines a barcode free field beyond the wallet/nosso-número pair
/// that identifies the boleto; BANK_B's CNAB dialect carries its own
/// "identificação no banco" field instead, but the barcode itself still
/// needs 25 digits per Febraban, so the same construction is reused for
/// both (see DESIGN.md).
fn free_field(wallet: &str, nosso_numero: u64) -> String {
    let padded = format!("{wallet:0>3}");
    let last_three = &padded[padded.len() - 3..];
    format!("9{last_three}{nosso_numero:012}00000000")
        .chars()
        .take(25)
        .collect()
}

/// A computed boleto barcode, plus the derived digitable line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeResult {
    /// 44-digit Febraban barcode.
    pub barcode: String,
    /// 47-digit digitable line, formatted with 3 dots and 4 spaces (54
    /// characters total).
    pub digitable_line: String,
}

/// Compute the 44-digit barcode and 47-digit digitable line for a boleto
/// (C3).
///
/// `amount_cents` must fit in the 10-digit amount field (i.e. be less than
/// 10^10); `wallet` is zero-padded/truncated to 3 digits.
pub fn build_barcode(
    bank: BankKind,
    due_date: NaiveDate,
    amount_cents: i64,
    nosso_numero: u64,
    wallet: &str,
) -> Result<BarcodeResult, ReceivablesError> {
    if amount_cents < 0 {
        return Err(ReceivablesError::Builder(
            "barcode amount must not be negative".into(),
        ));
    }
    if amount_cents >= 10_000_000_000 {
        return Err(ReceivablesError::Builder(format!(
            "amount {amount_cents} overflows the 10-digit barcode amount field"
        )));
    }

    let fator = fator_vencimento(due_date)?;
    let amount_field = format!("{amount_cents:010}");
    let free = free_field(wallet, nosso_numero);

    // 43 digits: bank(3) + currency(1) + fator(4) + amount(10) + free(25).
    let barcode_no_dv = format!("{}9{fator}{amount_field}{free}", bank.code());
    let general_dv = mod11(&barcode_no_dv, 9, 1);
    let barcode = format!("{}9{general_dv}{fator}{amount_field}{free}", bank.code());

    // Group 1: bank(3) + currency(1) + free[0..5) = 9 digits, +DV = 10, split 5/5.
    let group1_data = format!("{}9{}", bank.code(), &free[0..5]);
    let group1_dv = mod10(&group1_data);
    let group1 = format!("{}.{}{group1_dv}", &group1_data[0..5], &group1_data[5..9]);

    // Group 2: free[5..15) = 10 digits, +DV = 11, split 5/6.
    let group2_data = &free[5..15];
    let group2_dv = mod10(group2_data);
    let group2 = format!("{}.{}{group2_dv}", &group2_data[0..5], &group2_data[5..10]);

    // Group 3: free[15..25) = 10 digits, +DV = 11, split 5/6.
    let group3_data = &free[15..25];
    let group3_dv = mod10(group3_data);
    let group3 = format!("{}.{}{group3_dv}", &group3_data[0..5], &group3_data[5..10]);

    let digitable_line = format!("{group1} {group2} {group3} {general_dv} {fator}{amount_field}");

    Ok(BarcodeResult {
        barcode,
        digitable_line,
    })
}

/// Format a BANK_A nosso-número: zero-pad to 12 digits, append '-' and
/// `mod11(nn, base=9, r=0)`.
pub fn format_nosso_numero_bank_a(nosso_numero: u64) -> String {
    let nn = format!("{nosso_numero:012}");
    let dv = mod11(&nn, 9, 0);
    format!("{nn}-{dv}")
}

/// Format a BANK_B nosso-número: zero-pad to 11 digits, append '-' and
/// [`bank_b_nn_dv`].
pub fn format_nosso_numero_bank_b(wallet: &str, nosso_numero: u64) -> String {
    let nn = format!("{nosso_numero:011}");
    let dv = bank_b_nn_dv(wallet, nosso_numero);
    format!("{nn}-{dv}")
}

/// Format the nosso-número for whichever bank a boleto belongs to.
pub fn format_nosso_numero(bank: BankKind, wallet: &str, nosso_numero: u64) -> String {
    match bank {
        BankKind::BankA => format_nosso_numero_bank_a(nosso_numero),
        BankKind::BankB => format_nosso_numero_bank_b(wallet, nosso_numero),
    }
}
