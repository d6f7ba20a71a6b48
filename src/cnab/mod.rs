//! CNAB remittance emission (C5): dispatches to the BANK_A 240-column
//! layered emitter or the BANK_B 400-column flat emitter by [`BankKind`].

mod bank_a;
mod bank_b;
mod primitives;
mod species;

pub use species::bank_b_species_code;

use chrono::NaiveDate;

use crate::core::{BankKind, BankProfile, Boleto, ReceivablesError, Tenant};

/// Emit a remittance body (without filename/sequence metadata) for
/// `boletos`, dispatching on `profile.bank`. Latin-1-safe text, CRLF line
/// terminators, no trailing newline.
pub fn emit(
    tenant: &Tenant,
    profile: &BankProfile,
    boletos: &[Boleto],
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    match profile.bank {
        BankKind::BankA => bank_a::emit(tenant, profile, boletos, generation_date),
        BankKind::BankB => bank_b::emit(tenant, profile, boletos, generation_date),
    }
}

/// Encode `body` to ISO-8859-1 (Latin-1) bytes, one byte per Unicode scalar
/// value, for the byte-exact 240/400-column files the banks consume.
///
/// `String` is always UTF-8; naively calling `.into_bytes()` on a body
/// containing an accented character (any `xNome`/`payer_name` with "ã",
/// "ç", "é"...) emits two bytes for a column the fixed-width layout counted
/// as one, shifting every field after it. Every Latin-1 code point maps
/// 1:1 onto the Unicode code points U+0000..=U+00FF, so the conversion is
/// exact for anything in that range and impossible outside it.
pub fn encode_latin1(body: &str) -> Result<Vec<u8>, ReceivablesError> {
    let mut bytes = Vec::with_capacity(body.len());
    for c in body.chars() {
        let code = c as u32;
        if code > 0xFF {
            return Err(ReceivablesError::CnabBuildError {
                field: "remittance_body".into(),
                message: format!("character '{c}' (U+{code:04X}) has no Latin-1 representation"),
            });
        }
        bytes.push(code as u8);
    }
    Ok(bytes)
}
