//! CPF/CNPJ check-digit verification and canonical formatting (C6).

use super::error::ValidationError;

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn all_digits_equal(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    }
}

/// Collapse a modulo-11 remainder into a CPF/CNPJ check digit: remainders
/// under 2 map to 0, everything else maps to `11 - remainder`.
fn collapse(remainder: u32) -> u8 {
    if remainder < 2 { 0 } else { (11 - remainder) as u8 }
}

fn weighted_sum(digits: &[u32], weights: &[u32]) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

/// Validate an 11-digit CPF (Cadastro de Pessoas Físicas).
///
/// Accepts input with or without the usual `NNN.NNN.NNN-NN` punctuation.
pub fn validate_cpf(cpf: &str) -> bool {
    let cpf = digits_only(cpf);
    if cpf.len() != 11 || all_digits_equal(&cpf) {
        return false;
    }
    let digits: Vec<u32> = cpf.chars().map(|c| c.to_digit(10).unwrap()).collect();

    let d1_weights: Vec<u32> = (2..=10).rev().collect();
    let d1 = collapse(weighted_sum(&digits[0..9], &d1_weights) % 11);
    if digits[9] != d1 as u32 {
        return false;
    }

    let d2_weights: Vec<u32> = (2..=11).rev().collect();
    let d2 = collapse(weighted_sum(&digits[0..10], &d2_weights) % 11);
    digits[10] == d2 as u32
}

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate a 14-digit CNPJ (Cadastro Nacional da Pessoa Jurídica).
///
/// Accepts input with or without the usual `NN.NNN.NNN/NNNN-NN` punctuation.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let cnpj = digits_only(cnpj);
    if cnpj.len() != 14 || all_digits_equal(&cnpj) {
        return false;
    }
    let digits: Vec<u32> = cnpj.chars().map(|c| c.to_digit(10).unwrap()).collect();

    let d1 = collapse(weighted_sum(&digits[0..12], &CNPJ_WEIGHTS_1) % 11);
    if digits[12] != d1 as u32 {
        return false;
    }

    let d2 = collapse(weighted_sum(&digits[0..13], &CNPJ_WEIGHTS_2) % 11);
    digits[13] == d2 as u32
}

/// Validate a CPF or CNPJ, dispatching on digit length. Any other length
/// is simply invalid.
pub fn validate(tax_id: &str) -> bool {
    match digits_only(tax_id).len() {
        11 => validate_cpf(tax_id),
        14 => validate_cnpj(tax_id),
        _ => false,
    }
}

/// Validate a tax id, reporting a [`ValidationError`] against `field` on
/// failure. Convenience wrapper for callers collecting multiple problems.
pub fn validate_field(field: &str, tax_id: &str) -> Result<(), ValidationError> {
    if validate(tax_id) {
        Ok(())
    } else {
        Err(ValidationError::with_rule(
            field,
            format!("'{tax_id}' is not a valid CPF or CNPJ"),
            "tax-id-check-digit",
        ))
    }
}

/// Format an 11-digit CPF as `NNN.NNN.NNN-NN`. Returns the input unchanged
/// (digits-only) if it is not 11 digits.
pub fn format_cpf(cpf: &str) -> String {
    let cpf = digits_only(cpf);
    if cpf.len() != 11 {
        return cpf;
    }
    format!(
        "{}.{}.{}-{}",
        &cpf[0..3],
        &cpf[3..6],
        &cpf[6..9],
        &cpf[9..11]
    )
}

/// Format a 14-digit CNPJ as `NN.NNN.NNN/NNNN-NN`. Returns the input
/// unchanged (digits-only) if it is not 14 digits.
pub fn format_cnpj(cnpj: &str) -> String {
    let cnpj = digits_only(cnpj);
    if cnpj.len() != 14 {
        return cnpj;
    }
    format!(
        "{}.{}.{}/{}-{}",
        &cnpj[0..2],
        &cnpj[2..5],
        &cnpj[5..8],
        &cnpj[8..12],
        &cnpj[12..14]
    )
}
