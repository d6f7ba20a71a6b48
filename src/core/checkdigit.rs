//! Modulo-10 and modulo-11 check-digit primitives shared by the barcode,
//! digitable line, and nosso-número formatters.

/// Modulo-10 check digit (used for the three digitable-line group DVs).
///
/// Weights alternate 2, 1, 2, 1… right-to-left; any product greater than 9
/// collapses by summing its own digits before accumulating.
pub fn mod10(s: &str) -> u8 {
    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for ch in s.chars().rev() {
        let digit = ch.to_digit(10).unwrap_or(0);
        let product = digit * weight;
        sum += if product > 9 { product - 9 } else { product };
        weight = if weight == 2 { 1 } else { 2 };
    }
    ((10 - (sum % 10)) % 10) as u8
}

/// Modulo-11 check digit with a configurable weight cycle and fallback.
///
/// Weights cycle `2..=base` right-to-left. When `11 - (sum % 11)` would be
/// 10 or 11, the caller-supplied fallback `r` is returned instead — the
/// barcode's general DV and the BankA nosso-número DV use different
/// fallbacks (1 and 0 respectively) per their governing manuals, so callers
/// always pass `r` explicitly rather than rely on a shared default.
pub fn mod11(s: &str, base: u32, r: u8) -> u8 {
    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for ch in s.chars().rev() {
        let digit = ch.to_digit(10).unwrap_or(0);
        sum += digit * weight;
        weight = if weight == base { 2 } else { weight + 1 };
    }
    let remainder = sum % 11;
    let result = 11_i32 - remainder as i32;
    if result >= 10 { r } else { result as u8 }
}

/// BankB's nosso-número check digit (Manual pág. 13): wallet prepended to
/// the zero-padded 11-digit nosso-número, weights cycle 2..7, and a
/// remainder of 1 returns the literal character `'P'` instead of a digit.
pub fn bank_b_nn_dv(wallet: &str, nosso_numero: u64) -> char {
    let base_calc = format!("{wallet}{nosso_numero:011}");
    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for ch in base_calc.chars().rev() {
        let digit = ch.to_digit(10).unwrap_or(0);
        sum += digit * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }
    let remainder = sum % 11;
    match remainder {
        0 => '0',
        1 => 'P',
        _ => std::char::from_digit(11 - remainder, 10).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod10_known_value() {
        // 341 -> 3*2=6, 4*1=4, 1*2=2 -> sum 12 -> (10-2)%10 = 8
        assert_eq!(mod10("341"), 8);
    }

    #[test]
    fn mod10_digit_sum_collapse() {
        // 9 * 2 = 18 -> collapses to 1+8=9
        assert_eq!(mod10("9"), (10 - 9) % 10);
    }

    #[test]
    fn mod11_fallback_applies() {
        // A string of zeros sums to zero; 11 - 0 = 11 -> fallback
        assert_eq!(mod11("0000", 9, 1), 1);
        assert_eq!(mod11("0000", 9, 0), 0);
    }

    #[test]
    fn bank_b_nn_dv_scenarios() {
        assert_eq!(bank_b_nn_dv("109", 1), '0');
        assert_eq!(bank_b_nn_dv("1", 1), 'P');
    }

    #[test]
    fn bank_b_nn_dv_is_deterministic() {
        let a = bank_b_nn_dv("101", 123456);
        let b = bank_b_nn_dv("101", 123456);
        assert_eq!(a, b);
    }
}
