use receba::core::validators::*;

#[test]
fn idempotent_under_validate_format_round_trip() {
    // §8: formatting CPF/CNPJ is idempotent under validate ∘ strip.
    for raw in ["52998224725", "11222333000181"] {
        let formatted = if raw.len() == 11 {
            format_cpf(raw)
        } else {
            format_cnpj(raw)
        };
        assert!(validate(&formatted));
        let reformatted = if raw.len() == 11 {
            format_cpf(&formatted)
        } else {
            format_cnpj(&formatted)
        };
        assert_eq!(formatted, reformatted);
    }
}

#[test]
fn validate_rejects_cpf_with_both_check_digits_tampered() {
    assert!(!validate_cpf("52998224700"));
}

#[test]
fn validate_rejects_length_that_is_neither_cpf_nor_cnpj() {
    assert!(!validate("123456789012"));
}

#[test]
fn format_cpf_passes_through_wrong_length_unchanged() {
    assert_eq!(format_cpf("123"), "123");
}

#[test]
fn format_cnpj_passes_through_wrong_length_unchanged() {
    assert_eq!(format_cnpj("123"), "123");
}
