//! BANK_B (Febraban code 274, BMP Money Plus) 400-column flat CNAB
//! remittance emitter: Header, Detail* (one per boleto), Trailer.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{BankProfile, Boleto, ReceivablesError, Tenant, bank_b_nn_dv};

use super::primitives::{num, text};
use super::species::bank_b_species_code;

const COLS: usize = 400;

fn build_error(field: &str, message: impl Into<String>) -> ReceivablesError {
    ReceivablesError::CnabBuildError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn num_or_err(field: &str, v: i64, n: usize, d: u32) -> Result<String, ReceivablesError> {
    num(v, n, d).ok_or_else(|| build_error(field, format!("value {v} does not fit in {n} digits")))
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn header(tenant: &Tenant, profile: &BankProfile, generation_date: NaiveDate) -> Result<String, ReceivablesError> {
    let mut s = String::with_capacity(COLS);
    s.push('0');
    s.push('1');
    s.push_str("REMESSA");
    s.push_str("01");
    s.push_str(&text("COBRANCA", 15));
    s.push_str(&text(&profile.agreement, 20));
    s.push_str(&text(&tenant.legal_name, 30));
    s.push_str("274");
    s.push_str(&text("BMP MONEY PLUS", 15));
    s.push_str(&generation_date.format("%d%m%y").to_string());
    s.push_str(&" ".repeat(8));
    s.push_str("MX");
    s.push_str(&num_or_err("file_sequence", 1, 7, 0)?);
    s.push_str(&" ".repeat(277));
    s.push_str(&num_or_err("record_sequence", 1, 6, 0)?);
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn bank_identification(profile: &BankProfile) -> Result<String, ReceivablesError> {
    let wallet: i64 = profile
        .wallet
        .parse()
        .map_err(|_| build_error("wallet", "wallet is not numeric"))?;
    let agency: i64 = profile
        .agency
        .parse()
        .map_err(|_| build_error("agency", "agency is not numeric"))?;
    let body: i64 = profile
        .account
        .body
        .parse()
        .map_err(|_| build_error("account.body", "account body is not numeric"))?;
    let dv = profile.account.check_digit.chars().next().unwrap_or('0');
    Ok(format!(
        "0{}{}{}{dv}",
        num_or_err("wallet", wallet, 3, 0)?,
        num_or_err("agency", agency, 5, 0)?,
        num_or_err("account.body", body, 7, 0)?,
    ))
}

fn instructions(profile: &BankProfile) -> (&'static str, &'static str) {
    let instr1 = match (profile.instructions.protest_days, profile.instructions.writeoff_days) {
        (Some(d), _) if d > 0 => "09",
        (_, Some(d)) if d > 0 => "15",
        _ => "00",
    };
    (instr1, "00")
}

fn interest_per_day(profile: &BankProfile, amount_cents: i64) -> Result<i64, ReceivablesError> {
    match profile.instructions.monthly_interest_percent {
        Some(rate) if rate > Decimal::ZERO => {
            let amount = Decimal::new(amount_cents, 2);
            let daily = (amount * rate) / Decimal::new(3000, 0);
            let daily_cents = (daily * Decimal::from(100))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
            daily_cents
                .to_string()
                .parse()
                .map_err(|_| build_error("instructions.monthly_interest_percent", "daily interest out of range"))
        }
        _ => Ok(0),
    }
}

fn detail(
    tenant: &Tenant,
    profile: &BankProfile,
    boleto: &Boleto,
    sequence: u32,
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let cnpj: i64 = digits_only(&tenant.cnpj)
        .parse()
        .map_err(|_| build_error("tenant.cnpj", "CNPJ is not numeric"))?;
    let dv_nn = bank_b_nn_dv(&profile.wallet, boleto.nosso_numero);

    let doc_digits = digits_only(&boleto.payer_tax_id);
    let tipo_insc = if doc_digits.len() > 11 { "02" } else { "01" };
    let doc_num: i64 = doc_digits
        .parse()
        .map_err(|_| build_error("payer_tax_id", "payer tax id is not numeric"))?;
    let zip = digits_only(&boleto.payer_address.postal_code);
    let zip_num: i64 = zip.parse().unwrap_or(0);

    let (instr1, instr2) = instructions(profile);
    let daily_interest_cents = interest_per_day(profile, boleto.amount_cents)?;

    let mut s = String::with_capacity(COLS);
    s.push('1');
    s.push_str("02");
    s.push_str(&num_or_err("tenant.cnpj", cnpj, 14, 0)?);
    s.push('0');
    s.push('0');
    s.push(' ');
    s.push_str(&bank_identification(profile)?);
    s.push_str(&text(&boleto.id, 25));
    s.push_str(&"0".repeat(8));
    s.push_str(&num_or_err("nosso_numero", boleto.nosso_numero as i64, 11, 0)?);
    s.push(dv_nn);
    s.push_str(&"0".repeat(10));
    s.push('2');
    s.push('N');
    s.push_str(&" ".repeat(13));
    s.push('I');
    s.push_str("01");
    s.push_str(&text(&boleto.id, 10));
    s.push_str(&boleto.due_date.format("%d%m%y").to_string());
    s.push_str(&num_or_err("amount_cents", boleto.amount_cents, 13, 0)?);
    s.push_str("274");
    s.push_str("00000");
    s.push_str(bank_b_species_code(&boleto.species));
    s.push('N');
    s.push_str(&generation_date.format("%d%m%y").to_string());
    s.push_str(instr1);
    s.push_str(instr2);
    s.push_str(&num_or_err("instructions.monthly_interest_percent", daily_interest_cents, 13, 0)?);
    s.push_str("000000");
    s.push_str(&"0".repeat(13));
    s.push_str(&"0".repeat(13));
    s.push_str(&"0".repeat(13));
    s.push_str(tipo_insc);
    s.push_str(&num_or_err("payer_tax_id", doc_num, 14, 0)?);
    s.push_str(&text(&boleto.payer_name, 40));
    s.push_str(&text(&boleto.payer_address.street, 40));
    s.push_str(&text(&boleto.payer_address.neighborhood, 12));
    s.push_str(&num_or_err("payer_address.postal_code", zip_num, 8, 0)?);
    s.push_str(&text(&boleto.payer_address.city, 15));
    s.push_str(&text(&boleto.payer_address.state, 2));
    s.push_str(&" ".repeat(42));
    s.push('0');
    s.push_str(&num_or_err("record_sequence", sequence as i64, 6, 0)?);
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn trailer(sequence: u32) -> Result<String, ReceivablesError> {
    let mut s = String::with_capacity(COLS);
    s.push('9');
    s.push_str(&" ".repeat(393));
    s.push_str(&num_or_err("record_sequence", sequence as i64, 6, 0)?);
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

/// Emit a full BANK_B 400-column remittance file for `boletos`, joined with
/// CRLF and no trailing newline.
pub fn emit(
    tenant: &Tenant,
    profile: &BankProfile,
    boletos: &[Boleto],
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let mut lines = Vec::with_capacity(2 + boletos.len());
    lines.push(header(tenant, profile, generation_date)?);

    let mut sequence = 2u32;
    for boleto in boletos {
        lines.push(detail(tenant, profile, boleto, sequence, generation_date)?);
        sequence += 1;
    }
    lines.push(trailer(sequence)?);

    Ok(lines.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Account, Address, BankKind, BoletoStatus, InstructionPolicy};

    fn sample_tenant() -> Tenant {
        Tenant {
            display_name: "ACME".into(),
            legal_name: "ACME LTDA".into(),
            cnpj: "11222333000181".into(),
            address: Address {
                street: String::new(),
                number: String::new(),
                neighborhood: String::new(),
                city: String::new(),
                state: String::new(),
                postal_code: String::new(),
            },
        }
    }

    fn sample_profile() -> BankProfile {
        BankProfile {
            bank: BankKind::BankB,
            agency: "1234".into(),
            account: Account {
                body: "456789".into(),
                check_digit: "0".into(),
            },
            wallet: "109".into(),
            agreement: "998877".into(),
            transmission_code: None,
            min_nosso_numero: 1,
            max_nosso_numero: 999_999_999,
            current_nosso_numero: 1,
            active: true,
            instructions: InstructionPolicy::default(),
        }
    }

    fn sample_boleto() -> Boleto {
        Boleto {
            id: "b-1".into(),
            bank: BankKind::BankB,
            payer_name: "Fulano de Tal".into(),
            payer_tax_id: "52998224725".into(),
            payer_address: Address {
                street: "Av. Paulista".into(),
                number: "1000".into(),
                neighborhood: "Bela Vista".into(),
                city: "Sao Paulo".into(),
                state: "SP".into(),
                postal_code: "01310100".into(),
            },
            amount_cents: 123_456,
            due_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            species: "DM".into(),
            nosso_numero: 1,
            nosso_numero_formatted: "00000000001-0".into(),
            barcode: "0".repeat(44),
            digitable_line: String::new(),
            status: BoletoStatus::Pending,
            deleted_at: None,
        }
    }

    #[test]
    fn every_record_is_400_columns() {
        let out = emit(
            &sample_tenant(),
            &sample_profile(),
            &[sample_boleto()],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
        .unwrap();
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.chars().count(), COLS);
        }
    }

    #[test]
    fn header_starts_with_record_type_and_literal() {
        let out = emit(
            &sample_tenant(),
            &sample_profile(),
            &[sample_boleto()],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
        .unwrap();
        let header_line = out.split("\r\n").next().unwrap();
        assert_eq!(&header_line[0..2], "01");
        assert_eq!(&header_line[2..9], "REMESSA");
    }

    #[test]
    fn trailer_starts_with_nine_and_ends_with_sequence() {
        let out = emit(
            &sample_tenant(),
            &sample_profile(),
            &[sample_boleto(), sample_boleto()],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
        .unwrap();
        let trailer_line = out.split("\r\n").last().unwrap();
        assert!(trailer_line.starts_with('9'));
        assert_eq!(&trailer_line[394..400], "000004");
    }

    #[test]
    fn rejects_non_numeric_wallet() {
        let mut profile = sample_profile();
        profile.wallet = "abc".into();
        let err = emit(
            &sample_tenant(),
            &profile,
            &[sample_boleto()],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        assert!(err.is_err());
    }
}
