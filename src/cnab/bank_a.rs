//! BANK_A (Febraban code 033) 240-column layered CNAB remittance emitter:
//! FileHeader, BatchHeader, (SegmentP, SegmentQ)* one pair per boleto,
//! BatchTrailer, FileTrailer.

use chrono::NaiveDate;

use crate::core::{Account, BankProfile, Boleto, ReceivablesError, Tenant};

use super::primitives::{num, text};

const COLS: usize = 240;

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

fn account_dv_char(account: &Account) -> char {
    account.check_digit.chars().next().unwrap_or('0')
}

fn transmission_code(profile: &BankProfile) -> Result<String, ReceivablesError> {
    if let Some(code) = &profile.transmission_code {
        let n: i64 = digits_only(code)
            .parse()
            .map_err(|_| build_error("transmission_code", "transmission code is not numeric"))?;
        return num_or_err("transmission_code", n, 15, 0);
    }
    let agency = num_or_err("agency", profile.agency.parse().unwrap_or(0), 4, 0)?;
    let body: i64 = profile
        .account
        .body
        .parse()
        .map_err(|_| build_error("account.body", "account body is not numeric"))?;
    let body_field = num_or_err("account.body", body, 9, 0)?;
    Ok(format!(
        "{agency} {body_field}{}",
        account_dv_char(&profile.account)
    ))
}

fn file_header(
    tenant: &Tenant,
    profile: &BankProfile,
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let cnpj: i64 = digits_only(&tenant.cnpj)
        .parse()
        .map_err(|_| build_error("tenant.cnpj", "CNPJ is not numeric"))?;
    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("0000");
    s.push('0');
    s.push_str(&" ".repeat(8));
    s.push('2');
    s.push_str(&num_or_err("tenant.cnpj", cnpj, 15, 0)?);
    s.push_str(&transmission_code(profile)?);
    s.push_str(&" ".repeat(25));
    s.push_str(&text(&tenant.legal_name, 30));
    s.push_str(&text("BANCO SANTANDER", 30));
    s.push_str(&" ".repeat(10));
    s.push('1');
    s.push_str(&generation_date.format("%d%m%Y").to_string());
    s.push_str(&" ".repeat(6));
    s.push_str(&num_or_err("file_sequence", 1, 6, 0)?);
    s.push_str("040");
    s.push_str(&" ".repeat(74));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn batch_header(
    tenant: &Tenant,
    profile: &BankProfile,
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let cnpj: i64 = digits_only(&tenant.cnpj)
        .parse()
        .map_err(|_| build_error("tenant.cnpj", "CNPJ is not numeric"))?;
    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("0001");
    s.push('1');
    s.push('R');
    s.push_str("01");
    s.push_str("  ");
    s.push_str("030");
    s.push(' ');
    s.push('2');
    s.push_str(&num_or_err("tenant.cnpj", cnpj, 15, 0)?);
    s.push_str(&" ".repeat(20));
    s.push_str(&transmission_code(profile)?);
    s.push_str(&" ".repeat(5));
    s.push_str(&text(&tenant.legal_name, 30));
    s.push_str(&" ".repeat(40));
    s.push_str(&" ".repeat(40));
    s.push_str(&num_or_err("batch_sequence", 1, 8, 0)?);
    s.push_str(&generation_date.format("%d%m%Y").to_string());
    s.push_str(&" ".repeat(41));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn interest_block(profile: &BankProfile, amount_cents: i64) -> Result<String, ReceivablesError> {
    match profile.instructions.monthly_interest_percent {
        Some(rate) if rate > rust_decimal::Decimal::ZERO => {
            let amount = rust_decimal::Decimal::new(amount_cents, 2);
            let daily = (amount * rate / rust_decimal::Decimal::from(100)) / rust_decimal::Decimal::from(30);
            // num() truncates (§4.5), it does not round — unlike BANK_B's
            // interest-per-day field, which the spec explicitly calls out
            // as rounded half-even.
            let daily_cents = (daily * rust_decimal::Decimal::from(100)).trunc();
            let daily_cents: i64 = daily_cents
                .to_string()
                .parse()
                .map_err(|_| build_error("instructions.monthly_interest_percent", "daily interest out of range"))?;
            Ok(format!(
                "1{}{}",
                "0".repeat(8),
                num_or_err("instructions.monthly_interest_percent", daily_cents, 15, 0)?
            ))
        }
        _ => Ok(format!("0{}{}", "0".repeat(8), "0".repeat(15))),
    }
}

fn protest_block(profile: &BankProfile) -> Result<String, ReceivablesError> {
    match profile.instructions.protest_days {
        Some(days) if days > 0 => Ok(format!("1{}", num_or_err("instructions.protest_days", days as i64, 2, 0)?)),
        _ => Ok("3".to_string() + "00"),
    }
}

fn writeoff_block(profile: &BankProfile) -> Result<String, ReceivablesError> {
    match profile.instructions.writeoff_days {
        Some(days) if days > 0 => Ok(format!(
            "10{}",
            num_or_err("instructions.writeoff_days", days as i64, 2, 0)?
        )),
        _ => Ok("10".to_string() + "90"),
    }
}

fn segment_p(
    profile: &BankProfile,
    boleto: &Boleto,
    sequence: u32,
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let body: i64 = profile
        .account
        .body
        .parse()
        .map_err(|_| build_error("account.body", "account body is not numeric"))?;
    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("0001");
    s.push('3');
    s.push_str(&num_or_err("segment_p.sequence", sequence as i64, 5, 0)?);
    s.push('P');
    s.push(' ');
    s.push_str("01");
    s.push_str(&num_or_err("agency", profile.agency.parse().unwrap_or(0), 4, 0)?);
    s.push('0');
    s.push_str(&num_or_err("account.body", body, 9, 0)?);
    s.push(account_dv_char(&profile.account));
    s.push_str(&"0".repeat(9));
    s.push('0');
    s.push_str("  ");
    s.push_str(&num_or_err("nosso_numero", boleto.nosso_numero as i64, 13, 0)?);
    s.push('5');
    s.push('1');
    s.push('1');
    s.push(' ');
    s.push(' ');
    s.push_str(&text(&boleto.id, 15));
    s.push_str(&boleto.due_date.format("%d%m%Y").to_string());
    s.push_str(&num_or_err("amount_cents", boleto.amount_cents, 15, 0)?);
    s.push_str("0000");
    s.push('0');
    s.push(' ');
    s.push_str("04");
    s.push('N');
    s.push_str(&boleto.issue_date.format("%d%m%Y").to_string());
    s.push_str(&interest_block(profile, boleto.amount_cents)?);
    s.push('0');
    s.push_str(&"0".repeat(8));
    s.push_str(&"0".repeat(15));
    s.push_str(&"0".repeat(15));
    s.push_str(&"0".repeat(15));
    s.push_str(&text(&boleto.id, 25));
    s.push_str(&protest_block(profile)?);
    s.push_str(&writeoff_block(profile)?);
    s.push_str("09");
    s.push_str(&" ".repeat(11));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn segment_q(boleto: &Boleto, sequence: u32) -> Result<String, ReceivablesError> {
    let doc_digits = digits_only(&boleto.payer_tax_id);
    let tipo_insc = if doc_digits.len() > 11 { "2" } else { "1" };
    let doc_num: i64 = doc_digits
        .parse()
        .map_err(|_| build_error("payer_tax_id", "payer tax id is not numeric"))?;
    let zip = digits_only(&boleto.payer_address.postal_code);
    let zip5 = zip.get(0..5).unwrap_or("").parse().unwrap_or(0);
    let zip3 = zip.get(5..).unwrap_or("").parse().unwrap_or(0);

    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("0001");
    s.push('3');
    s.push_str(&num_or_err("segment_q.sequence", sequence as i64, 5, 0)?);
    s.push('Q');
    s.push(' ');
    s.push_str("01");
    s.push_str(tipo_insc);
    s.push_str(&num_or_err("payer_tax_id", doc_num, 15, 0)?);
    s.push_str(&text(&boleto.payer_name, 40));
    s.push_str(&text(&boleto.payer_address.street, 40));
    s.push_str(&text(&boleto.payer_address.neighborhood, 15));
    s.push_str(&num_or_err("payer_address.postal_code", zip5, 5, 0)?);
    s.push_str(&num_or_err("payer_address.postal_code", zip3, 3, 0)?);
    s.push_str(&text(&boleto.payer_address.city, 15));
    s.push_str(&text(&boleto.payer_address.state, 2));
    s.push('0');
    s.push_str(&"0".repeat(15));
    s.push_str(&" ".repeat(40));
    s.push_str(&" ".repeat(3));
    s.push_str(&" ".repeat(3));
    s.push_str(&" ".repeat(3));
    s.push_str(&" ".repeat(3));
    s.push_str(&" ".repeat(19));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn batch_trailer(records_in_batch: u32) -> Result<String, ReceivablesError> {
    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("0001");
    s.push('5');
    s.push_str(&" ".repeat(9));
    s.push_str(&num_or_err("records_in_batch", records_in_batch as i64, 6, 0)?);
    s.push_str(&" ".repeat(217));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

fn file_trailer(total_records: u32) -> Result<String, ReceivablesError> {
    let mut s = String::with_capacity(COLS);
    s.push_str("033");
    s.push_str("9999");
    s.push('9');
    s.push_str(&" ".repeat(9));
    s.push_str(&num_or_err("batch_count", 1, 6, 0)?);
    s.push_str(&num_or_err("total_records", total_records as i64, 6, 0)?);
    s.push_str(&" ".repeat(211));
    debug_assert_eq!(s.len(), COLS);
    Ok(s)
}

/// Emit a full BANK_A 240-column remittance file for `boletos`, joined with
/// CRLF and no trailing newline.
pub fn emit(
    tenant: &Tenant,
    profile: &BankProfile,
    boletos: &[Boleto],
    generation_date: NaiveDate,
) -> Result<String, ReceivablesError> {
    let mut lines = Vec::with_capacity(4 + boletos.len() * 2);
    lines.push(file_header(tenant, profile, generation_date)?);
    lines.push(batch_header(tenant, profile, generation_date)?);

    let mut sequence = 1u32;
    for boleto in boletos {
        lines.push(segment_p(profile, boleto, sequence, generation_date)?);
        sequence += 1;
        lines.push(segment_q(boleto, sequence)?);
        sequence += 1;
    }

    let records_in_batch = 2 + 2 * boletos.len() as u32;
    lines.push(batch_trailer(records_in_batch)?);

    let total_records = lines.len() as u32 + 1;
    lines.push(file_trailer(total_records)?);

    Ok(lines.join("\r\n"))
}
