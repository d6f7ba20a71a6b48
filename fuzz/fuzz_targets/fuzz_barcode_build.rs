#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use receba::boleto::build_barcode;
use receba::core::BankKind;

fuzz_target!(|data: &[u8]| {
    if data.len() < 17 {
        return;
    }
    let bank = if data[0] & 1 == 0 {
        BankKind::BankA
    } else {
        BankKind::BankB
    };
    let days = i64::from_le_bytes(data[1..9].try_into().unwrap());
    let amount_cents = i64::from_le_bytes(data[9..17].try_into().unwrap());
    let nosso_numero = if data.len() >= 25 {
        u64::from_le_bytes(data[17..25].try_into().unwrap())
    } else {
        0
    };
    let wallet: String = data[..data.len().min(3)]
        .iter()
        .map(|b| (b'0' + b % 10) as char)
        .collect();

    let Some(due_date) = NaiveDate::from_yo_opt(1970, 1).unwrap().checked_add_signed(chrono::Duration::days(days)) else {
        return;
    };

    // Must not panic on any input — overflow and before-epoch dates return Err.
    let _ = build_barcode(bank, due_date, amount_cents, nosso_numero, &wallet);
});
