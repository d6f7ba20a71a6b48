#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic — malformed/unknown-kind/missing-field errors are
        // fine, panics are bugs.
        let _ = receba::fiscal_xml::extract_invoice(s);
    }
});
