//! Species (espécie) code lookup for BANK_B's detail record.
//!
//! Modeled as an open function rather than a closed enum: adding a species
//! later is a data change here, not a breaking one.

/// Map an invoice/boleto species code (e.g. "DM", "DS") to its two-digit
/// CNAB species code. Unknown species default to "04" (duplicata de
/// serviço), matching the original tool's fallback.
pub fn bank_b_species_code(species: &str) -> &'static str {
    match species {
        "DM" => "02",
        "DS" => "04",
        _ => "04",
    }
}
