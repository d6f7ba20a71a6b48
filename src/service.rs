//! Top-level orchestration (§6 of the governing design): ties the
//! nosso-número sequencer, the remittance sequencer, barcode/digitable-line
//! computation, and the CNAB emitters into the two transactional operations
//! a collaborator actually calls.
//!
//! Persistence, authentication, and audit logging are collaborator
//! concerns; both functions here are pure over their explicit arguments —
//! the caller is expected to load the tenant/profile/invoices from storage
//! and persist the returned boletos/remittance file itself.

use chrono::NaiveDate;

use crate::boleto::{build_barcode, format_nosso_numero};
use crate::cnab;
use crate::core::{
    Allocation, BankProfile, Boleto, BoletoBuilder, BoletoStatus, CounterKey, Invoice,
    NossoNumeroSequencer, ReceivablesError, RemittanceFile, RemittanceSequencer, Tenant,
    remittance_filename,
};

/// Aggregate `invoices` into one boleto per distinct payer tax id,
/// allocating a nosso-número and computing the barcode/digitable line for
/// each. All allocations for this batch commit together at the end, so a
/// failure partway through (e.g. a later group exhausts the counter) leaves
/// every earlier allocation uncommitted and therefore rolled back.
pub fn create_boleto_batch(
    tenant: &Tenant,
    profile: &BankProfile,
    sequencer: &NossoNumeroSequencer,
    invoices: &[Invoice],
    issue_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<Vec<Boleto>, ReceivablesError> {
    if !profile.active {
        return Err(ReceivablesError::BankDisabled(format!(
            "bank profile for tenant {} / bank {} is not active",
            tenant.cnpj,
            profile.bank.code()
        )));
    }

    let mut groups: Vec<(&str, Vec<Invoice>)> = Vec::new();
    for invoice in invoices {
        match groups
            .iter_mut()
            .find(|(tax_id, _)| *tax_id == invoice.payer_tax_id)
        {
            Some((_, group)) => group.push(invoice.clone()),
            None => groups.push((invoice.payer_tax_id.as_str(), vec![invoice.clone()])),
        }
    }

    let key = CounterKey::new(tenant.cnpj.clone(), profile.bank.code());
    let mut boletos = Vec::with_capacity(groups.len());
    let mut allocations: Vec<Allocation<'_>> = Vec::with_capacity(groups.len());

    for (_, group) in groups {
        let allocation = sequencer.allocate(key.clone())?;
        let nosso_numero = allocation.value();

        let mut builder = BoletoBuilder::new(
            format!("{}-{nosso_numero}", tenant.cnpj),
            profile.bank,
            issue_date,
        )
        .due_date(due_date)
        .nosso_numero(nosso_numero);
        for invoice in group {
            builder = builder.add_invoice(invoice);
        }
        let mut boleto = builder.build()?;

        let barcode = build_barcode(
            profile.bank,
            due_date,
            boleto.amount_cents,
            nosso_numero,
            &profile.wallet,
        )?;
        boleto.barcode = barcode.barcode;
        boleto.digitable_line = barcode.digitable_line;
        boleto.nosso_numero_formatted =
            format_nosso_numero(profile.bank, &profile.wallet, nosso_numero);

        boletos.push(boleto);
        allocations.push(allocation);
    }

    for allocation in allocations {
        allocation.commit();
    }

    Ok(boletos)
}

/// Emit a CNAB remittance file for `boletos`, all belonging to `tenant` and
/// `profile`'s bank, advancing the per-(tenant, bank) remittance sequence
/// and naming the file from `generation_date`.
///
/// Takes a single tenant explicitly — fan-out across tenants sharing a bank
/// is the caller's responsibility, exercised by calling once per tenant.
pub fn emit_remittance(
    tenant: &Tenant,
    profile: &BankProfile,
    remittance_sequencer: &RemittanceSequencer,
    boletos: &[Boleto],
    generation_date: NaiveDate,
) -> Result<RemittanceFile, ReceivablesError> {
    if !profile.active {
        return Err(ReceivablesError::BankDisabled(format!(
            "bank profile for tenant {} / bank {} is not active",
            tenant.cnpj,
            profile.bank.code()
        )));
    }
    if let Some(cancelled) = boletos.iter().find(|b| b.status == BoletoStatus::Cancelled) {
        return Err(ReceivablesError::Conflict(format!(
            "boleto {} is cancelled and cannot be remitted",
            cancelled.id
        )));
    }

    let body = cnab::emit(tenant, profile, boletos, generation_date)?;
    let bytes = cnab::encode_latin1(&body)?;

    let key = CounterKey::new(tenant.cnpj.clone(), profile.bank.code());
    let sequence = remittance_sequencer.next(key);
    let filename = remittance_filename(generation_date, sequence);

    Ok(RemittanceFile {
        filename,
        sequence,
        bytes,
    })
}
