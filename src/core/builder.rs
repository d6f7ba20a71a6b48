use chrono::NaiveDate;

use super::error::ReceivablesError;
use super::types::*;

/// Builder for [`Address`].
#[derive(Debug, Default)]
pub struct AddressBuilder {
    street: String,
    number: String,
    neighborhood: String,
    city: String,
    state: String,
    postal_code: String,
}

impl AddressBuilder {
    pub fn new(city: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            postal_code: postal_code.into(),
            ..Default::default()
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = street.into();
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = neighborhood.into();
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            number: self.number,
            neighborhood: self.neighborhood,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
        }
    }
}

/// Builder for [`Tenant`].
pub struct TenantBuilder {
    display_name: String,
    legal_name: String,
    cnpj: String,
    address: Option<Address>,
}

impl TenantBuilder {
    pub fn new(legal_name: impl Into<String>, cnpj: impl Into<String>) -> Self {
        let legal_name = legal_name.into();
        Self {
            display_name: legal_name.clone(),
            legal_name,
            cnpj: cnpj.into(),
            address: None,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn build(self) -> Result<Tenant, ReceivablesError> {
        if !super::validators::validate_cnpj(&self.cnpj) {
            return Err(ReceivablesError::InvalidTaxId(self.cnpj));
        }
        Ok(Tenant {
            display_name: self.display_name,
            legal_name: self.legal_name,
            cnpj: self.cnpj,
            address: self.address.unwrap_or(Address {
                street: String::new(),
                number: String::new(),
                neighborhood: String::new(),
                city: String::new(),
                state: String::new(),
                postal_code: String::new(),
            }),
        })
    }
}

/// Builder for [`BankProfile`].
pub struct BankProfileBuilder {
    bank: BankKind,
    agency: String,
    account: Account,
    wallet: String,
    agreement: String,
    transmission_code: Option<String>,
    min_nosso_numero: u64,
    max_nosso_numero: u64,
    current_nosso_numero: u64,
    active: bool,
    instructions: InstructionPolicy,
}

impl BankProfileBuilder {
    pub fn new(bank: BankKind, agency: impl Into<String>, account: Account) -> Self {
        Self {
            bank,
            agency: agency.into(),
            account,
            wallet: String::new(),
            agreement: String::new(),
            transmission_code: None,
            min_nosso_numero: 1,
            max_nosso_numero: 999_999_999,
            current_nosso_numero: 1,
            active: true,
            instructions: InstructionPolicy::default(),
        }
    }

    pub fn wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = wallet.into();
        self
    }

    pub fn agreement(mut self, agreement: impl Into<String>) -> Self {
        self.agreement = agreement.into();
        self
    }

    pub fn transmission_code(mut self, code: impl Into<String>) -> Self {
        self.transmission_code = Some(code.into());
        self
    }

    pub fn nosso_numero_bounds(mut self, min: u64, max: u64, current: u64) -> Self {
        self.min_nosso_numero = min;
        self.max_nosso_numero = max;
        self.current_nosso_numero = current;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn instructions(mut self, instructions: InstructionPolicy) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn build(self) -> Result<BankProfile, ReceivablesError> {
        if self.min_nosso_numero > self.current_nosso_numero
            || self.current_nosso_numero > self.max_nosso_numero + 1
        {
            return Err(ReceivablesError::Builder(format!(
                "nosso-número bounds invalid: min={} current={} max={}",
                self.min_nosso_numero, self.current_nosso_numero, self.max_nosso_numero
            )));
        }
        Ok(BankProfile {
            bank: self.bank,
            agency: self.agency,
            account: self.account,
            wallet: self.wallet,
            agreement: self.agreement,
            transmission_code: self.transmission_code,
            min_nosso_numero: self.min_nosso_numero,
            max_nosso_numero: self.max_nosso_numero,
            current_nosso_numero: self.current_nosso_numero,
            active: self.active,
            instructions: self.instructions,
        })
    }
}

/// Builder for [`Boleto`], aggregating one or more invoices sharing the
/// same payer tax id.
pub struct BoletoBuilder {
    id: String,
    bank: BankKind,
    invoices: Vec<Invoice>,
    due_date: Option<NaiveDate>,
    issue_date: NaiveDate,
    nosso_numero: Option<u64>,
}

impl BoletoBuilder {
    pub fn new(id: impl Into<String>, bank: BankKind, issue_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            bank,
            invoices: Vec::new(),
            due_date: None,
            issue_date,
            nosso_numero: None,
        }
    }

    pub fn add_invoice(mut self, invoice: Invoice) -> Self {
        self.invoices.push(invoice);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn nosso_numero(mut self, n: u64) -> Self {
        self.nosso_numero = Some(n);
        self
    }

    /// Assemble the boleto. Barcode, digitable line, and formatted
    /// nosso-número are left empty here — they are computed by
    /// `boleto::build_barcode` once a [`BankProfile`] is available, since
    /// that computation needs agency/account/wallet this builder does not
    /// carry.
    pub fn build(self) -> Result<Boleto, ReceivablesError> {
        if self.invoices.is_empty() {
            return Err(ReceivablesError::Builder(
                "a boleto must aggregate at least one invoice".into(),
            ));
        }
        let payer_tax_id = self.invoices[0].payer_tax_id.clone();
        if self
            .invoices
            .iter()
            .any(|i| i.payer_tax_id != payer_tax_id)
        {
            return Err(ReceivablesError::Builder(
                "all invoices in a boleto must share the same payer tax id".into(),
            ));
        }
        let nosso_numero = self.nosso_numero.ok_or_else(|| {
            ReceivablesError::Builder("nosso-número must be allocated before build".into())
        })?;
        let due_date = self
            .due_date
            .ok_or_else(|| ReceivablesError::Builder("due date is required".into()))?;

        let amount_cents: Cents = self.invoices.iter().map(|i| i.amount_cents).sum();
        let first = &self.invoices[0];

        Ok(Boleto {
            id: self.id,
            bank: self.bank,
            payer_name: first.payer_name.clone(),
            payer_tax_id,
            payer_address: first.payer_address.clone(),
            amount_cents,
            due_date,
            issue_date: self.issue_date,
            species: first.species.clone(),
            nosso_numero,
            nosso_numero_formatted: String::new(),
            barcode: String::new(),
            digitable_line: String::new(),
            status: BoletoStatus::Pending,
            deleted_at: None,
        })
    }
}
