//! Fiscal XML extraction (C2): pulls payer identity, address, amount,
//! issue date, and document number out of an NFe or CTe document.
//!
//! Implementation follows a path-stack state machine over a streaming XML
//! reader, the read-side counterpart of how this crate's write-side XML
//! tooling is structured: a `Vec<String>` tracks the currently open
//! element path, text events are dispatched to the in-progress parse
//! record, and specific closing tags commit completed sub-structures.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;
use rust_decimal::Decimal;

use crate::core::{
    Address, AddressBuilder, Invoice, InvoiceStatus, ReceivablesError, SourceKind,
    cents_from_decimal,
};

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Which fiscal document family an XML document belongs to, detected from
/// its root element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Nfe,
    Cte,
}

fn detect_kind(root_name: &str) -> Result<DocumentKind, ReceivablesError> {
    let lower = root_name.to_ascii_lowercase();
    if lower.contains("nfe") {
        Ok(DocumentKind::Nfe)
    } else if lower.contains("cte") {
        Ok(DocumentKind::Cte)
    } else {
        Err(ReceivablesError::UnknownKind(format!(
            "root element '{root_name}' is neither NFe nor CTe"
        )))
    }
}

/// A party (payer) accumulated while scanning one of the named sections
/// (`dest`, `rem`, `exped`, `receb`, `toma4`).
#[derive(Default, Clone)]
struct PartyAccumulator {
    name: Option<String>,
    doc: Option<String>,
    street: Option<String>,
    number: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
}

impl PartyAccumulator {
    fn into_invoice_fields(self) -> (String, String, Address) {
        let name = self.name.unwrap_or_else(|| "Unknown".to_string());
        let doc = self.doc.unwrap_or_default();
        let address = AddressBuilder::new(
            self.city.unwrap_or_default(),
            self.postal_code.unwrap_or_default(),
        )
        .street(self.street.unwrap_or_default())
        .number(self.number.unwrap_or_default())
        .neighborhood(self.neighborhood.unwrap_or_default())
        .state(self.state.unwrap_or_default())
        .build();
        (name, doc, address)
    }
}

/// Which named section is currently open, so bare element names like
/// `xNome`/`CNPJ` are routed to the right accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Dest,
    Rem,
    Exped,
    Receb,
    Toma4,
    Toma3,
}

impl Section {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "dest" => Some(Section::Dest),
            "rem" => Some(Section::Rem),
            "exped" => Some(Section::Exped),
            "receb" => Some(Section::Receb),
            "toma4" => Some(Section::Toma4),
            "toma3" => Some(Section::Toma3),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ParseState {
    root_name: Option<String>,
    section: Option<Section>,
    dest: PartyAccumulator,
    rem: PartyAccumulator,
    exped: PartyAccumulator,
    receb: PartyAccumulator,
    toma4: PartyAccumulator,
    toma_role: Option<String>,
    amount: Option<String>,
    issue_date: Option<String>,
    document_number: Option<String>,
}

impl ParseState {
    fn accumulator_mut(&mut self, section: Section) -> Option<&mut PartyAccumulator> {
        match section {
            Section::Dest => Some(&mut self.dest),
            Section::Rem => Some(&mut self.rem),
            Section::Exped => Some(&mut self.exped),
            Section::Receb => Some(&mut self.receb),
            Section::Toma4 => Some(&mut self.toma4),
            Section::Toma3 => None,
        }
    }

    fn handle_text(&mut self, tag: &str, text: &str) {
        if let Some(section) = self.section {
            if section == Section::Toma3 {
                if tag == "toma" {
                    self.toma_role = Some(text.to_string());
                }
                return;
            }
            if let Some(acc) = self.accumulator_mut(section) {
                match tag {
                    "xNome" => acc.name = Some(text.to_string()),
                    "CNPJ" => acc.doc = Some(text.to_string()),
                    "CPF" => {
                        if acc.doc.is_none() {
                            acc.doc = Some(text.to_string());
                        }
                    }
                    "xLgr" => acc.street = Some(text.to_string()),
                    "nro" => acc.number = Some(text.to_string()),
                    "xBairro" => acc.neighborhood = Some(text.to_string()),
                    "xMun" => acc.city = Some(text.to_string()),
                    "UF" => acc.state = Some(text.to_string()),
                    "CEP" => acc.postal_code = Some(text.to_string()),
                    _ => {}
                }
                return;
            }
        }

        match tag {
            "vNF" | "vTPrest" => self.amount = Some(text.to_string()),
            "dhEmi" => self.issue_date = Some(text.to_string()),
            "dEmi" => {
                if self.issue_date.is_none() {
                    self.issue_date = Some(text.to_string());
                }
            }
            "nNF" | "nCT" => self.document_number = Some(text.to_string()),
            _ => {}
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    let s = std::str::from_utf8(raw).unwrap_or("");
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ReceivablesError> {
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| ReceivablesError::Malformed(format!("invalid date '{raw}': {e}")))
}

fn resolve_cte_payer(state: &ParseState) -> PartyAccumulator {
    if let Some(role_code) = &state.toma_role {
        let resolved = match role_code.as_str() {
            "0" => Some(&state.rem),
            "1" => Some(&state.exped),
            "2" => Some(&state.receb),
            "3" => Some(&state.dest),
            _ => None,
        };
        if let Some(acc) = resolved {
            if acc.name.is_some() {
                return acc.clone();
            }
        }
    }
    if state.toma4.name.is_some() {
        return state.toma4.clone();
    }
    state.dest.clone()
}

/// Extract an [`Invoice`] from an NFe or CTe XML document.
pub fn extract_invoice(xml: &str) -> Result<Invoice, ReceivablesError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ParseState::default();
    let mut open_tag: Option<String> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| ReceivablesError::Malformed(format!("XML parse error: {e}")))?
        {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                if state.root_name.is_none() {
                    state.root_name = Some(name.clone());
                }
                if let Some(section) = Section::from_tag(&name) {
                    state.section = Some(section);
                }
                open_tag = Some(name);
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| ReceivablesError::Malformed(format!("XML text error: {err}")))?
                    .to_string();
                if !text.is_empty() {
                    if let Some(tag) = &open_tag {
                        state.handle_text(tag, &text);
                    }
                }
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref());
                if state.section.map(|s| matches!((s, name.as_str()),
                    (Section::Dest, "dest")
                    | (Section::Rem, "rem")
                    | (Section::Exped, "exped")
                    | (Section::Receb, "receb")
                    | (Section::Toma4, "toma4")
                    | (Section::Toma3, "toma3")
                )).unwrap_or(false)
                {
                    state.section = None;
                }
                open_tag = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let root_name = state
        .root_name
        .clone()
        .ok_or_else(|| ReceivablesError::Malformed("empty XML document".to_string()))?;
    let kind = detect_kind(&root_name)?;

    let (payer_name, payer_doc, payer_address, amount_raw, date_raw, document_number) = match kind
    {
        DocumentKind::Nfe => {
            if state.dest.name.is_none() {
                return Err(ReceivablesError::MissingRequired(
                    "NFe document has no <dest> node".to_string(),
                ));
            }
            let (name, doc, address) = state.dest.clone().into_invoice_fields();
            (
                name,
                doc,
                address,
                state.amount.clone(),
                state.issue_date.clone(),
                state.document_number.clone(),
            )
        }
        DocumentKind::Cte => {
            let resolved = resolve_cte_payer(&state);
            let (name, doc, address) = resolved.into_invoice_fields();
            (
                name,
                doc,
                address,
                state.amount.clone(),
                state.issue_date.clone(),
                state.document_number.clone(),
            )
        }
    };

    let amount_raw = amount_raw
        .ok_or_else(|| ReceivablesError::MissingRequired("amount field not found".to_string()))?;
    let amount_decimal = Decimal::from_str(amount_raw.trim())
        .map_err(|e| ReceivablesError::Malformed(format!("invalid amount '{amount_raw}': {e}")))?;
    let amount_cents = cents_from_decimal(amount_decimal)?;

    let issue_date = match date_raw {
        Some(raw) => parse_date(&raw)?,
        None => {
            return Err(ReceivablesError::MissingRequired(
                "issue date field not found".to_string(),
            ));
        }
    };

    let document_number = document_number
        .ok_or_else(|| ReceivablesError::MissingRequired("document number not found".to_string()))?;

    Ok(Invoice {
        source: match kind {
            DocumentKind::Nfe => SourceKind::Nfe,
            DocumentKind::Cte => SourceKind::Cte,
        },
        original_file_path: None,
        payer_name,
        payer_tax_id: digits_only(&payer_doc),
        payer_address,
        amount_cents,
        issue_date,
        document_number,
        species: "DM".to_string(),
        status: InvoiceStatus::Pending,
        linked_boleto_id: None,
        deleted_at: None,
    })
}

/// Extract an [`Invoice`] from a file on disk, recording the source path.
pub fn extract_invoice_from_path(path: &Path) -> Result<Invoice, ReceivablesError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReceivablesError::Malformed(format!("failed to read {path:?}: {e}")))?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| ReceivablesError::Malformed(format!("not valid UTF-8: {e}")))?;
    let mut invoice = extract_invoice(&xml)?;
    invoice.original_file_path = Some(path.display().to_string());
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFE_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe">
  <NFe>
    <infNFe>
      <ide>
        <nNF>789</nNF>
        <dhEmi>2024-01-15T10:30:00-03:00</dhEmi>
      </ide>
      <dest>
        <xNome>Fulano de Tal</xNome>
        <CPF>52998224725</CPF>
        <enderDest>
          <xLgr>Av. Paulista</xLgr>
          <nro>1000</nro>
          <xBairro>Bela Vista</xBairro>
          <xMun>Sao Paulo</xMun>
          <UF>SP</UF>
          <CEP>01310100</CEP>
        </enderDest>
      </dest>
      <total>
        <ICMSTot>
          <vNF>1234.56</vNF>
        </ICMSTot>
      </total>
    </infNFe>
  </NFe>
</nfeProc>"#;

    const CTE_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cteProc xmlns="http://www.portalfiscal.inf.br/cte">
  <CTe>
    <infCte>
      <ide>
        <nCT>321</nCT>
        <dhEmi>2024-02-01T08:00:00-03:00</dhEmi>
        <toma3>
          <toma>3</toma>
        </toma3>
      </ide>
      <dest>
        <xNome>Transportadora Alvo</xNome>
        <CNPJ>11222333000181</CNPJ>
        <enderDest>
          <xLgr>Rua das Cargas</xLgr>
          <nro>50</nro>
          <xBairro>Centro</xBairro>
          <xMun>Campinas</xMun>
          <UF>SP</UF>
          <CEP>13010000</CEP>
        </enderDest>
      </dest>
      <vPrest>
        <vTPrest>500.00</vTPrest>
      </vPrest>
    </infCte>
  </CTe>
</cteProc>"#;

    #[test]
    fn extracts_nfe_payer_and_amount() {
        let invoice = extract_invoice(NFE_SAMPLE).unwrap();
        assert_eq!(invoice.source, SourceKind::Nfe);
        assert_eq!(invoice.payer_name, "Fulano de Tal");
        assert_eq!(invoice.payer_tax_id, "52998224725");
        assert_eq!(invoice.amount_cents, 123_456);
        assert_eq!(invoice.document_number, "789");
        assert_eq!(
            invoice.issue_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(invoice.payer_address.city, "Sao Paulo");
    }

    #[test]
    fn extracts_cte_payer_via_toma3_destinatary_role() {
        let invoice = extract_invoice(CTE_SAMPLE).unwrap();
        assert_eq!(invoice.source, SourceKind::Cte);
        assert_eq!(invoice.payer_name, "Transportadora Alvo");
        assert_eq!(invoice.payer_tax_id, "11222333000181");
        assert_eq!(invoice.amount_cents, 50_000);
        assert_eq!(invoice.document_number, "321");
    }

    #[test]
    fn rejects_unknown_root_element() {
        let xml = "<fooDocument><bar/></fooDocument>";
        let err = extract_invoice(xml).unwrap_err();
        assert!(matches!(err, ReceivablesError::UnknownKind(_)));
    }

    #[test]
    fn rejects_malformed_xml() {
        let xml = "<nfeProc><dest><xNome>Unclosed";
        assert!(extract_invoice(xml).is_err());
    }

    #[test]
    fn rejects_nfe_missing_dest() {
        let xml = r#"<nfeProc><NFe><infNFe><ide><nNF>1</nNF><dhEmi>2024-01-01</dhEmi></ide>
            <total><ICMSTot><vNF>1.00</vNF></ICMSTot></total></infNFe></NFe></nfeProc>"#;
        let err = extract_invoice(xml).unwrap_err();
        assert!(matches!(err, ReceivablesError::MissingRequired(_)));
    }
}
