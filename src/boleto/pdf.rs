//! Boleto PDF rendering (C3): an A4 page with the mandatory boleto regions
//! and an Interleaved 2-of-5 barcode, assembled directly as PDF objects —
//! no layout engine — the same low-level approach the crate's Factur-X
//! embedding already takes to PDF structure, generalized from editing an
//! existing document to writing one from scratch.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::core::{Account, Address, BankKind, Cents, ReceivablesError, decimal_from_cents};

/// Everything C3's PDF renderer needs about one boleto, flattened into a
/// single pure-function argument per the crate's "explicit aggregate
/// snapshot" convention (DESIGN.md) rather than back-references into a
/// Tenant/BankProfile object graph.
pub struct BoletoPdfData<'a> {
    pub bank: BankKind,
    pub bank_legal_name: &'a str,
    pub tenant_legal_name: &'a str,
    pub tenant_tax_id: &'a str,
    pub agency: &'a str,
    pub account: &'a Account,
    pub wallet: &'a str,
    pub due_date: NaiveDate,
    pub issue_date: NaiveDate,
    pub document_number: &'a str,
    pub species: &'a str,
    pub amount_cents: Cents,
    pub nosso_numero_formatted: &'a str,
    pub barcode: &'a str,
    pub digitable_line: &'a str,
    pub payer_name: &'a str,
    pub payer_tax_id: &'a str,
    pub payer_address: &'a Address,
    pub instructions: &'a str,
}

const A4_WIDTH: f32 = 595.0;
const A4_HEIGHT: f32 = 842.0;

/// Render a one-page A4 boleto PDF, returning the raw bytes.
///
/// Never fails on barcode-rendering problems: if the Interleaved 2-of-5
/// encoding cannot be computed (non-positive bar width, an odd digit
/// count), the renderer falls back to printing the 44 digits as monospace
/// text instead of bars. Only genuine PDF-structure errors return `Err`.
pub fn render_boleto_pdf(data: &BoletoPdfData) -> Result<Vec<u8>, ReceivablesError> {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let font_bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let content = build_content_stream(data);
    let content_bytes = content
        .encode()
        .map_err(|e| ReceivablesError::Builder(format!("PDF content encode error: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => font_bold_id,
        },
    });

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), (A4_WIDTH as i64).into(), (A4_HEIGHT as i64).into()],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ReceivablesError::Builder(format!("failed to save PDF: {e}")))?;
    Ok(output)
}

fn text_op(
    ops: &mut Vec<Operation>,
    font: &str,
    size: f32,
    x: f32,
    y: f32,
    text: &str,
) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(text.as_bytes().to_vec())],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn line_op(ops: &mut Vec<Operation>, x1: f32, y1: f32, x2: f32, y2: f32) {
    ops.push(Operation::new("w", vec![0.5.into()]));
    ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
    ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
    ops.push(Operation::new("S", vec![]));
}

fn rect_fill_op(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32) {
    ops.push(Operation::new(
        "re",
        vec![x.into(), y.into(), w.into(), h.into()],
    ));
    ops.push(Operation::new("f", vec![]));
}

fn build_content_stream(data: &BoletoPdfData) -> Content {
    let mut ops: Vec<Operation> = Vec::new();
    let left = 28.0;
    let right = A4_WIDTH - 28.0;
    let mut y = A4_HEIGHT - 56.0;

    ops.push(Operation::new("g", vec![0.into()]));

    text_op(&mut ops, "F2", 10.0, left, y, "RECIBO DO PAGADOR");
    y -= 14.0;
    line_op(&mut ops, left, y, right, y);
    y -= 16.0;

    text_op(
        &mut ops,
        "F2",
        12.0,
        left,
        y,
        &format!("{} | {}", data.bank.code(), data.bank_legal_name),
    );
    text_op(&mut ops, "F1", 9.0, left, y - 12.0, data.digitable_line);
    y -= 28.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        "PAGAVEL EM QUALQUER BANCO ATE O VENCIMENTO",
    );
    text_op(
        &mut ops,
        "F2",
        10.0,
        right - 120.0,
        y,
        &format!("Vencimento: {}", data.due_date.format("%d/%m/%Y")),
    );
    y -= 16.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        &format!(
            "Beneficiario: {} - {}",
            data.tenant_legal_name, data.tenant_tax_id
        ),
    );
    text_op(
        &mut ops,
        "F1",
        8.0,
        right - 160.0,
        y,
        &format!(
            "Agencia/Codigo: {}/{}-{}",
            data.agency, data.account.body, data.account.check_digit
        ),
    );
    y -= 16.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        &format!(
            "Data Documento: {}   No Documento: {}   Especie: {}",
            data.issue_date.format("%d/%m/%Y"),
            data.document_number,
            data.species
        ),
    );
    text_op(
        &mut ops,
        "F1",
        8.0,
        right - 160.0,
        y,
        &format!("Nosso Numero: {}", data.nosso_numero_formatted),
    );
    y -= 16.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        &format!("Carteira: {}", data.wallet),
    );
    text_op(
        &mut ops,
        "F2",
        10.0,
        right - 160.0,
        y,
        &format!("Valor Documento: R$ {:.2}", decimal_from_cents(data.amount_cents)),
    );
    y -= 16.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        "Instrucoes (responsabilidade do beneficiario):",
    );
    text_op(&mut ops, "F1", 8.0, left, y - 12.0, data.instructions);
    y -= 32.0;
    line_op(&mut ops, left, y, right, y);
    y -= 14.0;

    text_op(
        &mut ops,
        "F1",
        8.0,
        left,
        y,
        &format!("Pagador: {} - {}", data.payer_name, data.payer_tax_id),
    );
    text_op(
        &mut ops,
        "F1",
        7.0,
        left,
        y - 12.0,
        &format!(
            "{}, {} - {} - {}/{} - {}",
            data.payer_address.street,
            data.payer_address.number,
            data.payer_address.neighborhood,
            data.payer_address.city,
            data.payer_address.state,
            data.payer_address.postal_code
        ),
    );

    draw_barcode(&mut ops, data.barcode, left, 40.0);

    Content { operations: ops }
}

/// Interleaved 2-of-5 wide/narrow element patterns for digits 0-9: each is
/// 5 elements (bar, space, bar, space, bar), `true` meaning a wide element.
const I2OF5_PATTERNS: [[bool; 5]; 10] = [
    [false, false, true, true, false], // 0
    [true, false, false, false, true], // 1
    [false, true, false, false, true], // 2
    [true, true, false, false, false], // 3
    [false, false, true, false, true], // 4
    [true, false, true, false, false], // 5
    [false, true, true, false, false], // 6
    [false, false, false, true, true], // 7
    [true, false, false, true, false], // 8
    [false, true, false, true, false], // 9
];

/// Draw the 44-digit barcode as Interleaved 2-of-5 bars, falling back to a
/// monospace digit run if the digit count is odd or the computed module
/// width would be non-positive. Never fails the whole PDF — only this
/// region degrades.
fn draw_barcode(ops: &mut Vec<Operation>, barcode: &str, left: f32, y: f32) {
    if barcode.len() % 2 != 0 || !barcode.chars().all(|c| c.is_ascii_digit()) {
        text_op(ops, "F2", 10.0, left, y + 5.0, "Digitacao manual:");
        text_op(ops, "F2", 12.0, left, y - 8.0, barcode);
        return;
    }

    let narrow = 0.6_f32;
    let wide = narrow * 2.5;
    let bar_height = 36.0;
    let available_width = A4_WIDTH - 2.0 * left;

    let digits: Vec<u32> = barcode.chars().filter_map(|c| c.to_digit(10)).collect();
    let mut total_width = 0.0_f32;
    for pair in digits.chunks(2) {
        let bar_pattern = I2OF5_PATTERNS[pair[0] as usize];
        let space_pattern = I2OF5_PATTERNS[pair[1] as usize];
        for i in 0..5 {
            total_width += if bar_pattern[i] { wide } else { narrow };
            total_width += if space_pattern[i] { wide } else { narrow };
        }
    }
    // start (N N N N) + stop (W N N) overhead, in module widths.
    total_width += 4.0 * narrow + (wide + 2.0 * narrow);

    if total_width <= 0.0 || total_width > available_width * 4.0 {
        text_op(ops, "F2", 10.0, left, y + 5.0, "Digitacao manual:");
        text_op(ops, "F2", 12.0, left, y - 8.0, barcode);
        return;
    }

    let mut x = (A4_WIDTH - total_width.min(available_width)) / 2.0;
    ops.push(Operation::new("g", vec![0.into()]));

    // start pattern: bar,space,bar,space (all narrow)
    for i in 0..4 {
        if i % 2 == 0 {
            rect_fill_op(ops, x, y, narrow, bar_height);
        }
        x += narrow;
    }

    for pair in digits.chunks(2) {
        let bar_pattern = I2OF5_PATTERNS[pair[0] as usize];
        let space_pattern = I2OF5_PATTERNS[pair[1] as usize];
        for i in 0..5 {
            let bar_w = if bar_pattern[i] { wide } else { narrow };
            rect_fill_op(ops, x, y, bar_w, bar_height);
            x += bar_w;
            let space_w = if space_pattern[i] { wide } else { narrow };
            x += space_w;
        }
    }
    // stop pattern: wide bar, narrow space, narrow bar
    rect_fill_op(ops, x, y, wide, bar_height);
    x += wide + narrow;
    rect_fill_op(ops, x, y, narrow, bar_height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AddressBuilder;

    fn sample_data() -> BoletoPdfData<'static> {
        static ACCOUNT: std::sync::OnceLock<Account> = std::sync::OnceLock::new();
        static ADDRESS: std::sync::OnceLock<Address> = std::sync::OnceLock::new();
        static BARCODE_RESULT: std::sync::OnceLock<super::super::barcode::BarcodeResult> =
            std::sync::OnceLock::new();
        let account = ACCOUNT.get_or_init(|| Account {
            body: "13000456".into(),
            check_digit: "1".into(),
        });
        let address = ADDRESS.get_or_init(|| {
            AddressBuilder::new("Sao Paulo", "01310100")
                .street("Av. Paulista")
                .number("1000")
                .neighborhood("Bela Vista")
                .state("SP")
                .build()
        });
        let computed = BARCODE_RESULT.get_or_init(|| {
            super::super::barcode::build_barcode(
                BankKind::BankA,
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                123_456,
                1,
                "101",
            )
            .unwrap()
        });
        BoletoPdfData {
            bank: BankKind::BankA,
            bank_legal_name: "BANCO SANTANDER",
            tenant_legal_name: "ACME LTDA",
            tenant_tax_id: "11.222.333/0001-81",
            agency: "3421",
            account,
            wallet: "101",
            due_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            document_number: "789",
            species: "DM",
            amount_cents: 123_456,
            nosso_numero_formatted: "000000000001-0",
            barcode: &computed.barcode,
            digitable_line: &computed.digitable_line,
            payer_name: "Fulano de Tal",
            payer_tax_id: "529.982.247-25",
            payer_address: address,
            instructions: "Nao receber apos o vencimento",
        }
    }

    #[test]
    fn renders_non_empty_pdf_bytes() {
        let data = sample_data();
        assert_eq!(data.barcode.len(), 44);
        let bytes = render_boleto_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.len() > 200);
    }

    #[test]
    fn falls_back_to_monospace_on_odd_digit_count() {
        let mut data = sample_data();
        data.barcode = "123";
        let bytes = render_boleto_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
