//! A4 bill documents drawn with the built-in Helvetica fonts.
//!
//! Layout runs top to bottom through a [`Canvas`] that starts a new page
//! whenever the next block would cross the bottom margin. Table headers are
//! repeated on continuation pages.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core::config::BillingConfig;
use crate::features::bills::dtos::{BillLineItemResponseDto, BillResponseDto};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const LINE_GAP: f32 = 4.0;
const CELL_PAD: f32 = 5.0;

const HEADER_SHADE: f32 = 0.94;
const TOTAL_SHADE: f32 = 0.97;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to encode page content: {0}")]
    Content(String),

    #[error("Failed to write PDF document: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

struct Column {
    title: &'static str,
    width: f32,
    align: Align,
}

const MATERIAL_COLUMNS: [Column; 4] = [
    Column {
        title: "Item",
        width: 215.0,
        align: Align::Left,
    },
    Column {
        title: "Quantity",
        width: 70.0,
        align: Align::Right,
    },
    Column {
        title: "Unit Price (Rs.)",
        width: 105.0,
        align: Align::Right,
    },
    Column {
        title: "Total (Rs.)",
        width: 105.0,
        align: Align::Right,
    },
];

const LABOR_COLUMNS: [Column; 4] = [
    Column {
        title: "Description",
        width: 215.0,
        align: Align::Left,
    },
    Column {
        title: "Hours",
        width: 70.0,
        align: Align::Right,
    },
    Column {
        title: "Rate per Hour (Rs.)",
        width: 105.0,
        align: Align::Right,
    },
    Column {
        title: "Total (Rs.)",
        width: 105.0,
        align: Align::Right,
    },
];

/// Renders persisted bills as downloadable PDFs
pub struct PdfRenderer {
    business_name: String,
    gst_rate_percent: String,
}

impl PdfRenderer {
    pub fn new(billing: &BillingConfig) -> Self {
        Self {
            business_name: billing.business_name.clone(),
            gst_rate_percent: billing.gst_rate_percent.clone(),
        }
    }

    pub fn render(&self, bill: &BillResponseDto) -> Result<Vec<u8>, PdfError> {
        let mut canvas = Canvas::new();

        canvas.line(
            Align::Center,
            Font::Bold,
            TITLE_SIZE,
            &self.business_name.to_uppercase(),
        );
        canvas.line(Align::Center, Font::Bold, HEADING_SIZE, "Service Bill");
        canvas.gap(20.0);

        canvas.line(
            Align::Left,
            Font::Bold,
            HEADING_SIZE,
            &format!("Bill ID: {}", bill.bill_id),
        );
        canvas.line(
            Align::Left,
            Font::Regular,
            BODY_SIZE,
            &format!("Service Request ID: REQ-{}", bill.request_id),
        );
        canvas.line(
            Align::Left,
            Font::Regular,
            BODY_SIZE,
            &format!("Date: {}", bill.generated_at.format("%d %b %Y, %H:%M")),
        );
        canvas.paragraph(
            Font::Regular,
            BODY_SIZE,
            &format!("Customer: {}", bill.customer_name),
        );
        canvas.paragraph(
            Font::Regular,
            BODY_SIZE,
            &format!(
                "Vehicle: {} ({})",
                bill.vehicle_name, bill.registration_number
            ),
        );
        canvas.gap(14.0);

        canvas.table(
            "Materials & Parts",
            &MATERIAL_COLUMNS,
            &item_rows(&bill.materials),
            "Materials Total",
            &money(bill.materials_total),
        );
        canvas.gap(14.0);

        canvas.table(
            "Labor Charges",
            &LABOR_COLUMNS,
            &item_rows(&bill.labor),
            "Labor Total",
            &money(bill.labor_total),
        );
        canvas.gap(14.0);

        canvas.heading("Bill Summary");
        canvas.summary_row("Subtotal:", &money(bill.subtotal), Font::Regular);
        canvas.summary_row(
            &format!("GST ({}%):", self.gst_rate_percent),
            &money(bill.gst),
            Font::Regular,
        );
        canvas.summary_row("Grand Total:", &money(bill.grand_total), Font::Bold);

        if let Some(notes) = bill.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            canvas.gap(14.0);
            canvas.heading("Notes:");
            for paragraph in notes.lines() {
                canvas.paragraph(Font::Regular, BODY_SIZE, paragraph);
            }
        }

        canvas.gap(28.0);
        canvas.line(
            Align::Center,
            Font::Regular,
            BODY_SIZE,
            &format!("Thank you for choosing {}!", self.business_name),
        );

        build_document(canvas.into_pages())
    }
}

fn money(value: Decimal) -> String {
    format!("Rs. {}", value)
}

fn item_rows(items: &[BillLineItemResponseDto]) -> Vec<[String; 4]> {
    items
        .iter()
        .map(|item| {
            [
                item.description.clone(),
                item.quantity.to_string(),
                item.unit_price.to_string(),
                item.total.to_string(),
            ]
        })
        .collect()
}

/// Page-by-page operation buffer with a top-down cursor
struct Canvas {
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn into_pages(mut self) -> Vec<Vec<Operation>> {
        self.finished.push(self.current);
        self.finished
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= MARGIN
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.finished.push(page);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Returns true when a page break was needed
    fn reserve(&mut self, height: f32) -> bool {
        if self.fits(height) {
            return false;
        }
        self.new_page();
        true
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, x: f32, baseline: f32, font: Font, size: f32, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(sanitize(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![gray.into(), gray.into(), gray.into()]),
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn rule(&mut self, y: f32) {
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new("RG", vec![0.7f32.into(), 0.7f32.into(), 0.7f32.into()]),
            Operation::new("m", vec![MARGIN.into(), y.into()]),
            Operation::new("l", vec![(MARGIN + CONTENT_WIDTH).into(), y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Single line of text; anything wider than the page is clipped by the viewer
    fn line(&mut self, align: Align, font: Font, size: f32, text: &str) {
        self.reserve(size + LINE_GAP);
        let baseline = self.y - size;
        let x = aligned_x(align, MARGIN, CONTENT_WIDTH, text_width(text, font, size));
        self.text(x, baseline, font, size, text);
        self.y -= size + LINE_GAP;
    }

    fn paragraph(&mut self, font: Font, size: f32, text: &str) {
        for line in wrap(text, font, size, CONTENT_WIDTH) {
            self.line(Align::Left, font, size, &line);
        }
    }

    fn heading(&mut self, text: &str) {
        // keep the heading together with at least one row below it
        self.reserve(HEADING_SIZE + LINE_GAP + 2.0 * (BODY_SIZE + 2.0 * CELL_PAD));
        self.line(Align::Left, Font::Bold, HEADING_SIZE, text);
        self.gap(2.0);
    }

    fn table(
        &mut self,
        heading: &str,
        columns: &[Column; 4],
        rows: &[[String; 4]],
        total_label: &str,
        total_value: &str,
    ) {
        let header: [String; 4] = [
            columns[0].title.to_string(),
            columns[1].title.to_string(),
            columns[2].title.to_string(),
            columns[3].title.to_string(),
        ];

        self.heading(heading);
        self.row(columns, &header, Font::Bold, Some(HEADER_SHADE));

        if rows.is_empty() {
            let empty = [
                "No itemised entries".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ];
            self.row(columns, &empty, Font::Regular, None);
        }

        for cells in rows {
            let height = row_height(columns, cells, Font::Regular);
            if self.reserve(height) {
                self.row(columns, &header, Font::Bold, Some(HEADER_SHADE));
            }
            self.row(columns, cells, Font::Regular, None);
        }

        self.total_row(columns, total_label, total_value);
    }

    fn row(&mut self, columns: &[Column], cells: &[String], font: Font, shade: Option<f32>) {
        let height = row_height(columns, cells, font);
        self.reserve(height);

        let top = self.y;
        if let Some(gray) = shade {
            self.fill_rect(MARGIN, top - height, CONTENT_WIDTH, height, gray);
        }

        let mut x = MARGIN;
        for (column, cell) in columns.iter().zip(cells) {
            let inner = column.width - 2.0 * CELL_PAD;
            let mut baseline = top - CELL_PAD - BODY_SIZE;
            for line in wrap(cell, font, BODY_SIZE, inner) {
                let tx = aligned_x(
                    column.align,
                    x + CELL_PAD,
                    inner,
                    text_width(&line, font, BODY_SIZE),
                );
                self.text(tx, baseline, font, BODY_SIZE, &line);
                baseline -= BODY_SIZE + 2.0;
            }
            x += column.width;
        }

        self.rule(top - height);
        self.y = top - height;
    }

    /// Label spanning all but the last column, value in the last one
    fn total_row(&mut self, columns: &[Column], label: &str, value: &str) {
        let height = BODY_SIZE + 2.0 * CELL_PAD;
        self.reserve(height);

        let top = self.y;
        let last = columns.last().map(|c| c.width).unwrap_or(0.0);
        let span = CONTENT_WIDTH - last;
        let baseline = top - CELL_PAD - BODY_SIZE;

        self.fill_rect(MARGIN, top - height, CONTENT_WIDTH, height, TOTAL_SHADE);
        let label_x = aligned_x(
            Align::Right,
            MARGIN + CELL_PAD,
            span - 2.0 * CELL_PAD,
            text_width(label, Font::Bold, BODY_SIZE),
        );
        self.text(label_x, baseline, Font::Bold, BODY_SIZE, label);
        let value_x = aligned_x(
            Align::Right,
            MARGIN + span + CELL_PAD,
            last - 2.0 * CELL_PAD,
            text_width(value, Font::Bold, BODY_SIZE),
        );
        self.text(value_x, baseline, Font::Bold, BODY_SIZE, value);

        self.rule(top - height);
        self.y = top - height;
    }

    /// Two-column row occupying the right half of the page
    fn summary_row(&mut self, label: &str, value: &str, font: Font) {
        let height = BODY_SIZE + 2.0 * CELL_PAD;
        self.reserve(height);

        let half = CONTENT_WIDTH / 2.0;
        let baseline = self.y - CELL_PAD - BODY_SIZE;
        self.text(MARGIN + half + CELL_PAD, baseline, font, BODY_SIZE, label);
        let value_x = aligned_x(
            Align::Right,
            MARGIN + half,
            half - CELL_PAD,
            text_width(value, font, BODY_SIZE),
        );
        self.text(value_x, baseline, font, BODY_SIZE, value);
        self.y -= height;
    }
}

fn row_height(columns: &[Column], cells: &[String], font: Font) -> f32 {
    let lines = columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| wrap(cell, font, BODY_SIZE, column.width - 2.0 * CELL_PAD).len())
        .max()
        .unwrap_or(1)
        .max(1);

    lines as f32 * (BODY_SIZE + 2.0) - 2.0 + 2.0 * CELL_PAD
}

fn aligned_x(align: Align, left: f32, width: f32, text_width: f32) -> f32 {
    match align {
        Align::Left => left,
        Align::Center => left + (width - text_width).max(0.0) / 2.0,
        Align::Right => left + (width - text_width).max(0.0),
    }
}

/// Approximate Helvetica advance widths, in 1/1000 em
fn glyph_width(c: char) -> f32 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        'f' | 't' | 'I' | '(' | ')' | '[' | ']' | '/' | '-' => 333.0,
        'm' | 'M' | 'W' => 833.0,
        'w' => 722.0,
        '0'..='9' => 556.0,
        'A'..='Z' => 667.0,
        _ => 556.0,
    }
}

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: f32 = sanitize(text).chars().map(glyph_width).sum();
    let factor = match font {
        Font::Regular => 1.0,
        Font::Bold => 1.06,
    };
    units * factor * size / 1000.0
}

/// Greedy word wrap. Words wider than a line are split by character.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for c in word.chars() {
            current.push(c);
            if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// The standard fonts only cover Latin-1; keep output to printable ASCII
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20B9}' => out.push_str("Rs."),
            '\t' | '\n' | '\r' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn build_document(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource() => regular_id,
            Font::Bold.resource() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Content(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn item(description: &str, quantity: &str, unit_price: &str) -> BillLineItemResponseDto {
        BillLineItemResponseDto {
            description: description.to_string(),
            quantity: dec(quantity),
            unit_price: dec(unit_price),
            total: dec(quantity) * dec(unit_price),
        }
    }

    fn bill() -> BillResponseDto {
        BillResponseDto {
            bill_id: 7,
            request_id: 42,
            vehicle_name: "Honda City".to_string(),
            registration_number: "MH-12-AB-1234".to_string(),
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.com".to_string(),
            materials_total: dec("3750.00"),
            labor_total: dec("1200.00"),
            subtotal: dec("4950.00"),
            gst: dec("891.00"),
            grand_total: dec("5841.00"),
            generated_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap(),
            notes: Some("Brake pads at 40%.".to_string()),
            download_url: "/api/bills/service-request/42/download".to_string(),
            email_sent: false,
            materials: vec![
                item("Engine Oil", "4", "850.00"),
                item("Oil Filter", "1", "350.00"),
            ],
            labor: vec![item("Regular Service", "2", "600.00")],
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_render_produces_pdf_with_bill_content() {
        let renderer = PdfRenderer::new(&BillingConfig::default());
        let bytes = renderer.render(&bill()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(contains(&bytes, "Bill ID: 7"));
        assert!(contains(&bytes, "Service Request ID: REQ-42"));
        assert!(contains(&bytes, "Date: 14 Mar 2025, 09:05"));
        assert!(contains(&bytes, "Engine Oil"));
        assert!(contains(&bytes, "Rs. 5841.00"));
        assert!(contains(&bytes, "GST \\(18%\\):") || contains(&bytes, "GST (18%):"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_empty_tables_show_placeholder() {
        let mut bill = bill();
        bill.materials.clear();
        bill.labor.clear();
        bill.notes = None;

        let bytes = PdfRenderer::new(&BillingConfig::default())
            .render(&bill)
            .unwrap();

        assert!(contains(&bytes, "No itemised entries"));
        assert!(!contains(&bytes, "Notes:"));
    }

    #[test]
    fn test_long_bills_break_pages() {
        let mut bill = bill();
        bill.materials = (0..120)
            .map(|i| item(&format!("Part number {}", i), "1", "10.00"))
            .collect();

        let bytes = PdfRenderer::new(&BillingConfig::default())
            .render(&bill)
            .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_wrap_splits_long_text() {
        let lines = wrap(&"word ".repeat(60), Font::Regular, BODY_SIZE, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, BODY_SIZE) <= 200.0);
        }

        assert_eq!(wrap("", Font::Regular, BODY_SIZE, 200.0), vec![String::new()]);
    }

    #[test]
    fn test_sanitize_keeps_ascii() {
        assert_eq!(sanitize("\u{20B9}500 caf\u{e9}"), "Rs.500 caf?");
    }
}
