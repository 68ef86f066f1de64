// src/render/pdf.rs

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;
use std::path::Path;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

use super::{InvoiceRenderer, fit_text, invoice_info_lines, totals_lines};
use crate::error::RenderError;
use crate::invoice::Invoice;
use crate::projection::{ColumnSpans, TableLayout};

// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

const CELL_PADDING: f32 = 2.0;
// Helvetica digits are 0.556 em; bold capitals run wider still.
const AVG_GLYPH_EM: f32 = 0.6;
const FOOTER_HEIGHT: f32 = 24.0;

/// Renders an invoice to a single PDF using the shared table layout.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pub margin: f32,
    pub title: String,
    /// Fixed footer timestamp. `None` stamps the current UTC time.
    pub generated_at: Option<String>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        PdfRenderer {
            margin: 36.0,
            title: "SALES TAX INVOICE".to_string(),
            generated_at: None,
        }
    }
}

/// PDF literal string in WinAnsi bytes, with delimiters escaped.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for ch in text.chars() {
        let byte = match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                ch as u8
            }
            ' '..='~' => ch as u8,
            '\u{a0}'..='\u{ff}' => ch as u32 as u8,
            '—' => 0x97,
            '–' => 0x96,
            '…' => 0x85,
            _ => b'?',
        };
        out.push(byte);
    }
    out.push(b')');
    out
}

/// Content stream for one page.
struct Canvas {
    ops: Vec<u8>,
}

impl Canvas {
    fn new() -> Self {
        Canvas { ops: Vec::new() }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) -> std::io::Result<()> {
        write!(self.ops, "BT /{font} {size:.2} Tf {x:.2} {y:.2} Td ")?;
        self.ops.extend_from_slice(&pdf_string(text));
        self.ops.extend_from_slice(b" Tj ET\n");
        Ok(())
    }

    fn fill_rect(&mut self, gray: f32, x: f32, y: f32, w: f32, h: f32) -> std::io::Result<()> {
        writeln!(self.ops, "{gray:.2} g {x:.2} {y:.2} {w:.2} {h:.2} re f 0 g")
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> std::io::Result<()> {
        writeln!(self.ops, "0.5 w {x:.2} {y:.2} {w:.2} {h:.2} re S")
    }

    fn hline(&mut self, x1: f32, x2: f32, y: f32) -> std::io::Result<()> {
        writeln!(self.ops, "0.5 w {x1:.2} {y:.2} m {x2:.2} {y:.2} l S")
    }
}

/// Characters that fit in a cell `span_width` points wide.
fn max_chars(span_width: f32, font: f32) -> usize {
    ((span_width - 2.0 * CELL_PADDING) / (font * AVG_GLYPH_EM)).max(0.0) as usize
}

/// Table geometry derived once per render.
struct Grid<'a> {
    layout: &'a TableLayout,
    spans: ColumnSpans,
    x: f32,
    width: f32,
    font: f32,
    row_height: f32,
}

impl Grid<'_> {
    fn max_chars(&self, span_width: f32) -> usize {
        max_chars(span_width, self.font)
    }

    fn row(
        &self,
        canvas: &mut Canvas,
        top: f32,
        font: &str,
        number: &str,
        values: &[&str],
    ) -> std::io::Result<()> {
        let bottom = top - self.row_height;
        let baseline = bottom + (self.row_height - self.font) / 2.0 + self.font * 0.2;

        if let Some(span) = &self.spans.number {
            let x = self.x + span.start;
            let text = fit_text(number, self.max_chars(span.width));
            canvas.text(font, self.font, x + CELL_PADDING, baseline, &text)?;
            if self.layout.table_borders {
                canvas.stroke_rect(x, bottom, span.width, self.row_height)?;
            }
        }
        for (span, value) in self.spans.columns.iter().zip(values) {
            let x = self.x + span.start;
            let text = fit_text(value, self.max_chars(span.width));
            canvas.text(font, self.font, x + CELL_PADDING, baseline, &text)?;
            if self.layout.table_borders {
                canvas.stroke_rect(x, bottom, span.width, self.row_height)?;
            }
        }
        Ok(())
    }

    fn header(&self, canvas: &mut Canvas, top: f32) -> std::io::Result<()> {
        canvas.fill_rect(0.9, self.x, top - self.row_height, self.width, self.row_height)?;
        let labels: Vec<&str> = self.layout.header.iter().map(|c| c.value.as_str()).collect();
        self.row(canvas, top, BOLD, "#", &labels)?;
        if !self.layout.table_borders {
            canvas.hline(self.x, self.x + self.width, top - self.row_height)?;
        }
        Ok(())
    }
}

impl PdfRenderer {
    fn timestamp(&self) -> String {
        if let Some(fixed) = &self.generated_at {
            return fixed.clone();
        }
        let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
        OffsetDateTime::now_utc()
            .format(&format)
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn content_pages(
        &self,
        invoice: &Invoice,
        layout: &TableLayout,
    ) -> Result<Vec<Canvas>, RenderError> {
        let margin = self.margin;
        let top = PAGE_HEIGHT - margin;
        let floor = margin + FOOTER_HEIGHT;
        let table_width = PAGE_WIDTH - 2.0 * margin;
        let font = layout.font_size.points();

        let grid = Grid {
            layout,
            spans: layout.column_spans(table_width),
            x: margin,
            width: table_width,
            font,
            row_height: font * 2.2,
        };

        let mut pages = Vec::new();
        let mut canvas = Canvas::new();
        let mut y = top;

        canvas.text(BOLD, 16.0, margin, y - 16.0, &self.title)?;
        y -= 30.0;
        for (label, value) in invoice_info_lines(invoice) {
            canvas.text(BOLD, 9.0, margin, y - 9.0, &format!("{label}:"))?;
            canvas.text(REGULAR, 9.0, margin + 110.0, y - 9.0, &value)?;
            y -= 13.0;
        }
        y -= 10.0;

        grid.header(&mut canvas, y)?;
        y -= grid.row_height;

        for row in &layout.rows {
            if y - grid.row_height < floor {
                pages.push(std::mem::replace(&mut canvas, Canvas::new()));
                y = top;
                grid.header(&mut canvas, y)?;
                y -= grid.row_height;
            }
            let values: Vec<&str> = row.cells.iter().map(|c| c.value.as_str()).collect();
            grid.row(&mut canvas, y, REGULAR, &row.number.to_string(), &values)?;
            y -= grid.row_height;
        }

        let totals = totals_lines(invoice);
        let block = 16.0 + 14.0 * totals.len() as f32;
        if y - block < floor {
            pages.push(std::mem::replace(&mut canvas, Canvas::new()));
            y = top;
        }
        y -= 16.0;
        let label_x = margin + table_width * 0.55;
        let value_x = margin + table_width * 0.8;
        for (label, value) in totals {
            let font = if label == "GRAND TOTAL" { BOLD } else { REGULAR };
            canvas.text(font, 10.0, label_x, y - 10.0, &format!("{label}:"))?;
            canvas.text(font, 10.0, value_x, y - 10.0, &value)?;
            y -= 14.0;
        }
        pages.push(canvas);
        Ok(pages)
    }

    pub fn render_to_bytes(
        &self,
        invoice: &Invoice,
        layout: &TableLayout,
    ) -> Result<Vec<u8>, RenderError> {
        let mut pages = self.content_pages(invoice, layout)?;
        let count = pages.len();
        let stamp = self.timestamp();
        for (i, page) in pages.iter_mut().enumerate() {
            let footer = format!("Generated on {stamp}  |  Page {} of {count}", i + 1);
            page.text(REGULAR, 7.0, self.margin, self.margin, &footer)?;
        }

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
            "Font" => dictionary! { REGULAR => regular_id, BOLD => bold_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(count);
        for page in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, page.ops));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        info!(pages = count, columns = layout.column_count(), "Rendered invoice PDF");
        Ok(bytes)
    }

    pub fn render_to_file(
        &self,
        invoice: &Invoice,
        layout: &TableLayout,
        path: &Path,
    ) -> Result<(), RenderError> {
        let bytes = self.render_to_bytes(invoice, layout)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "Wrote invoice PDF");
        Ok(())
    }
}

impl InvoiceRenderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, invoice: &Invoice, layout: &TableLayout) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(invoice, layout)
    }
}
