use std::fmt::Write as _;

use super::{InvoiceRenderer, fit_text, invoice_info_lines, totals_lines};
use crate::error::RenderError;
use crate::invoice::Invoice;
use crate::projection::{Span, TableLayout};

/// Fixed-width text rendering of an invoice, used for the on-screen preview.
#[derive(Debug, Clone)]
pub struct TextPreview {
    /// Characters available for the items table.
    pub line_width: usize,
}

impl Default for TextPreview {
    fn default() -> Self {
        TextPreview { line_width: 120 }
    }
}

fn char_width(span: &Span) -> usize {
    let start = span.start.round() as usize;
    let end = (span.start + span.width).round() as usize;
    end.saturating_sub(start).max(2)
}

fn cell(out: &mut String, text: &str, width: usize, borders: bool) {
    let inner = width - 1;
    let text = fit_text(text, inner);
    if borders {
        let _ = write!(out, "|{text:<inner$}");
    } else {
        let _ = write!(out, "{text:<inner$} ");
    }
}

impl TextPreview {
    fn table_line(
        &self,
        layout: &TableLayout,
        widths: &[usize],
        number_width: Option<usize>,
        number: &str,
        values: impl Iterator<Item = String>,
    ) -> String {
        let mut line = String::new();
        if let Some(w) = number_width {
            cell(&mut line, number, w, layout.table_borders);
        }
        for (value, width) in values.zip(widths) {
            cell(&mut line, &value, *width, layout.table_borders);
        }
        if layout.table_borders {
            line.push('|');
        }
        line.trim_end().to_string()
    }
}

impl InvoiceRenderer for TextPreview {
    type Output = String;

    fn render(&self, invoice: &Invoice, layout: &TableLayout) -> Result<String, RenderError> {
        let spans = layout.column_spans(self.line_width as f32);
        let widths: Vec<usize> = spans.columns.iter().map(char_width).collect();
        let number_width = spans.number.as_ref().map(char_width);

        let mut out = String::new();
        out.push_str("SALES TAX INVOICE\n");
        for (label, value) in invoice_info_lines(invoice) {
            let _ = writeln!(out, "{label}: {value}");
        }
        out.push('\n');

        let header = self.table_line(
            layout,
            &widths,
            number_width,
            "#",
            layout.header.iter().map(|c| c.value.clone()),
        );
        let rule_char = if layout.table_borders { '-' } else { '=' };
        let rule: String = std::iter::repeat_n(rule_char, header.chars().count()).collect();

        if layout.table_borders {
            let _ = writeln!(out, "{rule}");
        }
        let _ = writeln!(out, "{header}");
        let _ = writeln!(out, "{rule}");
        for row in &layout.rows {
            let line = self.table_line(
                layout,
                &widths,
                number_width,
                &row.number.to_string(),
                row.cells.iter().map(|c| c.value.clone()),
            );
            let _ = writeln!(out, "{line}");
        }
        if layout.table_borders {
            let _ = writeln!(out, "{rule}");
        }

        out.push('\n');
        for (label, value) in totals_lines(invoice) {
            let _ = writeln!(out, "{label:>24}: {value}");
        }
        Ok(out)
    }
}
