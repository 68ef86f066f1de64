// src/render/mod.rs

mod pdf;
mod preview;

pub use pdf::PdfRenderer;
pub use preview::TextPreview;

use crate::error::RenderError;
use crate::invoice::{Invoice, InvoiceTotals, format_money};
use crate::projection::TableLayout;

/// A consumer of the shared table layout. Implementations differ only in
/// presentation; the columns, their order and their widths come from the
/// layout.
pub trait InvoiceRenderer {
    type Output;

    fn render(&self, invoice: &Invoice, layout: &TableLayout) -> Result<Self::Output, RenderError>;
}

/// Shorten `text` to at most `max_chars` characters, marking the cut with
/// an ellipsis.
pub fn fit_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Label/value pairs printed above the items table.
pub(crate) fn invoice_info_lines(invoice: &Invoice) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("FBR Invoice Number", or_na(invoice.fbr_invoice_number.as_deref())),
        ("Reference Number", or_na(invoice.invoice_ref_no.as_deref())),
        ("Invoice Date", or_na(Some(&invoice.invoice_date))),
        ("Invoice Type", or_na(Some(&invoice.invoice_type))),
    ];
    if let Some(buyer) = &invoice.buyer {
        lines.push(("Buyer", or_na(Some(&buyer.business_name))));
        lines.push(("Buyer NTN/CNIC", or_na(Some(&buyer.ntncnic))));
        lines.push(("Buyer Address", or_na(Some(&buyer.address))));
    }
    lines
}

/// Label/value pairs printed under the items table. Discount and FED only
/// appear when non-zero.
pub(crate) fn totals_lines(invoice: &Invoice) -> Vec<(&'static str, String)> {
    let totals = InvoiceTotals::from_items(&invoice.items);
    let mut lines = vec![
        ("Subtotal (Excl. Tax)", format_money(totals.subtotal)),
        ("Sales Tax", format_money(totals.sales_tax)),
    ];
    if totals.discount > 0.0 {
        lines.push(("Discount", format!("- {}", format_money(totals.discount))));
    }
    if totals.fed > 0.0 {
        lines.push(("FED Payable", format_money(totals.fed)));
    }
    lines.push(("GRAND TOTAL", format_money(totals.grand_total)));
    lines
}
