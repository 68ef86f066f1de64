// src/projection.rs

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::field_key::FieldKey;
use crate::invoice::InvoiceItem;
use crate::settings::{FontSize, SettingsDocument};

/// Share of the table reserved for the `#` column when item numbers are on.
pub const ITEM_NUMBER_GUTTER_PERCENT: u32 = 4;

/// Which row to project.
#[derive(Debug, Clone, Copy)]
pub enum RowRequest<'a> {
    Header,
    Item { item: &'a InvoiceItem, index: usize },
}

/// One cell of a projected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedCell {
    pub key: FieldKey,
    pub label: String,
    pub value: String,
    pub width_percent: u32,
}

/// Map the document's visible columns onto one row. Columns whose key is
/// missing from the catalog (for example a deleted custom field) are
/// skipped; the rest render normally. The header row carries the label as
/// its value.
pub fn project(
    doc: &SettingsDocument,
    catalog: &Catalog,
    row: RowRequest<'_>,
) -> Vec<ProjectedCell> {
    doc.visible_fields
        .iter()
        .filter_map(|key| {
            let Some(descriptor) = catalog.get(key) else {
                debug!(field = %key, "Skipping column not present in catalog");
                return None;
            };
            let value = match row {
                RowRequest::Header => descriptor.label.clone(),
                RowRequest::Item { item, index } => descriptor.value_for(item, index),
            };
            Some(ProjectedCell {
                key: key.clone(),
                label: descriptor.label.clone(),
                value,
                width_percent: doc
                    .width_of(key)
                    .unwrap_or_else(|| descriptor.default_width()),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// 1-based position of the item on the invoice.
    pub number: usize,
    pub cells: Vec<ProjectedCell>,
}

/// Horizontal placement of one column, in whatever unit the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpans {
    pub number: Option<Span>,
    pub columns: Vec<Span>,
}

/// Everything a renderer needs to draw the items table. The preview and the
/// PDF both consume this; neither selects, orders or sizes columns itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLayout {
    pub header: Vec<ProjectedCell>,
    pub rows: Vec<TableRow>,
    pub font_size: FontSize,
    pub table_borders: bool,
    pub show_item_numbers: bool,
    pub total_width: u32,
}

impl TableLayout {
    pub fn build(doc: &SettingsDocument, catalog: &Catalog, items: &[InvoiceItem]) -> Self {
        let header = project(doc, catalog, RowRequest::Header);
        let total_width = header.iter().map(|c| c.width_percent).sum();
        let rows = items
            .iter()
            .enumerate()
            .map(|(index, item)| TableRow {
                number: index + 1,
                cells: project(doc, catalog, RowRequest::Item { item, index }),
            })
            .collect();

        TableLayout {
            header,
            rows,
            font_size: doc.font_size,
            table_borders: doc.table_borders,
            show_item_numbers: doc.show_item_numbers,
            total_width,
        }
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Lay the columns out across `extent` units. The item-number gutter is
    /// carved off first; percentages apply to what is left. Totals other
    /// than 100% are drawn as-is (short or overflowing tables).
    pub fn column_spans(&self, extent: f32) -> ColumnSpans {
        let (number, body_start, body) = if self.show_item_numbers {
            let gutter = extent * ITEM_NUMBER_GUTTER_PERCENT as f32 / 100.0;
            (Some(Span { start: 0.0, width: gutter }), gutter, extent - gutter)
        } else {
            (None, 0.0, extent)
        };

        let mut cursor = body_start;
        let columns = self
            .header
            .iter()
            .map(|cell| {
                let width = body * cell.width_percent as f32 / 100.0;
                let span = Span { start: cursor, width };
                cursor += width;
                span
            })
            .collect();

        ColumnSpans { number, columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_catalog;
    use crate::field_key::BuiltinField;
    use crate::invoice::{CustomFieldDefinition, CustomFieldType, CustomFieldValue};
    use crate::settings::default_settings;
    use crate::validator::reconcile;
    use proptest::prelude::*;

    fn sample_item() -> InvoiceItem {
        InvoiceItem {
            product_description: "Cotton yarn 20s".into(),
            quantity: 12.0,
            uom: "KG".into(),
            rate: "18%".into(),
            value_sales_excluding_st: 2400.0,
            sales_tax_applicable: 432.0,
            total_values: 2832.0,
            custom_field_values: vec![CustomFieldValue {
                custom_field_id: "abc123".into(),
                value: "Lot 7".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_item_row_values() {
        let catalog = get_catalog(&[]);
        let doc = default_settings();
        let row = project(&doc, &catalog, RowRequest::Item { item: &sample_item(), index: 0 });
        let values: Vec<&str> = row.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            [
                "—",
                "Cotton yarn 20s",
                "12.00",
                "KG",
                "18%",
                "Rs. 2400.00",
                "Rs. 432.00",
                "Rs. 2832.00"
            ]
        );
    }

    #[test]
    fn test_header_row_uses_labels() {
        let catalog = get_catalog(&[]);
        let header = project(&default_settings(), &catalog, RowRequest::Header);
        assert_eq!(header[1].value, "Description");
        assert!(header.iter().all(|c| c.value == c.label));
    }

    #[test]
    fn test_orphaned_custom_field_is_skipped() {
        let catalog = get_catalog(&[]);
        let mut doc = default_settings();
        doc.visible_fields.insert(1, FieldKey::custom("abc123"));
        doc.column_widths.insert(FieldKey::custom("abc123"), 10);

        let header = project(&doc, &catalog, RowRequest::Header);
        let row = project(&doc, &catalog, RowRequest::Item { item: &sample_item(), index: 0 });
        assert_eq!(header.len(), 8);
        assert_eq!(row.len(), 8);
        assert!(header.iter().all(|c| c.key != FieldKey::custom("abc123")));
        assert_eq!(header[1].key, FieldKey::Builtin(BuiltinField::ProductDescription));
    }

    #[test]
    fn test_layout_total_skips_orphaned_width() {
        let catalog = get_catalog(&[]);
        let mut doc = default_settings();
        doc.visible_fields.push(FieldKey::custom("gone"));
        doc.column_widths.insert(FieldKey::custom("gone"), 20);

        let layout = TableLayout::build(&doc, &catalog, &[]);
        let header_sum: u32 = layout.header.iter().map(|c| c.width_percent).sum();
        assert_eq!(layout.total_width, header_sum);
        assert_eq!(layout.total_width, 100);
    }

    #[test]
    fn test_active_custom_field_renders() {
        let catalog = get_catalog(&[CustomFieldDefinition {
            id: "abc123".into(),
            field_name: "Lot No".into(),
            field_type: CustomFieldType::Text,
            is_active: true,
        }]);
        let mut doc = default_settings();
        doc.visible_fields.push(FieldKey::custom("abc123"));
        let doc = reconcile(doc, &catalog);

        let row = project(&doc, &catalog, RowRequest::Item { item: &sample_item(), index: 0 });
        let last = row.last().unwrap();
        assert_eq!(last.label, "Lot No");
        assert_eq!(last.value, "Lot 7");
        assert_eq!(last.width_percent, 15);
    }

    #[test]
    fn test_layout_numbers_rows() {
        let catalog = get_catalog(&[]);
        let items = vec![sample_item(), sample_item(), sample_item()];
        let layout = TableLayout::build(&default_settings(), &catalog, &items);
        let numbers: Vec<usize> = layout.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
        assert_eq!(layout.total_width, 100);
        assert_eq!(layout.column_count(), 8);
    }

    #[test]
    fn test_column_spans_with_gutter() {
        let catalog = get_catalog(&[]);
        let layout = TableLayout::build(&default_settings(), &catalog, &[]);
        let spans = layout.column_spans(500.0);

        let gutter = spans.number.unwrap();
        assert_eq!(gutter.width, 20.0);
        assert_eq!(spans.columns[0].start, 20.0);
        // hsCode is 10% of the remaining 480.
        assert!((spans.columns[0].width - 48.0).abs() < 1e-3);
        let last = spans.columns.last().unwrap();
        assert!((last.start + last.width - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_column_spans_without_gutter() {
        let catalog = get_catalog(&[]);
        let mut doc = default_settings();
        doc.show_item_numbers = false;
        let layout = TableLayout::build(&doc, &catalog, &[]);
        let spans = layout.column_spans(100.0);
        assert!(spans.number.is_none());
        assert_eq!(spans.columns[0].start, 0.0);
        assert!((spans.columns[1].start - 10.0).abs() < 1e-4);
    }

    fn arb_layout_doc() -> impl Strategy<Value = SettingsDocument> {
        let keys: Vec<FieldKey> = BuiltinField::ALL
            .into_iter()
            .map(FieldKey::Builtin)
            .chain([FieldKey::custom("abc123"), FieldKey::custom("gone")])
            .collect();
        let n = keys.len();
        proptest::sample::subsequence(keys, 0..=n)
            .prop_shuffle()
            .prop_map(|visible| SettingsDocument {
                visible_fields: visible,
                ..default_settings()
            })
    }

    proptest! {
        /// Header and item rows agree on keys and widths.
        #[test]
        fn header_and_rows_agree(doc in arb_layout_doc(), index in 0usize..50) {
            let catalog = get_catalog(&[CustomFieldDefinition {
                id: "abc123".into(),
                field_name: "Lot No".into(),
                field_type: CustomFieldType::Number,
                is_active: true,
            }]);
            let item = sample_item();
            let header = project(&doc, &catalog, RowRequest::Header);
            let row = project(&doc, &catalog, RowRequest::Item { item: &item, index });

            prop_assert_eq!(header.len(), row.len());
            for (h, r) in header.iter().zip(&row) {
                prop_assert_eq!(&h.key, &r.key);
                prop_assert_eq!(h.width_percent, r.width_percent);
            }
            prop_assert!(header.iter().all(|c| c.key != FieldKey::custom("gone")));
        }
    }
}
