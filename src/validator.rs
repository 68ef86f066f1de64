// src/validator.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::catalog::{Catalog, FieldDescriptor};
use crate::error::LayoutError;
use crate::settings::SettingsDocument;

/// Advisory range for the sum of visible column widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidthPolicy {
    pub min_total: u32,
    pub max_total: u32,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        WidthPolicy {
            min_total: 95,
            max_total: 105,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WidthHealth {
    Ok { total: u32 },
    Warn { total: u32 },
}

impl WidthHealth {
    pub fn is_ok(&self) -> bool {
        matches!(self, WidthHealth::Ok { .. })
    }

    pub fn total(&self) -> u32 {
        match *self {
            WidthHealth::Ok { total } | WidthHealth::Warn { total } => total,
        }
    }
}

impl WidthPolicy {
    pub fn health(&self, total: u32) -> WidthHealth {
        if (self.min_total..=self.max_total).contains(&total) {
            WidthHealth::Ok { total }
        } else {
            WidthHealth::Warn { total }
        }
    }

    /// Message shown next to a successful save when the total is off.
    pub fn warning(&self, total: u32) -> Option<String> {
        match self.health(total) {
            WidthHealth::Ok { .. } => None,
            WidthHealth::Warn { total } => Some(format!(
                "Column widths total {total}%; recommended {}-{}%",
                self.min_total, self.max_total
            )),
        }
    }
}

/// Health under the default 95-105% policy.
pub fn width_health(total: u32) -> WidthHealth {
    WidthPolicy::default().health(total)
}

/// Sum of widths over visible columns. Columns without a width count as 0.
pub fn total_width(doc: &SettingsDocument) -> u32 {
    doc.visible_fields
        .iter()
        .map(|k| doc.column_widths.get(k).copied().unwrap_or(0))
        .sum()
}

/// Sum of widths over the visible columns the catalog can render, with the
/// midpoint standing in for a missing width. Same columns `project` emits.
pub fn rendered_width(doc: &SettingsDocument, catalog: &Catalog) -> u32 {
    doc.visible_fields
        .iter()
        .filter_map(|k| {
            catalog
                .get(k)
                .map(|d| doc.width_of(k).unwrap_or_else(|| d.default_width()))
        })
        .sum()
}

/// Remove visible keys the catalog no longer knows, with their widths.
pub fn retain_known(doc: &mut SettingsDocument, catalog: &Catalog) {
    let mut dropped = Vec::new();
    doc.visible_fields.retain(|key| {
        let known = catalog.get(key).is_some();
        if !known {
            warn!(field = %key, "Dropping unknown field from layout");
            dropped.push(key.clone());
        }
        known
    });
    for key in dropped {
        doc.column_widths.remove(&key);
    }
}

/// Fill the gaps a catalog change can leave in a loaded document: required
/// fields that are not visible get appended, visible fields without a width
/// get their midpoint width, repeated keys keep their first position. Never
/// hides or reorders a field the user chose.
pub fn reconcile(mut doc: SettingsDocument, catalog: &Catalog) -> SettingsDocument {
    let mut seen = HashSet::new();
    doc.visible_fields.retain(|k| seen.insert(k.clone()));

    for required in catalog.required() {
        if !doc.visible_fields.contains(&required.key) {
            info!(field = %required.key, "Restoring required field to layout");
            doc.visible_fields.push(required.key.clone());
        }
    }

    for key in &doc.visible_fields {
        if doc.column_widths.contains_key(key) {
            continue;
        }
        if let Some(descriptor) = catalog.get(key) {
            doc.column_widths.insert(key.clone(), descriptor.default_width());
        }
    }

    doc
}

/// Show or hide one column. Required columns are never hidden. Returns
/// whether the column is visible afterwards.
pub fn toggle_field(doc: &mut SettingsDocument, descriptor: &FieldDescriptor) -> bool {
    if descriptor.required {
        return doc.is_visible(&descriptor.key);
    }
    if let Some(pos) = doc.visible_fields.iter().position(|k| k == &descriptor.key) {
        doc.visible_fields.remove(pos);
        doc.column_widths.remove(&descriptor.key);
        false
    } else {
        doc.visible_fields.push(descriptor.key.clone());
        doc.column_widths
            .insert(descriptor.key.clone(), descriptor.default_width());
        true
    }
}

/// Set a column width, rejecting values outside the field's range.
pub fn set_width(
    doc: &mut SettingsDocument,
    descriptor: &FieldDescriptor,
    width: u32,
) -> Result<(), LayoutError> {
    if !descriptor.accepts_width(width) {
        return Err(LayoutError::OutOfRangeWidth {
            key: descriptor.key.to_string(),
            width,
            min: descriptor.min_width,
            max: descriptor.max_width,
        });
    }
    doc.column_widths.insert(descriptor.key.clone(), width);
    Ok(())
}

/// Set a column width, pulling out-of-range values to the nearest bound.
pub fn clamp_width(doc: &mut SettingsDocument, descriptor: &FieldDescriptor, width: u32) -> u32 {
    let clamped = descriptor.clamp_width(width);
    doc.column_widths.insert(descriptor.key.clone(), clamped);
    clamped
}

/// Normalize a document right before persistence: reconcile, drop keys the
/// catalog no longer knows, clamp every width into range and forget widths
/// of hidden columns.
pub fn sanitize_for_save(
    doc: SettingsDocument,
    catalog: &Catalog,
) -> Result<SettingsDocument, LayoutError> {
    let mut doc = reconcile(doc, catalog);

    retain_known(&mut doc, catalog);
    if doc.visible_fields.is_empty() {
        return Err(LayoutError::EmptyLayout);
    }

    let mut widths = std::collections::BTreeMap::new();
    for key in &doc.visible_fields {
        if let Some(descriptor) = catalog.get(key) {
            let requested = doc
                .column_widths
                .get(key)
                .copied()
                .unwrap_or_else(|| descriptor.default_width());
            let clamped = descriptor.clamp_width(requested);
            if clamped != requested {
                warn!(field = %key, requested, clamped, "Clamped column width");
            }
            widths.insert(key.clone(), clamped);
        }
    }
    doc.column_widths = widths;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_catalog;
    use crate::field_key::{BuiltinField, FieldKey};
    use crate::invoice::{CustomFieldDefinition, CustomFieldType};
    use crate::settings::{FontSize, default_settings};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn key(field: BuiltinField) -> FieldKey {
        FieldKey::Builtin(field)
    }

    fn doc_with(fields: &[(FieldKey, u32)]) -> SettingsDocument {
        SettingsDocument {
            visible_fields: fields.iter().map(|(k, _)| k.clone()).collect(),
            column_widths: fields.iter().cloned().collect(),
            font_size: FontSize::Small,
            table_borders: true,
            show_item_numbers: false,
        }
    }

    fn catalog_with_custom() -> Catalog {
        get_catalog(&[CustomFieldDefinition {
            id: "abc123".into(),
            field_name: "Lot No".into(),
            field_type: CustomFieldType::Text,
            is_active: true,
        }])
    }

    #[test]
    fn test_basic_save_scenario() {
        let catalog = get_catalog(&[]);
        let doc = doc_with(&[
            (key(BuiltinField::ProductDescription), 40),
            (key(BuiltinField::Quantity), 10),
        ]);
        let saved = sanitize_for_save(doc, &catalog).unwrap();
        assert_eq!(total_width(&saved), 50);
        assert_eq!(width_health(total_width(&saved)), WidthHealth::Warn { total: 50 });
        assert!(WidthPolicy::default().warning(50).is_some());
    }

    #[test]
    fn test_health_bounds_inclusive() {
        assert!(width_health(95).is_ok());
        assert!(width_health(105).is_ok());
        assert!(!width_health(94).is_ok());
        assert!(!width_health(106).is_ok());

        let strict = WidthPolicy { min_total: 100, max_total: 100 };
        assert!(strict.health(100).is_ok());
        assert_eq!(strict.health(99).total(), 99);
    }

    #[test]
    fn test_reconcile_appends_required_and_fills_widths() {
        let catalog = catalog_with_custom();
        let mut doc = doc_with(&[(key(BuiltinField::Quantity), 10)]);
        doc.visible_fields.push(FieldKey::custom("abc123"));

        let doc = reconcile(doc, &catalog);
        assert_eq!(
            doc.visible_fields,
            vec![
                key(BuiltinField::Quantity),
                FieldKey::custom("abc123"),
                key(BuiltinField::ProductDescription),
            ]
        );
        // Midpoints: custom text 5-25 -> 15, description 15-45 -> 30.
        assert_eq!(doc.width_of(&FieldKey::custom("abc123")), Some(15));
        assert_eq!(doc.width_of(&key(BuiltinField::ProductDescription)), Some(30));
        assert_eq!(doc.width_of(&key(BuiltinField::Quantity)), Some(10));
    }

    #[test]
    fn test_reconcile_keeps_unknown_keys() {
        let catalog = get_catalog(&[]);
        let mut doc = default_settings();
        doc.visible_fields.push(FieldKey::custom("gone"));
        let doc = reconcile(doc, &catalog);
        assert!(doc.is_visible(&FieldKey::custom("gone")));
        assert_eq!(doc.width_of(&FieldKey::custom("gone")), None);
    }

    #[test]
    fn test_toggle_appends_at_end() {
        let catalog = get_catalog(&[]);
        let hs = catalog.get(&key(BuiltinField::HsCode)).unwrap();
        let mut doc = default_settings();
        assert_eq!(doc.visible_fields[0], hs.key);

        assert!(!toggle_field(&mut doc, hs));
        assert!(!doc.is_visible(&hs.key));
        assert_eq!(doc.width_of(&hs.key), None);

        assert!(toggle_field(&mut doc, hs));
        assert_eq!(doc.visible_fields.last(), Some(&hs.key));
        assert_eq!(doc.width_of(&hs.key), Some(hs.default_width()));
    }

    #[test]
    fn test_toggle_required_is_noop() {
        let catalog = get_catalog(&[]);
        let desc = catalog.get(&key(BuiltinField::ProductDescription)).unwrap();
        let mut doc = default_settings();
        let before = doc.clone();
        assert!(toggle_field(&mut doc, desc));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_toggle_required_reports_actual_visibility() {
        let catalog = get_catalog(&[]);
        let desc = catalog.get(&key(BuiltinField::ProductDescription)).unwrap();
        let mut doc = doc_with(&[(key(BuiltinField::Quantity), 10)]);
        assert!(!toggle_field(&mut doc, desc));
        assert!(!doc.is_visible(&desc.key));
    }

    #[test]
    fn test_rendered_width_ignores_unknown_keys() {
        let catalog = get_catalog(&[]);
        let mut doc = doc_with(&[
            (key(BuiltinField::ProductDescription), 40),
            (FieldKey::custom("gone"), 20),
        ]);
        doc.visible_fields.push(key(BuiltinField::Quantity));
        assert_eq!(total_width(&doc), 60);
        // Quantity has no width yet and counts at its midpoint of 12.
        assert_eq!(rendered_width(&doc, &catalog), 52);

        retain_known(&mut doc, &catalog);
        assert!(!doc.is_visible(&FieldKey::custom("gone")));
        assert_eq!(doc.width_of(&FieldKey::custom("gone")), None);
    }

    #[test]
    fn test_set_width_rejects_out_of_range() {
        let catalog = get_catalog(&[]);
        let qty = catalog.get(&key(BuiltinField::Quantity)).unwrap();
        let mut doc = default_settings();

        let err = set_width(&mut doc, qty, 25).unwrap_err();
        assert!(matches!(err, LayoutError::OutOfRangeWidth { min: 5, max: 20, .. }));
        assert_eq!(doc.width_of(&qty.key), Some(8));

        set_width(&mut doc, qty, 20).unwrap();
        assert_eq!(doc.width_of(&qty.key), Some(20));

        assert_eq!(clamp_width(&mut doc, qty, 1), 5);
        assert_eq!(doc.width_of(&qty.key), Some(5));
    }

    #[test]
    fn test_sanitize_drops_orphans_and_hidden_widths() {
        let catalog = get_catalog(&[]);
        let mut doc = doc_with(&[
            (key(BuiltinField::ProductDescription), 90),
            (FieldKey::custom("gone"), 10),
        ]);
        doc.column_widths.insert(key(BuiltinField::Rate), 7);

        let saved = sanitize_for_save(doc, &catalog).unwrap();
        assert_eq!(saved.visible_fields, vec![key(BuiltinField::ProductDescription)]);
        assert_eq!(saved.column_widths.len(), 1);
        assert_eq!(saved.width_of(&key(BuiltinField::ProductDescription)), Some(45));
    }

    #[test]
    fn test_sanitize_keeps_required_even_from_empty() {
        let catalog = get_catalog(&[]);
        let doc = doc_with(&[]);
        let saved = sanitize_for_save(doc, &catalog).unwrap();
        assert_eq!(saved.visible_fields, vec![key(BuiltinField::ProductDescription)]);
    }

    fn all_keys() -> Vec<FieldKey> {
        BuiltinField::ALL
            .into_iter()
            .map(FieldKey::Builtin)
            .chain([FieldKey::custom("abc123"), FieldKey::custom("gone")])
            .collect()
    }

    fn arb_document() -> impl Strategy<Value = SettingsDocument> {
        let keys = all_keys();
        let n = keys.len();
        (
            proptest::sample::subsequence(keys.clone(), 0..=n).prop_shuffle(),
            proptest::collection::vec(proptest::option::of(0u32..60), n),
            any::<bool>(),
        )
            .prop_map(move |(visible, widths, borders)| {
                let column_widths: BTreeMap<FieldKey, u32> = keys
                    .iter()
                    .zip(widths)
                    .filter_map(|(k, w)| w.map(|w| (k.clone(), w)))
                    .collect();
                SettingsDocument {
                    visible_fields: visible,
                    column_widths,
                    font_size: FontSize::Medium,
                    table_borders: borders,
                    show_item_numbers: !borders,
                }
            })
    }

    proptest! {
        /// Every required catalog field is visible after reconciliation.
        #[test]
        fn reconcile_includes_required(doc in arb_document()) {
            let catalog = catalog_with_custom();
            let out = reconcile(doc, &catalog);
            for required in catalog.required() {
                prop_assert!(out.visible_fields.contains(&required.key));
            }
        }

        /// Reconciliation is a fixed point.
        #[test]
        fn reconcile_is_idempotent(doc in arb_document()) {
            let catalog = catalog_with_custom();
            let once = reconcile(doc, &catalog);
            let twice = reconcile(once.clone(), &catalog);
            prop_assert_eq!(once, twice);
        }

        /// Reconciliation never drops or reorders chosen fields.
        #[test]
        fn reconcile_preserves_user_order(doc in arb_document()) {
            let catalog = catalog_with_custom();
            let before = doc.visible_fields.clone();
            let out = reconcile(doc, &catalog);
            prop_assert_eq!(&out.visible_fields[..before.len()], &before[..]);
        }

        /// Everything that survives save is within its field's bounds.
        #[test]
        fn saved_widths_within_bounds(doc in arb_document()) {
            let catalog = catalog_with_custom();
            let saved = sanitize_for_save(doc, &catalog).unwrap();
            for key in &saved.visible_fields {
                let d = catalog.get(key).unwrap();
                let w = saved.width_of(key).unwrap();
                prop_assert!(d.min_width <= w && w <= d.max_width);
            }
        }
    }
}
