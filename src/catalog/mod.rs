// src/catalog/mod.rs

mod builtin;

use serde::Serialize;

use crate::field_key::{BuiltinField, FieldKey};
use crate::invoice::{
    CustomFieldDefinition, CustomFieldType, InvoiceItem, PLACEHOLDER, format_quantity,
    text_or_placeholder,
};

/// Editor grouping for catalog entries. Never affects column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Basic,
    Quantity,
    Amounts,
    Tax,
    Sro,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDescriptor {
    pub key: Category,
    pub label: &'static str,
    pub order: u8,
}

const BUILTIN_CATEGORIES: [CategoryDescriptor; 5] = [
    CategoryDescriptor { key: Category::Basic, label: "Basic Information", order: 1 },
    CategoryDescriptor { key: Category::Quantity, label: "Quantity & Rate", order: 2 },
    CategoryDescriptor { key: Category::Amounts, label: "Amounts", order: 3 },
    CategoryDescriptor { key: Category::Tax, label: "Tax Details", order: 4 },
    CategoryDescriptor { key: Category::Sro, label: "SRO Details", order: 5 },
];

const CUSTOM_CATEGORY: CategoryDescriptor = CategoryDescriptor {
    key: Category::Custom,
    label: "Custom Fields",
    order: 6,
};

/// Where a column's cell text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Builtin(BuiltinField),
    Custom { id: String, field_type: CustomFieldType },
}

/// One entry in the field catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: FieldKey,
    pub label: String,
    pub description: String,
    pub category: Category,
    pub min_width: u32,
    pub max_width: u32,
    pub required: bool,
    #[serde(skip)]
    pub source: ValueSource,
}

impl FieldDescriptor {
    /// Width assigned when the column is first shown.
    pub fn default_width(&self) -> u32 {
        (self.min_width + self.max_width) / 2
    }

    pub fn clamp_width(&self, width: u32) -> u32 {
        width.clamp(self.min_width, self.max_width)
    }

    pub fn accepts_width(&self, width: u32) -> bool {
        (self.min_width..=self.max_width).contains(&width)
    }

    /// Display text for this column on one line item. Currency and quantity
    /// figures are rounded to two decimals here so every renderer prints the
    /// same digits.
    pub fn value_for(&self, item: &InvoiceItem, _index: usize) -> String {
        match &self.source {
            ValueSource::Builtin(field) => builtin::value(*field, item),
            ValueSource::Custom { id, field_type } => match item.custom_value(id) {
                None => PLACEHOLDER.to_string(),
                Some(raw) => match field_type {
                    CustomFieldType::Number => raw
                        .parse::<f64>()
                        .map(format_quantity)
                        .unwrap_or_else(|_| raw.to_string()),
                    _ => text_or_placeholder(raw),
                },
            },
        }
    }
}

fn custom_bounds(field_type: CustomFieldType) -> (u32, u32) {
    match field_type {
        CustomFieldType::Text => (5, 25),
        CustomFieldType::Number => (5, 20),
        CustomFieldType::Date => (8, 15),
        CustomFieldType::Textarea => (10, 40),
    }
}

fn custom_descriptor(def: &CustomFieldDefinition) -> FieldDescriptor {
    let (min_width, max_width) = custom_bounds(def.field_type);
    FieldDescriptor {
        key: FieldKey::custom(def.id.clone()),
        label: def.field_name.clone(),
        description: format!("Custom {} field", def.field_type.as_str()),
        category: Category::Custom,
        min_width,
        max_width,
        required: false,
        source: ValueSource::Custom {
            id: def.id.clone(),
            field_type: def.field_type,
        },
    }
}

/// Every column available to a user: the fixed built-ins plus one entry per
/// active custom field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub builtins: Vec<FieldDescriptor>,
    pub custom_fields: Vec<FieldDescriptor>,
    pub categories: Vec<CategoryDescriptor>,
}

/// Build the catalog for a user's custom field list. Inactive definitions
/// are ignored.
pub fn get_catalog(custom_fields: &[CustomFieldDefinition]) -> Catalog {
    let custom_fields: Vec<FieldDescriptor> = custom_fields
        .iter()
        .filter(|def| def.is_active)
        .map(custom_descriptor)
        .collect();

    let mut categories = BUILTIN_CATEGORIES.to_vec();
    if !custom_fields.is_empty() {
        categories.push(CUSTOM_CATEGORY);
    }

    Catalog {
        builtins: builtin::descriptors(),
        custom_fields,
        categories,
    }
}

impl Catalog {
    /// Built-ins followed by custom fields.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.builtins.iter().chain(self.custom_fields.iter())
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldDescriptor> {
        self.iter().find(|d| &d.key == key)
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.iter().filter(|d| d.required)
    }

    /// Fields grouped by category in display order, for the settings editor.
    pub fn grouped(&self) -> Vec<(&CategoryDescriptor, Vec<&FieldDescriptor>)> {
        let mut categories: Vec<&CategoryDescriptor> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
            .into_iter()
            .map(|c| (c, self.iter().filter(|d| d.category == c.key).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::CustomFieldValue;

    fn lot_field() -> CustomFieldDefinition {
        CustomFieldDefinition {
            id: "abc123".into(),
            field_name: "Lot No".into(),
            field_type: CustomFieldType::Text,
            is_active: true,
        }
    }

    #[test]
    fn test_empty_custom_list() {
        let catalog = get_catalog(&[]);
        assert!(catalog.custom_fields.is_empty());
        assert_eq!(catalog.builtins.len(), BuiltinField::ALL.len());
        assert!(catalog.categories.iter().all(|c| c.key != Category::Custom));
    }

    #[test]
    fn test_custom_fields_become_entries() {
        let mut inactive = lot_field();
        inactive.id = "old".into();
        inactive.is_active = false;

        let catalog = get_catalog(&[lot_field(), inactive]);
        assert_eq!(catalog.custom_fields.len(), 1);
        let d = catalog.get(&FieldKey::custom("abc123")).unwrap();
        assert_eq!(d.label, "Lot No");
        assert_eq!(d.category, Category::Custom);
        assert!(catalog.get(&FieldKey::custom("old")).is_none());
        assert!(catalog.categories.iter().any(|c| c.key == Category::Custom));
    }

    #[test]
    fn test_custom_value_lookup() {
        let catalog = get_catalog(&[lot_field()]);
        let d = catalog.get(&FieldKey::custom("abc123")).unwrap();

        let mut item = InvoiceItem::default();
        assert_eq!(d.value_for(&item, 0), PLACEHOLDER);

        item.custom_field_values.push(CustomFieldValue {
            custom_field_id: "abc123".into(),
            value: "L-77".into(),
        });
        assert_eq!(d.value_for(&item, 0), "L-77");
    }

    #[test]
    fn test_number_custom_field_two_decimals() {
        let def = CustomFieldDefinition {
            id: "w1".into(),
            field_name: "Weight".into(),
            field_type: CustomFieldType::Number,
            is_active: true,
        };
        let catalog = get_catalog(&[def]);
        let d = catalog.get(&FieldKey::custom("w1")).unwrap();
        let item = InvoiceItem {
            custom_field_values: vec![CustomFieldValue {
                custom_field_id: "w1".into(),
                value: "12.5".into(),
            }],
            ..Default::default()
        };
        assert_eq!(d.value_for(&item, 3), "12.50");
    }

    #[test]
    fn test_grouping_follows_category_order() {
        let catalog = get_catalog(&[lot_field()]);
        let groups = catalog.grouped();
        let orders: Vec<u8> = groups.iter().map(|(c, _)| c.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
        let (_, custom) = groups.last().unwrap();
        assert_eq!(custom.len(), 1);
    }

    #[test]
    fn test_midpoint_default_width() {
        let catalog = get_catalog(&[]);
        let qty = catalog.get(&FieldKey::Builtin(BuiltinField::Quantity)).unwrap();
        assert_eq!(qty.default_width(), 12);
        assert_eq!(qty.clamp_width(40), 20);
        assert!(!qty.accepts_width(4));
    }
}
