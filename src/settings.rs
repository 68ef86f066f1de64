// src/settings.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::field_key::{BuiltinField, FieldKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "small" => Some(FontSize::Small),
            "medium" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }

    /// Body text size in PDF points.
    pub fn points(self) -> f32 {
        match self {
            FontSize::Small => 8.0,
            FontSize::Medium => 9.5,
            FontSize::Large => 11.0,
        }
    }
}

/// A user's print layout: which columns, in which order, how wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    pub visible_fields: Vec<FieldKey>,
    pub column_widths: BTreeMap<FieldKey, u32>,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default = "default_true")]
    pub table_borders: bool,
    #[serde(default = "default_true")]
    pub show_item_numbers: bool,
}

fn default_true() -> bool {
    true
}

const DEFAULT_COLUMNS: [(BuiltinField, u32); 8] = [
    (BuiltinField::HsCode, 10),
    (BuiltinField::ProductDescription, 26),
    (BuiltinField::Quantity, 8),
    (BuiltinField::UoM, 10),
    (BuiltinField::Rate, 8),
    (BuiltinField::ValueSalesExcludingSt, 13),
    (BuiltinField::SalesTaxApplicable, 12),
    (BuiltinField::TotalValues, 13),
];

/// Layout used whenever a user has no stored settings.
pub fn default_settings() -> SettingsDocument {
    SettingsDocument {
        visible_fields: DEFAULT_COLUMNS.iter().map(|(f, _)| FieldKey::Builtin(*f)).collect(),
        column_widths: DEFAULT_COLUMNS
            .iter()
            .map(|(f, w)| (FieldKey::Builtin(*f), *w))
            .collect(),
        font_size: FontSize::Small,
        table_borders: true,
        show_item_numbers: true,
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        default_settings()
    }
}

impl SettingsDocument {
    pub fn is_visible(&self, key: &FieldKey) -> bool {
        self.visible_fields.contains(key)
    }

    pub fn width_of(&self, key: &FieldKey) -> Option<u32> {
        self.column_widths.get(key).copied()
    }
}
