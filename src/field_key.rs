// src/field_key.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;

/// Prefix used when a custom field key crosses the persistence boundary.
pub const CUSTOM_FIELD_PREFIX: &str = "customField_";

/// The fixed set of columns every invoice line item can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinField {
    HsCode,
    ProductDescription,
    SaleType,
    Quantity,
    UoM,
    Rate,
    ValueSalesExcludingSt,
    FixedNotifiedValueOrRetailPrice,
    Discount,
    TotalValues,
    SalesTaxApplicable,
    SalesTaxWithheldAtSource,
    ExtraTax,
    FurtherTax,
    FedPayable,
    SroScheduleNo,
    SroItemSerialNo,
}

impl BuiltinField {
    pub const ALL: [BuiltinField; 17] = [
        BuiltinField::HsCode,
        BuiltinField::ProductDescription,
        BuiltinField::SaleType,
        BuiltinField::Quantity,
        BuiltinField::UoM,
        BuiltinField::Rate,
        BuiltinField::ValueSalesExcludingSt,
        BuiltinField::FixedNotifiedValueOrRetailPrice,
        BuiltinField::Discount,
        BuiltinField::TotalValues,
        BuiltinField::SalesTaxApplicable,
        BuiltinField::SalesTaxWithheldAtSource,
        BuiltinField::ExtraTax,
        BuiltinField::FurtherTax,
        BuiltinField::FedPayable,
        BuiltinField::SroScheduleNo,
        BuiltinField::SroItemSerialNo,
    ];

    /// Wire name, matching the invoice item's JSON property.
    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinField::HsCode => "hsCode",
            BuiltinField::ProductDescription => "productDescription",
            BuiltinField::SaleType => "saleType",
            BuiltinField::Quantity => "quantity",
            BuiltinField::UoM => "uoM",
            BuiltinField::Rate => "rate",
            BuiltinField::ValueSalesExcludingSt => "valueSalesExcludingST",
            BuiltinField::FixedNotifiedValueOrRetailPrice => "fixedNotifiedValueOrRetailPrice",
            BuiltinField::Discount => "discount",
            BuiltinField::TotalValues => "totalValues",
            BuiltinField::SalesTaxApplicable => "salesTaxApplicable",
            BuiltinField::SalesTaxWithheldAtSource => "salesTaxWithheldAtSource",
            BuiltinField::ExtraTax => "extraTax",
            BuiltinField::FurtherTax => "furtherTax",
            BuiltinField::FedPayable => "fedPayable",
            BuiltinField::SroScheduleNo => "sroScheduleNo",
            BuiltinField::SroItemSerialNo => "sroItemSerialNo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// Identifies one column: either a built-in field or a user-defined custom
/// field by its id. The `customField_<id>` string form only exists at the
/// serde boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKey {
    Builtin(BuiltinField),
    Custom(String),
}

impl FieldKey {
    pub fn custom(id: impl Into<String>) -> Self {
        FieldKey::Custom(id.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, FieldKey::Custom(_))
    }
}

impl From<BuiltinField> for FieldKey {
    fn from(field: BuiltinField) -> Self {
        FieldKey::Builtin(field)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Builtin(field) => f.write_str(field.as_str()),
            FieldKey::Custom(id) => write!(f, "{CUSTOM_FIELD_PREFIX}{id}"),
        }
    }
}

impl FromStr for FieldKey {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix(CUSTOM_FIELD_PREFIX) {
            if id.is_empty() {
                return Err(LayoutError::UnknownFieldKey(s.to_string()));
            }
            return Ok(FieldKey::Custom(id.to_string()));
        }
        BuiltinField::from_name(s)
            .map(FieldKey::Builtin)
            .ok_or_else(|| LayoutError::UnknownFieldKey(s.to_string()))
    }
}

impl TryFrom<String> for FieldKey {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}
