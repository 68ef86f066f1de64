// src/invoice.rs

use serde::{Deserialize, Serialize};

/// Shown wherever a cell has no value.
pub const PLACEHOLDER: &str = "—";

/// HS code attached to a line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HsCode {
    pub hs_code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Value of one custom field on one line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    pub custom_field_id: String,
    pub value: String,
}

/// A single invoice line item as submitted to the FBR gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceItem {
    pub hs_code: Option<HsCode>,
    pub product_description: String,
    pub rate: String,
    #[serde(rename = "uoM")]
    pub uom: String,
    pub quantity: f64,
    pub total_values: f64,
    #[serde(rename = "valueSalesExcludingST")]
    pub value_sales_excluding_st: f64,
    pub fixed_notified_value_or_retail_price: f64,
    pub sales_tax_applicable: f64,
    pub sales_tax_withheld_at_source: f64,
    pub extra_tax: String,
    pub further_tax: f64,
    pub sro_schedule_no: String,
    pub fed_payable: f64,
    pub discount: f64,
    pub sale_type: String,
    pub sro_item_serial_no: String,
    pub custom_field_values: Vec<CustomFieldValue>,
}

impl InvoiceItem {
    /// Raw value of a custom field on this item, if one was entered.
    pub fn custom_value(&self, custom_field_id: &str) -> Option<&str> {
        self.custom_field_values
            .iter()
            .find(|v| v.custom_field_id == custom_field_id)
            .map(|v| v.value.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Buyer block printed above the items table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Buyer {
    pub business_name: String,
    pub ntncnic: String,
    pub province: String,
    pub address: String,
    pub registration_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub invoice_type: String,
    pub invoice_date: String,
    pub invoice_ref_no: Option<String>,
    pub fbr_invoice_number: Option<String>,
    pub buyer: Option<Buyer>,
    pub items: Vec<InvoiceItem>,
}

/// Summary printed under the items table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub sales_tax: f64,
    pub discount: f64,
    pub fed: f64,
    pub grand_total: f64,
}

impl InvoiceTotals {
    pub fn from_items(items: &[InvoiceItem]) -> Self {
        let mut totals = InvoiceTotals::default();
        for item in items {
            totals.subtotal += item.value_sales_excluding_st;
            totals.sales_tax += item.sales_tax_applicable;
            totals.discount += item.discount;
            totals.fed += item.fed_payable;
        }
        totals.grand_total = totals.subtotal + totals.sales_tax - totals.discount + totals.fed;
        totals
    }
}

/// Type of a user-defined custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Date,
    Textarea,
}

impl CustomFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomFieldType::Text => "text",
            CustomFieldType::Number => "number",
            CustomFieldType::Date => "date",
            CustomFieldType::Textarea => "textarea",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(CustomFieldType::Text),
            "number" => Some(CustomFieldType::Number),
            "date" => Some(CustomFieldType::Date),
            "textarea" => Some(CustomFieldType::Textarea),
            _ => None,
        }
    }
}

/// A custom field definition owned by the custom-field service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldDefinition {
    pub id: String,
    pub field_name: String,
    pub field_type: CustomFieldType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

pub fn format_money(v: f64) -> String {
    format!("Rs. {:.2}", normalize_zero(v))
}

pub fn format_quantity(v: f64) -> String {
    format!("{:.2}", normalize_zero(v))
}

// Avoid printing "-0.00" for values that round to zero.
fn normalize_zero(v: f64) -> f64 {
    if v.abs() < 0.005 { 0.0 } else { v }
}

/// Text value or the placeholder when blank.
pub fn text_or_placeholder(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}
