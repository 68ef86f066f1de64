use super::{Category, FieldDescriptor, ValueSource};
use crate::field_key::{BuiltinField, FieldKey};
use crate::invoice::{
    InvoiceItem, PLACEHOLDER, format_money, format_quantity, text_or_placeholder,
};

struct BuiltinEntry {
    field: BuiltinField,
    label: &'static str,
    description: &'static str,
    category: Category,
    min_width: u32,
    max_width: u32,
    required: bool,
}

const fn entry(
    field: BuiltinField,
    label: &'static str,
    description: &'static str,
    category: Category,
    min_width: u32,
    max_width: u32,
) -> BuiltinEntry {
    BuiltinEntry {
        field,
        label,
        description,
        category,
        min_width,
        max_width,
        required: false,
    }
}

// ---------------------------------------------------------------------------
// Built-in column table
// ---------------------------------------------------------------------------

const BUILTINS: [BuiltinEntry; 17] = [
    entry(
        BuiltinField::HsCode,
        "HS Code",
        "Harmonized System code of the product",
        Category::Basic,
        6,
        20,
    ),
    BuiltinEntry {
        required: true,
        ..entry(
            BuiltinField::ProductDescription,
            "Description",
            "Product or service description",
            Category::Basic,
            15,
            45,
        )
    },
    entry(BuiltinField::SaleType, "Sale Type", "FBR sale type of the line", Category::Basic, 8, 20),
    entry(BuiltinField::Quantity, "Qty", "Quantity sold", Category::Quantity, 5, 20),
    entry(BuiltinField::UoM, "UoM", "Unit of measurement", Category::Quantity, 5, 15),
    entry(BuiltinField::Rate, "Rate", "Applicable sales tax rate", Category::Quantity, 5, 12),
    entry(
        BuiltinField::ValueSalesExcludingSt,
        "Value (Excl.)",
        "Value of sales excluding sales tax",
        Category::Amounts,
        8,
        20,
    ),
    entry(
        BuiltinField::FixedNotifiedValueOrRetailPrice,
        "Retail Price",
        "Fixed notified value or retail price",
        Category::Amounts,
        8,
        20,
    ),
    entry(BuiltinField::Discount, "Discount", "Discount on the line", Category::Amounts, 6, 15),
    entry(
        BuiltinField::TotalValues,
        "Total",
        "Total value including taxes",
        Category::Amounts,
        8,
        20,
    ),
    entry(
        BuiltinField::SalesTaxApplicable,
        "Sales Tax",
        "Sales tax applicable",
        Category::Tax,
        8,
        18,
    ),
    entry(
        BuiltinField::SalesTaxWithheldAtSource,
        "ST Withheld",
        "Sales tax withheld at source",
        Category::Tax,
        8,
        18,
    ),
    entry(BuiltinField::ExtraTax, "Extra Tax", "Extra tax", Category::Tax, 6, 15),
    entry(BuiltinField::FurtherTax, "Further Tax", "Further tax", Category::Tax, 6, 15),
    entry(
        BuiltinField::FedPayable,
        "FED Payable",
        "Federal excise duty payable",
        Category::Tax,
        6,
        15,
    ),
    entry(BuiltinField::SroScheduleNo, "SRO Schedule", "SRO schedule number", Category::Sro, 6, 15),
    entry(
        BuiltinField::SroItemSerialNo,
        "SRO Item",
        "SRO item serial number",
        Category::Sro,
        6,
        12,
    ),
];

/// Descriptors for every built-in column, in catalog order.
pub(super) fn descriptors() -> Vec<FieldDescriptor> {
    BUILTINS
        .iter()
        .map(|s| FieldDescriptor {
            key: FieldKey::Builtin(s.field),
            label: s.label.to_string(),
            description: s.description.to_string(),
            category: s.category,
            min_width: s.min_width,
            max_width: s.max_width,
            required: s.required,
            source: ValueSource::Builtin(s.field),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Value extraction
// ---------------------------------------------------------------------------

pub(super) fn value(field: BuiltinField, item: &InvoiceItem) -> String {
    match field {
        BuiltinField::HsCode => item
            .hs_code
            .as_ref()
            .map(|h| text_or_placeholder(&h.hs_code))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        BuiltinField::ProductDescription => text_or_placeholder(&item.product_description),
        BuiltinField::SaleType => text_or_placeholder(&item.sale_type),
        BuiltinField::Quantity => format_quantity(item.quantity),
        BuiltinField::UoM => text_or_placeholder(&item.uom),
        BuiltinField::Rate => text_or_placeholder(&item.rate),
        BuiltinField::ValueSalesExcludingSt => format_money(item.value_sales_excluding_st),
        BuiltinField::FixedNotifiedValueOrRetailPrice => {
            format_money(item.fixed_notified_value_or_retail_price)
        }
        BuiltinField::Discount => format_money(item.discount),
        BuiltinField::TotalValues => format_money(item.total_values),
        BuiltinField::SalesTaxApplicable => format_money(item.sales_tax_applicable),
        BuiltinField::SalesTaxWithheldAtSource => format_money(item.sales_tax_withheld_at_source),
        // Free text on the wire; numeric when the gateway sent a figure.
        BuiltinField::ExtraTax => match item.extra_tax.trim().parse::<f64>() {
            Ok(v) => format_money(v),
            Err(_) => text_or_placeholder(&item.extra_tax),
        },
        BuiltinField::FurtherTax => format_money(item.further_tax),
        BuiltinField::FedPayable => format_money(item.fed_payable),
        BuiltinField::SroScheduleNo => text_or_placeholder(&item.sro_schedule_no),
        BuiltinField::SroItemSerialNo => text_or_placeholder(&item.sro_item_serial_no),
    }
}
