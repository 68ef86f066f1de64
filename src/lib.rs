//! Print layout engine for FBR sales tax invoices: which columns appear on a
//! printed invoice, in what order and how wide, and the renderers that draw
//! them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod field_key;
pub mod invoice;
pub mod ordering;
pub mod projection;
pub mod render;
pub mod session;
pub mod settings;
pub mod store;
pub mod validator;

pub use catalog::{Catalog, FieldDescriptor, get_catalog};
pub use error::{LayoutError, PrintError, RenderError, StoreError};
pub use field_key::{BuiltinField, FieldKey};
pub use invoice::{CustomFieldDefinition, CustomFieldType, Invoice, InvoiceItem};
pub use ordering::{DragGesture, reorder};
pub use projection::{RowRequest, TableLayout, project};
pub use render::{InvoiceRenderer, PdfRenderer, TextPreview};
pub use session::{EditSession, PrintSettingsService, SaveOutcome};
pub use settings::{FontSize, SettingsDocument, default_settings};
pub use store::{CustomFieldProvider, PrintStore, SettingsStore};
pub use validator::{
    WidthHealth, WidthPolicy, reconcile, rendered_width, sanitize_for_save, total_width,
    width_health,
};
