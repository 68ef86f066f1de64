// src/session.rs

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, CategoryDescriptor, FieldDescriptor, get_catalog};
use crate::error::{LayoutError, PrintError};
use crate::field_key::FieldKey;
use crate::invoice::Invoice;
use crate::ordering::{DragGesture, reorder};
use crate::projection::TableLayout;
use crate::settings::{FontSize, SettingsDocument, default_settings};
use crate::store::{CustomFieldProvider, SettingsStore};
use crate::validator::{self, WidthHealth, WidthPolicy, reconcile, sanitize_for_save};

/// An in-progress edit of one user's layout. Nothing here touches storage;
/// dropping the session discards the draft.
#[derive(Debug, Clone)]
pub struct EditSession {
    draft: SettingsDocument,
    catalog: Catalog,
    policy: WidthPolicy,
    drag: DragGesture,
    has_stored: bool,
}

impl EditSession {
    /// Columns the catalog no longer offers (a deactivated custom field, for
    /// instance) are dropped from the draft, since the editor cannot show
    /// or toggle them and saving would drop them anyway.
    pub fn new(
        doc: SettingsDocument,
        catalog: Catalog,
        policy: WidthPolicy,
        has_stored: bool,
    ) -> Self {
        let mut draft = reconcile(doc, &catalog);
        validator::retain_known(&mut draft, &catalog);
        EditSession {
            draft,
            catalog,
            policy,
            drag: DragGesture::default(),
            has_stored,
        }
    }

    pub fn draft(&self) -> &SettingsDocument {
        &self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether the user has a stored layout, i.e. whether reset would do
    /// anything.
    pub fn has_stored(&self) -> bool {
        self.has_stored
    }

    pub fn grouped_fields(&self) -> Vec<(&CategoryDescriptor, Vec<&FieldDescriptor>)> {
        self.catalog.grouped()
    }

    fn descriptor(&self, key: &FieldKey) -> Result<&FieldDescriptor, LayoutError> {
        self.catalog
            .get(key)
            .ok_or_else(|| LayoutError::UnknownFieldKey(key.to_string()))
    }

    /// Returns whether the column is visible afterwards.
    pub fn toggle(&mut self, key: &FieldKey) -> Result<bool, LayoutError> {
        let descriptor = self.descriptor(key)?.clone();
        Ok(validator::toggle_field(&mut self.draft, &descriptor))
    }

    pub fn set_width(&mut self, key: &FieldKey, width: u32) -> Result<(), LayoutError> {
        let descriptor = self.descriptor(key)?.clone();
        validator::set_width(&mut self.draft, &descriptor, width)
    }

    pub fn clamp_width(&mut self, key: &FieldKey, width: u32) -> Result<u32, LayoutError> {
        let descriptor = self.descriptor(key)?.clone();
        Ok(validator::clamp_width(&mut self.draft, &descriptor, width))
    }

    pub fn move_column(&mut self, from: usize, to: usize) -> Result<(), LayoutError> {
        reorder(&mut self.draft.visible_fields, from, to)
    }

    pub fn begin_drag(&mut self, index: usize) -> Result<(), LayoutError> {
        let len = self.draft.visible_fields.len();
        if index >= len {
            return Err(LayoutError::IndexOutOfBounds { index, len });
        }
        self.drag.start(index);
        Ok(())
    }

    pub fn drag_over(&mut self, index: usize) -> Result<bool, LayoutError> {
        self.drag.over(&mut self.draft.visible_fields, index)
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.draft.font_size = size;
    }

    pub fn set_table_borders(&mut self, on: bool) {
        self.draft.table_borders = on;
    }

    pub fn set_show_item_numbers(&mut self, on: bool) {
        self.draft.show_item_numbers = on;
    }

    pub fn total_width(&self) -> u32 {
        validator::rendered_width(&self.draft, &self.catalog)
    }

    pub fn health(&self) -> WidthHealth {
        self.policy.health(self.total_width())
    }

    /// Live table for the editor's preview pane.
    pub fn preview(&self, invoice: &Invoice) -> TableLayout {
        TableLayout::build(&self.draft, &self.catalog, &invoice.items)
    }
}

/// Stored-or-default settings for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSettings {
    pub document: SettingsDocument,
    pub is_default: bool,
}

/// Result of a successful save. `warning` is set when the width total is
/// outside the policy; the save still happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub document: SettingsDocument,
    pub health: WidthHealth,
    pub warning: Option<String>,
}

/// Ties the catalog, validator and store together per user.
pub struct PrintSettingsService<S> {
    store: S,
    policy: WidthPolicy,
}

impl<S: SettingsStore + CustomFieldProvider> PrintSettingsService<S> {
    pub fn new(store: S, policy: WidthPolicy) -> Self {
        PrintSettingsService { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> WidthPolicy {
        self.policy
    }

    pub fn catalog(&self, user: &str) -> Result<Catalog, PrintError> {
        let custom = self.store.active_custom_fields(user)?;
        Ok(get_catalog(&custom))
    }

    fn effective_with(
        &self,
        user: &str,
        catalog: &Catalog,
    ) -> Result<EffectiveSettings, PrintError> {
        let (document, is_default) = match self.store.load(user)? {
            Some(doc) => (doc, false),
            None => (default_settings(), true),
        };
        Ok(EffectiveSettings {
            document: reconcile(document, catalog),
            is_default,
        })
    }

    pub fn effective_settings(&self, user: &str) -> Result<EffectiveSettings, PrintError> {
        let catalog = self.catalog(user)?;
        self.effective_with(user, &catalog)
    }

    pub fn open_editor(&self, user: &str) -> Result<EditSession, PrintError> {
        let catalog = self.catalog(user)?;
        let effective = self.effective_with(user, &catalog)?;
        Ok(EditSession::new(
            effective.document,
            catalog,
            self.policy,
            !effective.is_default,
        ))
    }

    /// Commit a session's draft. On failure the draft is left as it was so
    /// the user can retry.
    pub fn save(&self, user: &str, session: &mut EditSession) -> Result<SaveOutcome, PrintError> {
        let doc = sanitize_for_save(session.draft.clone(), &session.catalog)?;
        let outcome = self.persist(user, doc)?;
        session.draft = outcome.document.clone();
        session.has_stored = true;
        Ok(outcome)
    }

    /// Save a document without going through an edit session.
    pub fn save_document(
        &self,
        user: &str,
        doc: SettingsDocument,
    ) -> Result<SaveOutcome, PrintError> {
        let catalog = self.catalog(user)?;
        let doc = sanitize_for_save(doc, &catalog)?;
        self.persist(user, doc)
    }

    fn persist(&self, user: &str, doc: SettingsDocument) -> Result<SaveOutcome, PrintError> {
        let document = self.store.save(user, &doc)?;
        let total = validator::total_width(&document);
        let health = self.policy.health(total);
        let warning = self.policy.warning(total);
        if let Some(message) = &warning {
            warn!(user = %user, total, "{message}");
        }
        info!(user = %user, total, "Print settings saved");
        Ok(SaveOutcome {
            document,
            health,
            warning,
        })
    }

    /// Delete the stored layout; the next load falls back to the defaults.
    pub fn reset(&self, user: &str) -> Result<SettingsDocument, PrintError> {
        self.store.delete(user)?;
        info!(user = %user, "Print settings reset to defaults");
        Ok(reconcile(default_settings(), &self.catalog(user)?))
    }

    /// Table layout for printing `invoice` with the user's settings.
    pub fn layout_for(&self, user: &str, invoice: &Invoice) -> Result<TableLayout, PrintError> {
        let catalog = self.catalog(user)?;
        let effective = self.effective_with(user, &catalog)?;
        Ok(TableLayout::build(&effective.document, &catalog, &invoice.items))
    }
}
