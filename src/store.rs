// src/store.rs

use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::field_key::FieldKey;
use crate::invoice::{CustomFieldDefinition, CustomFieldType};
use crate::settings::{FontSize, SettingsDocument};

/// Per-user persistence of the settings document.
pub trait SettingsStore {
    fn load(&self, user: &str) -> Result<Option<SettingsDocument>, StoreError>;

    /// Store `doc` and return what was persisted.
    fn save(&self, user: &str, doc: &SettingsDocument) -> Result<SettingsDocument, StoreError>;

    fn delete(&self, user: &str) -> Result<(), StoreError>;
}

/// Source of the user's active custom field definitions.
pub trait CustomFieldProvider {
    fn active_custom_fields(&self, user: &str) -> Result<Vec<CustomFieldDefinition>, StoreError>;
}

/// SQLite-backed store for print settings and custom field definitions.
pub struct PrintStore {
    conn: Connection,
}

// Raw row before keys are validated.
struct SettingsRow {
    visible_fields: String,
    column_widths: String,
    font_size: String,
    table_borders: bool,
    show_item_numbers: bool,
}

fn now_rfc3339() -> Result<String, StoreError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

impl PrintStore {
    /// Open (or create) the store at `db_path`. `":memory:"` gives a
    /// throwaway database.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS print_settings (
                user TEXT PRIMARY KEY,
                visible_fields TEXT NOT NULL,
                column_widths TEXT NOT NULL,
                font_size TEXT NOT NULL DEFAULT 'small',
                table_borders INTEGER NOT NULL DEFAULT 1,
                show_item_numbers INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS custom_fields (
                id TEXT PRIMARY KEY,
                user TEXT NOT NULL,
                field_name TEXT NOT NULL,
                field_type TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_custom_fields_user ON custom_fields(user)",
            [],
        )?;

        info!("Print settings database initialized");
        Ok(Self { conn })
    }

    /// Stable id for a custom field, derived from its owner, name and
    /// creation time.
    pub fn generate_field_id(user: &str, field_name: &str, created_at: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user.as_bytes());
        hasher.update(field_name.as_bytes());
        hasher.update(created_at.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }

    /// When the user's settings were last written, if ever.
    pub fn updated_at(&self, user: &str) -> Result<Option<String>, StoreError> {
        let stamp = self
            .conn
            .query_row(
                "SELECT updated_at FROM print_settings WHERE user = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stamp)
    }

    pub fn create_custom_field(
        &self,
        user: &str,
        field_name: &str,
        field_type: CustomFieldType,
    ) -> Result<CustomFieldDefinition, StoreError> {
        let created_at = now_rfc3339()?;
        let id = Self::generate_field_id(user, field_name, &created_at);
        self.conn.execute(
            "INSERT INTO custom_fields (id, user, field_name, field_type, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![id, user, field_name, field_type.as_str(), created_at],
        )?;
        info!(user = %user, id = %id, name = %field_name, "Custom field created");
        Ok(CustomFieldDefinition {
            id,
            field_name: field_name.to_string(),
            field_type,
            is_active: true,
        })
    }

    /// Activate or deactivate a custom field. Returns false when the user
    /// has no field with that id.
    pub fn set_custom_field_active(
        &self,
        user: &str,
        id: &str,
        active: bool,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE custom_fields SET is_active = ?1 WHERE user = ?2 AND id = ?3",
            params![active, user, id],
        )?;
        info!(user = %user, id = %id, active, "Custom field state changed");
        Ok(changed > 0)
    }

    /// All of the user's custom fields, active or not, oldest first.
    pub fn list_custom_fields(&self, user: &str) -> Result<Vec<CustomFieldDefinition>, StoreError> {
        self.query_custom_fields(user, false)
    }

    fn query_custom_fields(
        &self,
        user: &str,
        active_only: bool,
    ) -> Result<Vec<CustomFieldDefinition>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, field_name, field_type, is_active
             FROM custom_fields
             WHERE user = ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![user, active_only], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;

        let mut fields = Vec::new();
        for row in rows {
            let (id, field_name, field_type, is_active) = row?;
            let Some(field_type) = CustomFieldType::from_name(&field_type) else {
                warn!(
                    id = %id,
                    field_type = %field_type,
                    "Skipping custom field with unknown type"
                );
                continue;
            };
            fields.push(CustomFieldDefinition {
                id,
                field_name,
                field_type,
                is_active,
            });
        }
        Ok(fields)
    }

    fn parse_settings(user: &str, row: SettingsRow) -> Result<SettingsDocument, StoreError> {
        let raw_fields: Vec<String> = serde_json::from_str(&row.visible_fields)?;
        let raw_widths: BTreeMap<String, u32> = serde_json::from_str(&row.column_widths)?;

        let visible_fields = raw_fields
            .into_iter()
            .filter_map(|name| match FieldKey::from_str(&name) {
                Ok(key) => Some(key),
                Err(_) => {
                    warn!(user = %user, field = %name, "Ignoring unknown stored field");
                    None
                }
            })
            .collect();
        let column_widths = raw_widths
            .into_iter()
            .filter_map(|(name, width)| FieldKey::from_str(&name).ok().map(|k| (k, width)))
            .collect();
        let font_size = FontSize::from_name(&row.font_size).unwrap_or_else(|| {
            warn!(user = %user, font_size = %row.font_size, "Unknown stored font size");
            FontSize::default()
        });

        Ok(SettingsDocument {
            visible_fields,
            column_widths,
            font_size,
            table_borders: row.table_borders,
            show_item_numbers: row.show_item_numbers,
        })
    }
}

impl SettingsStore for PrintStore {
    fn load(&self, user: &str) -> Result<Option<SettingsDocument>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT visible_fields, column_widths, font_size, table_borders, show_item_numbers
                 FROM print_settings
                 WHERE user = ?1",
                params![user],
                |row| {
                    Ok(SettingsRow {
                        visible_fields: row.get(0)?,
                        column_widths: row.get(1)?,
                        font_size: row.get(2)?,
                        table_borders: row.get(3)?,
                        show_item_numbers: row.get(4)?,
                    })
                },
            )
            .optional()?;

        row.map(|r| Self::parse_settings(user, r)).transpose()
    }

    fn save(&self, user: &str, doc: &SettingsDocument) -> Result<SettingsDocument, StoreError> {
        let visible_fields = serde_json::to_string(&doc.visible_fields)?;
        let column_widths = serde_json::to_string(&doc.column_widths)?;
        let updated_at = now_rfc3339()?;

        self.conn.execute(
            "INSERT INTO print_settings
                (user, visible_fields, column_widths, font_size,
                 table_borders, show_item_numbers, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user) DO UPDATE SET
                visible_fields = excluded.visible_fields,
                column_widths = excluded.column_widths,
                font_size = excluded.font_size,
                table_borders = excluded.table_borders,
                show_item_numbers = excluded.show_item_numbers,
                updated_at = excluded.updated_at",
            params![
                user,
                visible_fields,
                column_widths,
                doc.font_size.as_str(),
                doc.table_borders,
                doc.show_item_numbers,
                updated_at,
            ],
        )?;
        info!(user = %user, columns = doc.visible_fields.len(), "Print settings stored");
        Ok(doc.clone())
    }

    fn delete(&self, user: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM print_settings WHERE user = ?1", params![user])?;
        info!(user = %user, "Print settings deleted");
        Ok(())
    }
}

impl CustomFieldProvider for PrintStore {
    fn active_custom_fields(&self, user: &str) -> Result<Vec<CustomFieldDefinition>, StoreError> {
        self.query_custom_fields(user, true)
    }
}
