use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use toml_edit::{DocumentMut, Item, Table, value};

use crate::validator::WidthPolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub width_policy: WidthPolicy,
    #[serde(default)]
    pub pdf: PdfSection,
    #[serde(default)]
    pub preview: PreviewSection,
}

fn default_db_path() -> String {
    "printstore/print_settings.db".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PdfSection {
    pub margin: f32,
    pub title: String,
}

impl Default for PdfSection {
    fn default() -> Self {
        PdfSection {
            margin: 36.0,
            title: "SALES TAX INVOICE".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PreviewSection {
    pub line_width: usize,
}

impl Default for PreviewSection {
    fn default() -> Self {
        PreviewSection { line_width: 120 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: default_db_path(),
            log_filter: default_log_filter(),
            width_policy: WidthPolicy::default(),
            pdf: PdfSection::default(),
            preview: PreviewSection::default(),
        }
    }
}

/// `INVOICE_PRINT_CONFIG` if set, else `.config/invoice_print.toml`.
pub fn config_path() -> PathBuf {
    env::var("INVOICE_PRINT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".config").join("invoice_print.toml"))
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Rewrite the width thresholds, keeping the rest of the file (comments
    /// included) as it was. Creates the file if needed.
    pub fn update_width_policy(
        path: impl AsRef<Path>,
        policy: WidthPolicy,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = if path.exists() {
            fs::read_to_string(path)?
        } else {
            String::new()
        };
        let mut doc = content.parse::<DocumentMut>()?;

        if !doc.contains_table("width_policy") {
            doc.insert("width_policy", Item::Table(Table::new()));
        }
        doc["width_policy"]["min_total"] = value(i64::from(policy.min_total));
        doc["width_policy"]["max_total"] = value(i64::from(policy.max_total));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, doc.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("invoice_print_{}_{name}.toml", std::process::id()))
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let cfg: Config = toml::from_str("db_path = \"x.db\"\n[pdf]\nmargin = 20.0\n").unwrap();
        assert_eq!(cfg.db_path, "x.db");
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.pdf.margin, 20.0);
        assert_eq!(cfg.pdf.title, "SALES TAX INVOICE");
        assert_eq!(cfg.width_policy, WidthPolicy::default());
        assert_eq!(cfg.preview.line_width, 120);
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = Config::load_or_default(temp_path("missing")).unwrap();
        assert_eq!(cfg.db_path, "printstore/print_settings.db");
    }

    #[test]
    fn test_update_width_policy_keeps_other_keys() {
        let path = temp_path("update");
        let original = concat!(
            "# local settings\n",
            "db_path = \"mine.db\"\n\n",
            "[width_policy]\nmin_total = 95\n",
        );
        fs::write(&path, original).unwrap();

        Config::update_width_policy(&path, WidthPolicy { min_total: 90, max_total: 110 }).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("# local settings"));
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.db_path, "mine.db");
        assert_eq!(cfg.width_policy, WidthPolicy { min_total: 90, max_total: 110 });
        fs::remove_file(&path).unwrap();
    }
}
