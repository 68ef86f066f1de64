use std::{env, fs};

use invoice_print::config::{self, Config};
use invoice_print::{
    CustomFieldType, Invoice, InvoiceRenderer, PdfRenderer, PrintSettingsService, PrintStore,
    SettingsDocument, TextPreview, WidthPolicy,
};
use tracing::{info, warn};

const USAGE: &str = "usage: invoice_print <command>
  catalog <user>                      list available columns
  show <user>                         print effective settings as JSON
  save <user> <settings.json>         validate and store settings
  reset <user>                        delete stored settings
  add-field <user> <name> <type>      create a custom field (text|number|date|textarea)
  deactivate-field <user> <id>        hide a custom field from the catalog
  preview <user> <invoice.json>       render a text preview
  export <user> <invoice.json> <out>  render a PDF
  policy <min> <max>                  update the width-sum policy in the config file";

fn arg(args: &[String], i: usize) -> Result<&str, Box<dyn std::error::Error>> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument\n{USAGE}").into())
}

fn read_invoice(path: &str) -> Result<Invoice, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg_path = config::config_path();
    let cfg = Config::load_or_default(&cfg_path)?;

    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(cfg.log_filter.as_str())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    if command == "policy" {
        let policy = WidthPolicy {
            min_total: arg(&args, 1)?.parse()?,
            max_total: arg(&args, 2)?.parse()?,
        };
        if policy.min_total > policy.max_total {
            return Err("min must not exceed max".into());
        }
        Config::update_width_policy(&cfg_path, policy)?;
        info!(
            path = %cfg_path.display(),
            min = policy.min_total,
            max = policy.max_total,
            "Width policy updated"
        );
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(&cfg.db_path).parent() {
        fs::create_dir_all(parent)?;
    }
    let service = PrintSettingsService::new(PrintStore::new(&cfg.db_path)?, cfg.width_policy);
    let user = arg(&args, 1)?;

    match command.as_str() {
        "catalog" => {
            let catalog = service.catalog(user)?;
            for (category, fields) in catalog.grouped() {
                println!("{}", category.label);
                for field in fields {
                    let required = if field.required { " (required)" } else { "" };
                    println!(
                        "  {:<36} {:<16} {:>2}-{:<2}%{required}",
                        field.key.to_string(),
                        field.label,
                        field.min_width,
                        field.max_width
                    );
                }
            }
        }
        "show" => {
            let effective = service.effective_settings(user)?;
            if let Some(stamp) = service.store().updated_at(user)? {
                info!(user = %user, updated_at = %stamp, "Stored settings");
            }
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
        "save" => {
            let doc: SettingsDocument = serde_json::from_str(&fs::read_to_string(arg(&args, 2)?)?)?;
            let outcome = service.save_document(user, doc)?;
            if let Some(message) = &outcome.warning {
                warn!("{message}");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        "reset" => {
            let defaults = service.reset(user)?;
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        "add-field" => {
            let name = arg(&args, 2)?;
            let field_type = CustomFieldType::from_name(arg(&args, 3)?)
                .ok_or("field type must be text, number, date or textarea")?;
            let field = service.store().create_custom_field(user, name, field_type)?;
            println!("{}", serde_json::to_string_pretty(&field)?);
        }
        "deactivate-field" => {
            let id = arg(&args, 2)?;
            if !service.store().set_custom_field_active(user, id, false)? {
                return Err(format!("no custom field {id} for {user}").into());
            }
        }
        "preview" => {
            let invoice = read_invoice(arg(&args, 2)?)?;
            let layout = service.layout_for(user, &invoice)?;
            let preview = TextPreview {
                line_width: cfg.preview.line_width,
            };
            print!("{}", preview.render(&invoice, &layout)?);
        }
        "export" => {
            let invoice = read_invoice(arg(&args, 2)?)?;
            let out = arg(&args, 3)?;
            let layout = service.layout_for(user, &invoice)?;
            let renderer = PdfRenderer {
                margin: cfg.pdf.margin,
                title: cfg.pdf.title.clone(),
                generated_at: None,
            };
            renderer.render_to_file(&invoice, &layout, std::path::Path::new(out))?;
        }
        other => {
            return Err(format!("unknown command `{other}`\n{USAGE}").into());
        }
    }

    Ok(())
}
