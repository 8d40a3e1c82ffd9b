use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::store::Connector;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print a record as JSON, or as `key: value` lines in text mode
pub fn output_record<T: Serialize>(output_format: &OutputFormat, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => match value {
            Value::Object(map) => {
                for (key, value) in map {
                    let shown = match value {
                        Value::String(s) => s,
                        Value::Null => "-".to_string(),
                        other => other.to_string(),
                    };
                    println!("{:<20} {}", format!("{}:", key), shown);
                }
            }
            other => println!("{}", other),
        },
    }
    Ok(())
}

pub fn output_connectors(output_format: &OutputFormat, connectors: &[Connector]) -> anyhow::Result<()> {
    if connectors.is_empty() {
        return output_empty_collection(output_format, "connectors", "No connectors registered");
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "connectors": connectors }))?);
        }
        OutputFormat::Text => {
            println!("{:<38} {:<20} {:<10} {:<18} {:<13} {}", "ID", "NAME", "VERSION", "BPN", "STATUS", "ENDPOINT");
            println!("{}", "-".repeat(130));

            for c in connectors {
                println!(
                    "{:<38} {:<20} {:<10} {:<18} {:<13} {}",
                    c.id,
                    c.name,
                    c.version,
                    c.bpn,
                    format!("{:?}", c.status),
                    c.endpoint
                );
            }
        }
    }
    Ok(())
}
