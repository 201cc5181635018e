use serde_json::{json, Value};

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::engine::CrudEngine;

pub async fn handle_list(resource: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = super::connect().await?;
    let rows = CrudEngine::new(&store).list(&resource).await?;
    store.close().await;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No {} found", resource);
            }
            for row in &rows {
                println!("{}", Value::Object(row.clone()));
            }
        }
    }
    Ok(())
}

pub fn handle_hash_password(password: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let hash = bcrypt::hash(password, config::config().security.bcrypt_cost)?;
    match output_format {
        OutputFormat::Json => output_success(&output_format, "Password hashed", Some(json!({ "hash": hash }))),
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
    }
}
