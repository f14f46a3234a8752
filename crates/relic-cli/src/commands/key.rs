use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use relic_formats::key::{KeyIndex, ResourceType};
use serde_json::json;
use tracing::info;

use crate::output::{create_table, numeric_cell, print_listing, regular_cell};
use crate::{KeyCommands, OutputFormat};

pub fn handle(cmd: KeyCommands, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        KeyCommands::List { key, resource_type } => list(&key, resource_type.as_deref(), format),
        KeyCommands::Export {
            key,
            name,
            resource_type,
            output,
        } => export(&key, &name, &resource_type, output),
    }
}

/// Resource type named by its extension
pub fn parse_resource_type(extension: &str) -> anyhow::Result<ResourceType> {
    match ResourceType::from_extension(extension) {
        Some(ty) => Ok(ty),
        None => bail!("unknown resource type '{extension}'"),
    }
}

fn open(key: &Path) -> anyhow::Result<KeyIndex> {
    KeyIndex::open(key).with_context(|| format!("failed to read {}", key.display()))
}

/// Directory the archive paths in `key` are relative to
fn game_root(key: &Path) -> &Path {
    key.parent().unwrap_or_else(|| Path::new("."))
}

fn list(key: &Path, filter: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let filter = filter.map(parse_resource_type).transpose()?;
    let index = open(key)?;

    let mut table = create_table(&["Category", "Resource", "Archive", "Locator"]);
    let mut groups = serde_json::Map::new();
    for (category, resources) in index.by_category() {
        let resources: Vec<_> = resources
            .into_iter()
            .filter(|r| filter.is_none_or(|ty| r.resource_type == ty))
            .collect();
        if resources.is_empty() {
            continue;
        }
        for resource in &resources {
            let archive = index
                .archives()
                .get(usize::from(resource.locator.archive))
                .map_or("?", |a| a.name.as_str());
            table.add_row(vec![
                regular_cell(category),
                regular_cell(resource.file_name()),
                regular_cell(archive),
                numeric_cell(resource.locator),
            ]);
        }
        groups.insert(
            category.to_string(),
            resources
                .iter()
                .map(|r| {
                    json!({
                        "name": r.file_name(),
                        "type": r.resource_type.code(),
                        "locator": r.locator.raw(),
                    })
                })
                .collect(),
        );
    }

    let value = json!({
        "archives": index.archives().iter().map(|a| a.name.clone()).collect::<Vec<_>>(),
        "resources": groups,
    });
    print_listing(&value, &table, format)?;
    Ok(())
}

fn export(
    key: &Path,
    name: &str,
    resource_type: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let resource_type = parse_resource_type(resource_type)?;
    let index = open(key)?;
    let Some(resource) = index.find(name, resource_type) else {
        bail!("{name}.{resource_type} is not listed in {}", key.display());
    };

    let data = index
        .load_resource(game_root(key), resource)
        .with_context(|| format!("failed to load {}", resource.file_name()))?;
    let output = output.unwrap_or_else(|| PathBuf::from(resource.file_name()));
    fs::write(&output, &data).with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        "Exported {} ({} bytes) to {}",
        resource.file_name(),
        data.len(),
        output.display()
    );
    Ok(())
}
