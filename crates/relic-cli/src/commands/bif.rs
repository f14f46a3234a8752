use std::fs;
use std::path::Path;

use anyhow::Context;
use relic_formats::bif::Bif;
use relic_formats::key::ResourceType;
use serde_json::json;
use tracing::info;

use crate::output::{create_table, format_size, numeric_cell, print_listing, regular_cell};
use crate::{BifCommands, OutputFormat};

pub fn handle(cmd: BifCommands, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        BifCommands::List { archive } => list(&archive, format),
        BifCommands::Get {
            archive,
            index,
            tileset,
            output,
        } => get(&archive, tileset, index, &output),
    }
}

fn open(archive: &Path) -> anyhow::Result<Bif> {
    Bif::open(archive).with_context(|| format!("failed to open {}", archive.display()))
}

fn list(archive: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let bif = open(archive)?;
    let files = bif.entries()?;
    let tilesets = bif.tilesets()?;

    let mut table = create_table(&["Entry", "Type", "Offset", "Size"]);
    for (index, entry) in files.iter().enumerate() {
        table.add_row(vec![
            regular_cell(format!("file {index}")),
            regular_cell(ResourceType::from_code(entry.resource_type)),
            numeric_cell(format!("{:#x}", entry.offset)),
            numeric_cell(format_size(entry.length())),
        ]);
    }
    for (number, entry) in tilesets.iter().enumerate() {
        table.add_row(vec![
            regular_cell(format!("tileset {number} ({} tiles)", entry.tile_count)),
            regular_cell(ResourceType::from_code(entry.resource_type)),
            numeric_cell(format!("{:#x}", entry.offset)),
            numeric_cell(format_size(entry.length())),
        ]);
    }

    let value = json!({
        "kind": format!("{:?}", bif.kind()),
        "files": files.iter().map(|e| json!({
            "locator": e.locator,
            "type": e.resource_type,
            "offset": e.offset,
            "size": e.size,
        })).collect::<Vec<_>>(),
        "tilesets": tilesets.iter().map(|e| json!({
            "locator": e.locator,
            "type": e.resource_type,
            "offset": e.offset,
            "tile_count": e.tile_count,
            "tile_size": e.tile_size,
        })).collect::<Vec<_>>(),
    });
    print_listing(&value, &table, format)?;
    Ok(())
}

fn get(archive: &Path, tileset: u32, index: u32, output: &Path) -> anyhow::Result<()> {
    let bif = open(archive)?;
    let data = bif
        .get(tileset, index)
        .with_context(|| format!("no resource {tileset}:{index} in {}", archive.display()))?;
    fs::write(output, &data).with_context(|| format!("failed to write {}", output.display()))?;
    info!("Wrote {} bytes to {}", data.len(), output.display());
    Ok(())
}
