use std::path::Path;

use anyhow::Context;
use relic_cabinet::{Cabinet, FileDescriptor, InstallAction};
use serde_json::json;
use tracing::info;

use crate::output::{create_table, format_size, numeric_cell, print_listing, regular_cell};
use crate::{CabCommands, OutputFormat};

pub fn handle(cmd: CabCommands, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        CabCommands::List { dir } => list(&dir, format),
        CabCommands::Components { dir } => components(&dir, format),
        CabCommands::Extract { dir, index, output } => extract(&dir, index, &output),
        CabCommands::Install {
            dir,
            target,
            dry_run,
        } => install(&dir, &target, dry_run),
    }
}

fn open(dir: &Path) -> anyhow::Result<Cabinet> {
    Cabinet::open(dir).with_context(|| format!("failed to open cabinet in {}", dir.display()))
}

/// Short flag summary: c(ompressed), o(bfuscated), i(nvalid), l(ink)
fn flag_letters(file: &FileDescriptor) -> String {
    [
        (file.flags.is_compressed(), 'c'),
        (file.flags.is_obfuscated(), 'o'),
        (file.flags.is_invalid(), 'i'),
        (file.links_previous(), 'l'),
    ]
    .iter()
    .map(|&(set, letter)| if set { letter } else { '-' })
    .collect()
}

fn list(dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let cabinet = open(dir)?;
    let mut table = create_table(&["Index", "Flags", "Size", "Stored", "Volume", "Path"]);
    for (index, file) in cabinet.files().iter().enumerate() {
        let path = if file.directory.is_empty() {
            file.name.clone()
        } else {
            format!("{}\\{}", file.directory, file.name)
        };
        table.add_row(vec![
            numeric_cell(index),
            regular_cell(flag_letters(file)),
            numeric_cell(format_size(file.size)),
            numeric_cell(format_size(file.compressed_size)),
            numeric_cell(file.volume),
            regular_cell(path),
        ]);
    }

    let value = json!({
        "version": cabinet.version().number(),
        "files": cabinet.files().iter().map(|f| json!({
            "name": f.name,
            "directory": f.directory,
            "size": f.size,
            "compressed_size": f.compressed_size,
            "volume": f.volume,
            "flags": f.flags.0,
            "md5": f.digest.to_hex(),
        })).collect::<Vec<_>>(),
    });
    if format == OutputFormat::Text {
        println!("Cabinet format version {}", cabinet.version());
    }
    print_listing(&value, &table, format)?;
    Ok(())
}

fn components(dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let cabinet = open(dir)?;
    let mut table = create_table(&["Component", "Group", "Files", "Destination"]);
    let mut value = Vec::new();
    for component in cabinet.components() {
        for name in &component.groups {
            let (files, destination) = match cabinet.group(name) {
                Some(group) => (
                    format!("{}..={}", group.first, group.last),
                    format!("{}\\{}", component.destination, group.destination),
                ),
                None => ("missing".to_string(), String::new()),
            };
            table.add_row(vec![
                regular_cell(&component.name),
                regular_cell(name),
                regular_cell(files),
                regular_cell(destination),
            ]);
        }
        value.push(json!({
            "name": component.name,
            "destination": component.destination,
            "groups": component.groups,
        }));
    }
    print_listing(&json!({ "components": value }), &table, format)?;
    Ok(())
}

fn extract(dir: &Path, index: usize, output: &Path) -> anyhow::Result<()> {
    let cabinet = open(dir)?;
    let report = cabinet
        .extract_to_path(index, output)
        .with_context(|| format!("failed to extract file {index}"))?;
    info!(
        "Extracted file {} ({} bytes, md5 {}) to {}",
        index,
        report.bytes_written,
        report.digest,
        output.display()
    );
    Ok(())
}

fn install(dir: &Path, target: &Path, dry_run: bool) -> anyhow::Result<()> {
    let cabinet = open(dir)?;
    if dry_run {
        for step in cabinet.install_plan(target) {
            match &step.action {
                InstallAction::Extract { index, destination } => {
                    println!("extract {index:5} -> {}", destination.display());
                }
                InstallAction::Copy {
                    source,
                    destination,
                } => {
                    println!("copy {} -> {}", source.display(), destination.display());
                }
            }
        }
        return Ok(());
    }

    let summary = cabinet
        .install(target)
        .with_context(|| format!("install into {} failed", target.display()))?;
    info!(
        "Installed {} extracted and {} copied files into {}",
        summary.extracted,
        summary.copied,
        target.display()
    );
    Ok(())
}
