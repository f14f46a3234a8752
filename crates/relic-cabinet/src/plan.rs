//! Mapping components, groups and files onto an install directory

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cabinet::Cabinet;
use crate::error::CabinetResult;

/// Placeholder replaced by the install directory
pub const TARGET_DIR_TOKEN: &str = "<targetdir>";

/// What to do for one installed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    /// Extract file `index` from the volumes
    Extract {
        /// File index
        index: usize,
        /// Destination path
        destination: PathBuf,
    },
    /// Copy a file shipped uncompressed next to the header
    Copy {
        /// Source path
        source: PathBuf,
        /// Destination path
        destination: PathBuf,
    },
}

impl InstallAction {
    /// Destination path
    pub fn destination(&self) -> &Path {
        match self {
            Self::Extract { destination, .. } | Self::Copy { destination, .. } => destination,
        }
    }
}

/// One entry of an install plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    /// Component the file is installed for
    pub component: String,
    /// File name
    pub file: String,
    /// Action to take
    pub action: InstallAction,
}

/// Counts from a completed install
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Files extracted from volumes
    pub extracted: usize,
    /// Files copied from beside the header
    pub copied: usize,
}

fn backslashes_to_slashes(part: &str) -> String {
    part.replace('\\', "/")
}

/// Join path parts, dropping empty and `.` segments and folding `..`
///
/// Operates on `/`-separated strings rather than [`Path`] so the result is
/// the same on every host: the joined value still holds the unexpanded
/// `<targetdir>` token and is only turned into a host path after that token
/// is replaced. A `..` never climbs above an absolute root, and leading
/// `..` segments of a relative path are kept.
fn clean_join(parts: &[&str]) -> String {
    let absolute = parts
        .iter()
        .find(|p| !p.is_empty())
        .is_some_and(|p| p.starts_with('/'));
    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        for segment in part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.last().is_some_and(|s| *s != "..") {
                        segments.pop();
                    } else if !absolute {
                        segments.push("..");
                    }
                }
                other => segments.push(other),
            }
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Build the install path of a file
///
/// The component destination, group destination, directory and name are
/// joined, lowercased and normalized to forward slashes. Only paths that
/// mention the target directory token and have a file name are installed;
/// the first token is replaced by `target`.
pub fn destination_path(
    target: &str,
    component: &str,
    group: &str,
    directory: &str,
    name: &str,
) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let parts = [component, group, directory, name].map(backslashes_to_slashes);
    let refs = parts.each_ref().map(String::as_str);
    let clean = clean_join(&refs).to_lowercase();
    clean
        .contains(TARGET_DIR_TOKEN)
        .then(|| clean.replacen(TARGET_DIR_TOKEN, target, 1))
}

impl Cabinet {
    /// List every file the components install under `target`
    ///
    /// Groups a component names but the header does not define are
    /// skipped, and group ranges are clamped to the file table.
    pub fn install_plan(&self, target: &Path) -> Vec<InstallStep> {
        let target_str = target.to_string_lossy();
        let files = self.files();
        let mut steps = Vec::new();

        for component in self.components() {
            for group_name in &component.groups {
                let Some(group) = self.group(group_name) else {
                    debug!(
                        "Component {} names unknown group {}",
                        component.name, group_name
                    );
                    continue;
                };
                let first = group.first as usize;
                let last = (group.last as usize).min(files.len().saturating_sub(1));
                for index in first..=last {
                    let Some(file) = files.get(index) else { break };
                    let Some(destination) = destination_path(
                        &target_str,
                        &component.destination,
                        &group.destination,
                        &file.directory,
                        &file.name,
                    ) else {
                        continue;
                    };
                    let destination = PathBuf::from(destination);
                    let action = if file.offset == 0 {
                        InstallAction::Copy {
                            source: self
                                .root()
                                .join(backslashes_to_slashes(&group.source))
                                .join(&file.name),
                            destination,
                        }
                    } else {
                        InstallAction::Extract { index, destination }
                    };
                    steps.push(InstallStep {
                        component: component.name.clone(),
                        file: file.name.clone(),
                        action,
                    });
                }
            }
        }
        steps
    }

    /// Carry out the install plan for `target`, stopping at the first failure
    pub fn install(&self, target: &Path) -> CabinetResult<InstallSummary> {
        let mut summary = InstallSummary::default();
        let mut current_component = None;
        for step in self.install_plan(target) {
            if current_component.as_ref() != Some(&step.component) {
                info!("Installing component {}", step.component);
                current_component = Some(step.component.clone());
            }
            if let Some(parent) = step.action.destination().parent() {
                std::fs::create_dir_all(parent)?;
            }
            match &step.action {
                InstallAction::Extract { index, destination } => {
                    info!("Extracting {}", step.file);
                    self.extract_to_path(*index, destination)?;
                    summary.extracted += 1;
                }
                InstallAction::Copy {
                    source,
                    destination,
                } => {
                    info!("Copying {}", step.file);
                    std::fs::copy(source, destination)?;
                    summary.copied += 1;
                }
            }
        }
        Ok(summary)
    }
}
