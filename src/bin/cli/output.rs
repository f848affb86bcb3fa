//! Output files and stdout summaries
//!
//! Formats run summaries as human-readable text or JSON

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use log::warn;
use serde_json::json;

use cpn_unfolder::{CompiledProperty, ContextKind, Unfolded};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Expected: human, json", s)),
        }
    }
}

/// Files produced by one run, keyed by suffix
#[derive(Debug, Clone)]
pub struct OutputFiles {
    dir: PathBuf,
    stem: String,
    pending: Vec<(PathBuf, String)>,
}

impl OutputFiles {
    pub fn new(dir: &Path, stem: &str) -> Self {
        OutputFiles {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            pending: Vec::new(),
        }
    }

    /// `<dir>/<stem><suffix>`
    pub fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.stem, suffix))
    }

    /// Queue `contents` for `<stem><suffix>`; nothing is written until `write_all`
    pub fn add(&mut self, suffix: &str, contents: String) -> PathBuf {
        let path = self.path(suffix);
        self.pending.push((path.clone(), contents));
        path
    }

    /// Write every queued file, or none of them
    ///
    /// Contents are staged next to their targets and renamed into place
    /// once all of them are on disk. On failure staged and already renamed
    /// files are removed.
    pub fn write_all(self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let mut staged = Vec::with_capacity(self.pending.len());
        for (path, contents) in self.pending {
            let temp = staging_path(&path);
            if let Err(e) = fs::write(&temp, contents) {
                discard(staged.iter().map(|(temp, _)| temp));
                let _ = fs::remove_file(&temp);
                return Err(e).with_context(|| format!("Failed to write {}", temp.display()));
            }
            staged.push((temp, path));
        }

        for (i, (temp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp, path) {
                discard(staged[..i].iter().map(|(_, path)| path));
                discard(staged[i..].iter().map(|(temp, _)| temp));
                return Err(e).with_context(|| format!("Failed to write {}", path.display()));
            }
        }
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Best-effort removal after a failed write
fn discard<'p>(paths: impl IntoIterator<Item = &'p PathBuf>) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

/// Summary of an `unfold` run
pub fn format_unfold(
    unfolded: &Unfolded,
    context: ContextKind,
    net_path: &Path,
    property_path: &Path,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Human => {
            let mut output = String::new();
            output.push_str(&format!("Unfolded with {} context\n", context));
            output.push_str(&format!("  Retained: {}\n", unfolded.retained.join(", ")));
            output.push_str(&format!("  Property: {}\n", unfolded.property));
            output.push_str(&format!("  Net written to {}\n", net_path.display()));
            output.push_str(&format!("  Property written to {}\n", property_path.display()));
            output
        }
        OutputFormat::Json => {
            let output = json!({
                "net": net_path.to_string_lossy(),
                "property": property_path.to_string_lossy(),
                "retained": unfolded.retained,
                "context": context.to_string(),
            });
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Summary of a `property` run
pub fn format_property(
    compiled: &CompiledProperty,
    property_path: &Path,
    propositions_path: &Path,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Human => {
            let mut output = String::new();
            output.push_str(&format!("Property: {}\n", compiled.property));
            output.push_str(&format!(
                "  Propositions: {}\n",
                compiled.propositions.lines().count()
            ));
            output.push_str(&format!("  Property written to {}\n", property_path.display()));
            output.push_str(&format!("  Propositions written to {}\n", propositions_path.display()));
            output
        }
        OutputFormat::Json => {
            let output = json!({
                "property": property_path.to_string_lossy(),
                "propositions": propositions_path.to_string_lossy(),
                "formula": compiled.property,
            });
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        }
    }
}
