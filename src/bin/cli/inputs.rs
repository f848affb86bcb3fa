//! Input loading
//!
//! Reads every input file and decodes it with the library, attaching the
//! file path to any failure.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use log::debug;

use cpn_unfolder::{parse_net, Context, ContextKind, MarkingSpec, PropertyRequest, StatementIndex, StructuredNet};

fn read(path: &Path, what: &str) -> Result<String> {
    debug!("reading {} from {}", what, path.display());
    fs::read_to_string(path).with_context(|| format!("Failed to read {} from {}", what, path.display()))
}

pub fn load_net(path: &Path) -> Result<StructuredNet> {
    let text = read(path, "net")?;
    parse_net(&text).with_context(|| format!("Failed to parse net {}", path.display()))
}

pub fn load_index(path: &Path) -> Result<StatementIndex> {
    let text = read(path, "statement index")?;
    StatementIndex::from_json(&text).with_context(|| format!("Failed to decode statement index {}", path.display()))
}

pub fn load_request(path: &Path) -> Result<PropertyRequest> {
    let text = read(path, "property request")?;
    PropertyRequest::from_json(&text).with_context(|| format!("Failed to decode property request {}", path.display()))
}

pub fn load_marking(path: &Path) -> Result<MarkingSpec> {
    let text = read(path, "marking")?;
    MarkingSpec::from_json(&text).with_context(|| format!("Failed to decode marking {}", path.display()))
}

/// Context for `kind`; a net file is required for DCR/CPN and refused for FREE
pub fn load_context(kind: ContextKind, path: Option<&Path>) -> Result<Context> {
    match (kind.needs_net(), path) {
        (true, Some(path)) => Ok(Context::Net {
            kind,
            net: load_net(path)?,
        }),
        (true, None) => bail!("--context is required for a {} context", kind),
        (false, Some(path)) => bail!("--context {} given for a FREE context", path.display()),
        (false, None) => Ok(Context::Free),
    }
}
