//! Artifact and audit log export
//!
//! Fire-and-forget actions: failures are reported in the status line and
//! never affect the session phase or the stored analysis.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;

use sphinx_protocol::artifact::artifact_file_name;
use sphinx_protocol::audit::AuditChain;

use crate::app::ArtifactState;

/// Write the sealed artifact under its generated identifier.
pub fn write_artifact(output_dir: &Path, artifact: &ArtifactState) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(artifact_file_name(&artifact.meta));
    std::fs::write(&path, &artifact.rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Copy text to the terminal clipboard via an OSC 52 escape write.
///
/// Works in terminals that honor OSC 52; the file export is the reliable
/// path when this one is ignored.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    let mut out = std::io::stdout();
    write!(out, "\x1b]52;c;{}\x07", encoded)?;
    out.flush()?;
    Ok(())
}

/// Export the full audit chain as JSON, named after the session tag.
pub fn export_audit(output_dir: &Path, session_tag: &str, chain: &AuditChain) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(format!("audit_{}.json", session_tag));
    let content = chain.export_json()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
