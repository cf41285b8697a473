pub mod account;
pub mod auth;
pub mod fields;
pub mod form_sets;
pub mod generate;
pub mod mappings;
pub mod templates;

use pdfdesk_core::api::Download;
use std::path::{Path, PathBuf};

/// Write a download into `dir` (or the working directory) under its own name
pub fn save_download(download: &Download, dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let dest = dir.join(&download.file_name);
    std::fs::write(&dest, &download.bytes)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_under_download_name() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("batches");
        let download = Download { file_name: "batch-4.zip".into(), content_type: None, bytes: b"PK".to_vec().into() };

        let dest = save_download(&download, Some(&nested)).unwrap();
        assert_eq!(dest, nested.join("batch-4.zip"));
        assert_eq!(std::fs::read(dest).unwrap(), b"PK");
    }
}
