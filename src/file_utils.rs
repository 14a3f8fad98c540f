use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

/// Prefix of the per-entry chemical shift table
pub const SHIFT_FILE_PREFIX: &str = "shift_data_";

/// Prefix of the per-entry annotated table
pub const FINAL_FILE_PREFIX: &str = "final_data_";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        if path.exists() && !path.is_dir() {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Path of the shift table for an entry
    pub fn shift_data_path<P: AsRef<Path>>(output_dir: P, entry_id: &str) -> PathBuf {
        output_dir.as_ref().join(format!("{}{}.csv", SHIFT_FILE_PREFIX, entry_id))
    }

    // @generates: Path of the annotated table for an entry
    pub fn final_data_path<P: AsRef<Path>>(output_dir: P, entry_id: &str) -> PathBuf {
        output_dir.as_ref().join(format!("{}{}.csv", FINAL_FILE_PREFIX, entry_id))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file in one go, replacing previous content
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
