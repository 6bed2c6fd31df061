use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::captions::{captions_from_json, captions_to_json, format_transcript, CaptionItem};

// @module: File and directory utilities

/// Extension of caption files
pub const CAPTION_EXTENSION: &str = "json";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated caption file
    // @params: input_file, output_dir, target_language
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let output_filename = format!("{}.{}.{}", stem.to_string_lossy(), target_language, CAPTION_EXTENSION);
        output_dir.as_ref().join(output_filename)
    }

    // @generates: Transcript file name for a language and day
    pub fn transcript_file_name(language: &str, date: NaiveDate) -> String {
        format!("transcript_{}_{}.txt", language, date.format("%Y-%m-%d"))
    }

    /// Find caption files under a directory, skipping outputs already in `target_language`
    pub fn find_caption_files<P: AsRef<Path>>(dir: P, target_language: &str) -> Result<Vec<PathBuf>> {
        let translated_suffix = format!(".{}", target_language);
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            let is_caption_file = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(CAPTION_EXTENSION));
            if !is_caption_file {
                continue;
            }

            let already_translated = path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy().ends_with(&translated_suffix));
            if !already_translated {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Read a caption list from a JSON file
    pub fn read_captions<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionItem>> {
        let content = Self::read_to_string(&path)?;
        captions_from_json(&content).with_context(|| format!("Invalid caption file: {:?}", path.as_ref()))
    }

    /// Write a caption list as pretty JSON
    pub fn write_captions<P: AsRef<Path>>(path: P, items: &[CaptionItem]) -> Result<()> {
        Self::write_to_file(path, &captions_to_json(items)?)
    }

    /// Write a dated transcript of `items` into `output_dir`
    pub fn write_transcript<P: AsRef<Path>>(output_dir: P, language: &str, items: &[CaptionItem]) -> Result<PathBuf> {
        let path = output_dir
            .as_ref()
            .join(Self::transcript_file_name(language, Local::now().date_naive()));
        Self::write_to_file(&path, &format_transcript(items))?;
        Ok(path)
    }
}
