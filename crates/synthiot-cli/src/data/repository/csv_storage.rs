/*
 * Copyright 2026 sukawasatoru
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::model::SyntheticCsv;
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use synthiot::prelude::*;

pub trait GetCsvStorage {
    type Storage: CsvStorage;

    fn get_csv_storage(&self) -> &Self::Storage;
}

#[cfg_attr(test, mockall::automock)]
pub trait CsvStorage {
    /// Returns where the file was written.
    fn save_csv(&self, csv: &SyntheticCsv) -> Fallible<PathBuf>;
}

/// Writes downloaded CSV files into a single directory.
pub struct CsvStorageImpl {
    download_dir: PathBuf,
}

impl CsvStorageImpl {
    pub fn create_with_path(download_dir: PathBuf) -> Self {
        Self { download_dir }
    }
}

impl CsvStorage for CsvStorageImpl {
    fn save_csv(&self, csv: &SyntheticCsv) -> Fallible<PathBuf> {
        // the name comes from the server. drop any directory part.
        let file_name = Path::new(&csv.file_name)
            .file_name()
            .with_context(|| format!("invalid file name: {}", csv.file_name))?;

        if !self.download_dir.exists() {
            create_dir_all(&self.download_dir).with_context(|| {
                format!(
                    "failed to create download directory: {}",
                    self.download_dir.display()
                )
            })?;
        }

        let (path, file) = create_new_file(&self.download_dir.join(file_name))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&csv.body)?;
        writer.flush()?;

        info!(path = %path.display(), bytes = csv.body.len(), "saved");

        Ok(path)
    }
}

/// Creates the first free one of `name.csv`, `name (1).csv`, `name (2).csv`, ...
///
/// An existing entry of any kind, including a dangling symlink, is never opened.
fn create_new_file(path: &Path) -> Fallible<(PathBuf, File)> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|data| data.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|data| format!(".{}", data.to_string_lossy()))
        .unwrap_or_default();

    let candidates = std::iter::once(path.to_owned())
        .chain((1..=u16::MAX).map(|i| parent.join(format!("{stem} ({i}){extension}"))));
    for candidate in candidates {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "exists");
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to create a file: {}", candidate.display()));
            }
        }
    }

    bail!("no free file name for {}", path.display())
}
