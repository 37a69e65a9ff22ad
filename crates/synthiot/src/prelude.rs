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

pub use anyhow::{Context as _, Result as Fallible, bail, ensure};
pub use tracing::{debug, error, info, info_span, trace, warn};

use std::io::prelude::*;
use std::path::{Path, PathBuf};

/// A TOML document stored at a fixed path.
///
/// A missing file reads as `T::default()`, and parent directories are created on store.
pub struct TomlFile {
    path: PathBuf,
}

impl TomlFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_default<T>(&self) -> Fallible<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "not found");
            return Ok(T::default());
        }

        let mut buf = String::new();
        std::io::BufReader::new(std::fs::File::open(&self.path)?).read_to_string(&mut buf)?;
        toml::from_str(&buf).with_context(|| format!("failed to parse {}", self.path.display()))
    }

    pub fn store<T>(&self, value: &T) -> Fallible<()>
    where
        T: serde::Serialize,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut buf = std::io::BufWriter::new(std::fs::File::create(&self.path)?);
        buf.write_all(toml::to_string(value)?.as_bytes())?;
        buf.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
    struct Sample {
        name: Option<String>,
        count: u32,
    }

    #[test]
    fn load_missing_file_returns_default() {
        let temp_dir = tempdir().unwrap();
        let file = TomlFile::new(temp_dir.path().join("missing.toml"));

        let actual = file.load_or_default::<Sample>().unwrap();
        assert_eq!(Sample::default(), actual);
    }

    #[test]
    fn store_creates_parent_and_loads_back() {
        let temp_dir = tempdir().unwrap();
        let file = TomlFile::new(temp_dir.path().join("a/b/prefs.toml"));

        let expected = Sample {
            name: Some("sensor".into()),
            count: 3,
        };
        file.store(&expected).unwrap();

        assert!(temp_dir.path().join("a/b/prefs.toml").exists());
        assert_eq!(expected, file.load_or_default::<Sample>().unwrap());
    }

    #[test]
    fn load_broken_file_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "count = \"three\"").unwrap();

        let file = TomlFile::new(path);
        assert!(file.load_or_default::<Sample>().is_err());
    }
}
