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

use crate::model::Preferences;
use std::path::PathBuf;
use synthiot::prelude::*;

pub trait GetPreferencesRepository {
    type Repo: PreferencesRepository;

    fn get_prefs_repo(&self) -> &Self::Repo;
}

#[cfg_attr(test, mockall::automock)]
pub trait PreferencesRepository {
    fn load_preferences(&self) -> Fallible<Preferences>;

    fn save_preferences(&self, prefs: &Preferences) -> Fallible<()>;
}

pub struct PreferencesRepositoryImpl {
    file: TomlFile,
}

impl PreferencesRepositoryImpl {
    pub fn create_with_path(config_dir_path: PathBuf) -> Self {
        Self {
            file: TomlFile::new(config_dir_path.join("preferences.toml")),
        }
    }
}

impl PreferencesRepository for PreferencesRepositoryImpl {
    fn load_preferences(&self) -> Fallible<Preferences> {
        self.file.load_or_default()
    }

    fn save_preferences(&self, prefs: &Preferences) -> Fallible<()> {
        debug!(path = %self.file.path().display(), "save preferences");
        self.file.store(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_default_if_not_exists() {
        let temp_dir = tempdir().unwrap();
        let repo = PreferencesRepositoryImpl::create_with_path(temp_dir.path().join("config"));

        assert_eq!(Preferences::default(), repo.load_preferences().unwrap());
    }

    #[test]
    fn save_and_load() {
        let temp_dir = tempdir().unwrap();
        let repo = PreferencesRepositoryImpl::create_with_path(temp_dir.path().join("config"));

        let expected = Preferences {
            base_url: Some("https://synthiot.example.com/api/".parse().unwrap()),
            download_dir: Some(temp_dir.path().join("downloads")),
            user_id: Some("u1".into()),
        };
        repo.save_preferences(&expected).unwrap();

        assert_eq!(expected, repo.load_preferences().unwrap());
    }

    #[test]
    fn load_integer_user_id() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("preferences.toml"), "user_id = 42\n").unwrap();
        let repo = PreferencesRepositoryImpl::create_with_path(temp_dir.path().to_owned());

        assert_eq!(
            Some("42".into()),
            repo.load_preferences().unwrap().user_id
        );
    }
}
