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

use crate::data::repository::{GetPreferencesRepository, PreferencesRepository};
use crate::model::Preferences;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use synthiot::prelude::*;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Command line (or environment) first, then the stored preference, then [DEFAULT_BASE_URL].
pub fn resolve_base_url(arg: Option<Url>, prefs: &Preferences) -> Fallible<Url> {
    match arg.or_else(|| prefs.base_url.clone()) {
        Some(data) => Ok(data),
        None => Ok(Url::parse(DEFAULT_BASE_URL)?),
    }
}

/// Command line (or environment) first, then the stored preference, then the user's download
/// directory, then the current directory.
pub fn resolve_download_dir(
    arg: Option<PathBuf>,
    prefs: &Preferences,
    user_download_dir: Option<&Path>,
) -> PathBuf {
    arg.or_else(|| prefs.download_dir.clone())
        .or_else(|| user_download_dir.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum SettingsKey {
    #[value(name = "base_url")]
    BaseUrl,
    #[value(name = "download_dir")]
    DownloadDir,
}

impl Display for SettingsKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsKey::BaseUrl => f.write_str("base_url"),
            SettingsKey::DownloadDir => f.write_str("download_dir"),
        }
    }
}

pub fn list_settings<Ctx>(context: &Ctx) -> Fallible<()>
where
    Ctx: GetPreferencesRepository,
{
    let prefs = context.get_prefs_repo().load_preferences()?;

    print_setting(
        &SettingsKey::BaseUrl,
        prefs.base_url.as_ref().map(|data| data.to_string()),
    );
    print_setting(
        &SettingsKey::DownloadDir,
        prefs.download_dir.as_ref().map(|data| data.display().to_string()),
    );
    println!(
        "user_id: {}",
        prefs
            .user_id
            .as_ref()
            .map(|data| data.0.as_str())
            .unwrap_or("(none)"),
    );

    Ok(())
}

pub fn get_setting<Ctx>(context: &Ctx, key: &SettingsKey) -> Fallible<()>
where
    Ctx: GetPreferencesRepository,
{
    let prefs = context.get_prefs_repo().load_preferences()?;

    match *key {
        SettingsKey::BaseUrl => print_setting(key, prefs.base_url.map(|data| data.to_string())),
        SettingsKey::DownloadDir => print_setting(
            key,
            prefs.download_dir.map(|data| data.display().to_string()),
        ),
    }

    Ok(())
}

/// `None` removes the stored value.
pub fn set_setting<Ctx>(context: &Ctx, key: &SettingsKey, value: Option<String>) -> Fallible<()>
where
    Ctx: GetPreferencesRepository,
{
    let repo = context.get_prefs_repo();
    let mut prefs = repo.load_preferences()?;

    match *key {
        SettingsKey::BaseUrl => {
            prefs.base_url = match value {
                Some(data) => {
                    let url = Url::parse(&data).with_context(|| format!("invalid url: {}", data))?;
                    ensure!(!url.cannot_be_a_base(), "invalid base url: {}", data);
                    Some(url)
                }
                None => None,
            };
        }
        SettingsKey::DownloadDir => {
            prefs.download_dir = value.map(PathBuf::from);
        }
    }

    repo.save_preferences(&prefs)?;

    Ok(())
}

fn print_setting(key: &SettingsKey, value: Option<String>) {
    println!("{key}: {}", value.as_deref().unwrap_or("(none)"));
}
