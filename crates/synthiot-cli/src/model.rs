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

use bytes::Bytes;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::num::{NonZeroU64, ParseIntError};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Backend identifiers are sometimes strings and sometimes integers.
macro_rules! backend_id {
    ($name:ident) => {
        #[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(de: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                de.deserialize_any(IdVisitor).map($name)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

backend_id!(ProjectID);
backend_id!(ChatID);
backend_id!(UserID);

struct IdVisitor;

impl Visitor<'_> for IdVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a string or integer identifier")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_owned())
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }
}

/// The logged-in user. Passed explicitly to everything that talks to the backend on behalf of
/// somebody.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub user_id: UserID,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Preferences {
    pub base_url: Option<Url>,
    pub download_dir: Option<PathBuf>,
    pub user_id: Option<UserID>,
}

impl Preferences {
    pub fn session(&self) -> Option<Session> {
        self.user_id.clone().map(|user_id| Session { user_id })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    #[default]
    #[serde(other)]
    Other,
}

/// A missing or `null` field reads as the default so one odd entry does not fail a history.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: MessageRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Chat {
    pub chat_id: ChatID,
    #[serde(default)]
    pub preview: Option<String>,
}

impl Chat {
    pub fn title(&self) -> &str {
        match self.preview.as_deref() {
            Some(data) if !data.is_empty() => data,
            _ => "New chat",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Project {
    #[serde(alias = "project_id")]
    pub id: ProjectID,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sensor_type: Option<String>,
}

impl Project {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(data) if !data.is_empty() => data.clone(),
            _ => format!("Project {}", self.id.0.chars().take(6).collect::<String>()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
pub enum SensorType {
    /// Temperature and humidity.
    #[default]
    #[serde(rename = "AM2320")]
    #[value(name = "AM2320")]
    Am2320,

    #[serde(rename = "DHT22")]
    #[value(name = "DHT22")]
    Dht22,

    #[serde(rename = "BME280")]
    #[value(name = "BME280")]
    Bme280,
}

impl Display for SensorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::Am2320 => f.write_str("AM2320"),
            SensorType::Dht22 => f.write_str("DHT22"),
            SensorType::Bme280 => f.write_str("BME280"),
        }
    }
}

impl FromStr for SensorType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AM2320" => Ok(Self::Am2320),
            "DHT22" => Ok(Self::Dht22),
            "BME280" => Ok(Self::Bme280),
            _ => anyhow::bail!("unexpected sensor type: {}", s),
        }
    }
}

/// Body of the create / update project requests.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    /// A [SensorType] name, or whatever the backend already stores for the project.
    pub sensor_type: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

const fn non_zero(value: u64) -> NonZeroU64 {
    match NonZeroU64::new(value) {
        Some(data) => data,
        None => panic!("zero"),
    }
}

/// Number of synthetic records to request. Never zero.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RowCount(NonZeroU64);

impl RowCount {
    pub const DEFAULT: RowCount = RowCount(non_zero(1000));

    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Rounds to the nearest integer and clamps to `1..=u64::MAX`.
    pub fn from_f64_clamped(value: f64) -> Self {
        let rounded = value.round();
        if rounded.is_nan() || rounded < 1.0 {
            return Self(NonZeroU64::MIN);
        }

        // `as` saturates at u64::MAX.
        Self(NonZeroU64::new(rounded as u64).unwrap_or(NonZeroU64::MIN))
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl Default for RowCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for RowCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RowCount {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU64>().map(Self)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct BatchSize(NonZeroU64);

impl BatchSize {
    pub const DEFAULT: BatchSize = BatchSize(non_zero(2000));

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for BatchSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for BatchSize {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU64>().map(Self)
    }
}

/// Built right before a download and thrown away afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenerationRequest {
    pub project_id: ProjectID,
    pub chat_id: ChatID,
    pub user_id: UserID,
    pub rows: RowCount,
    pub batch_size: BatchSize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyntheticCsv {
    pub file_name: String,
    pub body: Bytes,
}
