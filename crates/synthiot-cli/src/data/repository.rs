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

pub use crate::data::repository::csv_storage::{CsvStorage, CsvStorageImpl, GetCsvStorage};
pub use crate::data::repository::preferences::{
    GetPreferencesRepository, PreferencesRepository, PreferencesRepositoryImpl,
};
pub use crate::data::repository::synthiot_api::{
    GetSynthiotApi, SynthiotApi, SynthiotApiImpl, file_name_from_content_disposition,
};

#[cfg(test)]
pub use crate::data::repository::csv_storage::MockCsvStorage;
#[cfg(test)]
pub use crate::data::repository::preferences::MockPreferencesRepository;
#[cfg(test)]
pub use crate::data::repository::synthiot_api::MockSynthiotApi;

mod csv_storage;
mod preferences;
mod synthiot_api;
