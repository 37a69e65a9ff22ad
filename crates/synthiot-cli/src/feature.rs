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

pub mod auth;
pub mod chat;
pub mod generate;
pub mod project;
pub mod quantity;
pub mod settings;

#[cfg(test)]
pub mod test_helpers {
    use crate::data::repository::{
        GetCsvStorage, GetPreferencesRepository, GetSynthiotApi, MockCsvStorage,
        MockPreferencesRepository, MockSynthiotApi,
    };
    use crate::model::{Message, MessageRole};

    #[derive(Default)]
    pub struct MockContext {
        pub api: MockSynthiotApi,
        pub csv_storage: MockCsvStorage,
        pub prefs_repo: MockPreferencesRepository,
    }

    impl GetSynthiotApi for MockContext {
        type Api = MockSynthiotApi;

        fn get_synthiot_api(&self) -> &Self::Api {
            &self.api
        }
    }

    impl GetCsvStorage for MockContext {
        type Storage = MockCsvStorage;

        fn get_csv_storage(&self) -> &Self::Storage {
            &self.csv_storage
        }
    }

    impl GetPreferencesRepository for MockContext {
        type Repo = MockPreferencesRepository;

        fn get_prefs_repo(&self) -> &Self::Repo {
            &self.prefs_repo
        }
    }

    pub fn user(content: &str) -> Message {
        Message {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: &str) -> Message {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
