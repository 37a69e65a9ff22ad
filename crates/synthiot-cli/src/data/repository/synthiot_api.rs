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

use crate::model::{
    Chat, ChatID, GenerationRequest, Message, Project, ProjectForm, ProjectID, SyntheticCsv,
    UserID,
};
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::{Client, Response, header};
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use std::time::Duration;
use synthiot::prelude::*;
use url::Url;

pub trait GetSynthiotApi {
    type Api: SynthiotApi;

    fn get_synthiot_api(&self) -> &Self::Api;
}

/// REST endpoints of the SynthIoT backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthiotApi {
    async fn register_user(&self, name: &str, email: &str, password: &str) -> Fallible<()>;

    async fn login_user(&self, email: &str, password: &str) -> Fallible<UserID>;

    async fn get_projects(&self, user_id: &UserID) -> Fallible<Vec<Project>>;

    async fn create_project(&self, user_id: &UserID, form: &ProjectForm) -> Fallible<()>;

    async fn update_project(
        &self,
        project_id: &ProjectID,
        user_id: &UserID,
        form: &ProjectForm,
    ) -> Fallible<()>;

    async fn delete_project(&self, project_id: &ProjectID, user_id: &UserID) -> Fallible<()>;

    async fn get_chat_list(&self, project_id: &ProjectID, user_id: &UserID)
    -> Fallible<Vec<Chat>>;

    async fn create_chat(
        &self,
        project_id: &ProjectID,
        user_id: &UserID,
        name: &str,
    ) -> Fallible<ChatID>;

    async fn get_chat_history(
        &self,
        project_id: &ProjectID,
        chat_id: &ChatID,
        user_id: &UserID,
    ) -> Fallible<Vec<Message>>;

    /// The acknowledgement is discarded. The assistant's reply is only visible through
    /// [SynthiotApi::get_chat_history].
    async fn send_message(
        &self,
        project_id: &ProjectID,
        chat_id: &ChatID,
        user_id: &UserID,
        message: &str,
    ) -> Fallible<()>;

    async fn download_synthetic_csv(&self, request: &GenerationRequest) -> Fallible<SyntheticCsv>;
}

pub struct SynthiotApiImpl {
    client: Client,
    base_url: Url,
}

impl SynthiotApiImpl {
    pub fn new(base_url: Url) -> Fallible<Self> {
        ensure!(
            !base_url.cannot_be_a_base(),
            "unsupported base url: {}",
            base_url
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(60 * 5))
            .user_agent("synthiot (https://github.com/sukawasatoru/synthiot/)")
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Fallible<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()
            .context("base url cannot be a base")?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SynthiotApi for SynthiotApiImpl {
    async fn register_user(&self, name: &str, email: &str, password: &str) -> Fallible<()> {
        let res = self
            .client
            .post(self.endpoint(&["users", "create-users"])?)
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!(%status, %body, "register failed");
            bail!(
                "{}",
                detail_message(&body).unwrap_or_else(|| "Email already exists".into())
            );
        }

        Ok(())
    }

    async fn login_user(&self, email: &str, password: &str) -> Fallible<UserID> {
        let res = self
            .client
            .post(self.endpoint(&["users", "get-users"])?)
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        let res = ensure_success(res)
            .await
            .context("Invalid email or password")?;

        Ok(res.json::<Payload<LoginResponse>>().await?.into_inner().uid)
    }

    async fn get_projects(&self, user_id: &UserID) -> Fallible<Vec<Project>> {
        let res = self
            .client
            .get(self.endpoint(&["project", "get-project", &user_id.0])?)
            .send()
            .await?;
        let res = ensure_success(res).await?;

        projects_from_payload(res.json::<serde_json::Value>().await?)
    }

    async fn create_project(&self, user_id: &UserID, form: &ProjectForm) -> Fallible<()> {
        let res = self
            .client
            .post(self.endpoint(&["project", "create-project", &user_id.0])?)
            .json(form)
            .send()
            .await?;
        ensure_success(res).await?;

        Ok(())
    }

    async fn update_project(
        &self,
        project_id: &ProjectID,
        user_id: &UserID,
        form: &ProjectForm,
    ) -> Fallible<()> {
        let res = self
            .client
            .put(self.endpoint(&["project", "update-project", &project_id.0, &user_id.0])?)
            .json(form)
            .send()
            .await?;
        ensure_success(res).await?;

        Ok(())
    }

    async fn delete_project(&self, project_id: &ProjectID, user_id: &UserID) -> Fallible<()> {
        let res = self
            .client
            .delete(self.endpoint(&["project", "delete-project", &project_id.0, &user_id.0])?)
            .send()
            .await?;
        ensure_success(res).await?;

        Ok(())
    }

    async fn get_chat_list(
        &self,
        project_id: &ProjectID,
        user_id: &UserID,
    ) -> Fallible<Vec<Chat>> {
        let url = self.endpoint(&["chat", "get-chat-list", &project_id.0, &user_id.0])?;
        debug!(%url, "GET");
        let res = ensure_success(self.client.get(url).send().await?).await?;

        Ok(res.json::<Payload<Vec<Chat>>>().await?.into_inner())
    }

    async fn create_chat(
        &self,
        project_id: &ProjectID,
        user_id: &UserID,
        name: &str,
    ) -> Fallible<ChatID> {
        let url = self.endpoint(&["chat", "create-chat", &project_id.0, &user_id.0])?;
        debug!(%url, "POST");
        let res = self
            .client
            .post(url)
            .json(&json!({ "message": name }))
            .send()
            .await?;
        let res = ensure_success(res).await?;

        Ok(res.json::<Payload<CreatedChat>>().await?.into_inner().chat_id)
    }

    async fn get_chat_history(
        &self,
        project_id: &ProjectID,
        chat_id: &ChatID,
        user_id: &UserID,
    ) -> Fallible<Vec<Message>> {
        let url = self.endpoint(&[
            "chat",
            "get-chat-history",
            &project_id.0,
            &chat_id.0,
            &user_id.0,
        ])?;
        debug!(%url, "GET");
        let res = ensure_success(self.client.get(url).send().await?).await?;

        Ok(res
            .json::<Payload<ChatHistory>>()
            .await?
            .into_inner()
            .messages)
    }

    async fn send_message(
        &self,
        project_id: &ProjectID,
        chat_id: &ChatID,
        user_id: &UserID,
        message: &str,
    ) -> Fallible<()> {
        let url = self.endpoint(&[
            "chat",
            "send-message",
            &project_id.0,
            &chat_id.0,
            &user_id.0,
        ])?;
        debug!(%url, "POST");
        let res = self
            .client
            .post(url)
            .json(&json!({ "message": message }))
            .send()
            .await?;
        let res = ensure_success(res).await?;
        trace!(ack = %res.text().await.unwrap_or_default());

        Ok(())
    }

    async fn download_synthetic_csv(&self, request: &GenerationRequest) -> Fallible<SyntheticCsv> {
        let mut url = self.endpoint(&["synth", "generate"])?;
        url.query_pairs_mut()
            .append_pair("project_id", &request.project_id.0)
            .append_pair("chat_id", &request.chat_id.0)
            .append_pair("user_id", &request.user_id.0)
            .append_pair("rows", &request.rows.to_string())
            .append_pair("batch_size", &request.batch_size.to_string());
        debug!(%url, "GET (download)");

        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %text, "download failed");
            bail!("Generate failed: {} {}", status.as_u16(), text);
        }

        let file_name = res
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|data| data.to_str().ok())
            .and_then(file_name_from_content_disposition)
            .unwrap_or_else(|| format!("synthetic_{}.csv", request.chat_id));
        let body = res.bytes().await?;
        info!(%file_name, bytes = body.len(), "downloaded");

        Ok(SyntheticCsv { file_name, body })
    }
}

/// Some endpoints wrap the payload in `{"data": ...}` and some don't.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(data) => data,
        }
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    uid: UserID,
}

#[derive(Deserialize)]
struct CreatedChat {
    chat_id: ChatID,
}

#[derive(Deserialize)]
struct ChatHistory {
    #[serde(default)]
    messages: Vec<Message>,
}

async fn ensure_success(res: Response) -> Fallible<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_else(|e| format!("{:?}", e));
    bail!("failed to request: {} {}", status, body)
}

/// `{"detail": "..."}` error body.
fn detail_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_owned)
}

/// Anything other than an array, bare or under `data`, is an empty list.
fn projects_from_payload(value: serde_json::Value) -> Fallible<Vec<Project>> {
    let payload = match value {
        serde_json::Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            _ => serde_json::Value::Object(map),
        },
        data => data,
    };

    match payload {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(payload)?),
        data => {
            warn!(%data, "unexpected projects payload");
            Ok(vec![])
        }
    }
}

static CONTENT_DISPOSITION_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?["']?([^"';\n]+)["']?"#).expect("valid regex")
});

/// Picks the file name out of a `Content-Disposition` value, percent-decoding the RFC 5987 form.
/// An undecodable value is returned as is.
pub fn file_name_from_content_disposition(value: &str) -> Option<String> {
    let raw = CONTENT_DISPOSITION_FILE_NAME
        .captures(value)?
        .get(1)?
        .as_str()
        .trim();
    if raw.is_empty() {
        return None;
    }

    Some(
        percent_decode_str(raw)
            .decode_utf8()
            .map(|data| data.into_owned())
            .unwrap_or_else(|_| raw.to_owned()),
    )
}
