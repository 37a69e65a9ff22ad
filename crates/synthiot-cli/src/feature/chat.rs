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

use crate::data::repository::{GetCsvStorage, GetSynthiotApi, SynthiotApi};
use crate::feature::generate::download_csv;
use crate::feature::quantity::{extract_rows, has_generation_verb, mentions_download};
use crate::model::{
    BatchSize, Chat, ChatID, GenerationRequest, Message, MessageRole, ProjectID, RowCount,
    Session,
};
use std::io::prelude::*;
use std::io::{stdin, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use synthiot::prelude::*;
use tracing::instrument;

#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was sent. Blank input, no selected chat, or another cycle is running.
    Ignored,
    Sent { download: Option<DownloadStatus> },
}

#[derive(Debug)]
pub enum DownloadStatus {
    Saved { path: PathBuf, rows: RowCount },
    Failed { rows: RowCount, error: anyhow::Error },
}

/// State of one project's chat screen.
pub struct ChatView<'a, Ctx> {
    context: &'a Ctx,
    session: Session,
    project_id: ProjectID,
    chats: Vec<Chat>,
    selected: Option<Chat>,
    messages: Vec<Message>,
    input: String,
    sending: Arc<AtomicBool>,
}

impl<'a, Ctx> ChatView<'a, Ctx>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    pub fn new(context: &'a Ctx, session: Session, project_id: ProjectID) -> Self {
        Self {
            context,
            session,
            project_id,
            chats: vec![],
            selected: None,
            messages: vec![],
            input: String::new(),
            sending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share the in-flight flag with an observer.
    pub fn with_sending_flag(mut self, sending: Arc<AtomicBool>) -> Self {
        self.sending = sending;
        self
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn selected(&self) -> Option<&Chat> {
        self.selected.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    pub fn sending_flag(&self) -> Arc<AtomicBool> {
        self.sending.clone()
    }

    /// Fetch the chat list and select `preferred`, or the first chat when `None`.
    pub async fn load_chats(&mut self, preferred: Option<&ChatID>) -> Fallible<()> {
        self.refresh_chats().await?;

        let target = match preferred {
            Some(chat_id) => Some(
                self.chats
                    .iter()
                    .find(|chat| &chat.chat_id == chat_id)
                    .cloned()
                    .with_context(|| format!("chat not found: {}", chat_id))?,
            ),
            None => self.chats.first().cloned(),
        };

        match target {
            Some(chat) => self.select_chat(chat).await,
            None => {
                self.selected = None;
                self.messages.clear();
                Ok(())
            }
        }
    }

    /// The chat stays selected when its history fails to load, with an empty message list.
    pub async fn select_chat(&mut self, chat: Chat) -> Fallible<()> {
        debug!(chat_id = %chat.chat_id, "select");
        self.messages.clear();
        let chat_id = chat.chat_id.clone();
        self.selected = Some(chat);

        self.messages = self
            .context
            .get_synthiot_api()
            .get_chat_history(&self.project_id, &chat_id, &self.session.user_id)
            .await
            .context("failed to load history")?;

        Ok(())
    }

    pub async fn create_chat(&mut self, name: &str) -> Fallible<ChatID> {
        let chat_id = self
            .context
            .get_synthiot_api()
            .create_chat(&self.project_id, &self.session.user_id, name)
            .await
            .context("failed to create chat")?;
        info!(%chat_id, "created");

        self.refresh_chats().await?;
        let chat = match self.chats.iter().find(|chat| chat.chat_id == chat_id) {
            Some(data) => data.clone(),
            None => Chat {
                chat_id: chat_id.clone(),
                preview: Some(name.to_owned()),
            },
        };
        self.select_chat(chat).await?;

        Ok(chat_id)
    }

    /// Send the current input, reload the history and download a CSV when the exchange asks
    /// for one.
    ///
    /// The input survives a failed send or reload. A failed download does not fail the cycle.
    #[instrument(skip_all, fields(project_id = %self.project_id))]
    pub async fn send_and_maybe_generate(&mut self) -> Fallible<SendOutcome> {
        if self.input.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let Some(chat_id) = self.selected.as_ref().map(|data| data.chat_id.clone()) else {
            return Ok(SendOutcome::Ignored);
        };
        let Some(_in_flight) = InFlight::enter(&self.sending) else {
            debug!("already sending");
            return Ok(SendOutcome::Ignored);
        };

        let context = self.context;
        let api = context.get_synthiot_api();

        api.send_message(&self.project_id, &chat_id, &self.session.user_id, &self.input)
            .await
            .context("Failed to send message")?;

        let messages = api
            .get_chat_history(&self.project_id, &chat_id, &self.session.user_id)
            .await
            .context("Failed to load chat history")?;
        self.messages = messages;
        let input = std::mem::take(&mut self.input);

        let Some(rows) = plan_generation(&input, &self.messages) else {
            return Ok(SendOutcome::Sent { download: None });
        };

        let request = GenerationRequest {
            project_id: self.project_id.clone(),
            chat_id,
            user_id: self.session.user_id.clone(),
            rows,
            batch_size: BatchSize::DEFAULT,
        };
        let download = match download_csv(context, &request).await {
            Ok(path) => DownloadStatus::Saved { path, rows },
            Err(e) => {
                warn!(?e, "failed to download");
                DownloadStatus::Failed { rows, error: e }
            }
        };

        Ok(SendOutcome::Sent {
            download: Some(download),
        })
    }

    async fn refresh_chats(&mut self) -> Fallible<()> {
        self.chats = self
            .context
            .get_synthiot_api()
            .get_chat_list(&self.project_id, &self.session.user_id)
            .await
            .context("failed to load chats")?;
        Ok(())
    }
}

struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn enter(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag.clone()))
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub fn latest_reply(messages: &[Message]) -> Option<&Message> {
    messages
        .iter()
        .rev()
        .find(|data| data.role != MessageRole::User)
}

/// Decide whether an exchange asks for data, and how many rows.
///
/// Intent comes from a generation verb in `input` or a download mention in the latest reply.
/// The row count is read from both texts together, defaulting to [RowCount::DEFAULT].
pub fn plan_generation(input: &str, history: &[Message]) -> Option<RowCount> {
    let reply = latest_reply(history).map(|data| data.content.as_str());

    let intent = has_generation_verb(input) || reply.is_some_and(mentions_download);
    if !intent {
        return None;
    }

    let combined = [Some(input), reply]
        .into_iter()
        .flatten()
        .filter(|data| !data.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(extract_rows(&combined).unwrap_or_default())
}

pub async fn list_chats<Ctx>(context: &Ctx, session: &Session, project_id: ProjectID) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    let chats = context
        .get_synthiot_api()
        .get_chat_list(&project_id, &session.user_id)
        .await?;
    for chat in chats {
        println!("{}\t{}", chat.chat_id, chat.title());
    }

    Ok(())
}

pub async fn new_chat<Ctx>(
    context: &Ctx,
    session: &Session,
    project_id: ProjectID,
    name: &str,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    let chat_id = context
        .get_synthiot_api()
        .create_chat(&project_id, &session.user_id, name)
        .await?;
    println!("{}", chat_id);

    Ok(())
}

pub async fn show_history<Ctx>(
    context: &Ctx,
    session: Session,
    project_id: ProjectID,
    chat_id: Option<ChatID>,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    let mut view = ChatView::new(context, session, project_id);
    view.load_chats(chat_id.as_ref()).await?;
    if view.selected().is_none() {
        println!("no chats");
        return Ok(());
    }

    for message in view.messages() {
        print_message(message);
    }

    Ok(())
}

pub async fn send<Ctx>(
    context: &Ctx,
    session: Session,
    project_id: ProjectID,
    chat_id: Option<ChatID>,
    message: String,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    let mut view = ChatView::new(context, session, project_id);
    view.load_chats(chat_id.as_ref()).await?;
    ensure!(
        view.selected().is_some(),
        "no chats in this project. run `synthiot chat new` first"
    );

    view.set_input(message);
    match view.send_and_maybe_generate().await? {
        SendOutcome::Ignored => warn!("nothing to send"),
        SendOutcome::Sent { download } => {
            if let Some(reply) = latest_reply(view.messages()) {
                print_message(reply);
            }
            if let Some(download) = download {
                report_download(&download);
            }
        }
    }

    Ok(())
}

pub async fn interactive<Ctx>(
    context: &Ctx,
    session: Session,
    project_id: ProjectID,
    chat_id: Option<ChatID>,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    let mut view = ChatView::new(context, session, project_id);
    view.load_chats(chat_id.as_ref()).await?;

    print_help();
    print_selected(&view);

    let mut line = String::new();
    loop {
        print!("> ");
        stdout().flush()?;

        line.clear();
        if stdin().read_line(&mut line)? == 0 {
            debug!("EOF");
            break;
        }

        let command = line.trim();
        match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/chats" => {
                for (index, chat) in view.chats().iter().enumerate() {
                    println!("{}: {}\t{}", index + 1, chat.chat_id, chat.title());
                }
            }
            _ if command.starts_with("/new") => {
                let name = command["/new".len()..].trim();
                let name = if name.is_empty() { "New chat" } else { name };
                match view.create_chat(name).await {
                    Ok(chat_id) => println!("created {}", chat_id),
                    Err(e) => eprintln!("{:#}", e),
                }
            }
            _ if command.starts_with("/select") => {
                let chat = command["/select".len()..]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| index.checked_sub(1))
                    .and_then(|index| view.chats().get(index).cloned());
                match chat {
                    Some(chat) => match view.select_chat(chat).await {
                        Ok(_) => print_selected(&view),
                        Err(e) => eprintln!("{:#}", e),
                    },
                    None => eprintln!("usage: /select <number from /chats>"),
                }
            }
            _ => {
                view.set_input(line.trim_end_matches(['\r', '\n']));
                println!("...");
                match view.send_and_maybe_generate().await {
                    Ok(SendOutcome::Ignored) => eprintln!("no chat selected. use /new or /select"),
                    Ok(SendOutcome::Sent { download }) => {
                        if let Some(reply) = latest_reply(view.messages()) {
                            print_message(reply);
                        }
                        if let Some(download) = download {
                            report_download(&download);
                        }
                    }
                    Err(e) => eprintln!("{:#}", e),
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("/chats: list chats");
    println!("/select N: open chat N");
    println!("/new [NAME]: start a chat");
    println!("/quit: exit");
}

fn print_selected<Ctx>(view: &ChatView<Ctx>)
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    match view.selected() {
        Some(chat) => {
            println!("chat: {} ({})", chat.title(), chat.chat_id);
            for message in view.messages() {
                print_message(message);
            }
        }
        None => println!("no chats. use /new to start one"),
    }
}

fn print_message(message: &Message) {
    let label = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
        MessageRole::Other => "other",
    };
    println!("{}:", label);
    println!("{}", message.content.trim());
}

fn report_download(download: &DownloadStatus) {
    match download {
        DownloadStatus::Saved { path, rows } => {
            println!("saved {} rows to {}", rows, path.display())
        }
        DownloadStatus::Failed { rows, error } => {
            eprintln!("download of {} rows failed: {:#}", rows, error)
        }
    }
}
