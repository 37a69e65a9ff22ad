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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synthiot::feature::logging::init_tracing;
use synthiot::prelude::*;
use synthiot_cli::data::repository::{
    CsvStorageImpl, GetCsvStorage, GetPreferencesRepository, GetSynthiotApi, PreferencesRepository,
    PreferencesRepositoryImpl, SynthiotApiImpl,
};
use synthiot_cli::feature::auth::{login, logout, register, require_session};
use synthiot_cli::feature::chat::{interactive, list_chats, new_chat, send, show_history};
use synthiot_cli::feature::generate::{generate, print_rows};
use synthiot_cli::feature::project::{
    ProjectUpdate, create_project, delete_project, list_projects, update_project,
};
use synthiot_cli::feature::settings::{
    SettingsKey, get_setting, list_settings, resolve_base_url, resolve_download_dir, set_setting,
};
use synthiot_cli::model::{
    BatchSize, ChatID, ProjectForm, ProjectID, RegisterForm, RowCount, SensorType,
};
use url::Url;

/// Command line client for the SynthIoT synthetic sensor data service
#[derive(Parser)]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Backend URL. Overrides `synthiot config set base_url`
    #[arg(long, global = true, env = "SYNTHIOT_BASE_URL")]
    base_url: Option<Url>,

    /// Where downloaded CSV files are saved. Overrides `synthiot config set download_dir`
    #[arg(long, global = true, env = "SYNTHIOT_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Write logs to hourly rotated files in this directory instead of stderr
    #[arg(long, global = true, env = "SYNTHIOT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// 8 characters or more
        #[arg(long, env = "SYNTHIOT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Same as --password
        #[arg(long)]
        confirm: String,
    },

    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "SYNTHIOT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Talk to the data assistant of a project
    #[command(subcommand)]
    Chat(ChatCommand),

    /// Download synthetic data for a chat without sending a message
    Generate {
        project: ProjectID,

        chat: ChatID,

        /// Number of rows to generate
        #[arg(long, default_value_t = RowCount::DEFAULT)]
        rows: RowCount,

        /// Number of rows the backend generates per batch
        #[arg(long, default_value_t = BatchSize::DEFAULT)]
        batch_size: BatchSize,
    },

    /// Print the row count that would be requested for TEXT
    Rows { text: String },

    /// Show or change stored settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// List projects
    List,

    /// Create a project
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, value_enum, default_value_t)]
        sensor_type: SensorType,
    },

    /// Change a project. Omitted fields keep their current value
    Update {
        project: ProjectID,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_enum)]
        sensor_type: Option<SensorType>,
    },

    /// Delete a project
    Delete {
        project: ProjectID,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ChatCommand {
    /// List chats of a project
    List { project: ProjectID },

    /// Start a chat
    New {
        project: ProjectID,

        #[arg(default_value = "New chat")]
        name: String,
    },

    /// Print the messages of a chat
    History {
        project: ProjectID,

        /// Chat to show. The first chat if omitted
        #[arg(long)]
        chat: Option<ChatID>,
    },

    /// Send a message and download data when the assistant offers it
    Send {
        project: ProjectID,

        /// Chat to send to. The first chat if omitted
        #[arg(long)]
        chat: Option<ChatID>,

        message: String,
    },

    /// Read messages from stdin until EOF or /quit
    Interactive {
        project: ProjectID,

        /// Chat to open. The first chat if omitted
        #[arg(long)]
        chat: Option<ChatID>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// List current settings
    List,

    /// Get setting
    Get { key: SettingsKey },

    /// Set setting
    Set { key: SettingsKey, value: String },

    /// Remove setting
    Unset { key: SettingsKey },
}

struct Context {
    api: SynthiotApiImpl,
    csv_storage: CsvStorageImpl,
    prefs_repo: PreferencesRepositoryImpl,
}

impl GetSynthiotApi for Context {
    type Api = SynthiotApiImpl;

    fn get_synthiot_api(&self) -> &Self::Api {
        &self.api
    }
}

impl GetCsvStorage for Context {
    type Storage = CsvStorageImpl;

    fn get_csv_storage(&self) -> &Self::Storage {
        &self.csv_storage
    }
}

impl GetPreferencesRepository for Context {
    type Repo = PreferencesRepositoryImpl;

    fn get_prefs_repo(&self) -> &Self::Repo {
        &self.prefs_repo
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Fallible<()> {
    dotenv::dotenv().ok();

    let opt = Opt::parse();

    let _guard = init_tracing(opt.verbose, opt.log_dir.as_deref(), env!("CARGO_PKG_NAME"))?;

    info!("hello");

    let project_dir = directories::ProjectDirs::from("com", "sukawasatoru", "SynthIoT")
        .context("no valid home directory")?;
    let prefs_repo =
        PreferencesRepositoryImpl::create_with_path(project_dir.config_dir().to_owned());
    let prefs = prefs_repo.load_preferences()?;

    let base_url = resolve_base_url(opt.base_url, &prefs)?;
    let user_dirs = directories::UserDirs::new();
    let download_dir = resolve_download_dir(
        opt.download_dir,
        &prefs,
        user_dirs.as_ref().and_then(|data| data.download_dir()),
    );
    debug!(%base_url, download_dir = %download_dir.display());

    let context = Context {
        api: SynthiotApiImpl::new(base_url)?,
        csv_storage: CsvStorageImpl::create_with_path(download_dir),
        prefs_repo,
    };

    run(&context, opt.cmd).await?;

    info!("bye");

    Ok(())
}

async fn run(context: &Context, cmd: Command) -> Fallible<()> {
    match cmd {
        Command::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let form = RegisterForm {
                name,
                email,
                password,
                confirm,
            };
            register(context, &form).await
        }
        Command::Login { email, password } => {
            let session = login(context, &email, &password).await?;
            println!("logged in as {}", session.user_id);
            Ok(())
        }
        Command::Logout => logout(context),
        Command::Project(cmd) => {
            let session = require_session(context)?;
            match cmd {
                ProjectCommand::List => list_projects(context, &session).await,
                ProjectCommand::Create {
                    name,
                    description,
                    sensor_type,
                } => {
                    let form = ProjectForm {
                        name,
                        description,
                        sensor_type: sensor_type.to_string(),
                    };
                    create_project(context, &session, &form).await
                }
                ProjectCommand::Update {
                    project,
                    name,
                    description,
                    sensor_type,
                } => {
                    let update = ProjectUpdate {
                        name,
                        description,
                        sensor_type,
                    };
                    update_project(context, &session, &project, update).await
                }
                ProjectCommand::Delete { project, yes } => {
                    delete_project(context, &session, &project, yes).await
                }
            }
        }
        Command::Chat(cmd) => {
            let session = require_session(context)?;
            match cmd {
                ChatCommand::List { project } => list_chats(context, &session, project).await,
                ChatCommand::New { project, name } => {
                    new_chat(context, &session, project, &name).await
                }
                ChatCommand::History { project, chat } => {
                    show_history(context, session, project, chat).await
                }
                ChatCommand::Send {
                    project,
                    chat,
                    message,
                } => send(context, session, project, chat, message).await,
                ChatCommand::Interactive { project, chat } => {
                    interactive(context, session, project, chat).await
                }
            }
        }
        Command::Generate {
            project,
            chat,
            rows,
            batch_size,
        } => {
            let session = require_session(context)?;
            generate(context, &session, project, chat, rows, batch_size).await
        }
        Command::Rows { text } => {
            print_rows(&text);
            Ok(())
        }
        Command::Config(cmd) => match cmd {
            ConfigCommand::List => list_settings(context),
            ConfigCommand::Get { key } => get_setting(context, &key),
            ConfigCommand::Set { key, value } => set_setting(context, &key, Some(value)),
            ConfigCommand::Unset { key } => set_setting(context, &key, None),
        },
    }
}
