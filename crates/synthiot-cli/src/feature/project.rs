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

use crate::data::repository::{GetSynthiotApi, SynthiotApi};
use crate::model::{Project, ProjectForm, ProjectID, SensorType, Session};
use std::io::prelude::*;
use std::io::{stdin, stdout};
use synthiot::prelude::*;

/// Fields to change on an existing project. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sensor_type: Option<SensorType>,
}

pub async fn list_projects<Ctx>(context: &Ctx, session: &Session) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    let projects = context
        .get_synthiot_api()
        .get_projects(&session.user_id)
        .await
        .context("failed to load projects")?;
    if projects.is_empty() {
        println!("no projects. run `synthiot project create` to add one");
        return Ok(());
    }

    for project in projects {
        println!(
            "{}\t{}\t{}\t{}",
            project.id,
            project.display_name(),
            project.sensor_type.as_deref().unwrap_or("-"),
            project.description.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

pub async fn create_project<Ctx>(context: &Ctx, session: &Session, form: &ProjectForm) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    ensure!(!form.name.trim().is_empty(), "project name is empty");

    context
        .get_synthiot_api()
        .create_project(&session.user_id, form)
        .await
        .context("Failed to save project")?;
    info!(name = %form.name, "created");

    Ok(())
}

pub async fn update_project<Ctx>(
    context: &Ctx,
    session: &Session,
    project_id: &ProjectID,
    update: ProjectUpdate,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    let api = context.get_synthiot_api();
    let project = api
        .get_projects(&session.user_id)
        .await
        .context("failed to load projects")?
        .into_iter()
        .find(|data| &data.id == project_id)
        .with_context(|| format!("project not found: {}", project_id))?;

    let form = merge_form(&project, update);
    api.update_project(project_id, &session.user_id, &form)
        .await
        .context("Failed to save project")?;
    info!(%project_id, "updated");

    Ok(())
}

pub async fn delete_project<Ctx>(
    context: &Ctx,
    session: &Session,
    project_id: &ProjectID,
    yes: bool,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    if !yes && !confirm("Delete this project?")? {
        debug!("cancelled");
        return Ok(());
    }

    context
        .get_synthiot_api()
        .delete_project(project_id, &session.user_id)
        .await
        .context("Failed to delete")?;
    info!(%project_id, "deleted");

    Ok(())
}

/// A stored sensor type outside [SensorType] is sent back unchanged.
fn merge_form(project: &Project, update: ProjectUpdate) -> ProjectForm {
    ProjectForm {
        name: update
            .name
            .or_else(|| project.name.clone())
            .unwrap_or_default(),
        description: update
            .description
            .or_else(|| project.description.clone())
            .unwrap_or_default(),
        sensor_type: update
            .sensor_type
            .map(|data| data.to_string())
            .or_else(|| project.sensor_type.clone())
            .unwrap_or_else(|| SensorType::default().to_string()),
    }
}

fn confirm(prompt: &str) -> Fallible<bool> {
    print!("{} [y/N] ", prompt);
    stdout().flush()?;

    let mut buf = String::new();
    stdin().read_line(&mut buf)?;

    Ok(matches!(buf.trim(), "y" | "Y" | "yes"))
}
