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

use crate::data::repository::{CsvStorage, GetCsvStorage, GetSynthiotApi, SynthiotApi};
use crate::feature::quantity::extract_rows;
use crate::model::{BatchSize, ChatID, GenerationRequest, ProjectID, RowCount, Session};
use std::path::PathBuf;
use synthiot::prelude::*;

/// Download a synthetic CSV and store it. Returns the stored path.
pub async fn download_csv<Ctx>(context: &Ctx, request: &GenerationRequest) -> Fallible<PathBuf>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    info!(
        project_id = %request.project_id,
        chat_id = %request.chat_id,
        rows = %request.rows,
        batch_size = %request.batch_size,
        "generate"
    );

    let csv = context
        .get_synthiot_api()
        .download_synthetic_csv(request)
        .await?;
    context.get_csv_storage().save_csv(&csv)
}

pub async fn generate<Ctx>(
    context: &Ctx,
    session: &Session,
    project_id: ProjectID,
    chat_id: ChatID,
    rows: RowCount,
    batch_size: BatchSize,
) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
    Ctx: GetCsvStorage,
{
    let request = GenerationRequest {
        project_id,
        chat_id,
        user_id: session.user_id.clone(),
        rows,
        batch_size,
    };
    let path = download_csv(context, &request).await?;
    println!("saved {} rows to {}", rows, path.display());

    Ok(())
}

pub fn print_rows(text: &str) {
    match extract_rows(text) {
        Some(data) => println!("{}", data),
        None => println!("unknown (default: {})", RowCount::DEFAULT),
    }
}
