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

use crate::prelude::*;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose` when it is set. Logs go to stderr, or to an hourly rolling
/// file under `log_dir` when given. Keep the returned guard alive until exit so the file writer
/// can flush.
pub fn init_tracing(
    verbose: u8,
    log_dir: Option<&Path>,
    file_name_prefix: &str,
) -> Fallible<Option<WorkerGuard>> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(var) => EnvFilter::try_new(&var).unwrap_or_else(|e| {
            eprintln!("Ignoring `RUST_LOG={:?}`: {}", var, e);
            EnvFilter::new(level_from_verbose(verbose).to_string())
        }),
        Err(_) => EnvFilter::new(level_from_verbose(verbose).to_string()),
    };

    let registry = tracing_subscriber::registry().with(filter);

    match log_dir {
        Some(log_dir) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(
                tracing_appender::rolling::hourly(log_dir, file_name_prefix),
            );
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
            Ok(None)
        }
    }
}

pub fn level_from_verbose(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
