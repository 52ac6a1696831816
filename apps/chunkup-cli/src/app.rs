//! Upload and check commands.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chunkup_transfer::validate_file;
use chunkup_uploader::{UploadEvent, UploadFile, UploadStatus, UploadTask, Uploader, UploaderConfig};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Uploads `paths` as one batch. Returns `false` if any file ended in error.
pub async fn upload(config: UploaderConfig, paths: &[PathBuf]) -> anyhow::Result<bool> {
    let files = open_files(paths)?;

    let mut uploader = Uploader::new(config).context("creating upload client")?;
    let events = uploader
        .take_events()
        .context("event receiver already taken")?;
    let uploader = Arc::new(uploader);

    uploader.add_files(files);
    let mut names = HashMap::new();
    for task in uploader.tasks() {
        if let Some(reason) = task.error.as_deref() {
            eprintln!("{}: rejected: {reason}", task.file.name);
        }
        names.insert(task.id, task.file.name);
    }

    let printer = tokio::spawn(print_events(events, names));
    let mut batch = {
        let uploader = Arc::clone(&uploader);
        tokio::spawn(async move { uploader.start_upload().await })
    };

    tokio::select! {
        result = &mut batch => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, aborting upload");
            uploader.abort_upload().await;
            batch.await?;
        }
    }

    let tasks = uploader.tasks();
    // Closes the event channel so the printer drains and exits.
    drop(uploader);
    printer.await?;

    print_summary(&tasks);
    Ok(!tasks.iter().any(|t| t.status == UploadStatus::Error))
}

/// Validates `paths` without touching the network. Returns `false` if any
/// file is rejected.
pub fn check(config: &UploaderConfig, paths: &[PathBuf]) -> anyhow::Result<bool> {
    let rules = config.validation_rules();
    let mut all_ok = true;
    for file in open_files(paths)? {
        match validate_file(&file.name, file.size, &rules) {
            Ok(()) => println!("ok        {} ({})", file.name, format_bytes(file.size)),
            Err(e) => {
                all_ok = false;
                println!("rejected  {}: {e}", file.name);
            }
        }
    }
    Ok(all_ok)
}

fn open_files(paths: &[PathBuf]) -> anyhow::Result<Vec<UploadFile>> {
    paths
        .iter()
        .map(|p| UploadFile::from_path(p).with_context(|| format!("opening {}", p.display())))
        .collect()
}

async fn print_events(
    mut events: UnboundedReceiver<UploadEvent>,
    names: HashMap<String, String>,
) {
    while let Some(event) = events.recv().await {
        match event {
            UploadEvent::Progress {
                task_id,
                uploaded_bytes,
                progress,
                bytes_per_second,
                eta,
            } => {
                let name = names.get(&task_id).map_or(task_id.as_str(), String::as_str);
                println!(
                    "{name}: {progress:5.1}%  {}  {}/s  eta {}",
                    format_bytes(uploaded_bytes),
                    format_bytes(bytes_per_second as u64),
                    format_eta(eta)
                );
            }
            UploadEvent::FileComplete { task, .. } => {
                println!("{}: done", task.file.name);
            }
            UploadEvent::UploadComplete { tasks } => {
                info!(files = tasks.len(), "batch complete");
            }
            UploadEvent::UploadAborted { tasks } => {
                info!(files = tasks.len(), "batch aborted");
            }
        }
    }
}

fn print_summary(tasks: &[UploadTask]) {
    println!();
    for task in tasks {
        let detail = match (&task.error, task.key()) {
            (Some(reason), _) if task.status != UploadStatus::Completed => reason.clone(),
            (_, Some(key)) => key.to_string(),
            _ => String::new(),
        };
        println!(
            "{:<10} {:>10}  {}  {}",
            task.status.as_str(),
            format_bytes(task.file.size),
            task.file.name,
            detail
        );
    }
}

/// `m:ss`, or `--` while the speed is unknown.
pub fn format_eta(eta: Option<Duration>) -> String {
    match eta {
        Some(d) => {
            let secs = d.as_secs_f64().ceil() as u64;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "--".into(),
    }
}

/// Human-readable byte count with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
