mod config;
mod error;
mod events;
mod models;
mod queue;
mod state;
mod submit;
mod thumbnails;
mod uploader;
mod validate;
#[cfg(feature = "video-thumbs")]
mod video_frame;
mod view;

use crate::config::UploadConfig;
use crate::events::{EventBus, NoticeLevel, UiEvent};
use crate::models::{Consent, Preferences, StopKind, Submitter};
use crate::queue::{PickedFile, UploadManager, UPLOAD_TIMEOUT};
use crate::state::EditorState;
use crate::uploader::WebhookTransport;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A trip draft as fed to the binary: the same content a user would type
/// and pick in the form, with local file paths standing in for the file
/// picker.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftTrip {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_location")]
    location: String,
    #[serde(default)]
    cover_files: Vec<PathBuf>,
    #[serde(default)]
    days: Vec<DraftDay>,
    #[serde(default)]
    user: Option<Submitter>,
    #[serde(default)]
    preferences: Preferences,
    #[serde(default)]
    consent: Consent,
}

fn default_location() -> String {
    "Iceland".into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftDay {
    title: String,
    #[serde(default)]
    stops: Vec<DraftStop>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftStop {
    #[serde(rename = "type")]
    kind: StopKind,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    files: Vec<PathBuf>,
}

fn pick_files(paths: &[PathBuf]) -> Vec<PickedFile> {
    paths
        .iter()
        .filter_map(|path| match PickedFile::from_path(path.clone()) {
            Ok(file) => Some(file),
            Err(err) => {
                log::error!("Cannot read {}: {err}", path.display());
                None
            }
        })
        .collect()
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let do_submit = args.iter().any(|a| a == "--submit");
    let mut paths = args.iter().filter(|a| !a.starts_with("--"));
    let (Some(config_path), Some(draft_path)) = (paths.next(), paths.next()) else {
        eprintln!("Usage: trip-builder <config.json> <draft.json> [--submit]");
        std::process::exit(2);
    };

    let config = UploadConfig::load(Path::new(config_path)).expect("Failed to load config");
    let draft: DraftTrip = serde_json::from_str(
        &std::fs::read_to_string(draft_path).expect("Failed to read draft"),
    )
    .expect("Failed to parse draft");

    let (events, rx) = EventBus::new();
    // Stand-in for the rendering layer: toasts go to the log, re-render
    // triggers are only visible at debug level.
    std::thread::spawn(move || {
        for event in rx {
            match event {
                UiEvent::Toast { level, message } => match level {
                    NoticeLevel::Success => log::info!("{message}"),
                    NoticeLevel::Warning => log::warn!("{message}"),
                    NoticeLevel::Error => log::error!("{message}"),
                },
                UiEvent::Rerender(scope) => log::debug!("re-render {scope:?}"),
            }
        }
    });

    let state = Arc::new(Mutex::new(EditorState::new(events.clone())));
    let transport = Arc::new(
        WebhookTransport::new(config.media_upload_webhook.clone(), UPLOAD_TIMEOUT)
            .expect("Failed to build upload client"),
    );
    let manager = UploadManager::new(state.clone(), transport, config.clone(), events);

    {
        let mut state = state.lock().unwrap();
        state.set_trip_title(draft.title.clone());
        state.set_trip_description(draft.description.clone());
        state.set_trip_location(draft.location.clone());
        state.set_consent(draft.consent);
    }
    manager.add_cover_images(pick_files(&draft.cover_files));

    for draft_day in &draft.days {
        let day_id = {
            let mut state = state.lock().unwrap();
            let id = state.add_day();
            state.update_day_title(&id, draft_day.title.clone());
            id
        };
        for draft_stop in &draft_day.stops {
            let stop_id = {
                let mut state = state.lock().unwrap();
                match state.add_stop(&day_id, draft_stop.kind) {
                    Ok(id) => {
                        state.update_stop_title(&id, draft_stop.title.clone());
                        state.update_stop_description(&id, draft_stop.description.clone());
                        id
                    }
                    Err(err) => {
                        log::error!("Skipping stop \"{}\": {err}", draft_stop.title);
                        continue;
                    }
                }
            };
            manager.add_stop_media(&stop_id, pick_files(&draft_stop.files));
        }
    }

    manager.drain().await;

    let stats = state.lock().unwrap().stats();
    log::info!(
        "Uploads finished: {} days, {} stops, {} media",
        stats.total_days,
        stats.total_stops,
        stats.total_media
    );

    if do_submit {
        let payload = {
            let state = state.lock().unwrap();
            if let Err(err) = submit::validate_form(&state, manager.active_uploads()) {
                log::error!("{err}");
                std::process::exit(1);
            }
            submit::build_payload(&state, draft.user.unwrap_or_default(), draft.preferences)
        };
        let client = reqwest::Client::new();
        match submit::submit(&client, &config.final_submission_webhook, &payload).await {
            Ok(()) => log::info!("Trip submitted"),
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        }
    } else {
        let saved = state.lock().unwrap().export();
        println!(
            "{}",
            serde_json::to_string_pretty(&saved).expect("Failed to serialize trip")
        );
    }
}
