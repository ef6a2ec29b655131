use crate::error::{Error, Result};
use crate::models::{
    MediaStatus, Preferences, SubmissionConsent, SubmissionDay, SubmissionMedia,
    SubmissionPayload, SubmissionStop, SubmissionTrip, Submitter,
};
use crate::state::EditorState;
use chrono::Utc;

/// The submit gate. Returns the first blocking problem as a message the UI
/// would toast; a clean pass means the payload can be built.
pub fn validate_form(state: &EditorState, active_uploads: usize) -> Result<()> {
    let block = |message: &str| Err(Error::Submission(message.to_string()));

    if state.trip.cover_images.is_empty() {
        return block("Please add at least one cover image");
    }
    if state.trip.title.trim().is_empty() {
        return block("Please enter a trip title");
    }
    if state.trip.description.trim().is_empty() {
        return block("Please enter a trip description");
    }
    if state.days.is_empty() {
        return block("Please add at least one day");
    }
    for day in &state.days {
        if day.title.trim().is_empty() {
            return block(&format!("Please enter a title for Day {}", day.number));
        }
        for stop in &day.stops {
            if stop.title.trim().is_empty() {
                return block(&format!("Please enter a title for stop in Day {}", day.number));
            }
            if stop.description.trim().is_empty() {
                return block(&format!(
                    "Please enter a description for \"{}\" in Day {}",
                    stop.title, day.number
                ));
            }
        }
    }
    if active_uploads > 0 {
        return block("Please wait for media uploads to finish");
    }
    if !state.consent.ownership {
        return block("Please confirm content ownership");
    }
    if !state.consent.license {
        return block("Please agree to the license terms");
    }
    if !state.consent.age {
        return block("Please confirm your age");
    }
    if !state.consent.people {
        return block("Please confirm consent for people in photos");
    }
    Ok(())
}

/// Assemble the final submission body. Only media that finished uploading
/// makes it in, each entry carrying its remote URL and file metadata.
pub fn build_payload(
    state: &EditorState,
    user: Submitter,
    preferences: Preferences,
) -> SubmissionPayload {
    let now = Utc::now();
    SubmissionPayload {
        user,
        trip: SubmissionTrip {
            title: state.trip.title.clone(),
            description: state.trip.description.clone(),
            location: state.trip.location.clone(),
            cover_images: state
                .trip
                .cover_images
                .iter()
                .filter(|m| m.status == MediaStatus::Uploaded)
                .filter_map(|m| m.remote_url.clone())
                .collect(),
        },
        submitted_at: now,
        days: state
            .days
            .iter()
            .map(|day| SubmissionDay {
                id: day.id.clone(),
                number: day.number,
                title: day.title.clone(),
                stops: day
                    .stops
                    .iter()
                    .map(|stop| SubmissionStop {
                        id: stop.id.clone(),
                        kind: stop.kind,
                        title: stop.title.clone(),
                        description: stop.description.clone(),
                        media: stop
                            .media
                            .iter()
                            .filter(|m| m.status == MediaStatus::Uploaded)
                            .map(|m| SubmissionMedia {
                                id: m.id.clone(),
                                url: m.remote_url.clone().unwrap_or_default(),
                                file_name: m.meta.name.clone(),
                                file_type: m.meta.mime_type.clone(),
                                file_size: m.meta.size_bytes,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
        preferences,
        consent: SubmissionConsent {
            ownership_confirmed: state.consent.ownership,
            license_agreed: state.consent.license,
            age_confirmed: state.consent.age,
            people_consent_given: state.consent.people,
            consent_timestamp: now,
        },
    }
}

/// Post the payload. All-or-nothing: any non-2xx answer is a total
/// submission failure and the caller asks the user to retry.
pub async fn submit(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &SubmissionPayload,
) -> Result<()> {
    let response = client.post(endpoint).json(payload).send().await?;
    if !response.status().is_success() {
        return Err(Error::Submission(format!(
            "Submission failed. Please try again. (HTTP {})",
            response.status().as_u16()
        )));
    }
    Ok(())
}
