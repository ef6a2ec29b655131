use crate::error::{Error, Result};
use crate::events::{EventBus, NoticeLevel, Scope};
use crate::models::{
    generate_id, Consent, Day, MediaItem, MediaOwner, MediaStatus, SavedDay, SavedMedia,
    SavedStop, SavedTrip, SavedTripMeta, Stop, StopKind, Trip, TripStats, COVER_IMAGE_CAP,
};
use chrono::Utc;

/// The single owner of the trip tree. Every mutation goes through a method
/// here and emits the re-render events for the views derived from the
/// touched subtree before returning.
pub struct EditorState {
    pub trip: Trip,
    pub days: Vec<Day>,
    day_counter: u32,
    pub consent: Consent,
    events: EventBus,
}

impl EditorState {
    pub fn new(events: EventBus) -> Self {
        Self {
            trip: Trip {
                location: "Iceland".into(),
                ..Trip::default()
            },
            days: Vec::new(),
            day_counter: 0,
            consent: Consent::default(),
            events,
        }
    }

    fn touched(&self, scopes: &[Scope]) {
        for scope in scopes {
            self.events.rerender(*scope);
        }
    }

    // ===== Trip metadata =====

    pub fn set_trip_title(&mut self, title: impl Into<String>) {
        self.trip.title = title.into();
        self.touched(&[Scope::Preview]);
    }

    pub fn set_trip_description(&mut self, description: impl Into<String>) {
        self.trip.description = description.into();
        self.touched(&[Scope::Preview]);
    }

    pub fn set_trip_location(&mut self, location: impl Into<String>) {
        self.trip.location = location.into();
        self.touched(&[Scope::Preview]);
    }

    pub fn set_consent(&mut self, consent: Consent) {
        self.consent = consent;
    }

    // ===== Days =====

    pub fn add_day(&mut self) -> String {
        self.day_counter += 1;
        let day = Day {
            id: generate_id(),
            number: self.day_counter,
            title: String::new(),
            stops: Vec::new(),
        };
        let id = day.id.clone();
        self.days.push(day);
        self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
        id
    }

    pub fn remove_day(&mut self, day_id: &str) {
        let Some(index) = self.days.iter().position(|d| d.id == day_id) else {
            return;
        };
        let mut removed = self.days.remove(index);
        for stop in &mut removed.stops {
            for item in &mut stop.media {
                item.release_local();
            }
        }
        // Numbers stay dense 1..=N after any removal.
        for (i, day) in self.days.iter_mut().enumerate() {
            day.number = (i + 1) as u32;
        }
        self.day_counter = self.days.len() as u32;
        self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
    }

    pub fn update_day_title(&mut self, day_id: &str, title: impl Into<String>) {
        if let Some(day) = self.days.iter_mut().find(|d| d.id == day_id) {
            day.title = title.into();
            self.touched(&[Scope::Preview]);
        }
    }

    // ===== Stops =====

    pub fn add_stop(&mut self, day_id: &str, kind: StopKind) -> Result<String> {
        let Some(day) = self.days.iter_mut().find(|d| d.id == day_id) else {
            return Err(Error::Init(format!("Unknown day: {day_id}")));
        };
        if day.stops.iter().any(|s| s.kind == StopKind::Accommodation) {
            let message = if kind == StopKind::Accommodation {
                format!("Day {} already has an accommodation.", day.number)
            } else {
                "Accommodation should be the last stop of the day. Remove it first to add more activities.".into()
            };
            self.events.toast(NoticeLevel::Error, message.clone());
            return Err(Error::Validation(message));
        }
        let stop = Stop::new(kind);
        let id = stop.id.clone();
        day.stops.push(stop);
        self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
        Ok(id)
    }

    pub fn remove_stop(&mut self, stop_id: &str) {
        for day in &mut self.days {
            if let Some(index) = day.stops.iter().position(|s| s.id == stop_id) {
                let mut removed = day.stops.remove(index);
                for item in &mut removed.media {
                    item.release_local();
                }
                self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
                return;
            }
        }
    }

    pub fn update_stop_title(&mut self, stop_id: &str, title: impl Into<String>) {
        if let Some(stop) = self.stop_mut(stop_id) {
            stop.title = title.into();
            self.touched(&[Scope::Preview]);
        }
    }

    pub fn update_stop_description(&mut self, stop_id: &str, description: impl Into<String>) {
        if let Some(stop) = self.stop_mut(stop_id) {
            stop.description = description.into();
            self.touched(&[Scope::Preview]);
        }
    }

    pub fn stop_mut(&mut self, stop_id: &str) -> Option<&mut Stop> {
        self.days
            .iter_mut()
            .flat_map(|d| d.stops.iter_mut())
            .find(|s| s.id == stop_id)
    }

    pub fn stop(&self, stop_id: &str) -> Option<&Stop> {
        self.days
            .iter()
            .flat_map(|d| d.stops.iter())
            .find(|s| s.id == stop_id)
    }

    // ===== Media =====

    pub fn cover_slots_remaining(&self) -> usize {
        COVER_IMAGE_CAP.saturating_sub(self.trip.cover_images.len())
    }

    pub fn push_cover_image(&mut self, item: MediaItem) -> Result<()> {
        if self.trip.cover_images.len() >= COVER_IMAGE_CAP {
            return Err(Error::Validation(format!(
                "Cover image limit of {COVER_IMAGE_CAP} reached"
            )));
        }
        self.trip.cover_images.push(item);
        self.touched(&[Scope::Cover, Scope::Preview, Scope::Stats]);
        Ok(())
    }

    pub fn remove_cover_image(&mut self, media_id: &str) {
        if let Some(index) = self.trip.cover_images.iter().position(|m| m.id == media_id) {
            let mut removed = self.trip.cover_images.remove(index);
            removed.release_local();
            self.touched(&[Scope::Cover, Scope::Preview, Scope::Stats]);
        }
    }

    pub fn push_stop_media(&mut self, stop_id: &str, item: MediaItem) -> Result<()> {
        let Some(stop) = self.stop_mut(stop_id) else {
            return Err(Error::Init(format!("Unknown stop: {stop_id}")));
        };
        stop.media.push(item);
        self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
        Ok(())
    }

    pub fn remove_stop_media(&mut self, stop_id: &str, media_id: &str) {
        if let Some(stop) = self.stop_mut(stop_id) {
            if let Some(index) = stop.media.iter().position(|m| m.id == media_id) {
                let mut removed = stop.media.remove(index);
                removed.release_local();
                self.touched(&[Scope::Days, Scope::Preview, Scope::Stats]);
            }
        }
    }

    /// Re-resolve a queued reference pair against the tree. Returns `None`
    /// once the item has been removed by the user.
    pub fn media_mut(&mut self, owner: &MediaOwner, media_id: &str) -> Option<&mut MediaItem> {
        match owner {
            MediaOwner::Cover => self
                .trip
                .cover_images
                .iter_mut()
                .find(|m| m.id == media_id),
            MediaOwner::Stop(stop_id) => self
                .stop_mut(stop_id)?
                .media
                .iter_mut()
                .find(|m| m.id == media_id),
        }
    }

    pub fn set_thumbnail(&mut self, owner: &MediaOwner, media_id: &str, thumbnail: String) {
        if let Some(item) = self.media_mut(owner, media_id) {
            item.thumbnail = Some(thumbnail);
            self.touched(&[Scope::Days, Scope::Cover, Scope::Preview]);
        }
    }

    // ===== Aggregates =====

    pub fn stats(&self) -> TripStats {
        let total_stops = self.days.iter().map(|d| d.stops.len()).sum();
        let stop_media: usize = self
            .days
            .iter()
            .flat_map(|d| d.stops.iter())
            .map(|s| s.media.len())
            .sum();
        TripStats {
            total_days: self.days.len(),
            total_stops,
            total_media: self.trip.cover_images.len() + stop_media,
        }
    }

    // ===== Export / import =====

    pub fn export(&self) -> SavedTrip {
        SavedTrip {
            trip: SavedTripMeta {
                title: self.trip.title.clone(),
                description: self.trip.description.clone(),
                location: self.trip.location.clone(),
                cover_images: self.trip.cover_images.iter().map(saved_media).collect(),
            },
            days: self
                .days
                .iter()
                .map(|day| SavedDay {
                    id: day.id.clone(),
                    number: day.number,
                    title: day.title.clone(),
                    stops: day
                        .stops
                        .iter()
                        .map(|stop| SavedStop {
                            id: stop.id.clone(),
                            kind: stop.kind,
                            title: stop.title.clone(),
                            description: stop.description.clone(),
                            media: stop.media.iter().map(saved_media).collect(),
                        })
                        .collect(),
                })
                .collect(),
            consent: self.consent,
            updated_at: Utc::now(),
        }
    }

    /// Replace the whole tree with a previously exported one. Media entries
    /// without a surviving remote URL are dropped; everything restored with
    /// a URL is already uploaded, so nothing here re-enters the queue.
    pub fn import(&mut self, saved: SavedTrip) {
        self.trip = Trip {
            title: saved.trip.title,
            description: saved.trip.description,
            location: saved.trip.location,
            cover_images: saved
                .trip
                .cover_images
                .into_iter()
                .filter_map(restore_media)
                .collect(),
        };
        self.days = saved
            .days
            .into_iter()
            .map(|day| Day {
                id: or_new_id(day.id),
                number: day.number,
                title: day.title,
                stops: day
                    .stops
                    .into_iter()
                    .map(|stop| Stop {
                        id: or_new_id(stop.id),
                        kind: stop.kind,
                        title: stop.title,
                        description: stop.description,
                        media: stop.media.into_iter().filter_map(restore_media).collect(),
                    })
                    .collect(),
            })
            .collect();
        self.day_counter = self.days.len() as u32;
        self.consent = saved.consent;
        self.touched(&[Scope::All]);
    }

    /// Clear the tree. The upload manager clears the queue and counter
    /// alongside this when a trip reset is requested.
    pub fn reset(&mut self) {
        self.trip = Trip {
            location: "Iceland".into(),
            ..Trip::default()
        };
        self.days.clear();
        self.day_counter = 0;
        self.consent = Consent::default();
        self.touched(&[Scope::All]);
    }
}

fn saved_media(item: &MediaItem) -> SavedMedia {
    SavedMedia {
        id: item.id.clone(),
        url: item.remote_url.clone(),
        remote_url: item.remote_url.clone(),
        file_name: Some(item.meta.name.clone()),
        file_type: Some(item.meta.mime_type.clone()),
        file_size: Some(item.meta.size_bytes),
        thumbnail: item.thumbnail.clone(),
        status: if item.remote_url.is_some() {
            MediaStatus::Uploaded
        } else {
            MediaStatus::Pending
        },
    }
}

fn restore_media(saved: SavedMedia) -> Option<MediaItem> {
    let url = saved.remote_url.or(saved.url)?;
    Some(MediaItem {
        id: or_new_id(saved.id),
        local_path: None,
        thumbnail: saved.thumbnail,
        remote_url: Some(url),
        status: MediaStatus::Uploaded,
        meta: crate::models::FileMeta {
            name: saved.file_name.unwrap_or_else(|| "media".into()),
            mime_type: saved.file_type.unwrap_or_default(),
            size_bytes: saved.file_size.unwrap_or(0),
        },
    })
}

fn or_new_id(id: String) -> String {
    if id.is_empty() {
        generate_id()
    } else {
        id
    }
}
