use crate::models::{MediaItem, MediaStatus, TripStats};
use crate::state::EditorState;
use serde::Serialize;

/// Fallback tile for media that has no thumbnail yet (or never will, as
/// with videos when frame decoding is not built in): a dark card with a
/// play glyph.
pub const PLACEHOLDER_THUMB: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSI2NDAiIGhlaWdodD0iMzYwIiB2aWV3Qm94PSIwIDAgNjQwIDM2MCI+PHJlY3Qgd2lkdGg9IjY0MCIgaGVpZ2h0PSIzNjAiIGZpbGw9IiMxMTE4MjciLz48Y2lyY2xlIGN4PSIzMjAiIGN5PSIxODAiIHI9IjQ4IiBmaWxsPSJ3aGl0ZSIgb3BhY2l0eT0iMC45Ii8+PHBvbHlnb24gcG9pbnRzPSIzMTAsMTU1IDM0NSwxODAgMzEwLDIwNSIgZmlsbD0iIzExMTgyNyIvPjwvc3ZnPg==";

/// View models are plain data, rebuilt in full from current state on every
/// re-render event. Correctness only requires the state to be right; there
/// is no patching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripView {
    pub title: String,
    pub description: String,
    pub location: String,
    pub cover: Vec<MediaTile>,
    pub days: Vec<DayView>,
    pub stats: TripStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub id: String,
    pub label: String,
    pub title: String,
    pub stops: Vec<StopView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopView {
    pub id: String,
    pub badge: &'static str,
    pub title: String,
    pub description: String,
    pub media: Vec<MediaTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaTile {
    pub id: String,
    pub thumbnail: String,
    pub uploading: bool,
    pub failed: bool,
    pub is_video: bool,
}

fn media_tile(item: &MediaItem) -> MediaTile {
    MediaTile {
        id: item.id.clone(),
        thumbnail: item
            .thumbnail
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_THUMB.to_string()),
        uploading: item.status == MediaStatus::Uploading,
        failed: item.status == MediaStatus::Error,
        is_video: item.meta.mime_type.starts_with("video/"),
    }
}

pub fn cover_strip(state: &EditorState) -> Vec<MediaTile> {
    state.trip.cover_images.iter().map(media_tile).collect()
}

pub fn day_list(state: &EditorState) -> Vec<DayView> {
    state
        .days
        .iter()
        .map(|day| DayView {
            id: day.id.clone(),
            label: format!("Day {}", day.number),
            title: day.title.clone(),
            stops: day
                .stops
                .iter()
                .map(|stop| StopView {
                    id: stop.id.clone(),
                    badge: stop.kind.label(),
                    title: stop.title.clone(),
                    description: stop.description.clone(),
                    media: stop.media.iter().map(media_tile).collect(),
                })
                .collect(),
        })
        .collect()
}

pub fn trip_view(state: &EditorState) -> TripView {
    TripView {
        title: state.trip.title.clone(),
        description: state.trip.description.clone(),
        location: state.trip.location.clone(),
        cover: cover_strip(state),
        days: day_list(state),
        stats: state.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::models::{FileMeta, StopKind};
    use std::path::PathBuf;

    fn media(name: &str, mime: &str) -> MediaItem {
        MediaItem::new(
            FileMeta {
                name: name.into(),
                mime_type: mime.into(),
                size_bytes: 5,
            },
            PathBuf::from(format!("/tmp/{name}")),
        )
    }

    fn sample_state() -> EditorState {
        let (events, _rx) = EventBus::new();
        let mut state = EditorState::new(events);
        state.set_trip_title("Westfjords");
        let day = state.add_day();
        state.update_day_title(&day, "Arrival");
        let stop = state.add_stop(&day, StopKind::Accommodation).unwrap();
        state.update_stop_title(&stop, "Guesthouse");
        state.push_stop_media(&stop, media("room.jpg", "image/jpeg")).unwrap();
        state.push_stop_media(&stop, media("tour.mp4", "video/mp4")).unwrap();
        state
    }

    #[test]
    fn rendering_is_idempotent() {
        let state = sample_state();
        assert_eq!(trip_view(&state), trip_view(&state));
    }

    #[test]
    fn view_reflects_current_state_only() {
        let mut state = sample_state();
        let before = trip_view(&state);
        assert_eq!(before.days[0].label, "Day 1");
        assert_eq!(before.days[0].stops[0].badge, "Accommodation");
        assert_eq!(before.stats.total_media, 2);

        let stop_id = state.days[0].stops[0].id.clone();
        let media_id = state.days[0].stops[0].media[0].id.clone();
        state.remove_stop_media(&stop_id, &media_id);

        let after = trip_view(&state);
        assert_eq!(after.stats.total_media, 1);
        assert_eq!(after.days[0].stops[0].media.len(), 1);
    }

    #[test]
    fn tiles_fall_back_to_placeholder_and_flag_status() {
        let mut state = sample_state();
        let stop_id = state.days[0].stops[0].id.clone();
        {
            let stop = state.stop_mut(&stop_id).unwrap();
            stop.media[0].thumbnail = Some("data:image/jpeg;base64,abc".into());
            stop.media[0].status = MediaStatus::Uploading;
            stop.media[1].status = MediaStatus::Error;
        }

        let view = trip_view(&state);
        let tiles = &view.days[0].stops[0].media;
        assert_eq!(tiles[0].thumbnail, "data:image/jpeg;base64,abc");
        assert!(tiles[0].uploading);
        assert_eq!(tiles[1].thumbnail, PLACEHOLDER_THUMB);
        assert!(tiles[1].failed);
        assert!(tiles[1].is_video);
    }
}
