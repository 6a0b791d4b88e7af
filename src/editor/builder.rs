use crate::constants::{DRAFT_LINE_SOURCE, DRAFT_POINTS_SOURCE};
use crate::geometry::LngLat;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use super::completion::CompletionState;
use super::controller::{Dispatch, ModeController};
use super::draft::{Draft, PointAdded};
use super::error::{EditorError, UserSequenceError};
use super::mode::EditorMode;
use super::surface::{empty_collection, MapEvent, MapSurface};

/// One line feature through every vertex, or nothing for an empty chain
#[must_use]
pub fn line_collection(vertices: &[LngLat]) -> FeatureCollection {
    if vertices.is_empty() {
        return empty_collection();
    }
    let line = vertices.iter().map(|v| v.to_position()).collect();
    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(line))),
            id: None,
            properties: None,
            foreign_members: None,
        }],
        foreign_members: None,
    }
}

/// One point feature per position, tagged with its index
#[must_use]
pub fn point_collection(points: &[LngLat]) -> FeatureCollection {
    let features = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let mut properties = JsonObject::new();
            properties.insert("index".to_string(), index.into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(point.to_position()))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

impl<S: MapSurface> ModeController<S> {
    pub(super) fn draw_click(&mut self, event: &MapEvent) -> Dispatch {
        let Some(pointer) = event.pointer() else {
            return Dispatch::Ignored;
        };
        if matches!(self.completion, CompletionState::Saving(_)) {
            return self.reject(UserSequenceError::SaveInProgress);
        }
        let snap = self.snap.current();
        let Some(draft) = self.draft.as_mut() else {
            return self.reject(UserSequenceError::NoDraft);
        };
        match draft.add_point(snap, pointer.lng_lat) {
            Err(e) => self.reject(e),
            Ok(added) => {
                self.redraw_preview();
                if added == PointAdded::End {
                    self.offer_completion()
                } else {
                    Dispatch::Handled
                }
            }
        }
    }

    /// Remove the last vertex of the draft being drawn
    ///
    /// # Errors
    ///
    /// Returns an error outside EDIT mode, while the segment is being saved,
    /// or when the draft is empty
    pub fn cancel_last_point(&mut self) -> Result<LngLat, EditorError> {
        let result = self.remove_last_point();
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    fn remove_last_point(&mut self) -> Result<LngLat, EditorError> {
        if self.mode != EditorMode::Edit {
            return Err(UserSequenceError::NoDraft.into());
        }
        if matches!(self.completion, CompletionState::Saving(_)) {
            return Err(UserSequenceError::SaveInProgress.into());
        }
        let draft = self.draft.as_mut().ok_or(UserSequenceError::NoDraft)?;
        let removed = draft.remove_last_point()?;
        // an open form or decision no longer matches the draft
        self.completion = CompletionState::Idle;
        self.redraw_preview();
        Ok(removed)
    }

    /// Replace both preview sources with the current draft vertices
    pub(super) fn redraw_preview(&mut self) {
        let vertices = self.draft.as_ref().map(Draft::vertices).unwrap_or_default();
        let line = line_collection(vertices);
        let points = point_collection(vertices);
        self.surface.set_data(DRAFT_LINE_SOURCE, line);
        self.surface.set_data(DRAFT_POINTS_SOURCE, points);
    }
}
