//! Map and list view-models for a filtered result set.
//!
//! The presenter is pure: it turns a [`ResultSet`] into declarative marker and
//! list entries. The page's map widget places the markers and forwards pointer
//! events back by [`MarkerId`]; [`MapView::dispatch`] answers with the infobox
//! state to show, so the presenter never touches the widget's native event API.

use serde::Serialize;

use super::{Coordinates, ResultSet};

/// Zoom level used when centring on the first result.
pub const RESULT_ZOOM: f64 = 11.5;
/// Zoom level used for the neutral world view.
pub const WORLD_ZOOM: f64 = 1.0;

/// Stable marker identity within one rendered map (position in the result set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub usize);

/// One map marker with its on-demand detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerViewModel {
    pub id: MarkerId,
    pub location: Coordinates,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Where the map view is centred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapCenter {
    /// Centred on a result.
    Location { location: Coordinates },
    /// Neutral world view used when there is nothing to show.
    World,
}

/// Declarative map state for one completed search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// The map is shown for every completed search, even an empty one.
    pub visible: bool,
    pub center: MapCenter,
    pub zoom: f64,
    pub markers: Vec<MarkerViewModel>,
}

/// Pointer interaction reported by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerEventKind {
    Hover,
    Activate,
    Leave,
}

/// Infobox state the page should apply after a marker event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InfoboxState {
    Visible {
        marker: MarkerId,
        location: Coordinates,
        title: String,
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rating: Option<f64>,
    },
    Hidden,
}

impl MapView {
    /// Resolve a marker event into the infobox to display.
    ///
    /// Hover and activation reveal the marker's detail; leaving hides it.
    /// Unknown markers hide the infobox.
    pub fn dispatch(&self, marker: MarkerId, kind: MarkerEventKind) -> InfoboxState {
        if kind == MarkerEventKind::Leave {
            return InfoboxState::Hidden;
        }
        self.markers
            .iter()
            .find(|candidate| candidate.id == marker)
            .map_or(InfoboxState::Hidden, |found| InfoboxState::Visible {
                marker: found.id,
                location: found.location,
                title: found.title.clone(),
                description: found.description.clone(),
                rating: found.rating,
            })
    }
}

/// One list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub name: String,
    pub address: String,
}

/// Declarative list state for one completed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum ListView {
    Entries(Vec<ListItem>),
    /// Nothing survived the filter; the list stays hidden.
    NoResults,
}

impl ListView {
    /// Whether the list component should be shown.
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Entries(_))
    }
}

/// Map and list produced together for one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedResults {
    pub map: MapView,
    pub list: ListView,
}

/// Render a result set into map markers and list entries, both in result order.
///
/// # Examples
/// ```
/// use welp_backend::domain::{render, filter_by_budget, Budget, ListView, MapCenter};
///
/// let empty = filter_by_budget(Vec::new(), Budget::new(10.0).expect("valid budget"));
/// let rendered = render(&empty);
/// assert!(rendered.map.visible);
/// assert_eq!(rendered.map.center, MapCenter::World);
/// assert_eq!(rendered.list, ListView::NoResults);
/// ```
pub fn render(results: &ResultSet) -> RenderedResults {
    RenderedResults {
        map: render_map(results),
        list: render_list(results),
    }
}

fn render_map(results: &ResultSet) -> MapView {
    let markers = results
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| MarkerViewModel {
            id: MarkerId(index),
            location: record.location,
            title: record.name.clone(),
            description: record.address.clone(),
            rating: record.rating,
        })
        .collect();
    let (center, zoom) = match results.first() {
        Some(first) => (
            MapCenter::Location {
                location: first.location,
            },
            RESULT_ZOOM,
        ),
        None => (MapCenter::World, WORLD_ZOOM),
    };
    MapView {
        visible: true,
        center,
        zoom,
        markers,
    }
}

fn render_list(results: &ResultSet) -> ListView {
    if results.is_empty() {
        return ListView::NoResults;
    }
    ListView::Entries(
        results
            .records()
            .iter()
            .map(|record| ListItem {
                name: record.name.clone(),
                address: record.address.clone(),
            })
            .collect(),
    )
}
