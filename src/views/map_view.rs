use crate::config::CameraSite;
use crate::session::SessionError;

/// Zoom level for the whole-city overview.
pub const OVERVIEW_ZOOM: u8 = 13;
/// Zoom level after recentring on a single site.
pub const SITE_ZOOM: u8 = 16;

/// A static marker handed to the external map renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct MapMarker {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Popup text: site name plus direction label.
    pub popup: String,
}

/// Current map viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

/// Geospatial projection: static camera markers plus a recentring command.
///
/// Markers are built once from configuration at construction time, not
/// per-tick; recentring is keyed by site name and independent of the
/// snapshot flow.
pub struct MapView {
    sites: Vec<CameraSite>,
    markers: Vec<MapMarker>,
    center: MapCenter,
}

impl MapView {
    pub fn new(sites: &[CameraSite], default_center: (f64, f64)) -> Self {
        let markers = sites
            .iter()
            .map(|site| MapMarker {
                name: site.name.clone(),
                latitude: site.latitude,
                longitude: site.longitude,
                popup: format!("{} | Dir: {}", site.name, site.direction),
            })
            .collect();
        Self {
            sites: sites.to_vec(),
            markers,
            center: MapCenter {
                latitude: default_center.0,
                longitude: default_center.1,
                zoom: OVERVIEW_ZOOM,
            },
        }
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub fn center(&self) -> &MapCenter {
        &self.center
    }

    /// Recentre on a configured site.
    pub fn recenter(&mut self, site_name: &str) -> Result<&MapCenter, SessionError> {
        let site = self
            .sites
            .iter()
            .find(|site| site.name == site_name)
            .ok_or_else(|| SessionError::UnknownSite {
                name: site_name.to_string(),
            })?;
        self.center = MapCenter {
            latitude: site.latitude,
            longitude: site.longitude,
            zoom: SITE_ZOOM,
        };
        Ok(&self.center)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
