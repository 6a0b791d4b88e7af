use crate::geometry::LngLat;
use crate::models::{RoutingSettings, ValidationError};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// The HTTP request failed
    Request(String),
    Status(u16),
    /// The router answered but found no route
    NoRoute(String),
    Malformed(String),
    /// The route geometry cannot become a draft
    InvalidRoute(ValidationError),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "Routing request failed: {e}"),
            Self::Status(code) => write!(f, "Routing service answered with status {code}"),
            Self::NoRoute(reason) => write!(f, "No route found between the selected nodes: {reason}"),
            Self::Malformed(e) => write!(f, "Unexpected routing response: {e}"),
            Self::InvalidRoute(e) => write!(f, "The computed route is unusable: {e}"),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Computes a path between two points
#[allow(async_fn_in_trait)]
pub trait RoutingService {
    /// Ordered polyline from `from` to `to`
    ///
    /// # Errors
    ///
    /// See [`RoutingError`]
    async fn route(&self, from: LngLat, to: LngLat) -> Result<Vec<LngLat>, RoutingError>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: geojson::Geometry,
}

/// Extract the first route's polyline from an OSRM `route` response
///
/// # Errors
///
/// Returns an error if the body is not a successful response with a
/// line geometry
pub fn parse_route_response(body: &str) -> Result<Vec<LngLat>, RoutingError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Malformed(e.to_string()))?;
    if response.code != "Ok" {
        return Err(RoutingError::NoRoute(response.message.unwrap_or(response.code)));
    }
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::NoRoute("empty route list".to_string()))?;

    let geojson::Value::LineString(line) = route.geometry.value else {
        return Err(RoutingError::Malformed("route geometry is not a line".to_string()));
    };
    line.into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(LngLat::new(*lon, *lat)),
            _ => Err(RoutingError::Malformed("position with fewer than two values".to_string())),
        })
        .collect()
}

/// Client for an OSRM-compatible HTTP routing service
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmRouter {
    #[must_use]
    pub fn new(settings: &RoutingSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            profile: settings.profile.clone(),
        }
    }

    #[must_use]
    pub fn route_url(&self, from: LngLat, to: LngLat) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat
        )
    }
}

impl RoutingService for OsrmRouter {
    async fn route(&self, from: LngLat, to: LngLat) -> Result<Vec<LngLat>, RoutingError> {
        let response = self
            .client
            .get(self.route_url(from, to))
            .send()
            .await
            .map_err(|e| RoutingError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::Request(e.to_string()))?;
        // OSRM reports "no route" with a 400 and a JSON body
        match parse_route_response(&body) {
            Err(RoutingError::Malformed(_)) if !status.is_success() => Err(RoutingError::Status(status.as_u16())),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_url() {
        let router = OsrmRouter::new(&RoutingSettings {
            base_url: "https://routing.example.org/".to_string(),
            profile: "foot".to_string(),
        });
        assert_eq!(
            router.route_url(LngLat::new(9.1, 44.9), LngLat::new(9.2, 45.0)),
            "https://routing.example.org/route/v1/foot/9.1,44.9;9.2,45?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_parse_route() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1520.4,
                "geometry": {"type": "LineString", "coordinates": [[9.1, 44.9], [9.15, 44.95], [9.2, 45.0]]}
            }],
            "waypoints": []
        }"#;
        let polyline = parse_route_response(body).expect("valid route");
        assert_eq!(
            polyline,
            vec![LngLat::new(9.1, 44.9), LngLat::new(9.15, 44.95), LngLat::new(9.2, 45.0)]
        );
    }

    #[test]
    fn test_parse_no_route() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        assert_eq!(
            parse_route_response(body),
            Err(RoutingError::NoRoute("Impossible route between points".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_routes() {
        let body = r#"{"code": "Ok", "routes": []}"#;
        assert!(matches!(parse_route_response(body), Err(RoutingError::NoRoute(_))));
    }

    #[test]
    fn test_parse_non_line_geometry() {
        let body = r#"{"code": "Ok", "routes": [{"geometry": {"type": "Point", "coordinates": [9.1, 44.9]}}]}"#;
        assert!(matches!(parse_route_response(body), Err(RoutingError::Malformed(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_route_response("<html>"), Err(RoutingError::Malformed(_))));
    }
}
