//! Request-derived data served by the index loader.
//!
//! [`RequestGeo`] carries the edge's per-request properties (client IP,
//! network, approximate location). The edge forwards them as `cf-*`
//! request headers; every property missing from the request is reported
//! as [`NOT_AVAILABLE`].

use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Placeholder for a request property the edge did not provide.
pub const NOT_AVAILABLE: &str = "n/a";

/// Edge request properties shown on the index page and used to place the
/// globe marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestGeo {
    /// Connecting client IP.
    pub ip: String,
    /// Organisation owning the client's autonomous system.
    pub as_organization: String,
    /// Autonomous system number.
    pub asn: String,
    /// IANA time zone of the client location.
    pub timezone: String,
    /// Latitude of the client location.
    pub latitude: String,
    /// Longitude of the client location.
    pub longitude: String,
    /// City of the client location.
    pub city: String,
    /// Postal code of the client location.
    pub postal_code: String,
    /// Region (state, province) name.
    pub region: String,
    /// ISO 3166-2 region code.
    pub region_code: String,
    /// Edge data centre that handled the request.
    pub colo: String,
    /// ISO 3166-1 country code.
    pub country: String,
    /// Whether the country is in the European Union (`"1"` when it is).
    #[serde(rename = "isEUCountry")]
    pub is_eu_country: String,
    /// Continent code.
    pub continent: String,
}

impl RequestGeo {
    /// Build the property set from a header lookup.
    ///
    /// `lookup` receives lowercase header names and returns the header
    /// value when present. Empty values count as absent. The country falls
    /// back from `cf-country` to `cf-ipcountry`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
        };

        let country = lookup("cf-country")
            .or_else(|| lookup("cf-ipcountry"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

        Self {
            ip: get("cf-connecting-ip"),
            as_organization: get("cf-as-organization"),
            asn: get("cf-asn"),
            timezone: get("cf-timezone"),
            latitude: get("cf-iplatitude"),
            longitude: get("cf-iplongitude"),
            city: get("cf-ipcity"),
            postal_code: get("cf-postal-code"),
            region: get("cf-region"),
            region_code: get("cf-region-code"),
            colo: get("cf-colo"),
            country,
            is_eu_country: get("cf-is-eu-country"),
            continent: get("cf-ipcontinent"),
        }
    }

    /// Latitude and longitude as numbers, when both parse.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.parse::<f64>().ok()?;
        let long = self.longitude.parse::<f64>().ok()?;
        (lat.is_finite() && long.is_finite()).then_some((lat, long))
    }
}

impl Default for RequestGeo {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Browser preferences reported through client-hint cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHints {
    /// `prefers-color-scheme` of the browser.
    pub theme: Theme,
    /// IANA time zone of the browser.
    pub time_zone: String,
}

impl Default for ClientHints {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            time_zone: String::from("UTC"),
        }
    }
}

/// Payload of the index loader: edge properties plus the render-time
/// timestamp that seeds the push-stream consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexData {
    /// Edge request properties.
    pub cf: RequestGeo,
    /// ISO-8601 time at which the page was rendered.
    pub time: String,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_properties_are_not_available() {
        let geo = RequestGeo::default();
        assert_eq!(geo.ip, NOT_AVAILABLE);
        assert_eq!(geo.country, NOT_AVAILABLE);
        assert!(geo.coordinates().is_none());
    }

    #[test]
    fn reads_headers_and_falls_back_to_ipcountry() {
        let headers: HashMap<&str, &str> = [
            ("cf-connecting-ip", "203.0.113.7"),
            ("cf-ipcountry", "DE"),
            ("cf-iplatitude", "52.52"),
            ("cf-iplongitude", "13.40"),
            ("cf-ipcity", ""),
        ]
        .into_iter()
        .collect();

        let geo = RequestGeo::from_lookup(|name| headers.get(name).map(|v| (*v).to_owned()));

        assert_eq!(geo.ip, "203.0.113.7");
        assert_eq!(geo.country, "DE");
        assert_eq!(geo.city, NOT_AVAILABLE);
        assert_eq!(geo.coordinates(), Some((52.52, 13.40)));
    }

    #[test]
    fn serializes_with_original_field_names() {
        let value = serde_json::to_value(RequestGeo::default()).unwrap_or_default();
        assert!(value.get("asOrganization").is_some());
        assert!(value.get("isEUCountry").is_some());
        assert!(value.get("postalCode").is_some());
    }

    #[test]
    fn client_hints_default_to_light_utc() {
        let hints = ClientHints::default();
        assert_eq!(hints.theme, Theme::Light);
        assert_eq!(hints.time_zone, "UTC");
        let value = serde_json::to_value(&hints).unwrap_or_default();
        assert_eq!(value["timeZone"], "UTC");
    }
}
