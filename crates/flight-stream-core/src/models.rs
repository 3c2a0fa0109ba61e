//! Core data models for the search result stream.
//!
//! Three groups of types live here:
//!
//! - **Criteria** ([`SearchRequest`] and friends): what the client submits.
//! - **Wire results** ([`ResultFrame`], [`ProviderResult`], legs, segments):
//!   what providers push back, decoded leniently so that a single bad
//!   result can be skipped without losing its siblings.
//! - **Display** ([`DisplayRecord`], [`ProviderSummary`]): the normalized,
//!   renderer-ready view model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// Search criteria
// ═══════════════════════════════════════════════════════════════════════

/// Structured criteria for one search job.
///
/// Serialized in camelCase, matching the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub routes: Vec<RouteRequest>,
    pub passengers: Vec<PassengerRequest>,
    pub cabin_class: String,
    pub carrier: String,
    pub flexible_dates: bool,
    pub locale: String,
    pub currency: String,
    pub market: String,
    #[serde(default)]
    pub direct_routes: bool,
}

/// One requested leg: origin, destination and departure date-time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub departure: String,
    pub arrival: String,
    /// `YYYY-MM-DDTHH:MM:SS`.
    pub datetime: String,
}

impl RouteRequest {
    /// Build a route, upper-casing both airport codes.
    pub fn new(departure: &str, arrival: &str, datetime: &str) -> Self {
        Self {
            departure: departure.trim().to_uppercase(),
            arrival: arrival.trim().to_uppercase(),
            datetime: datetime.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adults,
    Children,
    Infants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerRequest {
    pub count: u32,
    #[serde(rename = "type")]
    pub kind: PassengerType,
}

/// Identifier of a running search job, as returned by submission.
///
/// Keys the push channel for that job. Never reused across searches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchJob {
    id: String,
}

impl SearchJob {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SearchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wire results
// ═══════════════════════════════════════════════════════════════════════

/// Body of one `message` frame.
///
/// `data` is kept as raw JSON so each entry can be decoded on its own;
/// a malformed entry must not take the whole frame down with it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFrame {
    pub resource_id: String,
    pub data: Vec<Value>,
}

/// One provider's offer for a full itinerary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    pub id: String,
    pub provider: Provider,
    pub legs: Vec<Leg>,
    /// Resource index for this result (`locations`, `carriers`, ...).
    #[serde(default)]
    pub resources: Value,
    #[serde(default)]
    pub passengers: Option<Passengers>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub presentation_name: Option<String>,
}

impl Provider {
    /// Name shown to the user; falls back to the provider identity.
    pub fn display_name(&self) -> &str {
        match self.presentation_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Leg {
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Segment {
    pub transport: Transport,
    pub route: Route,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub services: Option<Services>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Route {
    pub departure: Point,
    pub arrival: Point,
}

/// A location code with an optional local date-time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub location: String,
    #[serde(default)]
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transport {
    pub number: String,
    pub carriers: Carriers,
    #[serde(default)]
    pub equipment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Carriers {
    pub marketing: String,
    #[serde(default)]
    pub operating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Services {
    #[serde(default)]
    pub cabin_class: Option<String>,
    #[serde(default)]
    pub booking_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Passengers {
    #[serde(default)]
    pub adults: Option<PassengerFare>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PassengerFare {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub price: Option<FarePrice>,
}

/// Price as sent by the provider. Every field is optional on the wire;
/// normalization decides what is required.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarePrice {
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Display
// ═══════════════════════════════════════════════════════════════════════

/// A complete price: both total and currency are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    pub total: f64,
    pub currency: String,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.total, self.currency)
    }
}

/// Canonical, renderer-ready view of one provider result.
///
/// Built once by [`normalize`](crate::normalize::normalize) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub provider_id: String,
    pub result_id: String,
    /// Fingerprint of the itinerary; equal across providers selling the
    /// same flights.
    pub group_id: String,
    /// One line per segment, leg-then-segment order.
    pub lines: Vec<String>,
    /// `lines` concatenated.
    pub message: String,
    pub price: Price,
    pub redirect_uri: String,
    pub provider_presentation_name: String,
}

/// Running per-provider tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub provider_id: String,
    pub presentation_name: String,
    pub count: u64,
    pub style: crate::accumulate::BadgeStyle,
}
