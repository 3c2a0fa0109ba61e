//! Itinerary normalization: provider result → [`DisplayRecord`].
//!
//! # Algorithm
//!
//! 1. For every segment (leg-then-segment order), resolve the departure
//!    and arrival location codes against the result's own resource index.
//! 2. A resolved airport renders as `"<name> (<city>, <country>)"`; an
//!    unresolved one renders as its raw code.
//! 3. Each segment becomes one line:
//!    `"<carrier><number> - <dep> > <arr> <small><departure time></small><br />"`.
//! 4. The adult price (`passengers.adults.price`) must carry both `total`
//!    and `currency`. Otherwise the result is rejected; a price is never
//!    invented.
//! 5. The redirect URI is derived from the job id, result id and provider
//!    name only.
//!
//! Normalization is pure: equal inputs produce equal records.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{DisplayRecord, Leg, Price, ProviderResult, Segment};
use crate::resolve::ResourceIndex;

/// Path of the provider redirect endpoint, relative to the search host.
pub const REDIRECT_PATH: &str = "api/v1/redirect";

/// Characters left unescaped in redirect query values (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Why a single provider result could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("result '{result_id}' from '{provider}' has no adult price {field}")]
    MissingPrice {
        result_id: String,
        provider: String,
        field: &'static str,
    },

    #[error("malformed provider result: {0}")]
    Malformed(String),
}

/// Decode one raw `data[]` entry.
pub fn decode_result(raw: &Value) -> Result<ProviderResult, NormalizeError> {
    ProviderResult::deserialize(raw).map_err(|e| NormalizeError::Malformed(e.to_string()))
}

/// Normalize one decoded provider result for job `job_id`.
pub fn normalize(job_id: &str, result: &ProviderResult) -> Result<DisplayRecord, NormalizeError> {
    if result.id.is_empty() {
        return Err(NormalizeError::Malformed("result id is empty".to_string()));
    }
    if result.provider.name.is_empty() {
        return Err(NormalizeError::Malformed(format!(
            "result '{}' has an empty provider name",
            result.id
        )));
    }

    let index = ResourceIndex::new(&result.resources);
    let mut lines = Vec::new();
    for leg in &result.legs {
        for segment in &leg.segments {
            lines.push(segment_line(segment, &index));
        }
    }

    let price = adult_price(result)?;
    let message = lines.concat();

    Ok(DisplayRecord {
        provider_id: result.provider.name.clone(),
        result_id: result.id.clone(),
        group_id: group_id(&result.legs),
        lines,
        message,
        price,
        redirect_uri: redirect_uri(job_id, &result.id, &result.provider.name),
        provider_presentation_name: result.provider.display_name().to_string(),
    })
}

/// Decode and normalize one raw `data[]` entry.
pub fn normalize_raw(job_id: &str, raw: &Value) -> Result<DisplayRecord, NormalizeError> {
    normalize(job_id, &decode_result(raw)?)
}

/// Normalize every entry of a frame, keeping arrival order.
///
/// Failed entries are returned separately; they never stop their
/// siblings from being normalized.
pub fn normalize_batch(job_id: &str, data: &[Value]) -> (Vec<DisplayRecord>, Vec<NormalizeError>) {
    let mut records = Vec::with_capacity(data.len());
    let mut errors = Vec::new();
    for raw in data {
        match normalize_raw(job_id, raw) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }
    (records, errors)
}

/// Render one segment as a display line.
///
/// A segment without a departure time still renders, with an empty
/// `<small></small>`.
pub fn segment_line(segment: &Segment, index: &ResourceIndex<'_>) -> String {
    let departs_at = segment.route.departure.datetime.as_deref().unwrap_or("");

    format!(
        "{}{} - {} > {} <small>{}</small><br />",
        segment.transport.carriers.marketing,
        segment.transport.number,
        describe_location(index, &segment.route.departure.location),
        describe_location(index, &segment.route.arrival.location),
        departs_at
    )
}

/// `"<name> (<city>, <country>)"` when the code resolves, the raw code otherwise.
pub fn describe_location(index: &ResourceIndex<'_>, code: &str) -> String {
    match index.location(code) {
        Some(location) => location.to_string(),
        None => code.to_string(),
    }
}

/// `api/v1/redirect?resourceId=<job>&id=<result>&provider=<provider>`.
pub fn redirect_uri(job_id: &str, result_id: &str, provider: &str) -> String {
    format!(
        "{}?resourceId={}&id={}&provider={}",
        REDIRECT_PATH,
        utf8_percent_encode(job_id, QUERY_VALUE),
        utf8_percent_encode(result_id, QUERY_VALUE),
        utf8_percent_encode(provider, QUERY_VALUE)
    )
}

fn adult_price(result: &ProviderResult) -> Result<Price, NormalizeError> {
    let missing = |field: &'static str| NormalizeError::MissingPrice {
        result_id: result.id.clone(),
        provider: result.provider.name.clone(),
        field,
    };

    let price = result
        .passengers
        .as_ref()
        .and_then(|p| p.adults.as_ref())
        .and_then(|a| a.price.as_ref())
        .ok_or_else(|| missing("object"))?;

    let total = price.total.ok_or_else(|| missing("total"))?;
    let currency = match price.currency.as_deref() {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => return Err(missing("currency")),
    };

    Ok(Price { total, currency })
}

/// SHA-256 over every segment's identity: flight, times, airports, cabin.
fn group_id(legs: &[Leg]) -> String {
    let mut hasher = Sha256::new();
    for segment in legs.iter().flat_map(|l| l.segments.iter()) {
        let parts = [
            segment.transport.number.as_str(),
            segment.transport.carriers.marketing.as_str(),
            segment.route.departure.datetime.as_deref().unwrap_or(""),
            segment.route.arrival.datetime.as_deref().unwrap_or(""),
            segment.route.departure.location.as_str(),
            segment.route.arrival.location.as_str(),
            segment
                .services
                .as_ref()
                .and_then(|s| s.cabin_class.as_deref())
                .unwrap_or(""),
        ];
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
    }
    format!("{:x}", hasher.finalize())
}
