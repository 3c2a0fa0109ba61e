//! Building a [`SearchRequest`] from command-line criteria.
//!
//! Routes are given as `FROM:TO:DATETIME`, e.g. `ATH:SKG:2024-06-01T08:00:00`
//! or `ATH:SKG:2024-06-01` (midnight). A request can also be read whole
//! from a JSON file in the submission format.
//!
//! Only shape is checked here. Whether a route or date is acceptable is
//! for the search backend to decide; its rejection body is shown as-is.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

use flight_stream_core::models::{PassengerRequest, PassengerType, RouteRequest, SearchRequest};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Criteria as collected from the CLI.
#[derive(Debug, Clone)]
pub struct CriteriaArgs {
    pub routes: Vec<String>,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub cabin_class: String,
    pub carrier: String,
    pub currency: String,
    pub locale: String,
    pub market: String,
    pub direct: bool,
    pub flexible_dates: bool,
}

impl Default for CriteriaArgs {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            adults: 1,
            children: 0,
            infants: 0,
            cabin_class: "Y".to_string(),
            carrier: String::new(),
            currency: "EUR".to_string(),
            locale: "en_US".to_string(),
            market: "us".to_string(),
            direct: false,
            flexible_dates: false,
        }
    }
}

/// Parse `FROM:TO:DATETIME`.
pub fn parse_route(route: &str) -> Result<RouteRequest> {
    let mut parts = route.splitn(3, ':');
    let (Some(from), Some(to), Some(when)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("Invalid route '{}'. Expected FROM:TO:DATETIME", route);
    };

    for (name, code) in [("origin", from), ("destination", to)] {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("Invalid {} '{}' in route '{}'", name, code, route);
        }
    }

    Ok(RouteRequest::new(from, to, &parse_datetime(when.trim())?))
}

/// Normalize to `YYYY-MM-DDTHH:MM:SS`; a bare date means midnight.
fn parse_datetime(s: &str) -> Result<String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Ok(dt.format(DATETIME_FORMAT).to_string());
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| {
        format!(
            "Invalid departure '{}'. Expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
            s
        )
    })?;
    Ok(format!("{}T00:00:00", date.format(DATE_FORMAT)))
}

pub fn build_request(args: &CriteriaArgs) -> Result<SearchRequest> {
    if args.routes.is_empty() {
        bail!("At least one --route is required");
    }
    let routes = args
        .routes
        .iter()
        .map(|r| parse_route(r))
        .collect::<Result<Vec<_>>>()?;

    let passengers: Vec<PassengerRequest> = [
        (PassengerType::Adults, args.adults),
        (PassengerType::Children, args.children),
        (PassengerType::Infants, args.infants),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(kind, count)| PassengerRequest { count, kind })
    .collect();

    if passengers.is_empty() {
        bail!("At least one passenger is required");
    }

    Ok(SearchRequest {
        routes,
        passengers,
        cabin_class: args.cabin_class.clone(),
        carrier: args.carrier.clone(),
        flexible_dates: args.flexible_dates,
        locale: args.locale.clone(),
        currency: args.currency.clone(),
        market: args.market.clone(),
        direct_routes: args.direct,
    })
}

/// Read a complete request from a JSON file.
pub fn load_request(path: &Path) -> Result<SearchRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let request: SearchRequest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request file: {}", path.display()))?;
    if request.routes.is_empty() {
        bail!("Request file has no routes: {}", path.display());
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_route_full_datetime() {
        let r = parse_route("ath:skg:2024-06-01T08:30:00").unwrap();
        assert_eq!(r.departure, "ATH");
        assert_eq!(r.arrival, "SKG");
        assert_eq!(r.datetime, "2024-06-01T08:30:00");
    }

    #[test]
    fn test_parse_route_date_only_is_midnight() {
        let r = parse_route("ATH:SKG:2024-06-01").unwrap();
        assert_eq!(r.datetime, "2024-06-01T00:00:00");
    }

    #[test]
    fn test_parse_route_rejects_bad_shapes() {
        assert!(parse_route("ATH-SKG").is_err());
        assert!(parse_route("ATH:SKG").is_err());
        assert!(parse_route(":SKG:2024-06-01").is_err());
        assert!(parse_route("ATH:SKG:tomorrow").is_err());
        assert!(parse_route("ATH:SKG:2024-13-01").is_err());
    }

    #[test]
    fn test_build_request_defaults() {
        let args = CriteriaArgs {
            routes: vec!["ATH:SKG:2024-06-01".to_string()],
            ..Default::default()
        };
        let req = build_request(&args).unwrap();
        assert_eq!(req.passengers.len(), 1);
        assert_eq!(req.passengers[0].kind, PassengerType::Adults);
        assert_eq!(req.cabin_class, "Y");
        assert_eq!(req.currency, "EUR");
        assert!(!req.direct_routes);
    }

    #[test]
    fn test_build_request_skips_zero_counts() {
        let args = CriteriaArgs {
            routes: vec!["ATH:SKG:2024-06-01".to_string()],
            adults: 2,
            infants: 1,
            ..Default::default()
        };
        let req = build_request(&args).unwrap();
        let kinds: Vec<_> = req.passengers.iter().map(|p| (p.kind, p.count)).collect();
        assert_eq!(
            kinds,
            vec![(PassengerType::Adults, 2), (PassengerType::Infants, 1)]
        );
    }

    #[test]
    fn test_build_request_requires_route_and_passenger() {
        assert!(build_request(&CriteriaArgs::default()).is_err());
        let args = CriteriaArgs {
            routes: vec!["ATH:SKG:2024-06-01".to_string()],
            adults: 0,
            ..Default::default()
        };
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn test_load_request_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"routes":[{{"departure":"ATH","arrival":"SKG","datetime":"2024-06-01T00:00:00"}}],
               "passengers":[{{"count":1,"type":"adults"}}],
               "cabinClass":"Y","carrier":"","flexibleDates":false,
               "locale":"en_US","currency":"EUR","market":"gr"}}"#
        )
        .unwrap();
        let req = load_request(file.path()).unwrap();
        assert_eq!(req.market, "gr");
        assert_eq!(req.routes[0].arrival, "SKG");
    }
}
