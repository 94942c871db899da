//! Call records, record pages and the query filter used to list them.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::call::{CallDirection, CallStatus, Endpoint};

/// A hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Navigation links attached to records and pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Links {
    #[serde(default, rename = "self")]
    pub self_link: Option<Link>,
    #[serde(default)]
    pub first: Option<Link>,
    #[serde(default)]
    pub last: Option<Link>,
    #[serde(default)]
    pub prev: Option<Link>,
    #[serde(default)]
    pub next: Option<Link>,
}

/// A single call record.
///
/// `rate` and `price` arrive as quoted decimals and are kept exact.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallInfo {
    pub uuid: String,
    #[serde(default)]
    pub conversation_uuid: Option<String>,
    #[serde(default)]
    pub status: Option<CallStatus>,
    #[serde(default)]
    pub direction: Option<CallDirection>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Call length in seconds.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<Endpoint>,
    #[serde(default)]
    pub from: Option<Endpoint>,
    #[serde(default, rename = "_links")]
    pub links: Links,
}

/// One page of call records.
///
/// `count` is whatever the server reported; it is not checked against the
/// number of embedded records.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallInfoPage {
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub record_index: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default, rename = "_embedded")]
    embedded: Embedded,
    #[serde(default, rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Embedded {
    #[serde(default)]
    calls: Vec<CallInfo>,
}

impl CallInfoPage {
    pub fn calls(&self) -> &[CallInfo] {
        &self.embedded.calls
    }

    pub fn into_calls(self) -> Vec<CallInfo> {
        self.embedded.calls
    }

    /// Link to the following page, when the server advertised one.
    pub fn next_href(&self) -> Option<&str> {
        self.links.next.as_ref().map(|link| link.href.as_str())
    }
}

impl<'a> IntoIterator for &'a CallInfoPage {
    type Item = &'a CallInfo;
    type IntoIter = std::slice::Iter<'a, CallInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.embedded.calls.iter()
    }
}

/// Accepts `7`, `"7"` or `null`.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Sort order for listed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// Optional constraints for listing calls.
///
/// Built with [`CallsFilter::builder`]; unset fields are left to the
/// server's defaults and never appear in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallsFilter {
    status: Option<CallStatus>,
    date_start: Option<DateTime<Utc>>,
    date_end: Option<DateTime<Utc>>,
    page_size: Option<u32>,
    record_index: Option<u32>,
    order: Option<Order>,
    conversation_uuid: Option<String>,
}

impl CallsFilter {
    pub fn builder() -> CallsFilterBuilder {
        CallsFilterBuilder::default()
    }

    /// Query parameters in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(start) = self.date_start {
            query.push(("date_start", format_timestamp(start)));
        }
        if let Some(end) = self.date_end {
            query.push(("date_end", format_timestamp(end)));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        if let Some(record_index) = self.record_index {
            query.push(("record_index", record_index.to_string()));
        }
        if let Some(order) = self.order {
            query.push(("order", order.as_str().to_string()));
        }
        if let Some(conversation_uuid) = &self.conversation_uuid {
            query.push(("conversation_uuid", conversation_uuid.clone()));
        }
        query
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, Default)]
pub struct CallsFilterBuilder {
    filter: CallsFilter,
}

impl CallsFilterBuilder {
    #[must_use]
    pub fn status(mut self, status: CallStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    #[must_use]
    pub fn date_start(mut self, start: DateTime<Utc>) -> Self {
        self.filter.date_start = Some(start);
        self
    }

    #[must_use]
    pub fn date_end(mut self, end: DateTime<Utc>) -> Self {
        self.filter.date_end = Some(end);
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.filter.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn record_index(mut self, record_index: u32) -> Self {
        self.filter.record_index = Some(record_index);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.filter.order = Some(order);
        self
    }

    #[must_use]
    pub fn conversation_uuid(mut self, conversation_uuid: impl Into<String>) -> Self {
        self.filter.conversation_uuid = Some(conversation_uuid.into());
        self
    }

    pub fn build(self) -> CallsFilter {
        self.filter
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    const CALL_RECORD: &str = r#"
      {
        "uuid": "93137ee3-580e-45f7-a61a-e0b5716000ef",
        "status": "completed",
        "direction": "outbound",
        "rate": "0.02400000",
        "price": "0.00280000",
        "duration": "7",
        "network": "23410",
        "conversation_uuid": "aa17bd11-c895-4225-840d-30dc38c31e50",
        "start_time": "2017-01-13T13:55:02.000Z",
        "end_time": "2017-01-13T13:55:09.000Z",
        "to": {"type": "phone", "number": "447700900104"},
        "from": {"type": "phone", "number": "447700900105"},
        "_links": {"self": {"href": "/v1/calls/93137ee3-580e-45f7-a61a-e0b5716000ef"}}
      }
    "#;

    #[test]
    fn test_call_info_preserves_fixture_values() {
        let call: CallInfo = serde_json::from_str(CALL_RECORD).unwrap();

        assert_eq!(call.uuid, "93137ee3-580e-45f7-a61a-e0b5716000ef");
        assert_eq!(call.status, Some(CallStatus::Completed));
        assert_eq!(call.direction, Some(CallDirection::Outbound));
        assert_eq!(call.rate, Some(Decimal::from_str("0.02400000").unwrap()));
        assert_eq!(call.rate.unwrap().to_string(), "0.02400000");
        assert_eq!(call.price.unwrap().to_string(), "0.00280000");
        assert_eq!(call.duration, Some(7));
        assert_eq!(call.network.as_deref(), Some("23410"));
        assert_eq!(
            call.start_time,
            Some(Utc.with_ymd_and_hms(2017, 1, 13, 13, 55, 2).unwrap())
        );
        let to = call.to.as_ref().and_then(Endpoint::number);
        let from = call.from.as_ref().and_then(Endpoint::number);
        assert_eq!(to, Some("447700900104"));
        assert_eq!(from, Some("447700900105"));
        assert_eq!(
            call.links.self_link.unwrap().href,
            "/v1/calls/93137ee3-580e-45f7-a61a-e0b5716000ef"
        );
    }

    #[test]
    fn test_call_info_accepts_numeric_duration_and_missing_optionals() {
        let call: CallInfo =
            serde_json::from_str(r#"{"uuid": "abc", "duration": 42, "price": 0.5}"#).unwrap();

        assert_eq!(call.duration, Some(42));
        assert_eq!(call.price, Some(Decimal::new(5, 1)));
        assert!(call.rate.is_none());
        assert!(call.links.self_link.is_none());
    }

    #[test]
    fn test_call_info_rejects_non_numeric_duration() {
        let result = serde_json::from_str::<CallInfo>(r#"{"uuid": "abc", "duration": "long"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_page_decodes_with_zero_count() {
        let page: CallInfoPage = serde_json::from_str(
            r#"{
              "page_size": 10,
              "record_index": 0,
              "count": 0,
              "_embedded": {"calls": []},
              "_links": {
                "self": {"href": "/v1/calls?page_size=10&record_index=0"},
                "first": {"href": "/v1/calls?page_size=10"},
                "last": {"href": "/v1/calls?page_size=10"}
              }
            }"#,
        )
        .unwrap();

        assert_eq!(page.count, 0);
        assert_eq!(page.page_size, 10);
        assert!(page.calls().is_empty());
        assert!(page.next_href().is_none());
        assert_eq!(page.links.first.unwrap().href, "/v1/calls?page_size=10");
    }

    #[test]
    fn test_page_without_embedded_block_has_no_calls() {
        let page: CallInfoPage = serde_json::from_str(r#"{"count": 3}"#).unwrap();

        assert_eq!(page.count, 3);
        assert!(page.into_calls().is_empty());
    }

    #[test]
    fn test_page_iterates_embedded_calls() {
        let body = format!(
            r#"{{"count": 1, "_embedded": {{"calls": [{CALL_RECORD}]}},
                "_links": {{"next": {{"href": "/v1/calls?record_index=10"}}}}}}"#
        );
        let page: CallInfoPage = serde_json::from_str(&body).unwrap();

        let mut uuids = Vec::new();
        for call in &page {
            uuids.push(call.uuid.as_str());
        }
        assert_eq!(uuids, ["93137ee3-580e-45f7-a61a-e0b5716000ef"]);
        assert_eq!(page.next_href(), Some("/v1/calls?record_index=10"));
    }

    #[test]
    fn test_page_tolerates_app_and_unrecognised_endpoints() {
        let body = r#"{
          "count": 2,
          "_embedded": {
            "calls": [
              {
                "uuid": "in-app",
                "to": {"type": "app", "user": "alice"},
                "from": {"type": "phone", "number": "447700900105"}
              },
              {
                "uuid": "future",
                "to": {"type": "hologram", "room": "7"}
              }
            ]
          }
        }"#;

        let page: CallInfoPage = serde_json::from_str(body).unwrap();
        let calls = page.calls();
        let alice = Endpoint::App {
            user: "alice".to_string(),
        };

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to.as_ref(), Some(&alice));
        assert_eq!(calls[1].to.as_ref(), Some(&Endpoint::Unknown));
    }

    #[test]
    fn test_empty_filter_produces_no_query() {
        assert!(CallsFilter::builder().build().to_query().is_empty());
        assert_eq!(CallsFilter::builder().build(), CallsFilter::default());
    }

    #[test]
    fn test_full_filter_produces_ordered_query() {
        let filter = CallsFilter::builder()
            .status(CallStatus::Completed)
            .date_start(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
            .date_end(Utc.with_ymd_and_hms(2017, 1, 31, 23, 59, 59).unwrap())
            .page_size(25)
            .record_index(50)
            .order(Order::Descending)
            .conversation_uuid("aa17bd11-c895-4225-840d-30dc38c31e50")
            .build();

        assert_eq!(
            filter.to_query(),
            vec![
                ("status", "completed".to_string()),
                ("date_start", "2017-01-01T00:00:00Z".to_string()),
                ("date_end", "2017-01-31T23:59:59Z".to_string()),
                ("page_size", "25".to_string()),
                ("record_index", "50".to_string()),
                ("order", "desc".to_string()),
                (
                    "conversation_uuid",
                    "aa17bd11-c895-4225-840d-30dc38c31e50".to_string()
                ),
            ]
        );
    }
}
