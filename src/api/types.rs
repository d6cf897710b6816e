use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{TrackerError, TrackerResult};

/// A futures contract as advertised by the exchange catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractListing {
    pub symbol: String,
    pub create_time_ms: i64,
}

/// One element of the catalog. Anything that is not an object carrying a
/// string `symbol` is kept as `Malformed` so the tracker can log and skip it.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingEntry {
    Contract(ContractListing),
    Malformed(Value),
}

impl ListingEntry {
    pub fn from_value(value: Value) -> Self {
        let symbol = value
            .get("symbol")
            .and_then(Value::as_str)
            .map(str::to_string);
        let symbol = match symbol {
            Some(symbol) => symbol,
            None => return ListingEntry::Malformed(value),
        };

        // missing or unreadable createTime counts as the epoch, i.e. never new
        let create_time_ms = value.get("createTime").and_then(parse_millis).unwrap_or(0);

        ListingEntry::Contract(ContractListing {
            symbol,
            create_time_ms,
        })
    }
}

fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Accepts either a bare JSON array or the `{ "data": [...] }` envelope.
pub fn parse_catalog(body: Value) -> TrackerResult<Vec<ListingEntry>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(TrackerError::Parse(format!(
                    "catalog 'data' is not an array: {}",
                    other
                )))
            }
        },
        other => {
            return Err(TrackerError::Parse(format!(
                "catalog is neither an array nor an object: {}",
                other
            )))
        }
    };

    Ok(items.into_iter().map(ListingEntry::from_value).collect())
}

/// Reads `lastPrice` from a ticker body, at the top level or inside `data`.
/// Zero, missing and non-numeric values all read as no price.
pub fn parse_last_price(body: &Value) -> Option<f64> {
    let raw = body
        .get("lastPrice")
        .or_else(|| body.get("data").and_then(|data| data.get("lastPrice")))?;

    let price = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if price.is_finite() && price != 0.0 {
        Some(price)
    } else {
        None
    }
}

/// Body posted to the notification webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeNotification {
    pub token_name: String,
    pub initial_price: f64,
    pub current_price: f64,
    pub price_change: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_accepts_bare_array_and_envelope() {
        let bare = parse_catalog(json!([{"symbol": "BTC_USDT", "createTime": 1700000000000i64}]))
            .unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped = parse_catalog(json!({
            "success": true,
            "code": 0,
            "data": [
                {"symbol": "BTC_USDT", "createTime": 1700000000000i64},
                {"symbol": "PEPE_USDT", "createTime": "1700000000123"}
            ]
        }))
        .unwrap();
        assert_eq!(
            wrapped[1],
            ListingEntry::Contract(ContractListing {
                symbol: "PEPE_USDT".to_string(),
                create_time_ms: 1_700_000_000_123,
            })
        );
    }

    #[test]
    fn catalog_without_data_is_empty() {
        assert!(parse_catalog(json!({"success": false})).unwrap().is_empty());
    }

    #[test]
    fn catalog_rejects_scalars() {
        assert!(parse_catalog(json!("maintenance")).is_err());
        assert!(parse_catalog(json!({"data": {"symbol": "BTC_USDT"}})).is_err());
    }

    #[test]
    fn malformed_entries_are_preserved_for_logging() {
        let entries = parse_catalog(json!(["BTC_USDT", 42, {"createTime": 1}, {"symbol": 7}]))
            .unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries
            .iter()
            .all(|e| matches!(e, ListingEntry::Malformed(_))));
    }

    #[test]
    fn missing_create_time_reads_as_epoch() {
        let entry = ListingEntry::from_value(json!({"symbol": "ETH_USDT"}));
        assert_eq!(
            entry,
            ListingEntry::Contract(ContractListing {
                symbol: "ETH_USDT".to_string(),
                create_time_ms: 0,
            })
        );
    }

    #[test]
    fn last_price_from_number_string_or_envelope() {
        assert_eq!(parse_last_price(&json!({"lastPrice": 0.0123})), Some(0.0123));
        assert_eq!(parse_last_price(&json!({"lastPrice": "12.5"})), Some(12.5));
        assert_eq!(
            parse_last_price(&json!({"success": true, "data": {"symbol": "X", "lastPrice": 3.25}})),
            Some(3.25)
        );
    }

    #[test]
    fn zero_missing_or_garbage_price_is_absent() {
        assert_eq!(parse_last_price(&json!({"lastPrice": 0})), None);
        assert_eq!(parse_last_price(&json!({"lastPrice": "0"})), None);
        assert_eq!(parse_last_price(&json!({"lastPrice": "n/a"})), None);
        assert_eq!(parse_last_price(&json!({"bid1": 1.0})), None);
        assert_eq!(parse_last_price(&json!([1, 2])), None);
    }

    #[test]
    fn notification_uses_webhook_field_names() {
        let payload = PriceChangeNotification {
            token_name: "PEPE_USDT".to_string(),
            initial_price: 10.0,
            current_price: 12.5,
            price_change: 25.0,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "token_name": "PEPE_USDT",
                "initial_price": 10.0,
                "current_price": 12.5,
                "price_change": 25.0
            })
        );
    }
}
