//! Upgrades for payloads saved before schema versioning existed

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::warn;
use wallnance_core::Result;

/// Parse a day stamp written by any known release.
///
/// Accepts ISO dates, full RFC 3339 timestamps and the legacy
/// `"Sun Oct 18 2026"` layout.
pub fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%a %b %d %Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Player rewards v0 -> v1
///
/// Rewrites `lastClaimDate` to an ISO day and turns numeric transaction
/// ids into strings. An unreadable claim date is dropped, which restarts
/// the streak on the next daily bonus.
pub fn rewards_v0_to_v1(mut value: Value) -> Result<Value> {
    if let Some(obj) = value.as_object_mut() {
        if let Some(date) = obj.get("lastClaimDate").cloned() {
            let converted = match date.as_str() {
                Some(raw) => match parse_legacy_date(raw) {
                    Some(day) => Value::String(day.format("%Y-%m-%d").to_string()),
                    None => {
                        warn!("Dropping unreadable lastClaimDate {:?}", raw);
                        Value::Null
                    }
                },
                None => Value::Null,
            };
            obj.insert("lastClaimDate".to_string(), converted);
        }

        if let Some(Value::Array(transactions)) = obj.get_mut("transactions") {
            for tx in transactions.iter_mut() {
                if let Some(id) = tx.get("id").filter(|id| id.is_number()).cloned() {
                    tx["id"] = Value::String(id.to_string());
                }
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_legacy_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 18);
        assert_eq!(parse_legacy_date("2026-10-18"), expected);
        assert_eq!(parse_legacy_date("Sun Oct 18 2026"), expected);
        assert_eq!(parse_legacy_date("2026-10-18T08:30:00.000Z"), expected);
        assert_eq!(parse_legacy_date("yesterday"), None);
    }

    #[test]
    fn test_rewards_migration() {
        let legacy = json!({
            "totalPoints": 120,
            "lastClaimDate": "Sun Oct 18 2026",
            "transactions": [
                {"id": 1760780000000u64, "type": "daily_bonus", "amount": 60,
                 "timestamp": "2026-10-18T08:30:00.000Z"}
            ]
        });

        let upgraded = rewards_v0_to_v1(legacy).unwrap();
        assert_eq!(upgraded["lastClaimDate"], "2026-10-18");
        assert_eq!(upgraded["transactions"][0]["id"], "1760780000000");
        assert_eq!(upgraded["totalPoints"], 120);
    }

    #[test]
    fn test_rewards_migration_drops_garbage_date() {
        let upgraded = rewards_v0_to_v1(json!({"lastClaimDate": "??"})).unwrap();
        assert!(upgraded["lastClaimDate"].is_null());
    }
}
