use crate::error::ApiError;
use core_types::{Holding, RankInfo, RawLeaderboardEntry};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

// Each endpoint's JSON payload is parsed here, so transport and interpretation stay separate.

/// `GET /users/{id}/portfolio`: an array of holdings, or `{"holdings": [...]}`.
pub fn parse_portfolio(payload: Value) -> Result<Vec<Holding>, ApiError> {
    let holdings = match payload {
        Value::Object(mut object) => object
            .remove("holdings")
            .ok_or_else(|| ApiError::InvalidData("portfolio payload has no holdings".into()))?,
        other => other,
    };
    Ok(serde_json::from_value(holdings)?)
}

/// `GET /users/{id}/funds`: a bare number (or numeric string), or `{"funds": n}`.
pub fn parse_funds(payload: Value) -> Result<Decimal, ApiError> {
    let funds = match payload {
        Value::Object(mut object) => object
            .remove("funds")
            .ok_or_else(|| ApiError::InvalidData("funds payload has no funds field".into()))?,
        other => other,
    };
    match &funds {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|e| ApiError::InvalidData(format!("funds {}: {}", n, e))),
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|e| ApiError::InvalidData(format!("funds {:?}: {}", s, e))),
        other => Err(ApiError::InvalidData(format!("funds is not numeric: {}", other))),
    }
}

/// `GET /users/{id}/rank`: a `"rank / total"` string, or `{"rank": "..."}`.
pub fn parse_rank(payload: Value) -> Result<RankInfo, ApiError> {
    let rank = match payload {
        Value::Object(mut object) => object
            .remove("rank")
            .ok_or_else(|| ApiError::InvalidData("rank payload has no rank field".into()))?,
        other => other,
    };
    let text = rank
        .as_str()
        .ok_or_else(|| ApiError::InvalidData(format!("rank is not a string: {}", rank)))?;
    RankInfo::from_str(text).map_err(|e| ApiError::InvalidData(e.to_string()))
}

/// `GET /leaderboard`: an array of records.
///
/// Elements that are not JSON objects are kept as empty records so that the
/// validator reports them at their original index instead of the whole batch failing.
pub fn parse_leaderboard(payload: Value) -> Result<Vec<RawLeaderboardEntry>, ApiError> {
    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove("entries") {
            Some(Value::Array(records)) => records,
            _ => return Err(ApiError::InvalidData("leaderboard payload has no entries".into())),
        },
        other => {
            return Err(ApiError::InvalidData(format!(
                "leaderboard payload is not an array: {}",
                other
            )));
        }
    };

    Ok(records
        .into_iter()
        .map(|record| match record {
            Value::Object(_) => serde_json::from_value(record).unwrap_or_default(),
            _ => RawLeaderboardEntry::default(),
        })
        .collect())
}
