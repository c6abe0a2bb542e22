use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub type BookingId = i64;
pub type RoomId = i64;
pub type CustomerId = i64;
pub type RoleId = i64;

/// Query parameters forwarded verbatim to the booking list endpoint.
pub type Filters = BTreeMap<String, String>;

/// Lifecycle code of a booking as the service reports it in `StatusId`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "i64", into = "i64")]
pub enum BookingStatus {
    Confirmed,
    CheckedIn,
    Cancelled,
    Other(i64),
}

impl BookingStatus {
    pub fn code(self) -> i64 {
        match self {
            BookingStatus::Confirmed => 2,
            BookingStatus::CheckedIn => 3,
            BookingStatus::Cancelled => 5,
            BookingStatus::Other(code) => code,
        }
    }
}

impl From<i64> for BookingStatus {
    fn from(code: i64) -> Self {
        match code {
            2 => BookingStatus::Confirmed,
            3 => BookingStatus::CheckedIn,
            5 => BookingStatus::Cancelled,
            code => BookingStatus::Other(code),
        }
    }
}

impl From<BookingStatus> for i64 {
    fn from(status: BookingStatus) -> Self {
        status.code()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct RoomType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct BookingRoom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(rename = "roomType", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Booking {
    pub booking_id: BookingId,
    pub room_id: RoomId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub status_id: BookingStatus,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub checkin_date: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub checkout_date: String,
    #[serde(rename = "room", skip_serializing_if = "Option::is_none")]
    pub room: Option<BookingRoom>,
    #[serde(rename = "customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    /// Fields the service sends that this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Booking {
    pub fn new(booking_id: BookingId, room_id: RoomId, status: BookingStatus) -> Self {
        Booking {
            booking_id,
            room_id,
            customer_id: None,
            status_id: status,
            checkin_date: String::new(),
            checkout_date: String::new(),
            room: None,
            customer: None,
            extra: Map::new(),
        }
    }

    /// Shallow merge: every top level field present in `patch` replaces the
    /// stored one, absent fields are kept.
    pub fn merged(&self, patch: &Booking) -> Booking {
        let base = serde_json::to_value(self);
        let over = serde_json::to_value(patch);
        let merged = match (base, over) {
            (Ok(Value::Object(mut base)), Ok(Value::Object(over))) => {
                base.extend(over);
                serde_json::from_value(Value::Object(base))
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
            _ => return patch.clone(),
        };
        merged.unwrap_or_else(|e| {
            warn!("could not merge booking {}: {}", self.booking_id, e);
            patch.clone()
        })
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer.as_ref()?.customer_name.as_deref()
    }

    pub fn room_type_name(&self) -> Option<&str> {
        self.room.as_ref()?.room_type.as_ref()?.type_name.as_deref()
    }

    pub fn checkin_day(&self) -> Option<NaiveDate> {
        parse_day(&self.checkin_date)
    }

    pub fn checks_in_on(&self, day: NaiveDate) -> bool {
        self.checkin_day() == Some(day)
    }

    /// Case-insensitive substring match on booking id, room id and
    /// customer name.
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.booking_id.to_string().contains(&needle)
            || self.room_id.to_string().contains(&needle)
            || self
                .customer_name()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

/// The service sends `null` for dates it does not know yet.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Calendar day of a service timestamp. Zoned timestamps are moved into the
/// local timezone first.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Create/update payload. Only the fields that are set go over the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct BookingInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_date: Option<String>,
}

impl BookingInput {
    pub fn status(status: BookingStatus) -> Self {
        BookingInput {
            status_id: Some(status),
            ..Default::default()
        }
    }
}

/// What the create endpoint hands back. Only the id is trusted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedBooking {
    pub booking_id: BookingId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Room {
    pub room_id: RoomId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(rename = "roomType", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct RoomInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
}

/// List endpoints answer either with a bare array or wrapped in `data`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Wrapped { data } => data,
            ListEnvelope::Bare(items) => items,
        }
    }
}

/// Body of a failed service response.
#[derive(Deserialize, Debug, Default)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Role id as the auth session carries it: sometimes a number, sometimes
/// a string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RoleCode {
    Number(i64),
    Text(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SessionUser {
    #[serde(rename = "roleId", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleCode>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Session {
    #[serde(default)]
    pub user: Option<SessionUser>,
}
