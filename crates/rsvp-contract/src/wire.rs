//! Normalization of server and cached payloads into canonical types.
//!
//! The server and earlier client revisions disagree on field names
//! (`full_name` vs `fullName`, `rsvp` vs `rsvp_status`, ...) and sometimes
//! wrap bodies in `{"data": ...}`. Every payload is folded here, once, so the
//! rest of the workspace only sees [`GuestProfile`] and [`FamilyState`].
//! Unknown enum values are dropped rather than rejected.

use crate::family::{
    Child, FamilyMember, FamilyState, InviteReply, LinkStatus, RemoteFamily, UsernameMatch,
};
use crate::identity::GuestId;
use crate::profile::{AlcoholPrefs, FoodPreference, Gender, GuestProfile, RsvpStatus, Side};
use serde_json::{Map, Value};
use thiserror::Error;

const RSVP: &[&str] = &["rsvp_status", "rsvp", "rsvpStatus"];
const FULL_NAME: &[&str] = &["full_name", "fullName"];
const BIRTH_DATE: &[&str] = &["birth_date", "birthDate"];
const GENDER: &[&str] = &["gender"];
const PHONE: &[&str] = &["phone"];
const SIDE: &[&str] = &["side"];
const RELATIVE: &[&str] = &["is_relative", "relative", "isRelative"];
const FOOD: &[&str] = &["food_pref", "food", "foodPref"];
const ALLERGIES: &[&str] = &["food_allergies", "allergies", "foodAllergies"];
const ALCOHOL: &[&str] = &["alcohol_prefs", "alcohol", "alcoholPrefs"];
const WELCOME: &[&str] = &["welcome_seen_at", "welcomeSeenAt"];
const GUEST_ID: &[&str] = &["guest_id", "telegram_id", "telegram_user_id"];

const WITH_PARTNER: &[&str] = &["with_partner", "withPartner"];
const PARTNER: &[&str] = &[
    "partner_username",
    "partnerUsername",
    "partner_name",
    "partnerName",
];
const PARTNER_STATUS: &[&str] = &["partner_status", "partnerStatus"];
const PARTNER_CONFIRMED: &[&str] = &["partner_confirmed", "partnerConfirmed"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("expected {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("payload is empty")]
    Empty,

    /// The server answered but declined the request for a reason other than
    /// a missing or ambiguous username.
    #[error("request refused: {}", reason_text(.reason))]
    Refused { reason: Option<String> },
}

fn reason_text(reason: &Option<String>) -> &str {
    reason.as_deref().unwrap_or("no reason given")
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object(value: Value) -> Result<Option<Map<String, Value>>, WireError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(WireError::UnexpectedShape {
            expected: "object",
            found: kind(&other),
        }),
    }
}

/// Strip a `{"data": ...}` envelope if present.
fn unwrap_data(mut map: Map<String, Value>) -> Result<Option<Map<String, Value>>, WireError> {
    match map.remove("data") {
        Some(inner) => expect_object(inner),
        None => Ok(Some(map)),
    }
}

fn pick<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| map.get(*name))
        .find(|value| !value.is_null())
}

/// String or number as text; blank strings count as absent.
fn text(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match pick(map, names)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(map: &Map<String, Value>, names: &[&str]) -> bool {
    match pick(map, names) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

fn guest_id(map: &Map<String, Value>) -> Option<GuestId> {
    match pick(map, GUEST_ID)? {
        Value::Number(n) => n.as_i64().map(GuestId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn alcohol(map: &Map<String, Value>) -> AlcoholPrefs {
    match pick(map, ALCOHOL) {
        Some(Value::Array(items)) => {
            AlcoholPrefs::from_tags(items.iter().filter_map(Value::as_str).map(str::to_string))
        }
        Some(Value::String(csv)) => AlcoholPrefs::from_tags(csv.split(',')),
        _ => AlcoholPrefs::default(),
    }
}

fn profile_from_map(map: &Map<String, Value>) -> GuestProfile {
    GuestProfile {
        guest_id: guest_id(map),
        rsvp: text(map, RSVP)
            .map(|raw| RsvpStatus::parse(&raw))
            .unwrap_or_default(),
        full_name: text(map, FULL_NAME),
        birth_date: text(map, BIRTH_DATE),
        gender: text(map, GENDER).and_then(|raw| Gender::parse(&raw)),
        phone: text(map, PHONE),
        side: text(map, SIDE).and_then(|raw| Side::parse(&raw)),
        is_relative: flag(map, RELATIVE),
        food: text(map, FOOD).and_then(|raw| FoodPreference::parse(&raw)),
        allergies: text(map, ALLERGIES),
        alcohol: alcohol(map),
        welcome_seen_at: text(map, WELCOME),
    }
}

/// Normalize a profile payload. `null` and `{"data": null}` mean absent.
pub fn profile_from_value(value: Value) -> Result<Option<GuestProfile>, WireError> {
    let Some(map) = expect_object(value)? else {
        return Ok(None);
    };
    Ok(unwrap_data(map)?.map(|body| profile_from_map(&body)))
}

fn child_from_value(index: usize, value: &Value) -> Option<Child> {
    let map = value.as_object()?;
    Some(Child {
        id: text(map, &["id"]).unwrap_or_else(|| format!("child-{index}")),
        name: text(map, &["name"]).unwrap_or_default(),
        age: text(map, &["age"]).unwrap_or_default(),
        note: text(map, &["note"]).unwrap_or_default(),
    })
}

/// Link status carried by `map`, if any. A false confirmation flag says
/// nothing about the link.
fn link_status(
    map: &Map<String, Value>,
    status: &[&str],
    confirmed: &[&str],
) -> Option<LinkStatus> {
    let reported = text(map, status).map(|raw| LinkStatus::parse(&raw));
    if flag(map, confirmed) {
        Some(reported.unwrap_or_default().advance(LinkStatus::Confirmed))
    } else {
        reported
    }
}

/// Normalize a family payload, folding in an optional sibling
/// `invite: {status, confirmed}` object. `link` stays `None` when neither
/// the body nor the invite carries a status.
pub fn remote_family_from_value(value: Value) -> Result<Option<RemoteFamily>, WireError> {
    let Some(mut outer) = expect_object(value)? else {
        return Ok(None);
    };
    let invite = outer.remove("invite");
    let Some(body) = unwrap_data(outer)? else {
        return Ok(None);
    };

    let mut link = link_status(&body, PARTNER_STATUS, PARTNER_CONFIRMED);
    if let Some(Value::Object(invite)) = invite {
        link = link.max(link_status(&invite, &["status"], &["confirmed"]));
    }

    let children = match pick(&body, &["children"]) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| child_from_value(index, item))
            .collect(),
        _ => Vec::new(),
    };

    Ok(Some(RemoteFamily {
        family: FamilyState {
            with_partner: flag(&body, WITH_PARTNER),
            partner_username: text(&body, PARTNER),
            partner_status: link.unwrap_or_default(),
            children,
        },
        link,
    }))
}

/// Normalize a family payload into the canonical form, treating a missing
/// link status as `None`.
pub fn family_from_value(value: Value) -> Result<Option<FamilyState>, WireError> {
    Ok(remote_family_from_value(value)?.map(|remote| remote.family))
}

fn member_from_value(value: &Value) -> Option<FamilyMember> {
    let map = value.as_object()?;
    Some(FamilyMember {
        name: text(map, &["name", "full_name", "fullName"]).unwrap_or_default(),
        rsvp: text(map, RSVP)
            .map(|raw| RsvpStatus::parse(&raw))
            .unwrap_or_default(),
    })
}

/// Normalize a family status payload: either a bare member array or
/// `{members: [...], partner_status}`.
pub fn family_status_from_value(
    value: Value,
) -> Result<(LinkStatus, Vec<FamilyMember>), WireError> {
    let (status, members) = match value {
        Value::Null => return Ok((LinkStatus::None, Vec::new())),
        Value::Array(items) => (LinkStatus::None, items),
        Value::Object(map) => {
            let Some(map) = unwrap_data(map)? else {
                return Ok((LinkStatus::None, Vec::new()));
            };
            let status = link_status(
                &map,
                &["partner_status", "partnerStatus", "status"],
                PARTNER_CONFIRMED,
            )
            .unwrap_or_default();
            let members = match map.get("members") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            (status, members)
        }
        other => {
            return Err(WireError::UnexpectedShape {
                expected: "object or array",
                found: kind(&other),
            })
        }
    };
    Ok((
        status,
        members.iter().filter_map(member_from_value).collect(),
    ))
}

/// `{"exists": bool}` or a bare boolean.
pub fn exists_from_value(value: Value) -> Result<bool, WireError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Object(map) => Ok(flag(&map, &["exists"])),
        other => Err(WireError::UnexpectedShape {
            expected: "boolean",
            found: kind(&other),
        }),
    }
}

/// `{"found": bool, "name": ..., "multiple": bool}`.
pub fn username_match_from_value(value: Value) -> Result<UsernameMatch, WireError> {
    let map = expect_object(value)?.ok_or(WireError::Empty)?;
    if flag(&map, &["multiple"]) {
        Ok(UsernameMatch::MultipleMatches)
    } else if flag(&map, &["found"]) {
        Ok(UsernameMatch::Found {
            name: text(&map, &["name"]),
        })
    } else {
        Ok(UsernameMatch::NotFound)
    }
}

/// `{"ok": true, "name": ...}` or `{"ok": false, "error": "not_found" | "multiple"}`.
///
/// Any other refusal becomes [`WireError::Refused`] carrying the server's
/// `message` or `detail` text.
pub fn invite_reply_from_value(value: Value) -> Result<InviteReply, WireError> {
    let map = expect_object(value)?.ok_or(WireError::Empty)?;
    if flag(&map, &["ok"]) {
        return Ok(InviteReply::Sent {
            name: text(&map, &["name"]),
        });
    }
    let code = text(&map, &["error"]).map(|code| code.trim().to_ascii_lowercase());
    match code.as_deref() {
        Some("not_found" | "not-found" | "notfound" | "missing") => Ok(InviteReply::NotFound),
        Some("multiple" | "multiple_matches" | "multiple-matches") => {
            Ok(InviteReply::MultipleMatches)
        }
        _ => Err(WireError::Refused {
            reason: text(&map, &["message", "detail"]),
        }),
    }
}

impl TryFrom<Value> for GuestProfile {
    type Error = WireError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        profile_from_value(value)?.ok_or(WireError::Empty)
    }
}

impl TryFrom<Value> for FamilyState {
    type Error = WireError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        family_from_value(value)?.ok_or(WireError::Empty)
    }
}
