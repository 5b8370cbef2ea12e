//! Guest profile model and its local invariants.

use crate::identity::GuestId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag meaning "does not drink"; mutually exclusive with every other tag.
pub const NO_ALCOHOL_TAG: &str = "none";

/// Country prefix every phone number is normalized to.
pub const PHONE_PREFIX: &str = "+7";

const PHONE_DIGITS: usize = 10;

/// Attendance response as stored on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    #[default]
    Unset,
    Yes,
    No,
    Maybe,
}

impl RsvpStatus {
    /// Lenient parse; anything other than yes/no/maybe is `Unset`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Self::Yes,
            "no" => Self::No,
            "maybe" => Self::Maybe,
            _ => Self::Unset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Yes => "yes",
            Self::No => "no",
            Self::Maybe => "maybe",
        }
    }

    /// Whether a recognized response has been given.
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// Status line shown under the selector.
    pub fn summary(self) -> &'static str {
        match self {
            Self::Unset => "You have not answered yet",
            Self::Yes => "You said you will come",
            Self::No => "You said you cannot attend",
            Self::Maybe => "You said you are not sure yet",
        }
    }
}

/// A response the guest can actively pick; never `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpChoice {
    Yes,
    No,
    Maybe,
}

impl RsvpChoice {
    pub fn as_str(self) -> &'static str {
        RsvpStatus::from(self).as_str()
    }

    /// Label of the confirmation action pinned to this target.
    pub fn confirm_label(self) -> &'static str {
        match self {
            Self::Yes => "I'm coming!",
            Self::No => "Unfortunately, I can't come",
            Self::Maybe => "Not sure yet whether I can come",
        }
    }
}

impl From<RsvpChoice> for RsvpStatus {
    fn from(choice: RsvpChoice) -> Self {
        match choice {
            RsvpChoice::Yes => Self::Yes,
            RsvpChoice::No => Self::No,
            RsvpChoice::Maybe => Self::Maybe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Groom,
    Bride,
    Both,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "groom" => Some(Self::Groom),
            "bride" => Some(Self::Bride),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodPreference {
    Meat,
    Fish,
    Vegetarian,
    Vegan,
}

impl FoodPreference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "meat" => Some(Self::Meat),
            "fish" => Some(Self::Fish),
            "vegetarian" => Some(Self::Vegetarian),
            "vegan" => Some(Self::Vegan),
            _ => None,
        }
    }
}

/// Alcohol preference tags in selection order, without duplicates.
///
/// [`NO_ALCOHOL_TAG`] never coexists with another tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AlcoholPrefs(Vec<String>);

impl AlcoholPrefs {
    /// Build from raw tags: trims, drops blanks and duplicates, and collapses
    /// to only the "none" tag when it is present.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into().trim().to_string();
            if tag.is_empty() || out.contains(&tag) {
                continue;
            }
            out.push(tag);
        }
        if out.iter().any(|t| t == NO_ALCOHOL_TAG) {
            out = vec![NO_ALCOHOL_TAG.to_string()];
        }
        Self(out)
    }

    /// Select or deselect one tag, keeping "none" exclusive.
    pub fn toggle(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        let was_selected = self.contains(tag);
        if was_selected {
            self.0.retain(|t| t != tag);
        } else {
            self.0.push(tag.to_string());
        }

        if tag == NO_ALCOHOL_TAG && !was_selected {
            self.0 = vec![NO_ALCOHOL_TAG.to_string()];
        } else if tag != NO_ALCOHOL_TAG {
            self.0.retain(|t| t != NO_ALCOHOL_TAG);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for AlcoholPrefs {
    fn from(tags: Vec<String>) -> Self {
        Self::from_tags(tags)
    }
}

impl From<AlcoholPrefs> for Vec<String> {
    fn from(prefs: AlcoholPrefs) -> Self {
        prefs.0
    }
}

/// Why a profile cannot be saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileViolation {
    #[error("choose whether you can attend")]
    RsvpNotChosen,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("phone must be +7 followed by ten digits")]
    InvalidPhone,
}

/// The guest's RSVP questionnaire.
///
/// Serializes to the canonical snake_case wire shape. Deserialization goes
/// through [`crate::wire`], so legacy field names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct GuestProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<GuestId>,
    #[serde(rename = "rsvp_status")]
    pub rsvp: RsvpStatus,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub side: Option<Side>,
    pub is_relative: bool,
    #[serde(rename = "food_pref")]
    pub food: Option<FoodPreference>,
    #[serde(rename = "food_allergies")]
    pub allergies: Option<String>,
    #[serde(rename = "alcohol_prefs")]
    pub alcohol: AlcoholPrefs,
    pub welcome_seen_at: Option<String>,
}

impl GuestProfile {
    pub fn new(guest_id: GuestId) -> Self {
        Self {
            guest_id: Some(guest_id),
            ..Self::default()
        }
    }

    pub fn is_attending(&self) -> bool {
        matches!(self.rsvp, RsvpStatus::Yes | RsvpStatus::Maybe)
    }

    /// Check the profile can be submitted.
    ///
    /// A declining guest only needs a name (and a well-formed phone if one
    /// was typed); everything else may stay empty.
    pub fn validate(&self) -> Result<(), ProfileViolation> {
        if !self.rsvp.is_set() {
            return Err(ProfileViolation::RsvpNotChosen);
        }
        if is_blank(&self.full_name) {
            return Err(ProfileViolation::MissingField("full name"));
        }
        if let Some(phone) = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != PHONE_PREFIX)
        {
            if !is_valid_phone(phone) {
                return Err(ProfileViolation::InvalidPhone);
            }
        }
        if self.is_attending() && is_blank(&self.birth_date) {
            return Err(ProfileViolation::MissingField("birth date"));
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    phone
        .strip_prefix(PHONE_PREFIX)
        .is_some_and(|rest| rest.len() == PHONE_DIGITS && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Normalize typed phone input to `+7` followed by at most ten digits.
///
/// A leading `7` or `8` in the typed digits is taken as the country code.
pub fn normalize_phone(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let rest = digits
        .strip_prefix('7')
        .or_else(|| digits.strip_prefix('8'))
        .unwrap_or(&digits);
    let rest: String = rest.chars().take(PHONE_DIGITS).collect();
    format!("{PHONE_PREFIX}{rest}")
}
