//! Field edits on the profile form.

use rsvp_contract::{normalize_phone, FoodPreference, Gender, GuestProfile, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEdit {
    FullName(String),
    BirthDate(String),
    Gender(Option<Gender>),
    /// Raw typed input; normalized to the `+7` format.
    Phone(String),
    Side(Option<Side>),
    ToggleRelative,
    Food(Option<FoodPreference>),
    Allergies(String),
    ToggleAlcohol(String),
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

pub(crate) fn apply_edit(profile: &mut GuestProfile, edit: ProfileEdit) {
    match edit {
        ProfileEdit::FullName(name) => profile.full_name = non_blank(name),
        ProfileEdit::BirthDate(date) => profile.birth_date = non_blank(date),
        ProfileEdit::Gender(gender) => profile.gender = gender,
        ProfileEdit::Phone(raw) => {
            profile.phone = non_blank(raw).map(|raw| normalize_phone(&raw));
        }
        ProfileEdit::Side(side) => profile.side = side,
        ProfileEdit::ToggleRelative => profile.is_relative = !profile.is_relative,
        ProfileEdit::Food(food) => profile.food = food,
        ProfileEdit::Allergies(text) => profile.allergies = non_blank(text),
        ProfileEdit::ToggleAlcohol(tag) => profile.alcohol.toggle(&tag),
    }
}
