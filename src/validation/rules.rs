use std::fmt::Display;
use std::str::FromStr;

use validator::ValidationError;

use crate::filter::SortDirection;
use crate::types::{Priority, Theme, TicketSort, TicketStatus, TicketType, UserStatus};

/// Upper bound on ids accepted by a single bulk request
pub const MAX_BULK_IDS: usize = 1000;

fn one_of<E>(value: &str, code: &'static str) -> Result<(), ValidationError>
where
    E: FromStr,
    E::Err: Display,
{
    value
        .parse::<E>()
        .map(|_| ())
        .map_err(|e| ValidationError::new(code).with_message(e.to_string().into()))
}

/// Rejects whitespace-only text; empty values are left to the length rule
pub fn non_blank<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    let value = value.as_ref();
    if !value.is_empty() && value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be blank".into()));
    }
    Ok(())
}

pub fn valid_priority<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<Priority>(value.as_ref(), "priority")
}

pub fn valid_ticket_status<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<TicketStatus>(value.as_ref(), "ticket_status")
}

pub fn valid_ticket_type<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<TicketType>(value.as_ref(), "ticket_type")
}

pub fn valid_user_status<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<UserStatus>(value.as_ref(), "user_status")
}

pub fn valid_theme<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<Theme>(value.as_ref(), "theme")
}

pub fn valid_sort<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<TicketSort>(value.as_ref(), "sort")
}

pub fn valid_order<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    one_of::<SortDirection>(value.as_ref(), "order")
}

/// 1..=MAX_BULK_IDS non-blank ids
pub fn valid_user_ids<T: AsRef<[String]>>(ids: T) -> Result<(), ValidationError> {
    let ids = ids.as_ref();
    if ids.is_empty() {
        return Err(ValidationError::new("user_ids_empty").with_message("At least one user id is required".into()));
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(ValidationError::new("user_ids_too_many").with_message(
            format!("Cannot update more than {} users at once", MAX_BULK_IDS).into(),
        ));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ValidationError::new("user_ids_blank").with_message("User ids cannot be blank".into()));
    }
    Ok(())
}

/// At least one team, each name non-blank and at most 100 chars
pub fn valid_team_names<T: AsRef<[String]>>(names: T) -> Result<(), ValidationError> {
    let names = names.as_ref();
    if names.is_empty() {
        return Err(ValidationError::new("teams_empty").with_message("At least one team is required".into()));
    }
    if names.iter().any(|n| n.trim().is_empty() || n.len() > 100) {
        return Err(ValidationError::new("team_name")
            .with_message("Team names must be 1-100 characters".into()));
    }
    Ok(())
}

pub fn valid_json_object(value: &serde_json::Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("object").with_message("Must be a JSON object".into()))
    }
}

/// Distinct ids, in first-seen order
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}
