//! Comment mention grammar: `@[displayName](userId)`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::UserId;

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\[([^\]]+)\]\(([^)\s]+)\)").expect("mention pattern is valid")
});

/// A single `@[displayName](userId)` token found in comment text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub display_name: String,
    pub user_id: UserId,
}

/// Every mention token in order of appearance
pub fn parse_mentions(content: &str) -> Vec<Mention> {
    MENTION
        .captures_iter(content)
        .map(|caps| Mention {
            display_name: caps[1].to_string(),
            user_id: caps[2].to_string(),
        })
        .collect()
}

/// Distinct mentioned user ids in order of first appearance
pub fn mentioned_user_ids(content: &str) -> Vec<UserId> {
    dedup(parse_mentions(content).into_iter().map(|m| m.user_id))
}

/// An explicit mention list takes precedence over parsing the content
pub fn resolve_mentions(content: &str, explicit: Option<&[UserId]>) -> Vec<UserId> {
    match explicit {
        Some(ids) => dedup(ids.iter().map(|id| id.trim().to_string()).filter(|id| !id.is_empty())),
        None => mentioned_user_ids(content),
    }
}

fn dedup(ids: impl Iterator<Item = UserId>) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_name_and_id() {
        let mentions = parse_mentions("ping @[Oracle](u-42) about the relay");
        assert_eq!(
            mentions,
            vec![Mention {
                display_name: "Oracle".into(),
                user_id: "u-42".into()
            }]
        );
    }

    #[test]
    fn repeated_mentions_collapse() {
        let ids = mentioned_user_ids("@[Robin](u2) and @[Batgirl](u3), again @[Robin](u2)");
        assert_eq!(ids, vec!["u2".to_string(), "u3".to_string()]);
    }

    #[test]
    fn malformed_tokens_are_ignored() {
        assert!(mentioned_user_ids("@Robin (u2) @[](u3) @[Robin]() email@[x]").is_empty());
    }

    #[test]
    fn explicit_list_wins_even_when_empty() {
        let content = "@[Robin](u2)";
        assert!(resolve_mentions(content, Some(&[])).is_empty());
        assert_eq!(
            resolve_mentions(content, Some(&["u9".to_string(), "u9".to_string()])),
            vec!["u9".to_string()]
        );
        assert_eq!(resolve_mentions(content, None), vec!["u2".to_string()]);
    }
}
