//! User mentions.
//!
//! A mention is registered in the card's `msteams.entities` and only takes
//! effect when its `<at>NAME</at>` text also appears in the card body.

use serde::{Deserialize, Serialize};

use super::element::{Element, ElementType};
use super::validate;
use super::Card;
use crate::error::CardError;

/// `type` value of a [`Mention`].
pub const TYPE_MENTION: &str = "mention";

/// Separator placed between mention text and existing text.
pub const DEFAULT_MENTION_TEXT_SEPARATOR: &str = " ";

const MENTION_TEXT_OPEN: &str = "<at>";
const MENTION_TEXT_CLOSE: &str = "</at>";

/// Mention text for `display_name`, e.g. `<at>Jane Doe</at>`.
#[must_use]
pub fn mention_text(display_name: &str) -> String {
    format!("{MENTION_TEXT_OPEN}{display_name}{MENTION_TEXT_CLOSE}")
}

/// Whether `text` has the `<at>NAME</at>` shape with a non-empty name.
#[must_use]
pub fn is_mention_text(text: &str) -> bool {
    text.strip_prefix(MENTION_TEXT_OPEN)
        .and_then(|rest| rest.strip_suffix(MENTION_TEXT_CLOSE))
        .is_some_and(|name| !name.is_empty())
}

/// A user mention registered on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub kind: String,

    pub text: String,

    pub mentioned: Mentioned,
}

/// The user a [`Mention`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentioned {
    /// Teams user ID, Azure AD object ID or UPN.
    pub id: String,

    pub name: String,
}

impl Mention {
    /// Build a mention of `display_name` identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if either argument is empty.
    pub fn new(display_name: &str, id: &str) -> Result<Self, CardError> {
        if display_name.is_empty() {
            return Err(CardError::MissingValue(
                "required name argument is empty".to_string(),
            ));
        }
        if id.is_empty() {
            return Err(CardError::MissingValue(
                "required id argument is empty".to_string(),
            ));
        }

        Ok(Self {
            kind: TYPE_MENTION.to_string(),
            text: mention_text(display_name),
            mentioned: Mentioned {
                id: id.to_string(),
                name: display_name.to_string(),
            },
        })
    }
}

/// Register `mentions` on `card` and splice their text into `text_block`.
///
/// The mention texts are joined with a space and placed before the block's
/// text if `prepend_text`, otherwise after it, separated by `separator` (or
/// a single space when empty). An empty block just receives the mention
/// text. The block is switched to wrapping. The caller is responsible for
/// adding `text_block` to the card.
///
/// # Errors
///
/// Returns [`CardError::InvalidType`] if `text_block` is not a `TextBlock`,
/// [`CardError::MissingValue`] for no mentions, or the first invalid
/// mention. Neither argument is modified on error.
pub fn add_mention(
    card: &mut Card,
    text_block: &mut Element,
    prepend_text: bool,
    separator: &str,
    mentions: Vec<Mention>,
) -> Result<(), CardError> {
    if text_block.kind != ElementType::TextBlock {
        return Err(CardError::InvalidType(format!(
            "invalid element type {:?}; expected {:?}",
            text_block.kind.as_str(),
            ElementType::TextBlock.as_str()
        )));
    }

    if mentions.is_empty() {
        return Err(CardError::MissingValue(
            "received empty collection of mentions".to_string(),
        ));
    }

    for mention in &mentions {
        validate::validate(mention)?;
    }

    let separator = if separator.is_empty() {
        DEFAULT_MENTION_TEXT_SEPARATOR
    } else {
        separator
    };

    let joined = mentions
        .iter()
        .map(|mention| mention.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let existing = text_block.text.take().unwrap_or_default();
    text_block.text = Some(if existing.is_empty() {
        joined
    } else if prepend_text {
        format!("{joined}{separator}{existing}")
    } else {
        format!("{existing}{separator}{joined}")
    });
    text_block.wrap = true;

    card.ms_teams.entities.extend(mentions);
    Ok(())
}
