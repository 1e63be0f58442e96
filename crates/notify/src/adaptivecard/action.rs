//! Card actions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::element::Element;
use super::validate;
use super::{Card, TEAMS_ACTIONS_DISPLAY_LIMIT};
use crate::error::CardError;

/// Schema version that introduced `Action.Execute`.
pub const ACTION_EXECUTE_MIN_CARD_VERSION: f64 = 1.4;

/// Fallback keyword that drops an unsupported action.
pub const FALLBACK_OPTION_DROP: &str = "drop";

/// Action kinds known to the Adaptive Card schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Requires card version 1.4 or later.
    #[serde(rename = "Action.Execute")]
    Execute,
    /// Not supported by Teams incoming webhooks.
    #[serde(rename = "Action.Submit")]
    Submit,
    #[serde(rename = "Action.OpenUrl")]
    OpenUrl,
    #[serde(rename = "Action.ShowCard")]
    ShowCard,
    #[serde(rename = "Action.ToggleVisibility")]
    ToggleVisibility,
}

impl ActionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Execute => "Action.Execute",
            Self::Submit => "Action.Submit",
            Self::OpenUrl => "Action.OpenUrl",
            Self::ShowCard => "Action.ShowCard",
            Self::ToggleVisibility => "Action.ToggleVisibility",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action kinds usable on a card or in an `ActionSet` for `version`.
#[must_use]
pub fn supported_action_types(version: f64) -> Vec<ActionType> {
    let mut types = vec![
        ActionType::OpenUrl,
        ActionType::ShowCard,
        ActionType::ToggleVisibility,
    ];
    if version >= ACTION_EXECUTE_MIN_CARD_VERSION {
        types.insert(0, ActionType::Execute);
    }
    types
}

/// Action kinds usable as a column `selectAction` for `version`.
#[must_use]
pub fn supported_select_action_types(version: f64) -> Vec<ActionType> {
    supported_action_types(version)
        .into_iter()
        .filter(|kind| *kind != ActionType::ShowCard)
        .collect()
}

/// Values accepted in an action's `fallback` field for `version`.
#[must_use]
pub fn supported_fallback_values(version: f64) -> Vec<&'static str> {
    supported_action_types(version)
        .into_iter()
        .map(ActionType::as_str)
        .chain(std::iter::once(FALLBACK_OPTION_DROP))
        .collect()
}

/// A user-invocable control.
///
/// `Action.OpenUrl` needs `url`. Only `Action.ShowCard` may carry `card`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// An action type or `"drop"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Box<Card>>,
}

impl Action {
    /// A bare action of the given kind.
    #[must_use]
    pub const fn new(kind: ActionType) -> Self {
        Self {
            kind,
            id: None,
            title: None,
            url: None,
            fallback: None,
            card: None,
        }
    }

    /// An `Action.OpenUrl` button labelled `title`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for an empty URL.
    pub fn open_url(url: impl Into<String>, title: impl Into<String>) -> Result<Self, CardError> {
        let action = Self {
            url: Some(url.into()),
            title: Some(title.into()),
            ..Self::new(ActionType::OpenUrl)
        };
        validate::validate(&action)?;
        Ok(action)
    }

    /// An `Action.ShowCard` revealing `card`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `card`.
    pub fn show_card(title: impl Into<String>, card: Card) -> Result<Self, CardError> {
        let action = Self {
            title: Some(title.into()),
            card: Some(Box::new(card)),
            ..Self::new(ActionType::ShowCard)
        };
        validate::validate(&action)?;
        Ok(action)
    }
}

/// Group `actions` into `ActionSet` elements of at most
/// [`TEAMS_ACTIONS_DISPLAY_LIMIT`] actions each, keeping their order.
///
/// # Errors
///
/// Returns [`CardError::MissingValue`] for no actions, or the first invalid
/// action.
pub fn action_sets_from_actions(actions: Vec<Action>) -> Result<Vec<Element>, CardError> {
    if actions.is_empty() {
        return Err(CardError::MissingValue(
            "received empty collection of actions to create ActionSet".to_string(),
        ));
    }

    for action in &actions {
        validate::validate(action)?;
    }

    let mut sets = Vec::with_capacity(actions.len().div_ceil(TEAMS_ACTIONS_DISPLAY_LIMIT));
    let mut actions = actions.into_iter().peekable();
    while actions.peek().is_some() {
        let mut set = Element::action_set();
        set.actions = actions.by_ref().take(TEAMS_ACTIONS_DISPLAY_LIMIT).collect();
        sets.push(set);
    }

    Ok(sets)
}
