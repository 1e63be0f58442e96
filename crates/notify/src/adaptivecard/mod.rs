//! Adaptive Card messages for Teams incoming webhooks.
//!
//! A [`Message`] wraps one or more [`Attachment`]s, each holding a
//! [`TopLevelCard`]. Builder methods validate their arguments before
//! touching the card, so a failed call leaves it unchanged.
//!
//! ```no_run
//! use teams_notify::adaptivecard::{Card, Message};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut card = Card::text_block_card("job #42 failed", "Build Failed", true)?;
//! card.mention("Jane Doe", "jane@example.com", "please take a look", false)?;
//! let message = Message::from_card(card)?;
//! message.validate()?;
//! # Ok(())
//! # }
//! ```

mod action;
mod element;
mod mention;
pub mod validate;

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

pub use action::{
    action_sets_from_actions, supported_action_types, supported_fallback_values,
    supported_select_action_types, Action, ActionType, ACTION_EXECUTE_MIN_CARD_VERSION,
    FALLBACK_OPTION_DROP,
};
pub use element::{
    Column, ColumnWidth, Element, ElementType, Fact, Spacing, Style, TextColor, TextSize,
    TextWeight, VerticalContentAlignment, COLUMN_WIDTH_PIXEL_WIDTH_EXAMPLE, TYPE_COLUMN,
};
pub use mention::{
    add_mention, is_mention_text, mention_text, Mention, Mentioned,
    DEFAULT_MENTION_TEXT_SEPARATOR, TYPE_MENTION,
};
pub use validate::{validate, validate_all, Node, Validator};

use crate::error::CardError;
use crate::payload::{MessageFormat, PreparedPayload, TeamsMessage};

/// `type` value of a [`Message`].
pub const TYPE_MESSAGE: &str = "message";

/// `type` value of a [`Card`].
pub const TYPE_ADAPTIVE_CARD: &str = "AdaptiveCard";

/// `$schema` value of a [`Card`].
pub const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";

/// Highest schema version Teams renders for webhook cards.
pub const ADAPTIVE_CARD_MAX_VERSION: f64 = 1.3;

/// Lowest schema version accepted on a top-level card.
pub const ADAPTIVE_CARD_MIN_VERSION: f64 = 1.0;

/// Version string written by the card constructors.
pub const ADAPTIVE_CARD_VERSION: &str = "1.3";

/// `contentType` of an [`Attachment`].
pub const ATTACHMENT_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// The only accepted `msteams.width` value.
pub const MS_TEAMS_WIDTH_FULL: &str = "Full";

/// Card actions shown before Teams starts hiding them.
pub const TEAMS_ACTIONS_DISPLAY_LIMIT: usize = 6;

// =============================================================================
// Message
// =============================================================================

/// How multiple attachments are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentLayout {
    List,
    Carousel,
}

/// The envelope POSTed to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,

    pub attachments: Vec<Attachment>,

    /// Without `carousel`, Teams hides every attachment after the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<AttachmentLayout>,

    #[serde(skip)]
    payload: PreparedPayload,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// An empty message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: TYPE_MESSAGE.to_string(),
            attachments: Vec::new(),
            attachment_layout: None,
            payload: PreparedPayload::default(),
        }
    }

    /// A message holding one text card, see [`Card::text_block_card`].
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for empty `text`.
    pub fn simple(text: &str, title: &str, wrap: bool) -> Result<Self, CardError> {
        Self::from_card(Card::text_block_card(text, title, wrap)?)
    }

    /// A message holding one card.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible to match [`attach`](Self::attach).
    pub fn from_card(card: Card) -> Result<Self, CardError> {
        let mut message = Self::new();
        message.attach(vec![card])?;
        Ok(message)
    }

    /// A message holding one [`Card::mention_card`].
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any argument is empty.
    pub fn mention_message(display_name: &str, id: &str, text: &str) -> Result<Self, CardError> {
        Self::from_card(Card::mention_card(display_name, id, text)?)
    }

    /// Wrap each card in an attachment, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for no cards.
    pub fn attach(&mut self, cards: Vec<Card>) -> Result<(), CardError> {
        if cards.is_empty() {
            return Err(CardError::MissingValue(
                "received empty collection of cards".to_string(),
            ));
        }

        self.attachments.extend(cards.into_iter().map(|card| Attachment {
            content_type: ATTACHMENT_CONTENT_TYPE.to_string(),
            content_url: None,
            content: TopLevelCard(card),
        }));
        Ok(())
    }

    /// Show attachments side by side.
    pub fn carousel(&mut self) -> &mut Self {
        self.attachment_layout = Some(AttachmentLayout::Carousel);
        self
    }

    /// Mention a user in the first card, creating a mention card if there is
    /// none. The new `TextBlock` reads `<at>NAME</at> text` and goes first
    /// if `prepend`, otherwise last.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any argument is empty.
    pub fn mention(
        &mut self,
        prepend: bool,
        display_name: &str,
        id: &str,
        text: &str,
    ) -> Result<(), CardError> {
        if self.attachments.is_empty() {
            return self.attach(vec![Card::mention_card(display_name, id, text)?]);
        }
        self.attachments[0]
            .content
            .mention(display_name, id, text, prepend)
    }

    /// Every violated rule, in depth-first order.
    #[must_use]
    pub fn validate_all(&self) -> Vec<CardError> {
        validate_all(self)
    }

    /// Check the whole message tree.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), CardError> {
        validate(self)
    }
}

impl TeamsMessage for Message {
    fn format(&self) -> MessageFormat {
        MessageFormat::AdaptiveCard
    }

    fn validate(&self) -> Result<(), CardError> {
        Self::validate(self)
    }

    fn prepared(&self) -> &PreparedPayload {
        &self.payload
    }

    fn prepared_mut(&mut self) -> &mut PreparedPayload {
        &mut self.payload
    }
}

/// One card of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,

    pub content: TopLevelCard,
}

/// A card placed directly in an attachment. Unlike nested cards it must
/// declare a schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopLevelCard(pub Card);

impl Deref for TopLevelCard {
    type Target = Card;

    fn deref(&self) -> &Card {
        &self.0
    }
}

impl DerefMut for TopLevelCard {
    fn deref_mut(&mut self) -> &mut Card {
        &mut self.0
    }
}

// =============================================================================
// Card
// =============================================================================

/// An Adaptive Card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_text: Option<String>,

    #[serde(default)]
    pub body: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,

    #[serde(rename = "msteams", default, skip_serializing_if = "MsTeams::is_empty")]
    pub ms_teams: MsTeams,

    /// Requires `vertical_content_alignment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,

    /// Requires `min_height`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_content_alignment: Option<VerticalContentAlignment>,
}

/// Teams-specific card properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsTeams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_expand: bool,

    /// Mentions; each needs matching text in the card body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Mention>,
}

impl MsTeams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && !self.allow_expand && self.entities.is_empty()
    }
}

impl Default for Card {
    fn default() -> Self {
        Self::new()
    }
}

impl Card {
    /// An empty card at [`ADAPTIVE_CARD_VERSION`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: TYPE_ADAPTIVE_CARD.to_string(),
            schema: Some(ADAPTIVE_CARD_SCHEMA.to_string()),
            version: Some(ADAPTIVE_CARD_VERSION.to_string()),
            fallback_text: None,
            body: Vec::new(),
            actions: Vec::new(),
            ms_teams: MsTeams::default(),
            min_height: None,
            vertical_content_alignment: None,
        }
    }

    /// A card with one `TextBlock`, preceded by a heading if `title` is not
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for empty `text`.
    pub fn text_block_card(text: &str, title: &str, wrap: bool) -> Result<Self, CardError> {
        if text.is_empty() {
            return Err(CardError::MissingValue(
                "required field text is empty".to_string(),
            ));
        }

        let mut card = Self::new();
        if !title.is_empty() {
            card.body.push(Element::title_text_block(title, wrap));
        }
        card.body.push(Element::text_block(text, wrap));
        Ok(card)
    }

    /// A card whose only `TextBlock` reads `<at>NAME</at> text`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any argument is empty.
    pub fn mention_card(display_name: &str, id: &str, text: &str) -> Result<Self, CardError> {
        let mut card = Self::new();
        card.mention(display_name, id, text, false)?;
        Ok(card)
    }

    /// Add a `TextBlock` reading `<at>NAME</at> text` and register the
    /// mention. The block goes first if `prepend`, otherwise last.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any argument is empty.
    pub fn mention(
        &mut self,
        display_name: &str,
        id: &str,
        text: &str,
        prepend: bool,
    ) -> Result<(), CardError> {
        if text.is_empty() {
            return Err(CardError::MissingValue(
                "required msgText argument is empty".to_string(),
            ));
        }
        let mention = Mention::new(display_name, id)?;

        let text_block = Element::text_block(
            format!("{}{DEFAULT_MENTION_TEXT_SEPARATOR}{text}", mention.text),
            true,
        );
        insert(&mut self.body, prepend, vec![text_block]);
        self.ms_teams.entities.push(mention);
        Ok(())
    }

    /// Register `mentions` and add a wrapping `TextBlock` listing them,
    /// first if `prepend` (a lead-in), otherwise last (a CC list).
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for no mentions, or the first
    /// invalid mention.
    pub fn add_mention(&mut self, prepend: bool, mentions: Vec<Mention>) -> Result<(), CardError> {
        let mut text_block = Element::text_block(String::new(), true);
        add_mention(
            self,
            &mut text_block,
            true,
            DEFAULT_MENTION_TEXT_SEPARATOR,
            mentions,
        )?;
        insert(&mut self.body, prepend, vec![text_block]);
        Ok(())
    }

    /// Add `elements` to the body as one contiguous run.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for no elements, or the first
    /// invalid element.
    pub fn add_element(&mut self, prepend: bool, elements: Vec<Element>) -> Result<(), CardError> {
        if elements.is_empty() {
            return Err(CardError::MissingValue(
                "received empty collection of elements".to_string(),
            ));
        }
        for element in &elements {
            self.validator().validate(element)?;
        }

        insert(&mut self.body, prepend, elements);
        Ok(())
    }

    /// Add card-level actions. Teams shows at most
    /// [`TEAMS_ACTIONS_DISPLAY_LIMIT`] of them; use
    /// [`action_sets_from_actions`] for more.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for no actions, or the first
    /// action not valid for this card's version.
    pub fn add_action(&mut self, prepend: bool, actions: Vec<Action>) -> Result<(), CardError> {
        if actions.is_empty() {
            return Err(CardError::MissingValue(
                "received empty collection of actions".to_string(),
            ));
        }

        for action in &actions {
            self.validator().validate(action)?;
        }

        insert(&mut self.actions, prepend, actions);
        Ok(())
    }

    /// Add `FactSet` elements to the body.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for no fact sets,
    /// [`CardError::InvalidType`] for any other element kind, or the first
    /// validation failure.
    pub fn add_fact_set(&mut self, prepend: bool, fact_sets: Vec<Element>) -> Result<(), CardError> {
        if fact_sets.is_empty() {
            return Err(CardError::MissingValue(
                "received empty collection of factsets".to_string(),
            ));
        }
        for fact_set in &fact_sets {
            expect_kind(fact_set, ElementType::FactSet)?;
            self.validator().validate(fact_set)?;
        }

        insert(&mut self.body, prepend, fact_sets);
        Ok(())
    }

    /// Add a `Container` to the body.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidType`] for any other element kind, or the
    /// first validation failure.
    pub fn add_container(&mut self, prepend: bool, container: Element) -> Result<(), CardError> {
        expect_kind(&container, ElementType::Container)?;
        self.validator().validate(&container)?;

        insert(&mut self.body, prepend, vec![container]);
        Ok(())
    }

    /// Find the element with `id` anywhere in the body, including inside
    /// containers and columns. IDs are case sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for an empty id and
    /// [`CardError::ValueNotFound`] if nothing matches.
    pub fn get_element(&self, id: &str) -> Result<&Element, CardError> {
        check_element_id(id)?;
        self.body
            .iter()
            .find_map(|element| element.find(id))
            .ok_or_else(|| element_not_found(id))
    }

    /// Mutable variant of [`get_element`](Self::get_element).
    ///
    /// # Errors
    ///
    /// Same as [`get_element`](Self::get_element).
    pub fn get_element_mut(&mut self, id: &str) -> Result<&mut Element, CardError> {
        check_element_id(id)?;
        self.body
            .iter_mut()
            .find_map(|element| element.find_mut(id))
            .ok_or_else(|| element_not_found(id))
    }

    /// Use the full width of the chat pane.
    pub fn set_full_width(&mut self) {
        self.ms_teams.width = Some(MS_TEAMS_WIDTH_FULL.to_string());
    }

    /// Check this card as a nested card: no version is required.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), CardError> {
        validate(self)
    }

    #[must_use]
    pub fn validate_all(&self) -> Vec<CardError> {
        validate_all(self)
    }

    /// The declared version, or [`ADAPTIVE_CARD_MAX_VERSION`] if absent or
    /// malformed.
    #[must_use]
    pub fn version_number(&self) -> f64 {
        self.version
            .as_deref()
            .and_then(validate::parse_card_version)
            .unwrap_or(ADAPTIVE_CARD_MAX_VERSION)
    }

    fn validator(&self) -> Validator {
        Validator::new().with_version(self.version_number())
    }
}

fn insert<T>(target: &mut Vec<T>, prepend: bool, values: Vec<T>) {
    if prepend {
        target.splice(0..0, values);
    } else {
        target.extend(values);
    }
}

fn expect_kind(element: &Element, kind: ElementType) -> Result<(), CardError> {
    if element.kind == kind {
        Ok(())
    } else {
        Err(CardError::InvalidType(format!(
            "unsupported element type {}; expected {kind}",
            element.kind
        )))
    }
}

fn check_element_id(id: &str) -> Result<(), CardError> {
    if id.is_empty() {
        Err(CardError::MissingValue("empty ID value specified".to_string()))
    } else {
        Ok(())
    }
}

fn element_not_found(id: &str) -> CardError {
    CardError::ValueNotFound(format!("unable to retrieve element id {id:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CardErrorKind;
    use crate::payload::TeamsMessage;

    #[test]
    fn test_simple_message_shape() {
        let mut message = Message::simple("job #42", "Build Failed", true).unwrap();
        message.prepare().unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&message.payload_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "message");
        let attachment = &json["attachments"][0];
        assert_eq!(attachment["contentType"], ATTACHMENT_CONTENT_TYPE);
        let card = &attachment["content"];
        assert_eq!(card["type"], "AdaptiveCard");
        assert_eq!(card["$schema"], ADAPTIVE_CARD_SCHEMA);
        assert_eq!(card["version"], "1.3");
        assert_eq!(card["body"][0]["text"], "Build Failed");
        assert_eq!(card["body"][0]["style"], "heading");
        assert_eq!(card["body"][1]["text"], "job #42");
        assert!(card.get("msteams").is_none());
        assert!(card.get("actions").is_none());
        assert!(json.get("attachmentLayout").is_none());
    }

    #[test]
    fn test_simple_message_requires_text() {
        let err = Message::simple("", "title", false).unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::MissingValue);
    }

    #[test]
    fn test_attach_and_carousel() {
        let mut message = Message::new();
        assert_eq!(
            message.attach(Vec::new()).unwrap_err().kind(),
            CardErrorKind::MissingValue
        );

        message
            .attach(vec![
                Card::text_block_card("one", "", false).unwrap(),
                Card::text_block_card("two", "", false).unwrap(),
            ])
            .unwrap();
        message.carousel();

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["attachmentLayout"], "carousel");
        assert_eq!(json["attachments"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_card_serializes_body() {
        let json = serde_json::to_value(Card::new()).unwrap();
        assert_eq!(json["body"], serde_json::json!([]));
    }

    #[test]
    fn test_two_target_urls_in_order() {
        let mut card = Card::text_block_card("job #42", "Build Failed", true).unwrap();
        card.add_action(
            false,
            vec![
                Action::open_url("https://ci.example.com/logs", "Logs").unwrap(),
                Action::open_url("https://ci.example.com/dash", "Dashboard").unwrap(),
            ],
        )
        .unwrap();

        let json = serde_json::to_value(&card).unwrap();
        let actions = json["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0]["title"], "Logs");
        assert_eq!(actions[0]["url"], "https://ci.example.com/logs");
        assert_eq!(actions[1]["title"], "Dashboard");
        assert_eq!(actions[1]["url"], "https://ci.example.com/dash");
    }

    #[test]
    fn test_add_action_uses_card_version() {
        let mut card = Card::new();
        let err = card
            .add_action(false, vec![Action::new(ActionType::Execute)])
            .unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::InvalidType);
        assert!(card.actions.is_empty());

        card.version = Some("1.4".to_string());
        card.add_action(false, vec![Action::new(ActionType::Execute)])
            .unwrap();
        assert_eq!(card.actions.len(), 1);
    }

    #[test]
    fn test_add_element_and_container_use_card_version() {
        let execute_set = || {
            let mut set = Element::action_set();
            set.actions.push(Action::new(ActionType::Execute));
            set
        };
        let execute_container = || {
            let mut container = Element::container();
            container.items.push(execute_set());
            container
        };

        let mut card = Card::new();
        assert_eq!(
            card.add_element(false, vec![execute_set()]).unwrap_err().kind(),
            CardErrorKind::InvalidType
        );
        assert!(card.add_container(false, execute_container()).is_err());
        assert!(card.body.is_empty());

        card.version = Some("1.4".to_string());
        card.add_element(false, vec![execute_set()]).unwrap();
        card.add_container(false, execute_container()).unwrap();
        assert_eq!(card.body.len(), 2);
        assert_eq!(card.validate(), Ok(()));
    }

    #[test]
    fn test_non_finite_version_falls_back_to_max() {
        let mut card = Card::new();
        card.version = Some("NaN".to_string());
        assert!((card.version_number() - ADAPTIVE_CARD_MAX_VERSION).abs() < f64::EPSILON);
        assert!(card
            .add_action(false, vec![Action::new(ActionType::Execute)])
            .is_err());
    }

    #[test]
    fn test_card_mention_prepend_and_register() {
        let mut card = Card::text_block_card("body", "", false).unwrap();
        card.mention("Jane Doe", "jane@example.com", "please look", true)
            .unwrap();

        assert_eq!(
            card.body[0].text.as_deref(),
            Some("<at>Jane Doe</at> please look")
        );
        assert_eq!(card.body[1].text.as_deref(), Some("body"));
        assert_eq!(card.ms_teams.entities.len(), 1);
        assert_eq!(card.validate(), Ok(()));

        card.mention("John Roe", "john@example.com", "fyi", false)
            .unwrap();
        assert_eq!(card.body[2].text.as_deref(), Some("<at>John Roe</at> fyi"));
    }

    #[test]
    fn test_card_mention_requires_text() {
        let mut card = Card::new();
        let err = card.mention("Jane Doe", "jane@example.com", "", false).unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::MissingValue);
        assert!(card.body.is_empty());
    }

    #[test]
    fn test_add_mention_creates_text_block() {
        let mut card = Card::text_block_card("deploy finished", "", true).unwrap();
        card.add_mention(
            false,
            vec![
                Mention::new("Jane Doe", "jane@example.com").unwrap(),
                Mention::new("John Roe", "john@example.com").unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(
            card.body[1].text.as_deref(),
            Some("<at>Jane Doe</at> <at>John Roe</at>")
        );
        assert!(card.body[1].wrap);
        assert_eq!(card.ms_teams.entities.len(), 2);
        assert_eq!(Message::from_card(card).unwrap().validate(), Ok(()));
    }

    #[test]
    fn test_message_mention_creates_or_reuses_card() {
        let mut message = Message::new();
        message
            .mention(false, "Jane Doe", "jane@example.com", "build failed")
            .unwrap();
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(
            message.attachments[0].content.body[0].text.as_deref(),
            Some("<at>Jane Doe</at> build failed")
        );

        message
            .mention(true, "John Roe", "john@example.com", "heads up")
            .unwrap();
        assert_eq!(message.attachments.len(), 1);
        let card = &message.attachments[0].content;
        assert_eq!(card.body[0].text.as_deref(), Some("<at>John Roe</at> heads up"));
        assert_eq!(card.ms_teams.entities.len(), 2);
        assert_eq!(message.validate(), Ok(()));
    }

    #[test]
    fn test_mention_message() {
        let message = Message::mention_message("Jane Doe", "jane@example.com", "hi").unwrap();
        let json = serde_json::to_value(&message).unwrap();
        let entity = &json["attachments"][0]["content"]["msteams"]["entities"][0];
        assert_eq!(entity["type"], "mention");
        assert_eq!(entity["text"], "<at>Jane Doe</at>");
        assert_eq!(entity["mentioned"]["id"], "jane@example.com");
        assert_eq!(entity["mentioned"]["name"], "Jane Doe");
    }

    #[test]
    fn test_add_element_is_atomic() {
        let mut card = Card::text_block_card("first", "", false).unwrap();
        let err = card
            .add_element(
                true,
                vec![Element::text_block("ok", false), Element::container()],
            )
            .unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::MissingValue);
        assert_eq!(card.body.len(), 1);

        card.add_element(
            true,
            vec![Element::text_block("a", false), Element::text_block("b", false)],
        )
        .unwrap();
        let texts: Vec<&str> = card.body.iter().filter_map(|e| e.text.as_deref()).collect();
        assert_eq!(texts, vec!["a", "b", "first"]);
    }

    #[test]
    fn test_add_fact_set_and_container_check_kind() {
        let mut card = Card::new();
        let err = card
            .add_fact_set(false, vec![Element::text_block("x", false)])
            .unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::InvalidType);

        let mut facts = Element::fact_set();
        facts.add_fact([Fact::new("Status", "failed")]).unwrap();
        card.add_fact_set(false, vec![facts]).unwrap();

        let err = card
            .add_container(false, Element::text_block("x", false))
            .unwrap_err();
        assert_eq!(err.kind(), CardErrorKind::InvalidType);

        let mut container = Element::container();
        container
            .add_item(false, Element::text_block("inside", false))
            .unwrap();
        card.add_container(true, container).unwrap();
        assert_eq!(card.body[0].kind, ElementType::Container);
        assert_eq!(card.body[1].kind, ElementType::FactSet);
    }

    #[test]
    fn test_get_element_recurses() {
        let mut container = Element::container();
        container
            .add_item(false, Element::text_block("nested", false).with_id("inner"))
            .unwrap();
        let mut card = Card::new();
        card.add_container(false, container.with_id("outer")).unwrap();

        assert_eq!(card.get_element("outer").unwrap().kind, ElementType::Container);
        assert_eq!(
            card.get_element("inner").unwrap().text.as_deref(),
            Some("nested")
        );
        assert_eq!(
            card.get_element("Inner").unwrap_err().kind(),
            CardErrorKind::ValueNotFound
        );
        assert_eq!(
            card.get_element("").unwrap_err().kind(),
            CardErrorKind::MissingValue
        );

        card.get_element_mut("inner").unwrap().text = Some("changed".to_string());
        assert_eq!(
            card.get_element("inner").unwrap().text.as_deref(),
            Some("changed")
        );
    }

    #[test]
    fn test_set_full_width() {
        let mut card = Card::new();
        card.set_full_width();
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["msteams"], serde_json::json!({"width": "Full"}));
    }

    #[test]
    fn test_prepare_and_pretty_print() {
        let mut message = Message::simple("job #42", "Build Failed", true).unwrap();
        assert_eq!(message.pretty_print(), "");
        assert!(matches!(
            message.payload_bytes(),
            Err(crate::error::Error::NotPrepared)
        ));

        message.prepare().unwrap();
        let pretty = message.pretty_print();
        assert!(pretty.starts_with("{\n\t\"type\": \"message\""));

        let parsed: Message = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed.attachments, message.attachments);
        assert_eq!(message.format(), MessageFormat::AdaptiveCard);
    }
}
