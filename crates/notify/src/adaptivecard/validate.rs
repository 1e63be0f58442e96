//! Structural validation of Adaptive Card messages.
//!
//! One depth-first visitor walks Message → Attachment → TopLevelCard → Card
//! → body elements (items, columns, facts, actions) → card actions → nested
//! `Action.ShowCard` cards. Each node kind has a fixed rule set. The same
//! walk either stops at the first violation ([`validate`]) or collects all
//! of them ([`validate_all`]).
//!
//! The card schema version in scope gates `Action.Execute`. Nodes validated
//! on their own assume [`ADAPTIVE_CARD_MAX_VERSION`].

use super::action::{
    supported_action_types, supported_fallback_values, supported_select_action_types, Action,
    ActionType,
};
use super::element::{Column, Element, ElementType, Fact, TYPE_COLUMN};
use super::mention::{is_mention_text, Mention, TYPE_MENTION};
use super::{
    Attachment, Card, Message, MsTeams, TopLevelCard, ADAPTIVE_CARD_MAX_VERSION,
    ADAPTIVE_CARD_MIN_VERSION, ADAPTIVE_CARD_SCHEMA, ATTACHMENT_CONTENT_TYPE, MS_TEAMS_WIDTH_FULL,
    TYPE_ADAPTIVE_CARD, TYPE_MESSAGE,
};
use crate::error::CardError;

/// A borrowed node of a message tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Message(&'a Message),
    Attachment(&'a Attachment),
    TopLevelCard(&'a TopLevelCard),
    Card(&'a Card),
    Element(&'a Element),
    Column(&'a Column),
    Fact(&'a Fact),
    Action(&'a Action),
    MsTeams(&'a MsTeams),
    Mention(&'a Mention),
}

macro_rules! impl_node_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl<'a> From<&'a $ty> for Node<'a> {
                fn from(value: &'a $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_node_from! {
    Message => Message,
    Attachment => Attachment,
    TopLevelCard => TopLevelCard,
    Card => Card,
    Element => Element,
    Column => Column,
    Fact => Fact,
    Action => Action,
    MsTeams => MsTeams,
    Mention => Mention,
}

/// Validate `node`, stopping at the first violated rule.
///
/// # Errors
///
/// Returns the first violation found in depth-first order.
pub fn validate<'a>(node: impl Into<Node<'a>>) -> Result<(), CardError> {
    Validator::new().validate(node)
}

/// Validate `node` and return every violated rule, in depth-first order.
#[must_use]
pub fn validate_all<'a>(node: impl Into<Node<'a>>) -> Vec<CardError> {
    Validator::new().validate_all(node)
}

/// Stop signal for fail-fast walks.
struct Halt;

type Flow = Result<(), Halt>;

/// Visitor state: the schema version in scope and the violations so far.
#[derive(Debug, Clone)]
pub struct Validator {
    version: f64,
    collect_all: bool,
    errors: Vec<CardError>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: ADAPTIVE_CARD_MAX_VERSION,
            collect_all: false,
            errors: Vec::new(),
        }
    }

    /// Validate as if inside a card declaring `version`.
    #[must_use]
    pub const fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Stop at the first violation.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn validate<'a>(mut self, node: impl Into<Node<'a>>) -> Result<(), CardError> {
        self.collect_all = false;
        let _ = self.visit(node.into());
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Walk the whole tree and return every violation.
    #[must_use]
    pub fn validate_all<'a>(mut self, node: impl Into<Node<'a>>) -> Vec<CardError> {
        self.collect_all = true;
        let _ = self.visit(node.into());
        self.errors
    }

    fn visit(&mut self, node: Node<'_>) -> Flow {
        match node {
            Node::Message(message) => self.message(message),
            Node::Attachment(attachment) => self.attachment(attachment),
            Node::TopLevelCard(card) => self.top_level_card(card),
            Node::Card(card) => self.card(card),
            Node::Element(element) => self.element(element),
            Node::Column(column) => self.column(column),
            Node::Fact(fact) => self.fact(fact),
            Node::Action(action) => self.action(action),
            Node::MsTeams(ms_teams) => self.ms_teams(ms_teams),
            Node::Mention(mention) => self.mention(mention),
        }
    }

    fn report(&mut self, err: CardError) -> Flow {
        self.errors.push(err);
        if self.collect_all {
            Ok(())
        } else {
            Err(Halt)
        }
    }

    fn require(&mut self, ok: bool, err: impl FnOnce() -> CardError) -> Flow {
        if ok {
            Ok(())
        } else {
            self.report(err())
        }
    }

    // =========================================================================
    // Rules per node kind
    // =========================================================================

    fn message(&mut self, message: &Message) -> Flow {
        self.require(message.kind == TYPE_MESSAGE, || {
            CardError::InvalidType(format!(
                "invalid message type {:?}; expected {TYPE_MESSAGE:?}",
                message.kind
            ))
        })?;
        self.require(!message.attachments.is_empty(), || {
            CardError::MissingValue("required field Attachments is empty for message".to_string())
        })?;
        for attachment in &message.attachments {
            self.attachment(attachment)?;
        }
        Ok(())
    }

    fn attachment(&mut self, attachment: &Attachment) -> Flow {
        self.require(attachment.content_type == ATTACHMENT_CONTENT_TYPE, || {
            CardError::InvalidType(format!(
                "invalid attachment type {:?}; expected {ATTACHMENT_CONTENT_TYPE:?}",
                attachment.content_type
            ))
        })?;
        self.top_level_card(&attachment.content)
    }

    fn top_level_card(&mut self, card: &TopLevelCard) -> Flow {
        let version = parse_top_level_version(card.version.as_deref());

        let outer = self.version;
        if let Ok(parsed) = version {
            self.version = parsed;
        }
        let flow = self.card(card);
        self.version = outer;
        flow?;

        match version {
            Ok(_) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    fn card(&mut self, card: &Card) -> Flow {
        let outer = self.version;
        if let Some(parsed) = card.version.as_deref().and_then(parse_card_version) {
            self.version = parsed;
        }
        let flow = self.card_rules(card);
        self.version = outer;
        flow
    }

    fn card_rules(&mut self, card: &Card) -> Flow {
        self.require(card.kind == TYPE_ADAPTIVE_CARD, || {
            CardError::InvalidType(format!(
                "invalid card type {:?}; expected {TYPE_ADAPTIVE_CARD:?}",
                card.kind
            ))
        })?;

        if let Some(schema) = card.schema.as_deref().filter(|schema| !schema.is_empty()) {
            self.require(schema == ADAPTIVE_CARD_SCHEMA, || {
                CardError::InvalidFieldValue(format!(
                    "invalid Schema {schema:?} for card; expected {ADAPTIVE_CARD_SCHEMA:?}"
                ))
            })?;
        }

        let has_min_height = card.min_height.as_deref().is_some_and(|value| !value.is_empty());
        match (has_min_height, card.vertical_content_alignment.is_some()) {
            (true, false) => self.report(CardError::MissingValue(
                "field MinHeight is set, VerticalContentAlignment is not".to_string(),
            ))?,
            (false, true) => self.report(CardError::MissingValue(
                "field VerticalContentAlignment is set, MinHeight is not".to_string(),
            ))?,
            _ => {}
        }

        self.card_body_has_mentions(card)?;
        self.ms_teams(&card.ms_teams)?;

        for element in &card.body {
            self.element(element)?;
        }
        for action in &card.actions {
            self.action(action)?;
        }
        Ok(())
    }

    fn card_body_has_mentions(&mut self, card: &Card) -> Flow {
        let mentions = &card.ms_teams.entities;
        if mentions.is_empty() {
            return Ok(());
        }

        if card.body.is_empty() {
            return self.report(CardError::MissingValue(
                "user mention text not found in empty Card Body".to_string(),
            ));
        }

        for mention in mentions {
            self.require(body_has_mention(&card.body, mention), || {
                CardError::MissingValue(format!(
                    "user mention text {:?} not found in elements of Card Body",
                    mention.text
                ))
            })?;
        }
        Ok(())
    }

    fn ms_teams(&mut self, ms_teams: &MsTeams) -> Flow {
        if let Some(width) = ms_teams.width.as_deref().filter(|width| !width.is_empty()) {
            self.require(width == MS_TEAMS_WIDTH_FULL, || {
                CardError::InvalidFieldValue(format!(
                    "invalid Width {width:?} for MSTeams; expected {MS_TEAMS_WIDTH_FULL:?}"
                ))
            })?;
        }
        for mention in &ms_teams.entities {
            self.mention(mention)?;
        }
        Ok(())
    }

    fn mention(&mut self, mention: &Mention) -> Flow {
        self.require(mention.kind == TYPE_MENTION, || {
            CardError::InvalidType(format!(
                "invalid Mention type {:?}; expected {TYPE_MENTION:?}",
                mention.kind
            ))
        })?;

        if mention.text.is_empty() {
            self.report(CardError::MissingValue(
                "required field Text is empty for Mention".to_string(),
            ))?;
        } else {
            self.require(is_mention_text(&mention.text), || {
                CardError::InvalidFieldValue(format!(
                    "mention text {:?} does not follow the <at>NAME</at> pattern",
                    mention.text
                ))
            })?;
        }

        self.require(!mention.mentioned.id.is_empty(), || {
            CardError::MissingValue("required field ID is empty for Mentioned".to_string())
        })?;
        self.require(!mention.mentioned.name.is_empty(), || {
            CardError::MissingValue("required field Name is empty for Mentioned".to_string())
        })
    }

    fn element(&mut self, element: &Element) -> Flow {
        if let Some(style) = element.style {
            let supported = element.kind.supported_styles();
            self.require(supported.contains(&style), || {
                if supported.is_empty() {
                    CardError::InvalidFieldValue(format!(
                        "invalid Style {style:?} for element; Style values not supported for {}",
                        element.kind
                    ))
                } else {
                    CardError::InvalidFieldValue(format!(
                        "invalid Style {style:?} for {}; expected one of {supported:?}",
                        element.kind
                    ))
                }
            })?;
        }

        match element.kind {
            ElementType::ColumnSet => {
                for column in &element.columns {
                    self.column(column)?;
                }
            }
            ElementType::ActionSet => {
                self.require(!element.actions.is_empty(), || {
                    CardError::MissingValue(
                        "required field Actions is empty for ActionSet".to_string(),
                    )
                })?;
                for action in &element.actions {
                    self.action(action)?;
                }
            }
            ElementType::Container => {
                self.require(!element.items.is_empty(), || {
                    CardError::MissingValue("required field Items is empty for Container".to_string())
                })?;
                for item in &element.items {
                    self.element(item)?;
                }
            }
            ElementType::Image => {
                self.require(
                    element.url.as_deref().is_some_and(|url| !url.is_empty()),
                    || CardError::MissingValue("required field URL is empty for Image".to_string()),
                )?;
            }
            ElementType::FactSet => {
                self.require(!element.facts.is_empty(), || {
                    CardError::MissingValue("required field Facts is empty for FactSet".to_string())
                })?;
                for fact in &element.facts {
                    self.fact(fact)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn column(&mut self, column: &Column) -> Flow {
        self.require(column.kind == TYPE_COLUMN, || {
            CardError::InvalidType(format!(
                "invalid column type {:?}; expected {TYPE_COLUMN:?}",
                column.kind
            ))
        })?;

        if let Some(Err(err)) = column.width.as_ref().map(super::ColumnWidth::validate) {
            self.report(err)?;
        }

        for item in &column.items {
            self.element(item)?;
        }

        if let Some(action) = column.select_action.as_deref() {
            self.select_action(action)?;
        }
        Ok(())
    }

    fn fact(&mut self, fact: &Fact) -> Flow {
        self.require(!fact.title.is_empty(), || {
            CardError::MissingValue("required field Title is empty for Fact".to_string())
        })?;
        self.require(!fact.value.is_empty(), || {
            CardError::MissingValue("required field Value is empty for Fact".to_string())
        })
    }

    fn action(&mut self, action: &Action) -> Flow {
        let supported = supported_action_types(self.version);
        self.action_rules(action, &supported, "Action")?;

        if let Some(card) = action.card.as_deref() {
            if action.kind == ActionType::ShowCard {
                self.card(card)?;
            }
        }
        Ok(())
    }

    fn select_action(&mut self, action: &Action) -> Flow {
        let supported = supported_select_action_types(self.version);
        self.action_rules(action, &supported, "ISelectAction")
    }

    fn action_rules(&mut self, action: &Action, supported: &[ActionType], owner: &str) -> Flow {
        let version = self.version;
        self.require(supported.contains(&action.kind), || {
            let names: Vec<&str> = supported.iter().map(|kind| kind.as_str()).collect();
            CardError::InvalidType(format!(
                "invalid Type {:?} for {owner} in card version {version:.1}; expected one of {names:?}",
                action.kind.as_str()
            ))
        })?;

        if action.kind == ActionType::OpenUrl {
            self.require(
                action.url.as_deref().is_some_and(|url| !url.is_empty()),
                || CardError::MissingValue(format!("invalid URL for {owner}")),
            )?;
        }

        if let Some(fallback) = action.fallback.as_deref() {
            let allowed = supported_fallback_values(version);
            self.require(allowed.contains(&fallback), || {
                CardError::InvalidFieldValue(format!(
                    "invalid Fallback {fallback:?} for {owner}; expected one of {allowed:?}"
                ))
            })?;
        }

        if action.card.is_some() && action.kind != ActionType::ShowCard {
            self.report(CardError::InvalidFieldValue(format!(
                "specifying a Card is unsupported for {owner} type {:?}",
                action.kind.as_str()
            )))?;
        }
        Ok(())
    }
}

fn parse_top_level_version(version: Option<&str>) -> Result<f64, CardError> {
    let version = version.map(str::trim).unwrap_or_default();
    if version.is_empty() {
        return Err(CardError::MissingValue(
            "required field Version is empty for top-level Card".to_string(),
        ));
    }

    let parsed = parse_card_version(version).ok_or_else(|| {
        CardError::InvalidFieldValue(format!("value {version:?} incompatible with Version field"))
    })?;

    // Versions above the newest known schema are accepted.
    if parsed < ADAPTIVE_CARD_MIN_VERSION {
        return Err(CardError::InvalidFieldValue(format!(
            "unsupported version {version:?}; expected minimum value of {ADAPTIVE_CARD_MIN_VERSION:.1}"
        )));
    }
    Ok(parsed)
}

/// A card version as a number. `NaN` and infinities are not versions.
pub(crate) fn parse_card_version(version: &str) -> Option<f64> {
    version
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// Whether every element tree in `body` has `mention`'s text somewhere,
/// descending into containers and columns.
fn body_has_mention(body: &[Element], mention: &Mention) -> bool {
    body.iter().any(|element| element_has_mention(element, mention))
}

fn element_has_mention(element: &Element, mention: &Mention) -> bool {
    element.has_mention_text(mention)
        || element
            .children()
            .any(|child| element_has_mention(child, mention))
}
