//! Legacy `MessageCard` format.
//!
//! A card is a title, a Markdown text body, a theme color and an ordered
//! list of [`Section`]s. Sections carry facts, images and action buttons.
//! Builders reject malformed input before touching the card, with one
//! exception: [`MessageCard::add_section`] silently drops `None`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CardError;
use crate::payload::{MessageFormat, PreparedPayload, TeamsMessage};

/// `@type` value of a legacy card.
pub const MESSAGE_CARD_TYPE: &str = "MessageCard";

/// `@context` value of a legacy card.
pub const MESSAGE_CARD_CONTEXT: &str = "https://schema.org/extensions";

/// Action buttons Teams displays per card or section.
pub const POTENTIAL_ACTION_MAX_SUPPORTED: usize = 4;

/// Operating systems accepted for an `OpenUri` target.
pub const POTENTIAL_ACTION_TARGET_OS: [&str; 4] = ["default", "iOS", "android", "windows"];

// =============================================================================
// Types
// =============================================================================

/// A legacy Office 365 connector card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub kind: String,

    #[serde(rename = "@context")]
    pub context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,

    #[serde(rename = "potentialAction", default, skip_serializing_if = "Vec::is_empty")]
    pub potential_actions: Vec<PotentialAction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,

    #[serde(skip)]
    payload: PreparedPayload,
}

/// A visually separated block within a [`MessageCard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<SectionImage>,

    #[serde(default = "default_markdown")]
    pub markdown: bool,

    #[serde(rename = "potentialAction", default, skip_serializing_if = "Vec::is_empty")]
    pub potential_actions: Vec<PotentialAction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SectionImage>,

    #[serde(default)]
    pub start_group: bool,
}

/// A name/value pair rendered as a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    pub value: String,
}

/// An image shown in a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionImage {
    pub image: String,
    pub title: String,
}

/// Kind of a [`PotentialAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotentialActionType {
    OpenUri,
    #[serde(rename = "HttpPOST")]
    HttpPost,
}

/// A button rendered at the bottom of a card or section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialAction {
    #[serde(rename = "@type")]
    pub kind: PotentialActionType,

    pub name: String,

    /// `OpenUri` destinations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<ActionTarget>,

    /// `HttpPOST` destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_content_type: Option<String>,
}

/// An `OpenUri` destination for one operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    pub os: String,
    pub uri: String,
}

const fn default_markdown() -> bool {
    true
}

// =============================================================================
// Constructors and builders
// =============================================================================

impl Default for MessageCard {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCard {
    /// An empty card with the type and context tags set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: MESSAGE_CARD_TYPE.to_string(),
            context: MESSAGE_CARD_CONTEXT.to_string(),
            summary: None,
            title: None,
            text: None,
            theme_color: None,
            potential_actions: Vec::new(),
            sections: Vec::new(),
            payload: PreparedPayload::default(),
        }
    }

    /// A card with the given title and text.
    #[must_use]
    pub fn with_text(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
            ..Self::new()
        }
    }

    /// Append a section.
    ///
    /// `None` is dropped without error. A section whose fields are all at
    /// their empty value is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for an empty section.
    pub fn add_section(&mut self, section: impl Into<Option<Section>>) -> Result<(), CardError> {
        let Some(section) = section.into() else {
            debug!("Received nil section, skipping");
            return Ok(());
        };

        if section.is_empty() {
            return Err(CardError::MissingValue(
                "all section fields found to be at zero-value, skipping section".to_string(),
            ));
        }

        self.sections.push(section);
        Ok(())
    }

    /// Append card-level action buttons.
    ///
    /// More than [`POTENTIAL_ACTION_MAX_SUPPORTED`] actions are accepted, but
    /// Teams will not display the extras.
    ///
    /// # Errors
    ///
    /// Returns the first invalid action; nothing is added in that case.
    pub fn add_potential_action(
        &mut self,
        actions: impl IntoIterator<Item = PotentialAction>,
    ) -> Result<(), CardError> {
        add_potential_actions(&mut self.potential_actions, actions, "card")
    }

    /// Check the type tag, the text-or-summary rule and every section.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.kind != MESSAGE_CARD_TYPE {
            return Err(CardError::InvalidType(format!(
                "invalid card type {:?}; expected {MESSAGE_CARD_TYPE:?}",
                self.kind
            )));
        }

        if is_blank(self.text.as_deref()) && is_blank(self.summary.as_deref()) {
            return Err(CardError::MissingValue(
                "invalid message card: summary or text field is required".to_string(),
            ));
        }

        for action in &self.potential_actions {
            action.validate()?;
        }

        for section in &self.sections {
            section.validate()?;
        }

        Ok(())
    }
}

impl TeamsMessage for MessageCard {
    fn format(&self) -> MessageFormat {
        MessageFormat::MessageCard
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

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

impl Section {
    /// An empty section with Markdown rendering enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            title: None,
            text: None,
            activity_image: None,
            activity_title: None,
            activity_subtitle: None,
            activity_text: None,
            hero_image: None,
            markdown: true,
            potential_actions: Vec::new(),
            facts: Vec::new(),
            images: Vec::new(),
            start_group: false,
        }
    }

    /// A section holding only `text`.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new()
        }
    }

    /// Whether every field that Teams renders is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_blank(self.title.as_deref())
            && is_blank(self.text.as_deref())
            && is_blank(self.activity_image.as_deref())
            && is_blank(self.activity_title.as_deref())
            && is_blank(self.activity_subtitle.as_deref())
            && is_blank(self.activity_text.as_deref())
            && self.hero_image.is_none()
            && self.potential_actions.is_empty()
            && self.facts.is_empty()
            && self.images.is_empty()
            && !self.start_group
    }

    /// Append facts. All are checked before any is added.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any fact has an empty name or value.
    pub fn add_fact(&mut self, facts: impl IntoIterator<Item = Fact>) -> Result<(), CardError> {
        let facts: Vec<Fact> = facts.into_iter().collect();
        for fact in &facts {
            fact.validate()?;
        }
        self.facts.extend(facts);
        Ok(())
    }

    /// Append one fact whose value is `values` joined with ", ".
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] for an empty key or no values.
    pub fn add_fact_from_key_value<I, S>(&mut self, key: &str, values: I) -> Result<(), CardError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if key.is_empty() {
            return Err(CardError::MissingValue(
                "empty key received for new fact".to_string(),
            ));
        }

        let values: Vec<S> = values.into_iter().collect();
        if values.is_empty() {
            return Err(CardError::MissingValue(format!(
                "no values received for new fact {key:?}"
            )));
        }

        let value = values
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ");
        self.add_fact([Fact::new(key, value)])
    }

    /// Append images. All are checked before any is added.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if any image has an empty URL or title.
    pub fn add_image(
        &mut self,
        images: impl IntoIterator<Item = SectionImage>,
    ) -> Result<(), CardError> {
        let images: Vec<SectionImage> = images.into_iter().collect();
        for image in &images {
            image.validate()?;
        }
        self.images.extend(images);
        Ok(())
    }

    /// Set the hero image.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if the URL or title is empty.
    pub fn add_hero_image(&mut self, image: SectionImage) -> Result<(), CardError> {
        image.validate()?;
        self.hero_image = Some(image);
        Ok(())
    }

    /// Set the hero image from a URL and title.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if either argument is empty.
    pub fn add_hero_image_str(&mut self, url: &str, title: &str) -> Result<(), CardError> {
        self.add_hero_image(SectionImage {
            image: url.to_string(),
            title: title.to_string(),
        })
    }

    /// Append section action buttons.
    ///
    /// More than [`POTENTIAL_ACTION_MAX_SUPPORTED`] actions are accepted, but
    /// Teams will not display the extras.
    ///
    /// # Errors
    ///
    /// Returns the first invalid action; nothing is added in that case.
    pub fn add_potential_action(
        &mut self,
        actions: impl IntoIterator<Item = PotentialAction>,
    ) -> Result<(), CardError> {
        add_potential_actions(&mut self.potential_actions, actions, "section")
    }

    fn validate(&self) -> Result<(), CardError> {
        for fact in &self.facts {
            fact.validate()?;
        }
        for image in self.images.iter().chain(self.hero_image.as_ref()) {
            image.validate()?;
        }
        for action in &self.potential_actions {
            action.validate()?;
        }
        Ok(())
    }
}

impl Fact {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> Result<(), CardError> {
        if self.name.is_empty() {
            return Err(CardError::MissingValue(format!(
                "empty Name field received for new fact: {self:?}"
            )));
        }
        if self.value.is_empty() {
            return Err(CardError::MissingValue(format!(
                "empty Value field received for new fact: {self:?}"
            )));
        }
        Ok(())
    }
}

impl SectionImage {
    fn validate(&self) -> Result<(), CardError> {
        if self.image.is_empty() {
            return Err(CardError::MissingValue(
                "cannot add empty image URL".to_string(),
            ));
        }
        if self.title.is_empty() {
            return Err(CardError::MissingValue(
                "cannot add empty image title".to_string(),
            ));
        }
        Ok(())
    }
}

impl PotentialAction {
    /// An `OpenUri` button pointing at `url` on every platform.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if `name` or `url` is empty.
    pub fn open_uri(name: impl Into<String>, url: impl Into<String>) -> Result<Self, CardError> {
        let action = Self {
            kind: PotentialActionType::OpenUri,
            name: name.into(),
            targets: vec![ActionTarget {
                os: "default".to_string(),
                uri: url.into(),
            }],
            target: None,
            body: None,
            body_content_type: None,
        };
        action.validate()?;
        Ok(action)
    }

    /// An `HttpPOST` button that posts `body` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::MissingValue`] if `name` or `target` is empty.
    pub fn http_post(
        name: impl Into<String>,
        target: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, CardError> {
        let action = Self {
            kind: PotentialActionType::HttpPost,
            name: name.into(),
            targets: Vec::new(),
            target: Some(target.into()),
            body: Some(body.into()),
            body_content_type: None,
        };
        action.validate()?;
        Ok(action)
    }

    fn validate(&self) -> Result<(), CardError> {
        if self.name.is_empty() {
            return Err(CardError::MissingValue(
                "potential action name is empty".to_string(),
            ));
        }

        match self.kind {
            PotentialActionType::OpenUri => {
                if self.targets.is_empty() {
                    return Err(CardError::MissingValue(format!(
                        "OpenUri action {:?} has no targets",
                        self.name
                    )));
                }
                for target in &self.targets {
                    if !POTENTIAL_ACTION_TARGET_OS.contains(&target.os.as_str()) {
                        return Err(CardError::InvalidFieldValue(format!(
                            "invalid target os {:?}; expected one of {POTENTIAL_ACTION_TARGET_OS:?}",
                            target.os
                        )));
                    }
                    if target.uri.is_empty() {
                        return Err(CardError::MissingValue(format!(
                            "OpenUri action {:?} has an empty target URI",
                            self.name
                        )));
                    }
                }
            }
            PotentialActionType::HttpPost => {
                if is_blank(self.target.as_deref()) {
                    return Err(CardError::MissingValue(format!(
                        "HttpPOST action {:?} has no target",
                        self.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn add_potential_actions(
    existing: &mut Vec<PotentialAction>,
    actions: impl IntoIterator<Item = PotentialAction>,
    owner: &str,
) -> Result<(), CardError> {
    let actions: Vec<PotentialAction> = actions.into_iter().collect();
    for action in &actions {
        action.validate()?;
    }

    let total = existing.len() + actions.len();
    if total > POTENTIAL_ACTION_MAX_SUPPORTED {
        warn!(
            owner,
            total,
            limit = POTENTIAL_ACTION_MAX_SUPPORTED,
            "More potential actions than Teams displays"
        );
    }

    existing.extend(actions);
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    matches!(value, None | Some(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_or_summary_required() {
        let mut card = MessageCard::new();
        card.title = Some("Build Failed".to_string());
        let err = card.validate().unwrap_err();
        assert!(matches!(err, CardError::MissingValue(_)));
        assert!(err.to_string().contains("summary or text field is required"));

        card.summary = Some("build".to_string());
        assert_eq!(card.validate(), Ok(()));

        card.summary = None;
        card.text = Some("job #42".to_string());
        assert_eq!(card.validate(), Ok(()));
    }

    #[test]
    fn test_empty_strings_do_not_count_as_text() {
        let mut card = MessageCard::new();
        card.text = Some(String::new());
        card.summary = Some(String::new());
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_wrong_type_tag() {
        let mut card = MessageCard::with_text("t", "x");
        card.kind = "AdaptiveCard".to_string();
        assert!(matches!(card.validate(), Err(CardError::InvalidType(_))));
    }

    #[test]
    fn test_nil_section_silently_dropped() {
        let mut card = MessageCard::with_text("t", "x");
        assert_eq!(card.add_section(None), Ok(()));
        assert!(card.sections.is_empty());

        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("sections").is_none());
    }

    #[test]
    fn test_empty_section_rejected() {
        let mut card = MessageCard::with_text("t", "x");
        let err = card.add_section(Section::new()).unwrap_err();
        assert!(matches!(err, CardError::MissingValue(_)));
        assert!(card.sections.is_empty());

        let mut trailer = Section::with_text("Message delivered by teams-send");
        trailer.start_group = true;
        card.add_section(trailer).unwrap();
        assert_eq!(card.sections.len(), 1);
    }

    #[test]
    fn test_add_fact_is_atomic() {
        let mut section = Section::new();
        section.add_fact([Fact::new("Host", "web01")]).unwrap();

        let err = section
            .add_fact([Fact::new("Service", "http"), Fact::new("State", "")])
            .unwrap_err();
        assert!(matches!(err, CardError::MissingValue(_)));
        assert_eq!(section.facts, vec![Fact::new("Host", "web01")]);

        assert!(section.add_fact([Fact::new("", "value")]).is_err());
        assert_eq!(section.facts.len(), 1);
    }

    #[test]
    fn test_add_fact_from_key_value_joins_values() {
        let mut section = Section::new();
        section
            .add_fact_from_key_value("Hosts", ["web01", "web02"])
            .unwrap();
        assert_eq!(section.facts, vec![Fact::new("Hosts", "web01, web02")]);

        assert!(section.add_fact_from_key_value("", ["x"]).is_err());
        assert!(section
            .add_fact_from_key_value("Empty", Vec::<String>::new())
            .is_err());
    }

    #[test]
    fn test_images_require_url_and_title() {
        let mut section = Section::new();
        assert!(section.add_hero_image_str("", "Graph").is_err());
        assert!(section.hero_image.is_none());

        section
            .add_hero_image_str("https://example.com/graph.png", "Graph")
            .unwrap();
        assert!(section
            .add_image([SectionImage {
                image: "https://example.com/a.png".to_string(),
                title: String::new(),
            }])
            .is_err());
        assert!(section.images.is_empty());
    }

    #[test]
    fn test_potential_actions_keep_order_and_exceed_limit() {
        let mut section = Section::new();
        let actions = (1..=5)
            .map(|i| PotentialAction::open_uri(format!("Link {i}"), format!("https://example.com/{i}")))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        section.add_potential_action(actions).unwrap();
        assert_eq!(section.potential_actions.len(), 5);
        assert_eq!(section.potential_actions[0].name, "Link 1");
        assert_eq!(section.potential_actions[4].name, "Link 5");
    }

    #[test]
    fn test_open_uri_requires_url() {
        assert!(PotentialAction::open_uri("Logs", "").is_err());
        assert!(PotentialAction::open_uri("", "https://example.com").is_err());
        assert!(PotentialAction::http_post("Ack", "", "{}").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let mut card = MessageCard::with_text("Build Failed", "job #42");
        card.theme_color = Some("#832561".to_string());

        let mut links = Section::new();
        links
            .add_potential_action([
                PotentialAction::open_uri("Logs", "https://ci.example.com/42/logs").unwrap(),
                PotentialAction::open_uri("Dashboard", "https://ci.example.com/dash").unwrap(),
            ])
            .unwrap();
        card.add_section(links).unwrap();

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["@type"], "MessageCard");
        assert_eq!(json["@context"], "https://schema.org/extensions");
        assert_eq!(json["themeColor"], "#832561");
        assert!(json.get("summary").is_none());

        let actions = json["sections"][0]["potentialAction"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0]["@type"], "OpenUri");
        assert_eq!(actions[0]["name"], "Logs");
        assert_eq!(actions[0]["targets"][0]["uri"], "https://ci.example.com/42/logs");
        assert_eq!(actions[1]["name"], "Dashboard");
        assert_eq!(json["sections"][0]["markdown"], true);
        assert_eq!(json["sections"][0]["startGroup"], false);
    }

    #[test]
    fn test_prepare_then_pretty_print_round_trips() {
        let mut card = MessageCard::with_text("Build Failed", "job #42");
        card.theme_color = Some("#832561".to_string());
        card.add_section(Section::with_text("trailer")).unwrap();

        assert_eq!(card.pretty_print(), "");
        card.prepare().unwrap();

        let pretty = card.pretty_print();
        assert!(pretty.contains("\n\t\"@type\": \"MessageCard\""));

        let parsed: MessageCard = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Build Failed"));
        assert_eq!(parsed.text.as_deref(), Some("job #42"));
        assert_eq!(parsed.theme_color.as_deref(), Some("#832561"));
        assert_eq!(parsed.sections.len(), 1);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let card = MessageCard::new();
        let first = card.validate();
        let second = card.validate();
        assert_eq!(first, second);
        assert!(first.is_err());
    }
}
