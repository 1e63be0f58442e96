//! Body elements, columns, facts and the enums that constrain them.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::action::{action_sets_from_actions, Action};
use super::mention::Mention;
use super::validate;
use super::ADAPTIVE_CARD_MAX_VERSION;
use crate::error::CardError;

/// `type` value of a [`Column`].
pub const TYPE_COLUMN: &str = "Column";

/// Example shown when a pixel width is malformed.
pub const COLUMN_WIDTH_PIXEL_WIDTH_EXAMPLE: &str = "50px";

static COLUMN_WIDTH_PIXEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+px$").unwrap());

// =============================================================================
// Enumerations
// =============================================================================

/// Element kinds known to the Adaptive Card schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    ActionSet,
    ColumnSet,
    Container,
    FactSet,
    Image,
    ImageSet,
    #[serde(rename = "Input.ChoiceSet")]
    InputChoiceSet,
    #[serde(rename = "Input.Date")]
    InputDate,
    #[serde(rename = "Input.Number")]
    InputNumber,
    #[serde(rename = "Input.Text")]
    InputText,
    #[serde(rename = "Input.Time")]
    InputTime,
    #[serde(rename = "Input.Toggle")]
    InputToggle,
    Media,
    RichTextBlock,
    TextBlock,
    TextRun,
}

impl ElementType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActionSet => "ActionSet",
            Self::ColumnSet => "ColumnSet",
            Self::Container => "Container",
            Self::FactSet => "FactSet",
            Self::Image => "Image",
            Self::ImageSet => "ImageSet",
            Self::InputChoiceSet => "Input.ChoiceSet",
            Self::InputDate => "Input.Date",
            Self::InputNumber => "Input.Number",
            Self::InputText => "Input.Text",
            Self::InputTime => "Input.Time",
            Self::InputToggle => "Input.Toggle",
            Self::Media => "Media",
            Self::RichTextBlock => "RichTextBlock",
            Self::TextBlock => "TextBlock",
            Self::TextRun => "TextRun",
        }
    }

    /// Styles this element kind accepts. Empty means no style is allowed.
    #[must_use]
    pub const fn supported_styles(self) -> &'static [Style] {
        match self {
            Self::TextBlock => &[Style::Default, Style::Heading],
            Self::Container | Self::ColumnSet => &[
                Style::Default,
                Style::Emphasis,
                Style::Good,
                Style::Attention,
                Style::Warning,
                Style::Accent,
            ],
            Self::Image => &[Style::Default, Style::Person],
            Self::InputChoiceSet => &[Style::Compact, Style::Expanded, Style::Filtered],
            Self::InputText => &[
                Style::Text,
                Style::Tel,
                Style::Url,
                Style::Email,
                Style::Password,
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every style keyword. Which ones apply depends on the element kind; see
/// [`ElementType::supported_styles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    Default,
    Heading,
    Emphasis,
    Good,
    Attention,
    Warning,
    Accent,
    Person,
    Compact,
    Expanded,
    Filtered,
    Text,
    Tel,
    Url,
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextSize {
    Small,
    Default,
    Medium,
    Large,
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextWeight {
    Bolder,
    Lighter,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextColor {
    Default,
    Dark,
    Light,
    Accent,
    Good,
    Warning,
    Attention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Spacing {
    Default,
    None,
    Small,
    Medium,
    Large,
    ExtraLarge,
    Padding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalContentAlignment {
    Top,
    Center,
    Bottom,
}

/// Width of a [`Column`]: a keyword, a relative weight or a pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnWidth {
    Auto,
    Stretch,
    Weight(u32),
    /// Must match `^[0-9]+px$`.
    Pixels(String),
}

impl ColumnWidth {
    /// A pixel width such as `"50px"`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidFieldValue`] if `value` is not `<digits>px`.
    pub fn pixels(value: impl Into<String>) -> Result<Self, CardError> {
        let width = Self::Pixels(value.into());
        width.validate()?;
        Ok(width)
    }

    pub(crate) fn validate(&self) -> Result<(), CardError> {
        match self {
            Self::Pixels(value) if !COLUMN_WIDTH_PIXEL_REGEX.is_match(value.trim()) => {
                Err(CardError::InvalidFieldValue(format!(
                    "invalid pixel width {value:?}; expected value in format {COLUMN_WIDTH_PIXEL_WIDTH_EXAMPLE}"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Serialize for ColumnWidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Stretch => serializer.serialize_str("stretch"),
            Self::Weight(weight) => serializer.serialize_u32(*weight),
            Self::Pixels(value) => serializer.serialize_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnWidth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawWidth {
            Weight(u32),
            Keyword(String),
        }

        Ok(match RawWidth::deserialize(deserializer)? {
            RawWidth::Weight(weight) => Self::Weight(weight),
            RawWidth::Keyword(value) => match value.trim() {
                "auto" => Self::Auto,
                "stretch" => Self::Stretch,
                _ => Self::Pixels(value),
            },
        })
    }
}

// =============================================================================
// Element
// =============================================================================

/// One node of a card body.
///
/// All kinds share this struct; which fields matter depends on `kind`.
/// Containers need `items`, fact sets need `facts`, action sets need
/// `actions`, images need `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<TextSize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<TextWeight>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wrap: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
}

impl Element {
    /// A bare element of the given kind.
    #[must_use]
    pub const fn new(kind: ElementType) -> Self {
        Self {
            kind,
            id: None,
            text: None,
            url: None,
            size: None,
            weight: None,
            color: None,
            spacing: None,
            style: None,
            items: Vec::new(),
            columns: Vec::new(),
            actions: Vec::new(),
            facts: Vec::new(),
            wrap: false,
            separator: false,
        }
    }

    /// A `TextBlock` holding `text`.
    #[must_use]
    pub fn text_block(text: impl Into<String>, wrap: bool) -> Self {
        Self {
            text: Some(text.into()),
            wrap,
            ..Self::new(ElementType::TextBlock)
        }
    }

    /// A `TextBlock` styled as a heading, standing in for a card title.
    #[must_use]
    pub fn title_text_block(title: impl Into<String>, wrap: bool) -> Self {
        Self {
            style: Some(Style::Heading),
            size: Some(TextSize::Large),
            weight: Some(TextWeight::Bolder),
            ..Self::text_block(title, wrap)
        }
    }

    /// An empty `Container`.
    #[must_use]
    pub const fn container() -> Self {
        Self::new(ElementType::Container)
    }

    /// An empty `ActionSet`.
    #[must_use]
    pub const fn action_set() -> Self {
        Self::new(ElementType::ActionSet)
    }

    /// An empty `FactSet`.
    #[must_use]
    pub const fn fact_set() -> Self {
        Self::new(ElementType::FactSet)
    }

    /// An `ColumnSet` holding `columns`.
    #[must_use]
    pub fn column_set(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::new(ElementType::ColumnSet)
        }
    }

    /// An `Image` pointing at `url`.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(ElementType::Image)
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: TextSize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: TextWeight) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub const fn with_color(mut self, color: TextColor) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub const fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = Some(spacing);
        self
    }

    #[must_use]
    pub const fn with_separator(mut self) -> Self {
        self.separator = true;
        self
    }

    /// Append facts to a `FactSet`. All are checked before any is added.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidType`] on any other element kind and
    /// [`CardError::MissingValue`] for no facts or a fact with an empty
    /// title or value.
    pub fn add_fact(&mut self, facts: impl IntoIterator<Item = Fact>) -> Result<(), CardError> {
        if self.kind != ElementType::FactSet {
            return Err(CardError::InvalidType(format!(
                "unsupported element type {}; expected {}",
                self.kind,
                ElementType::FactSet
            )));
        }

        let facts: Vec<Fact> = facts.into_iter().collect();
        if facts.is_empty() {
            return Err(CardError::MissingValue(
                "received empty collection of facts".to_string(),
            ));
        }
        for fact in &facts {
            validate::validate(fact)?;
        }

        self.facts.extend(facts);
        Ok(())
    }

    /// Insert `element` into a `Container`, first if `prepend`, else last.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidType`] if this is not a container, or the
    /// first validation failure of `element`.
    pub fn add_item(&mut self, prepend: bool, element: Element) -> Result<(), CardError> {
        self.add_item_at_version(prepend, element, ADAPTIVE_CARD_MAX_VERSION)
    }

    /// Like [`add_item`](Self::add_item), validating `element` against the
    /// given card version, see [`Card::version_number`](super::Card::version_number).
    ///
    /// # Errors
    ///
    /// Same as [`add_item`](Self::add_item).
    pub fn add_item_at_version(
        &mut self,
        prepend: bool,
        element: Element,
        version: f64,
    ) -> Result<(), CardError> {
        self.expect_container()?;
        validate::Validator::new()
            .with_version(version)
            .validate(&element)?;

        if prepend {
            self.items.insert(0, element);
        } else {
            self.items.push(element);
        }
        Ok(())
    }

    /// Add `actions` to a `Container` as `ActionSet`s of at most
    /// [`TEAMS_ACTIONS_DISPLAY_LIMIT`](super::TEAMS_ACTIONS_DISPLAY_LIMIT)
    /// actions each.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidType`] if this is not a container, or the
    /// first invalid action.
    pub fn add_actions(&mut self, prepend: bool, actions: Vec<Action>) -> Result<(), CardError> {
        self.expect_container()?;
        let action_sets = action_sets_from_actions(actions)?;

        if prepend {
            self.items.splice(0..0, action_sets);
        } else {
            self.items.extend(action_sets);
        }
        Ok(())
    }

    /// Whether this element carries `mention`'s text where Teams looks for
    /// it: a `TextBlock`'s text, or a fact title or value of a `FactSet`.
    #[must_use]
    pub fn has_mention_text(&self, mention: &Mention) -> bool {
        match self.kind {
            ElementType::TextBlock => self
                .text
                .as_deref()
                .is_some_and(|text| text.contains(&mention.text)),
            ElementType::FactSet => self.facts.iter().any(|fact| {
                fact.title.contains(&mention.text) || fact.value.contains(&mention.text)
            }),
            _ => false,
        }
    }

    /// Depth-first search of this element and everything nested in it.
    pub(crate) fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.items
            .iter_mut()
            .chain(self.columns.iter_mut().flat_map(|column| column.items.iter_mut()))
            .find_map(|child| child.find_mut(id))
    }

    /// Direct children: container items and column items.
    pub(crate) fn children(&self) -> impl Iterator<Item = &Element> {
        self.items
            .iter()
            .chain(self.columns.iter().flat_map(|column| column.items.iter()))
    }

    fn expect_container(&self) -> Result<(), CardError> {
        if self.kind == ElementType::Container {
            Ok(())
        } else {
            Err(CardError::InvalidType(format!(
                "unsupported element type {}; expected {}",
                self.kind,
                ElementType::Container
            )))
        }
    }
}

// =============================================================================
// Column and Fact
// =============================================================================

/// A column of a `ColumnSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<ColumnWidth>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Element>,

    /// Invoked when the column is tapped. `Action.ShowCard` is not allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_action: Option<Box<Action>>,
}

impl Default for Column {
    fn default() -> Self {
        Self::new()
    }
}

impl Column {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: TYPE_COLUMN.to_string(),
            id: None,
            width: None,
            items: Vec::new(),
            select_action: None,
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    /// Append an element after validating it.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `element`.
    pub fn add_item(&mut self, element: Element) -> Result<(), CardError> {
        validate::validate(&element)?;
        self.items.push(element);
        Ok(())
    }
}

/// A title/value pair in a `FactSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub title: String,
    pub value: String,
}

impl Fact {
    #[must_use]
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}
