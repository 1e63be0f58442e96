//! Turn a validated [`Config`] into a Teams message and submit it.

use std::sync::Arc;

use teams_notify::adaptivecard::{
    Action, Card, Element, Mention, Message, TextSize, TEAMS_ACTIONS_DISPLAY_LIMIT,
};
use teams_notify::format::convert_eol_to_break;
use teams_notify::messagecard::{PotentialAction, Section};
use teams_notify::{
    CardError, Client, Error, MessageCard, SendContext, TeamsMessage, TracingObserver,
};
use tracing::debug;

use crate::branding::message_trailer;
use crate::config::{CardFormat, Config};

/// A message in whichever format the user asked for.
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    MessageCard(MessageCard),
    AdaptiveCard(Message),
}

impl OutgoingMessage {
    /// Serialize the message so [`pretty_print`](Self::pretty_print) has
    /// something to show.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the message cannot be encoded.
    pub fn prepare(&mut self) -> Result<(), Error> {
        match self {
            Self::MessageCard(card) => card.prepare(),
            Self::AdaptiveCard(message) => message.prepare(),
        }
    }

    #[must_use]
    pub fn pretty_print(&self) -> String {
        match self {
            Self::MessageCard(card) => card.pretty_print(),
            Self::AdaptiveCard(message) => message.pretty_print(),
        }
    }
}

/// Build the message described by `config`.
///
/// # Errors
///
/// Returns the first card construction error.
pub fn build_message(config: &Config) -> Result<OutgoingMessage, CardError> {
    let text = if config.convert_eol {
        convert_eol_to_break(&config.message)
    } else {
        config.message.clone()
    };

    let trailer = (!config.no_branding).then(|| message_trailer(&config.sender));

    match config.format {
        CardFormat::MessageCard => {
            build_message_card(config, text, trailer).map(OutgoingMessage::MessageCard)
        }
        CardFormat::AdaptiveCard => {
            build_adaptive_card(config, &text, trailer).map(OutgoingMessage::AdaptiveCard)
        }
    }
}

fn build_message_card(
    config: &Config,
    text: String,
    trailer: Option<String>,
) -> Result<MessageCard, CardError> {
    let mut card = MessageCard::with_text(&config.title, text);
    card.theme_color = Some(config.color.clone());

    if !config.target_urls.is_empty() {
        let actions = config
            .target_urls
            .iter()
            .map(|target| PotentialAction::open_uri(&target.description, target.url.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut links = Section::new();
        links.add_potential_action(actions)?;
        card.add_section(links)?;
    }

    if let Some(trailer) = trailer {
        let mut branding = Section::with_text(trailer);
        branding.start_group = true;
        card.add_section(branding)?;
    }

    Ok(card)
}

fn build_adaptive_card(
    config: &Config,
    text: &str,
    trailer: Option<String>,
) -> Result<Message, CardError> {
    let mut card = Card::text_block_card(text, &config.title, true)?;

    if !config.user_mentions.is_empty() {
        let mentions = config
            .user_mentions
            .iter()
            .map(|user| Mention::new(&user.name, &user.id))
            .collect::<Result<Vec<_>, _>>()?;
        card.add_mention(false, mentions)?;
    }

    if !config.target_urls.is_empty() {
        let actions = config
            .target_urls
            .iter()
            .map(|target| Action::open_url(target.url.as_str(), &target.description))
            .collect::<Result<Vec<_>, _>>()?;

        if actions.len() <= TEAMS_ACTIONS_DISPLAY_LIMIT {
            card.add_action(false, actions)?;
        } else {
            debug!(
                count = actions.len(),
                limit = TEAMS_ACTIONS_DISPLAY_LIMIT,
                "Too many target URLs for card actions, using action sets"
            );
            let mut links = Element::container();
            links.add_actions(false, actions)?;
            card.add_container(false, links)?;
        }
    }

    if let Some(trailer) = trailer {
        let branding = Element::text_block(trailer, true)
            .with_separator()
            .with_size(TextSize::Small);
        card.add_element(false, vec![branding])?;
    }

    card.set_full_width();
    Message::from_card(card)
}

/// A client that logs delivery progress and validates webhooks the way
/// `config` asks.
///
/// # Errors
///
/// Returns [`Error::Http`] if the HTTP client cannot be built.
pub fn client_for(config: &Config) -> Result<Client, Error> {
    Client::builder()
        .webhook_validation(config.webhook_validation())
        .observer(Arc::new(TracingObserver))
        .build()
}

/// Deliver `message` under the retry policy and overall deadline from
/// `config`.
///
/// # Errors
///
/// Returns the validation, delivery or abort error from the client.
pub async fn submit(
    config: &Config,
    client: &Client,
    message: &mut OutgoingMessage,
) -> Result<(), Error> {
    let ctx = SendContext::with_timeout(config.submission_timeout());
    let policy = config.retry_policy();

    match message {
        OutgoingMessage::MessageCard(card) => {
            client
                .send_with_retry(&ctx, &config.webhook_url, card, policy)
                .await
        }
        OutgoingMessage::AdaptiveCard(message) => {
            client
                .send_with_retry(&ctx, &config.webhook_url, message, policy)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serde_json::Value;

    use super::*;

    const WEBHOOK: &str = "https://outlook.office.com/webhook/a1269812-6d10-44b1-abc5-b84f93580ba0@9e7b80c7-d1eb-4b52-8582-76f921e416d9/IncomingWebhook/3fdd6767bae44ac58e5995547d66a4e4/f332c8d9-3397-4ac5-957b-b8e3fc465a8c";

    fn config(extra: &[&str]) -> Config {
        let mut args = vec![
            "teams-send",
            "--url",
            WEBHOOK,
            "--title",
            "Build Failed",
            "--message",
            "job #42",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    fn json(message: &mut OutgoingMessage) -> Value {
        message.prepare().unwrap();
        serde_json::from_str(&message.pretty_print()).unwrap()
    }

    #[test]
    fn test_message_card_without_branding() {
        let mut message = build_message(&config(&["--no-branding"])).unwrap();
        let value = json(&mut message);

        assert_eq!(value["@type"], "MessageCard");
        assert_eq!(value["title"], "Build Failed");
        assert_eq!(value["text"], "job #42");
        assert_eq!(value["themeColor"], "#832561");
        assert!(value.get("sections").is_none());
    }

    #[test]
    fn test_message_card_links_and_trailer() {
        let mut message = build_message(&config(&[
            "--target-url",
            "https://ci.example.com/logs, Logs",
            "--target-url",
            "https://ci.example.com/dash, Dashboard",
            "--sender",
            "nightly-ci",
        ]))
        .unwrap();
        let value = json(&mut message);

        let sections = value["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["potentialAction"][0]["name"], "Logs");
        assert_eq!(sections[0]["potentialAction"][1]["name"], "Dashboard");
        assert_eq!(sections[1]["startGroup"], true);
        let trailer = sections[1]["text"].as_str().unwrap();
        assert!(trailer.starts_with("Message delivered by [teams-send]"));
        assert!(trailer.ends_with(" on behalf of nightly-ci"));
    }

    #[test]
    fn test_convert_eol() {
        let mut cfg = config(&["--convert-eol", "--no-branding"]);
        cfg.message = "line one\r\nline two\nline three".to_string();

        let OutgoingMessage::MessageCard(card) = build_message(&cfg).unwrap() else {
            panic!("expected a MessageCard");
        };
        assert_eq!(
            card.text.as_deref(),
            Some("line one<br>line two<br>line three")
        );
    }

    #[test]
    fn test_adaptive_card_with_mentions_and_links() {
        let mut message = build_message(&config(&[
            "--format",
            "adaptivecard",
            "--user-mention",
            "Jane Doe, jane@example.com",
            "--target-url",
            "https://ci.example.com/logs, Logs",
        ]))
        .unwrap();
        let value = json(&mut message);

        assert_eq!(value["type"], "message");
        let card = &value["attachments"][0]["content"];
        assert_eq!(card["msteams"]["width"], "Full");
        assert_eq!(card["msteams"]["entities"][0]["text"], "<at>Jane Doe</at>");

        let body = card["body"].as_array().unwrap();
        assert_eq!(body[0]["text"], "Build Failed");
        assert_eq!(body[1]["text"], "job #42");
        assert_eq!(body[2]["text"], "<at>Jane Doe</at>");
        assert_eq!(body[3]["separator"], true);
        assert_eq!(body[3]["size"], "small");

        assert_eq!(card["actions"][0]["type"], "Action.OpenUrl");
        assert_eq!(card["actions"][0]["title"], "Logs");
    }

    #[test]
    fn test_adaptive_card_pages_many_links_into_action_sets() {
        let links: Vec<String> = (1..=8)
            .map(|i| format!("https://ci.example.com/{i}, Link {i}"))
            .collect();
        let mut args = vec!["--format", "adaptivecard", "--no-branding"];
        for link in &links {
            args.push("--target-url");
            args.push(link.as_str());
        }

        let OutgoingMessage::AdaptiveCard(message) = build_message(&config(&args)).unwrap() else {
            panic!("expected an adaptive card");
        };
        let card = &message.attachments[0].content;
        assert!(card.actions.is_empty());

        let container = card.body.last().unwrap();
        let set_sizes: Vec<usize> = container.items.iter().map(|set| set.actions.len()).collect();
        assert_eq!(set_sizes, vec![6, 2]);
        message.validate().unwrap();
    }
}
