//! LINE wire format for outgoing messages.

use serde::Serialize;

use crate::reply::{Action, CarouselColumn, ReplyMessage};

const CAROUSEL_ALT_TEXT: &str = "this is a carousel template";
const IMAGE_BACKGROUND_COLOR: &str = "#FFFFFF";

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineMessage {
    Text {
        text: String,
    },
    Template {
        #[serde(rename = "altText")]
        alt_text: String,
        template: Template,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(rename = "type")]
    kind: &'static str,
    columns: Vec<Column>,
    image_aspect_ratio: &'static str,
    image_size: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    thumbnail_image_url: String,
    image_background_color: &'static str,
    title: String,
    text: String,
    actions: Vec<LineAction>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineAction {
    Message { label: String, text: String },
    Uri { label: String, uri: String },
}

/// Body of `POST /v2/bot/message/reply`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<LineMessage>,
}

impl From<&ReplyMessage> for LineMessage {
    fn from(reply: &ReplyMessage) -> Self {
        match reply {
            ReplyMessage::PlainText { body } => LineMessage::Text { text: body.clone() },
            ReplyMessage::Carousel { columns } => LineMessage::Template {
                alt_text: CAROUSEL_ALT_TEXT.to_string(),
                template: Template {
                    kind: "carousel",
                    columns: columns.iter().map(Column::from).collect(),
                    image_aspect_ratio: "rectangle",
                    image_size: "cover",
                },
            },
        }
    }
}

impl From<&CarouselColumn> for Column {
    fn from(column: &CarouselColumn) -> Self {
        Column {
            // A missing image goes out as an empty string; the column stays.
            thumbnail_image_url: column.image_url.clone().unwrap_or_default(),
            image_background_color: IMAGE_BACKGROUND_COLOR,
            title: column.title.clone(),
            text: column.text.clone(),
            actions: column.actions.iter().map(LineAction::from).collect(),
        }
    }
}

impl From<&Action> for LineAction {
    fn from(action: &Action) -> Self {
        match action {
            Action::Message { label, text } => LineAction::Message {
                label: label.clone(),
                text: text.clone(),
            },
            Action::Uri { label, uri } => LineAction::Uri {
                label: label.clone(),
                uri: uri.clone(),
            },
        }
    }
}
