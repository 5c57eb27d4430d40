//! `m.room.message` content.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{
    Binding, ContentFamily, EventContent, EventKind, HasEditSupport, HasRelation, NEW_CONTENT,
    RELATES_TO, RelatesTo, TIMELINE_CONTENT_SHAPE,
};
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

/// `msgtype` for plain text.
pub const MSGTYPE_TEXT: &str = "m.text";
/// `msgtype` for notices (bot output).
pub const MSGTYPE_NOTICE: &str = "m.notice";
/// `msgtype` for emotes (`/me`).
pub const MSGTYPE_EMOTE: &str = "m.emote";
/// The only `format` currently defined.
pub const FORMAT_HTML: &str = "org.matrix.custom.html";

static SHAPE: Shape = Shape {
    name: "RoomMessageEventContent",
    parent: Some(&TIMELINE_CONTENT_SHAPE),
    fields: &[
        FieldShape::scalar("msgtype"),
        FieldShape::scalar("body"),
        FieldShape::scalar("format"),
        FieldShape::scalar("formatted_body"),
        FieldShape::scalar("url"),
        FieldShape::new("info", FieldKind::Opaque),
    ],
};

/// A room message: text, notice, emote or media.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomMessageEventContent {
    pub msgtype: Option<String>,
    /// Plain-text body. Edits keep the old body here for clients that do not
    /// understand `m.new_content`.
    pub body: Option<String>,
    pub format: Option<String>,
    pub formatted_body: Option<String>,
    /// `mxc://` URI for media messages.
    pub url: Option<String>,
    /// Media metadata, kept verbatim.
    pub info: Option<serde_json::Value>,
    pub relates_to: Option<RelatesTo>,
    pub new_content: Option<Box<RoomMessageEventContent>>,
    pub extra: JsonObject,
}

impl RoomMessageEventContent {
    pub fn new(msgtype: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            msgtype: Some(msgtype.into()),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn text_plain(body: impl Into<String>) -> Self {
        Self::new(MSGTYPE_TEXT, body)
    }

    pub fn text_html(body: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            format: Some(FORMAT_HTML.to_string()),
            formatted_body: Some(html.into()),
            ..Self::text_plain(body)
        }
    }

    pub fn notice(body: impl Into<String>) -> Self {
        Self::new(MSGTYPE_NOTICE, body)
    }

    pub fn emote(body: impl Into<String>) -> Self {
        Self::new(MSGTYPE_EMOTE, body)
    }
}

impl Record for RoomMessageEventContent {
    fn shape() -> &'static Shape {
        &SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            msgtype: fields.take("msgtype"),
            body: fields.take("body"),
            format: fields.take("format"),
            formatted_body: fields.take("formatted_body"),
            url: fields.take("url"),
            info: fields.take("info"),
            relates_to: fields.take_record(RELATES_TO),
            new_content: fields.take_record(NEW_CONTENT).map(Box::new),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("msgtype", &self.msgtype);
        out.put("body", &self.body);
        out.put("format", &self.format);
        out.put("formatted_body", &self.formatted_body);
        out.put("url", &self.url);
        out.put("info", &self.info);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
        out.put_record(NEW_CONTENT, self.new_content.as_deref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomMessageEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.message")];
    const FAMILY: ContentFamily = ContentFamily::Timeline;
    const KIND: EventKind = EventKind::Message;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomMessageEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

impl HasEditSupport for RoomMessageEventContent {
    fn new_content(&self) -> Option<&Self> {
        self.new_content.as_deref()
    }

    fn new_content_mut(&mut self) -> &mut Option<Box<Self>> {
        &mut self.new_content
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_round_trip_with_unknown_fields() {
        let raw = object(json!({
            "msgtype": "m.text",
            "body": "hello",
            "m.mentions": {"user_ids": ["@a:example.org"]},
            "io.element.extra": 1
        }));
        let content = RoomMessageEventContent::from_object(raw.clone());
        assert_eq!(content.body.as_deref(), Some("hello"));
        assert_eq!(content.extra.len(), 2);
        assert_eq!(content.to_object(), raw);
    }

    #[test]
    fn test_edit_relation() {
        let mut content = RoomMessageEventContent::text_plain("hello");
        content.extra.insert("x.custom".to_string(), json!(true));
        content.set_replace_relation("$abc");

        let encoded = Value::Object(content.to_object());
        assert_eq!(encoded["body"], json!("hello"));
        assert_eq!(encoded["m.new_content"]["body"], json!("hello"));
        assert_eq!(encoded["m.new_content"]["msgtype"], json!("m.text"));
        // Residue is not part of the replacement.
        assert!(encoded["m.new_content"].get("x.custom").is_none());
        assert_eq!(encoded["m.relates_to"]["rel_type"], json!("m.replace"));
        assert_eq!(encoded["m.relates_to"]["event_id"], json!("$abc"));
        assert_eq!(content.replaced_event(), Some("$abc"));
    }

    #[test]
    fn test_edit_of_edit_does_not_nest_new_content() {
        let mut content = RoomMessageEventContent::text_plain("v1");
        content.set_replace_relation("$one");
        content.body = Some("v2".to_string());
        content.set_replace_relation("$two");

        let new_content = content.new_content().map(|c| c.to_object());
        let new_content = new_content.unwrap_or_default();
        assert_eq!(new_content.get("body"), Some(&json!("v2")));
        assert!(!new_content.contains_key(NEW_CONTENT));
        assert!(!new_content.contains_key(RELATES_TO));
    }

    #[test]
    fn test_reply_keeps_existing_relation() {
        let mut content = RoomMessageEventContent::text_plain("reply");
        content.relates_to = Some(RelatesTo::new("m.thread", "$root"));
        content.set_reply_to("$parent");

        let relation = content.relates_to().cloned().unwrap_or_default();
        assert_eq!(relation.rel_type.as_deref(), Some("m.thread"));
        assert_eq!(relation.reply_target(), Some("$parent"));
    }

    #[test]
    fn test_html_constructor() {
        let content = RoomMessageEventContent::text_html("*hi*", "<em>hi</em>");
        assert_eq!(
            Value::Object(content.to_object()),
            json!({
                "msgtype": "m.text",
                "body": "*hi*",
                "format": "org.matrix.custom.html",
                "formatted_body": "<em>hi</em>"
            })
        );
    }
}
