//! Poll start content (MSC3381).
//!
//! Polls were sent under the `org.matrix.msc3381.poll.start` prefix before the
//! stable `m.poll.start` name existed. Both decode to the same type.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{
    Binding, ContentFamily, EventContent, EventKind, HasEditSupport, HasRelation, NEW_CONTENT,
    RELATES_TO, RelatesTo, TIMELINE_CONTENT_SHAPE,
};
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

/// Poll kind whose results are visible while voting.
pub const POLL_DISCLOSED: &str = "m.disclosed";
/// Poll kind whose results are revealed when it ends.
pub const POLL_UNDISCLOSED: &str = "m.undisclosed";

const TEXT_LIST: FieldKind = FieldKind::List(&FieldKind::Record(TextRepresentation::shape));

static SHAPE: Shape = Shape {
    name: "PollStartEventContent",
    parent: Some(&TIMELINE_CONTENT_SHAPE),
    fields: &[
        FieldShape::new("m.poll", FieldKind::Record(PollBlock::shape)),
        FieldShape::new("m.text", TEXT_LIST),
    ],
};

static POLL_BLOCK_SHAPE: Shape = Shape {
    name: "PollBlock",
    parent: None,
    fields: &[
        FieldShape::scalar("kind"),
        FieldShape::scalar("max_selections"),
        FieldShape::new("question", FieldKind::Record(PollQuestion::shape)),
        FieldShape::new("answers", FieldKind::List(&FieldKind::Record(PollAnswer::shape))),
    ],
};

static POLL_QUESTION_SHAPE: Shape = Shape {
    name: "PollQuestion",
    parent: None,
    fields: &[FieldShape::new("m.text", TEXT_LIST)],
};

static POLL_ANSWER_SHAPE: Shape = Shape {
    name: "PollAnswer",
    parent: None,
    fields: &[FieldShape::scalar("m.id"), FieldShape::new("m.text", TEXT_LIST)],
};

static TEXT_REPRESENTATION_SHAPE: Shape = Shape {
    name: "TextRepresentation",
    parent: None,
    fields: &[FieldShape::scalar("body"), FieldShape::scalar("mimetype")],
};

/// Start of a poll.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollStartEventContent {
    pub poll: Option<PollBlock>,
    /// Text fallback for clients without poll support.
    pub text: Option<Vec<TextRepresentation>>,
    pub relates_to: Option<RelatesTo>,
    pub new_content: Option<Box<PollStartEventContent>>,
    pub extra: JsonObject,
}

impl PollStartEventContent {
    /// A disclosed single-choice poll with a plain-text fallback.
    pub fn new(question: impl Into<String>, answers: &[(&str, &str)]) -> Self {
        let question = question.into();
        let fallback = std::iter::once(question.clone())
            .chain(answers.iter().enumerate().map(|(i, (_, text))| format!("{}. {text}", i + 1)))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            poll: Some(PollBlock {
                kind: Some(POLL_DISCLOSED.to_string()),
                max_selections: Some(1),
                question: Some(PollQuestion {
                    text: Some(vec![TextRepresentation::plain(question)]),
                    extra: JsonObject::new(),
                }),
                answers: Some(
                    answers
                        .iter()
                        .map(|(id, text)| PollAnswer {
                            id: Some((*id).to_string()),
                            text: Some(vec![TextRepresentation::plain(*text)]),
                            extra: JsonObject::new(),
                        })
                        .collect(),
                ),
                extra: JsonObject::new(),
            }),
            text: Some(vec![TextRepresentation::plain(fallback)]),
            ..Self::default()
        }
    }

    /// The plain-text question, if present.
    pub fn question(&self) -> Option<&str> {
        let question = self.poll.as_ref()?.question.as_ref()?;
        first_plain(question.text.as_deref())
    }

    /// Answer ids in order.
    pub fn answer_ids(&self) -> Vec<&str> {
        self.poll
            .as_ref()
            .and_then(|p| p.answers.as_deref())
            .unwrap_or_default()
            .iter()
            .filter_map(|a| a.id.as_deref())
            .collect()
    }
}

fn first_plain(text: Option<&[TextRepresentation]>) -> Option<&str> {
    let text = text?;
    text.iter()
        .find(|t| t.mimetype.as_deref().is_none_or(|m| m == "text/plain"))
        .or_else(|| text.first())
        .and_then(|t| t.body.as_deref())
}

impl Record for PollStartEventContent {
    fn shape() -> &'static Shape {
        &SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            poll: fields.take_record("m.poll"),
            text: fields.take_records("m.text"),
            relates_to: fields.take_record(RELATES_TO),
            new_content: fields.take_record(NEW_CONTENT).map(Box::new),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put_record("m.poll", self.poll.as_ref());
        out.put_records("m.text", self.text.as_deref());
        out.put_record(RELATES_TO, self.relates_to.as_ref());
        out.put_record(NEW_CONTENT, self.new_content.as_deref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for PollStartEventContent {
    const BINDINGS: &'static [Binding] = &[
        Binding::current("m.poll.start"),
        Binding::legacy("org.matrix.msc3381.poll.start"),
    ];
    const FAMILY: ContentFamily = ContentFamily::Timeline;
    const KIND: EventKind = EventKind::Message;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for PollStartEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

impl HasEditSupport for PollStartEventContent {
    fn new_content(&self) -> Option<&Self> {
        self.new_content.as_deref()
    }

    fn new_content_mut(&mut self) -> &mut Option<Box<Self>> {
        &mut self.new_content
    }
}

/// The `m.poll` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollBlock {
    pub kind: Option<String>,
    pub max_selections: Option<u64>,
    pub question: Option<PollQuestion>,
    pub answers: Option<Vec<PollAnswer>>,
    pub extra: JsonObject,
}

impl Record for PollBlock {
    fn shape() -> &'static Shape {
        &POLL_BLOCK_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            kind: fields.take("kind"),
            max_selections: fields.take("max_selections"),
            question: fields.take_record("question"),
            answers: fields.take_records("answers"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("kind", &self.kind);
        out.put("max_selections", &self.max_selections);
        out.put_record("question", self.question.as_ref());
        out.put_records("answers", self.answers.as_deref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollQuestion {
    pub text: Option<Vec<TextRepresentation>>,
    pub extra: JsonObject,
}

impl Record for PollQuestion {
    fn shape() -> &'static Shape {
        &POLL_QUESTION_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            text: fields.take_records("m.text"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put_records("m.text", self.text.as_deref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollAnswer {
    pub id: Option<String>,
    pub text: Option<Vec<TextRepresentation>>,
    pub extra: JsonObject,
}

impl Record for PollAnswer {
    fn shape() -> &'static Shape {
        &POLL_ANSWER_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            id: fields.take("m.id"),
            text: fields.take_records("m.text"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("m.id", &self.id);
        out.put_records("m.text", self.text.as_deref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

/// One representation of a piece of text (extensible events).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRepresentation {
    pub body: Option<String>,
    pub mimetype: Option<String>,
    pub extra: JsonObject,
}

impl TextRepresentation {
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }
}

impl Record for TextRepresentation {
    fn shape() -> &'static Shape {
        &TEXT_REPRESENTATION_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            body: fields.take("body"),
            mimetype: fields.take("mimetype"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("body", &self.body);
        out.put("mimetype", &self.mimetype);
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}
