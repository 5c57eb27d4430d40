//! An ordered list of events with mixed content types.

use crate::codec::content::Content;
use crate::codec::event::Event;
use crate::model::content::EventContent;
use crate::model::envelope::Envelope;

/// Events in insertion order.
///
/// No deduplication is done: two entries may share an `event_id`. The list
/// is a plain owned value; share it across threads behind a lock.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Appends content under an envelope.
    pub fn push_content(&mut self, envelope: Envelope, content: impl Into<Content>) {
        self.events.push(Event::new(envelope, content.into()));
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Events whose content is `T`, with the content downcast.
    pub fn iter_of<T: EventContent>(&self) -> impl Iterator<Item = (&Event, &T)> + '_ {
        self.events
            .iter()
            .filter_map(|event| event.content.downcast_ref::<T>().map(|content| (event, content)))
    }

    /// First event with the given id.
    pub fn find_by_event_id(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.event_id() == Some(event_id))
    }

    /// Most recently appended state event for `(event_type, state_key)`.
    pub fn latest_state(&self, event_type: &str, state_key: &str) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|e| e.event_type() == event_type && e.state_key() == Some(state_key))
    }
}

impl FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl Extend<Event> for EventList {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

impl IntoIterator for EventList {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
