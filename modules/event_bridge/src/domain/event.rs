/// Channel used when a request does not name one.
pub const DEFAULT_TOPIC: &str = "nexus.mesh.events";

/// Transport-agnostic event: a topic and an opaque payload carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    pub topic: String,
    pub payload: String,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Fill in [`DEFAULT_TOPIC`] when the topic is empty. Only the empty
    /// string counts as missing; whitespace is a (strange) topic name.
    pub fn normalized(mut self) -> Self {
        if self.topic.is_empty() {
            self.topic = DEFAULT_TOPIC.to_owned();
        }
        self
    }
}
