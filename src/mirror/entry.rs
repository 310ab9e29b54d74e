use serde::{Deserialize, Serialize};

/// A value held in one mirror partition.
///
/// `local_id` is assigned by the mirror on first save and is unrelated to
/// the remote document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorEntry<T> {
    pub partition: String,
    pub local_id: Option<i64>,
    pub value: T,
}

impl<T> MirrorEntry<T> {
    pub fn new(partition: impl Into<String>, value: T) -> Self {
        Self {
            partition: partition.into(),
            local_id: None,
            value,
        }
    }

    pub fn with_local_id(mut self, local_id: i64) -> Self {
        self.local_id = Some(local_id);
        self
    }
}
