use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive information carried by a schematic.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub created: Option<i64>,
    pub modified: Option<i64>,
    pub mc_version: Option<i32>,
    pub we_version: Option<i32>,
    pub lm_version: Option<i32>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl Metadata {
    /// Metadata for a freshly created schematic, stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_millis();
        Metadata {
            name: Some(name.into()),
            created: Some(now),
            modified: Some(now),
            ..Metadata::default()
        }
    }

    pub fn touch(&mut self) {
        self.modified = Some(now_millis());
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified.and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_timestamps() {
        let metadata = Metadata::new("tower");
        assert_eq!(metadata.name.as_deref(), Some("tower"));
        assert_eq!(metadata.created, metadata.modified);
        assert!(metadata.created_at().is_some());
    }

    #[test]
    fn test_touch_moves_modified_forward() {
        let mut metadata = Metadata::new("tower");
        metadata.modified = Some(0);
        metadata.touch();
        assert!(metadata.modified.unwrap() > 0);
        assert!(metadata.modified_at().unwrap() >= metadata.created_at().unwrap());
    }
}
