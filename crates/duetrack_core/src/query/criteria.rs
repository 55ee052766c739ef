//! Filter criteria owned by the list screen.

use crate::model::assignment::{Assignment, Priority, Status};
use crate::store::assignment_store::StoreQuery;
use serde::{Deserialize, Serialize};

/// Live search text plus optional status/priority filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl FilterCriteria {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Blank text and no filters: the full list is wanted.
    pub fn is_unfiltered(&self) -> bool {
        self.query.trim().is_empty() && self.status.is_none() && self.priority.is_none()
    }

    /// Store subscription backing these criteria.
    ///
    /// Surrounding whitespace in the text is ignored, so a blank query with a
    /// filter searches everything.
    pub fn store_query(&self) -> StoreQuery {
        if self.is_unfiltered() {
            StoreQuery::All
        } else {
            StoreQuery::Search(self.query.trim().to_string())
        }
    }

    /// Client-side status/priority check applied on top of the store query.
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.status.map_or(true, |status| assignment.status == status)
            && self
                .priority
                .map_or(true, |priority| assignment.priority == priority)
    }

    /// Keeps matching records, preserving store order.
    pub fn apply(&self, assignments: Vec<Assignment>) -> Vec<Assignment> {
        if self.status.is_none() && self.priority.is_none() {
            return assignments;
        }
        assignments
            .into_iter()
            .filter(|assignment| self.matches(assignment))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FilterCriteria;
    use crate::model::assignment::{Priority, Status};
    use crate::store::assignment_store::StoreQuery;

    #[test]
    fn blank_text_without_filters_reads_everything() {
        let criteria = FilterCriteria::default().with_query("   ");
        assert!(criteria.is_unfiltered());
        assert_eq!(criteria.store_query(), StoreQuery::All);
    }

    #[test]
    fn any_filter_switches_to_search() {
        let criteria = FilterCriteria::default()
            .with_query("  ")
            .with_status(Some(Status::Done));
        assert!(!criteria.is_unfiltered());
        assert_eq!(criteria.store_query(), StoreQuery::Search(String::new()));

        let criteria = FilterCriteria::default()
            .with_query("lab")
            .with_priority(Some(Priority::Urgent));
        assert_eq!(criteria.store_query(), StoreQuery::Search("lab".to_string()));
    }
}
