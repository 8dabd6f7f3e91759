use serde::{Deserialize, Serialize};

/// Filter value that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Category choices offered by the sidebar filter.
pub const CATEGORY_FILTERS: [&str; 5] = [ALL_CATEGORIES, "Clothing", "Shopping", "Care", "Resources"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub category: String,
    pub recommendation: String,
    pub impact: String,
}

impl RecommendationRow {
    pub fn new(
        category: impl Into<String>,
        recommendation: impl Into<String>,
        impact: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            recommendation: recommendation.into(),
            impact: impact.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationTable {
    rows: Vec<RecommendationRow>,
}

impl RecommendationTable {
    pub fn rows(&self) -> &[RecommendationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: RecommendationRow) {
        self.rows.push(row);
    }

    /// Rows whose category contains `filter`, ignoring case. `"All"` or a blank
    /// filter keeps every row.
    pub fn filter_by_category(&self, filter: &str) -> RecommendationTable {
        let filter = filter.trim();
        if filter.is_empty() || filter.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return self.clone();
        }
        let needle = filter.to_lowercase();
        self.rows
            .iter()
            .filter(|r| r.category.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl From<Vec<RecommendationRow>> for RecommendationTable {
    fn from(rows: Vec<RecommendationRow>) -> Self {
        Self { rows }
    }
}

impl FromIterator<RecommendationRow> for RecommendationTable {
    fn from_iter<I: IntoIterator<Item = RecommendationRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
