//! CSV export of the last produced recommendation table.

use crate::models::RecommendationTable;

pub const EXPORT_FILE_NAME: &str = "sustainable_fashion_recommendations.csv";
pub const CSV_HEADER: [&str; 3] = ["Category", "Recommendation", "Impact"];

pub fn table_to_csv(table: &RecommendationTable) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for row in table.rows() {
        writer.write_record([&row.category, &row.recommendation, &row.impact])?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
