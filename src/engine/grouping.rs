//! Partitioning of measurement rows into date (and config) groups.
use crate::engine::layout::Layout;
use crate::spreadsheet::Sheet;
use regex::Regex;
use std::collections::BTreeMap;

/// Identity of a measurement group.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    /// `YYYY-MM-DD` date stamp
    pub date: String,
    /// Config token, `None` when grouping by date alone
    pub config: Option<String>,
}

/// Row indexes of each group.
pub type Groups = BTreeMap<GroupKey, Vec<usize>>;

/// Groups the data rows of a sheet by their date stamp and, when
/// `by_config` is set, by the token in the layout's config column.
///
/// Rows without a date stamp belong to no group.
pub fn group_rows(sheet: &Sheet, layout: &Layout, date_pattern: &Regex, by_config: bool) -> Groups {
    let mut groups = Groups::new();
    for row in layout.data_row..sheet.height {
        let Some(date) = sheet
            .get(row, layout.date_column)
            .map(|cell| cell.to_string())
            .and_then(|text| date_pattern.find(&text).map(|found| found.as_str().to_owned()))
        else {
            continue;
        };
        let config = by_config.then(|| {
            sheet
                .get(row, layout.config_column)
                .map(|cell| cell.to_string())
                .unwrap_or_default()
        });
        groups.entry(GroupKey { date, config }).or_default().push(row);
    }
    groups
}
