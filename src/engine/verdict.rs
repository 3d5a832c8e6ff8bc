//! OK/NG verdict column detection and yield tallying.
use crate::engine::scan::best_match;
use crate::spreadsheet::{Cell, Sheet};

/// Pass/fail tally of one station sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct YieldRecord {
    pub station: String,
    pub total: usize,
    pub ok: usize,
    pub ng: usize,
    /// `ok / total`, 0 when nothing was inspected
    pub ratio: f64,
}

impl YieldRecord {
    pub fn new(station: &str, ok: usize, ng: usize) -> Self {
        let total = ok + ng;
        let ratio = if total > 0 {
            ok as f64 / total as f64
        } else {
            0.0
        };
        YieldRecord {
            station: station.to_owned(),
            total,
            ok,
            ng,
            ratio,
        }
    }

    /// Yield as a percentage string with two decimals, e.g. `"97.50%"`.
    pub fn percent(&self) -> String {
        format!("{:.2}%", self.ratio * 100.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Verdict {
    Ok,
    Ng,
}

fn verdict(cell: &Cell) -> Option<Verdict> {
    match cell.to_string().to_uppercase().as_str() {
        "OK" => Some(Verdict::Ok),
        "NG" => Some(Verdict::Ng),
        _ => None,
    }
}

/// Finds the column with the most OK/NG cells among the first `limit`
/// columns. Ties keep the lower index; no verdict at all gives `None`.
pub fn locate_verdict_column(sheet: &Sheet, limit: usize) -> Option<usize> {
    best_match(0, sheet.width, limit, |column| {
        sheet.column(column, 0).filter(|cell| verdict(cell).is_some()).count()
    })
    .map(|(column, _)| column)
}

/// Tallies the verdict column of a sheet into a yield record.
pub fn tally_yield(station: &str, sheet: &Sheet, limit: usize) -> Option<YieldRecord> {
    let column = locate_verdict_column(sheet, limit)?;
    let (ok, ng) = sheet
        .column(column, 0)
        .filter_map(verdict)
        .fold((0, 0), |(ok, ng), verdict| match verdict {
            Verdict::Ok => (ok + 1, ng),
            Verdict::Ng => (ok, ng + 1),
        });
    Some(YieldRecord::new(station, ok, ng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::from_rows(
            "s",
            rows.iter()
                .map(|row| row.iter().map(|value| Data::String(value.to_string())).collect())
                .collect(),
        )
    }

    #[test]
    fn picks_column_with_most_verdicts() {
        let sheet = sheet(&[
            &["Judge", "Result"],
            &["ok", "OK"],
            &["", "NG"],
            &["x", "ok"],
        ]);
        assert_eq!(locate_verdict_column(&sheet, 30), Some(1));
        let record = tally_yield("A", &sheet, 30).unwrap();
        assert_eq!(record, YieldRecord::new("A", 2, 1));
        assert_eq!(record.total, 3);
    }

    #[test]
    fn tie_keeps_lower_column() {
        let sheet = sheet(&[&["OK", "NG"], &["NG", "OK"]]);
        assert_eq!(locate_verdict_column(&sheet, 30), Some(0));
    }

    #[test]
    fn no_verdicts_no_record() {
        let sheet = sheet(&[&["Dim No", "1.2"], &["OKAY", "N/G"]]);
        assert_eq!(tally_yield("A", &sheet, 30), None);
        assert_eq!(tally_yield("A", &Sheet::empty("e"), 30), None);
    }

    #[test]
    fn columns_beyond_limit_are_ignored() {
        let sheet = sheet(&[&["", "", "OK"]]);
        assert_eq!(locate_verdict_column(&sheet, 2), None);
        assert_eq!(locate_verdict_column(&sheet, 3), Some(2));
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(YieldRecord::new("A", 39, 1).percent(), "97.50%");
        assert_eq!(YieldRecord::new("A", 0, 0).percent(), "0.00%");
        assert_eq!(YieldRecord::new("A", 0, 0).ratio, 0.0);
    }
}
