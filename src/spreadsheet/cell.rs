use calamine::Data;
use std::fmt::Display;

/// A raw worksheet cell with the coercions the layout heuristics rely on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: Data,
}

impl Cell {
    pub fn new(value: Data) -> Self {
        Cell { value }
    }

    /// Returns true for blank cells and blank strings.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Data::Empty => true,
            Data::String(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Coerces the cell to a finite number.
    ///
    /// Numbers pass through, strings are parsed after trimming. Booleans,
    /// dates, errors and anything unparsable are not numbers.
    pub fn to_number(&self) -> Option<f64> {
        let number = match &self.value {
            Data::Int(value) => *value as f64,
            Data::Float(value) => *value,
            Data::String(value) => value.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        Some(number).filter(|number| number.is_finite())
    }

    /// Lowercased text used for keyword scans.
    pub fn to_lowercase(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl Display for Cell {
    /// Renders the cell the way it reads in the sheet: dates as
    /// `YYYY-MM-DD HH:MM:SS`, whole floats without a fraction, blanks as "".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Data::Empty => Ok(()),
            Data::Int(value) => write!(f, "{value}"),
            Data::Float(value) => write!(f, "{value}"),
            Data::String(value) => write!(f, "{value}"),
            Data::Bool(value) => write!(f, "{value}"),
            Data::DateTime(value) => match value.as_datetime() {
                Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{}", value.as_f64()),
            },
            Data::DateTimeIso(value) => write!(f, "{}", value.replacen('T', " ", 1)),
            Data::DurationIso(value) => write!(f, "{value}"),
            Data::Error(value) => write!(f, "{value}"),
        }
    }
}
