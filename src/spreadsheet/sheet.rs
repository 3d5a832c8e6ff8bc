use crate::spreadsheet::cell::Cell;
use calamine::{Data, Range};

/// A worksheet held as a dense grid of raw cells.
///
/// Positions are absolute: row 0 / column 0 is cell A1 even when the used
/// range of the worksheet starts further down or to the right.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name as stored in the workbook
    pub name: String,
    /// Number of rows (one past the last used row)
    pub height: usize,
    /// Number of columns (one past the last used column)
    pub width: usize,
    /// Row-major cells, `height * width` long
    cells: Vec<Cell>,
}

impl Sheet {
    /// Builds a sheet from a calamine range.
    pub fn from_range(name: &str, range: &Range<Data>) -> Self {
        let (start, end) = match (range.start(), range.end()) {
            (Some(start), Some(end)) if !range.is_empty() => (start, end),
            _ => return Sheet::empty(name),
        };
        let height = end.0 as usize + 1;
        let width = end.1 as usize + 1;
        let mut cells = vec![Cell::default(); height * width];
        for (row, column, value) in range.used_cells() {
            let row = start.0 as usize + row;
            let column = start.1 as usize + column;
            cells[row * width + column] = Cell::new(value.to_owned());
        }
        Sheet {
            name: name.to_owned(),
            height,
            width,
            cells,
        }
    }

    /// Builds a sheet from rows of values; short rows are padded with blanks.
    pub fn from_rows(name: &str, rows: Vec<Vec<Data>>) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(height * width);
        for mut row in rows {
            row.resize(width, Data::Empty);
            cells.extend(row.into_iter().map(Cell::new));
        }
        Sheet {
            name: name.to_owned(),
            height,
            width,
            cells,
        }
    }

    pub fn empty(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            ..Sheet::default()
        }
    }

    /// Gets the cell at (row, column), `None` outside the grid.
    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        if row < self.height && column < self.width {
            self.cells.get(row * self.width + column)
        } else {
            None
        }
    }

    /// Cells of one row, empty outside the grid.
    pub fn row(&self, row: usize) -> &[Cell] {
        if row < self.height {
            &self.cells[row * self.width..(row + 1) * self.width]
        } else {
            &[]
        }
    }

    /// Cells of one column restricted to rows `row_lower_bound..height`.
    pub fn column(&self, column: usize, row_lower_bound: usize) -> impl Iterator<Item = &Cell> {
        (row_lower_bound..self.height).filter_map(move |row| self.get(row, column))
    }

    /// Lowercased text of a whole row, cells joined by a space.
    pub fn row_text(&self, row: usize) -> String {
        self.row(row)
            .iter()
            .map(Cell::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
