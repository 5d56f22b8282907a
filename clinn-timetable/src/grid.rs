use serde::{Deserialize, Serialize};

use crate::legacy::{self, RawCell};
use crate::{Error, Result, DAYS, PERIODS};

/// A weekly `DAYS` x `PERIODS` matrix of text cells.
///
/// The empty string is the "nothing scheduled" value; a grid never has
/// missing cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid", into = "Vec<Vec<String>>")]
pub struct Grid {
  cells: [[String; PERIODS]; DAYS],
}

/// Every form a grid arrives in before it is normalized.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGrid {
  Encoded(String),
  Rows(Vec<Vec<RawCell>>),
}

impl Grid {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, day: usize, period: usize) -> Option<&str> {
    self
      .cells
      .get(day)
      .and_then(|row| row.get(period))
      .map(String::as_str)
  }

  pub fn set(&mut self, day: usize, period: usize, value: impl Into<String>) -> Result<()> {
    match self.cells.get_mut(day).and_then(|row| row.get_mut(period)) {
      Some(cell) => {
        *cell = value.into();
        Ok(())
      }
      None => Err(Error::OutOfRange { day, period }),
    }
  }

  /// Writes a cell whose index came from [`Grid::cells`].
  pub(crate) fn put(&mut self, day: usize, period: usize, value: impl Into<String>) {
    self.cells[day][period] = value.into();
  }

  /// All cells in row-major order.
  pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
    self.cells.iter().enumerate().flat_map(|(day, row)| {
      row
        .iter()
        .enumerate()
        .map(move |(period, cell)| (day, period, cell.as_str()))
    })
  }

  pub fn is_empty(&self) -> bool {
    self.cells().all(|(_, _, cell)| cell.is_empty())
  }

  pub fn occupied(&self) -> usize {
    self.cells().filter(|(_, _, cell)| !cell.is_empty()).count()
  }

  pub fn rows(&self) -> Vec<Vec<String>> {
    self.cells.iter().map(|row| row.to_vec()).collect()
  }

  /// Parses the textual encoding older records store instead of nested arrays.
  pub fn parse_legacy(value: &str) -> Result<Self> {
    Self::from_raw_rows(legacy::parse(value)?)
  }

  pub fn to_legacy(&self) -> String {
    legacy::render(&self.cells)
  }

  fn from_raw_rows(rows: Vec<Vec<RawCell>>) -> Result<Self> {
    if rows.len() != DAYS {
      return Err(Error::MalformedGrid(format!(
        "expected {DAYS} days, got {}",
        rows.len()
      )));
    }

    let mut grid = Self::default();
    for (day, row) in rows.into_iter().enumerate() {
      if row.len() != PERIODS {
        return Err(Error::MalformedGrid(format!(
          "expected {PERIODS} periods on day {day}, got {}",
          row.len()
        )));
      }

      for (period, cell) in row.into_iter().enumerate() {
        grid.cells[day][period] = cell.into_text();
      }
    }

    Ok(grid)
  }
}

impl TryFrom<RawGrid> for Grid {
  type Error = Error;

  fn try_from(raw: RawGrid) -> Result<Self> {
    match raw {
      RawGrid::Encoded(text) => Self::parse_legacy(&text),
      RawGrid::Rows(rows) => Self::from_raw_rows(rows),
    }
  }
}

impl TryFrom<Vec<Vec<String>>> for Grid {
  type Error = Error;

  fn try_from(rows: Vec<Vec<String>>) -> Result<Self> {
    Self::from_raw_rows(
      rows
        .into_iter()
        .map(|row| row.into_iter().map(RawCell::Text).collect())
        .collect(),
    )
  }
}

impl From<Grid> for Vec<Vec<String>> {
  fn from(grid: Grid) -> Self {
    grid.cells.into_iter().map(Vec::from).collect()
  }
}

#[cfg(test)]
mod test {
  use crate::{Error, Grid, DAYS, PERIODS};

  #[test]
  fn out_of_range_cells_are_rejected() {
    let mut grid = Grid::new();

    assert_eq!(grid.get(DAYS, 0), None);
    assert_eq!(grid.get(0, PERIODS), None);
    assert_eq!(
      grid.set(0, PERIODS, "Lecture"),
      Err(Error::OutOfRange {
        day: 0,
        period: PERIODS
      })
    );
    assert!(grid.is_empty());
  }

  #[test]
  fn serializes_as_nested_arrays() -> anyhow::Result<()> {
    let mut grid = Grid::new();
    grid.set(2, 3, "Lab")?;

    let json = serde_json::to_value(&grid)?;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), DAYS);
    assert!(rows.iter().all(|row| row.as_array().unwrap().len() == PERIODS));
    assert_eq!(json[2][3], "Lab");
    assert_eq!(json[0][0], "");

    Ok(())
  }

  #[test]
  fn accepts_structured_and_encoded_forms() -> anyhow::Result<()> {
    let mut expected = Grid::new();
    expected.set(1, 1, "Lecture")?;

    let structured: Grid = serde_json::from_value(serde_json::to_value(&expected)?)?;
    let encoded: Grid = serde_json::from_value(serde_json::Value::String(expected.to_legacy()))?;

    assert_eq!(structured, expected);
    assert_eq!(encoded, expected);

    Ok(())
  }

  #[test]
  fn zero_cells_read_as_empty() -> anyhow::Result<()> {
    let mut rows = vec![vec![serde_json::json!(0); PERIODS]; DAYS];
    rows[4][4] = serde_json::json!("Seminar");

    let grid: Grid = serde_json::from_value(serde_json::to_value(rows)?)?;
    assert_eq!(grid.get(0, 0), Some(""));
    assert_eq!(grid.get(4, 4), Some("Seminar"));
    assert_eq!(grid.occupied(), 1);

    Ok(())
  }

  #[test]
  fn wrong_shape_is_malformed() {
    let rows = vec![vec![String::new(); PERIODS]; DAYS - 1];
    assert!(matches!(Grid::try_from(rows), Err(Error::MalformedGrid(_))));

    let mut rows = vec![vec![String::new(); PERIODS]; DAYS];
    rows[3].pop();
    assert!(matches!(Grid::try_from(rows), Err(Error::MalformedGrid(_))));
  }
}
