use std::fmt::Write;

use clinn_timetable::{weekday, Grid, DAYS, PERIODS};

/// Renders a week as a plain text table, one line per day.
pub fn table(grid: &Grid) -> String {
  let labels = (0..DAYS)
    .map(|day| weekday(day).map(|day| day.to_string()).unwrap_or_default())
    .collect::<Vec<String>>();
  let label_width = labels.iter().map(String::len).max().unwrap_or_default();

  let widths = (0..PERIODS)
    .map(|period| {
      (0..DAYS)
        .filter_map(|day| grid.get(day, period))
        .map(|cell| cell.chars().count())
        .chain([period.to_string().len()])
        .max()
        .unwrap_or_default()
    })
    .collect::<Vec<usize>>();

  let mut buf = String::new();

  write!(buf, "{:label_width$}", "").unwrap();
  for (period, width) in widths.iter().copied().enumerate() {
    write!(buf, " | {:<width$}", period).unwrap();
  }
  buf.push('\n');

  write!(buf, "{}", "-".repeat(label_width)).unwrap();
  for width in &widths {
    write!(buf, "-+-{}", "-".repeat(*width)).unwrap();
  }
  buf.push('\n');

  for (day, label) in labels.iter().enumerate() {
    write!(buf, "{:label_width$}", label).unwrap();
    for (period, width) in widths.iter().copied().enumerate() {
      let cell = grid.get(day, period).unwrap_or_default();
      write!(buf, " | {:<width$}", cell).unwrap();
    }
    buf.truncate(buf.trim_end().len());
    buf.push('\n');
  }

  buf
}

#[cfg(test)]
mod test {
  use clinn_timetable::Grid;

  use crate::ascii::table;

  #[test]
  fn renders_one_line_per_day() -> anyhow::Result<()> {
    let mut grid = Grid::new();
    grid.set(1, 1, "Lecture @ Hall 1")?;

    let rendered = table(&grid);
    let lines = rendered.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 2 + 7);
    assert!(lines[0].starts_with("          | 0 | 1"));
    assert!(lines[2].starts_with("Monday"));
    assert!(lines[3].starts_with("Tuesday   |   | Lecture @ Hall 1 |"));
    assert!(lines[8].starts_with("Sunday"));

    Ok(())
  }
}
