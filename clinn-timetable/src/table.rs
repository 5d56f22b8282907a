use serde::{Deserialize, Serialize};

use crate::{Grid, Result};

/// Weekly occupancy of one topic: what happens in a slot and where.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTable {
  #[serde(alias = "topics")]
  pub slots: Grid,
  pub places: Grid,
}

impl TopicTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_slot(
    &mut self,
    day: usize,
    period: usize,
    slot: impl Into<String>,
    place: impl Into<String>,
  ) -> Result<()> {
    self.slots.set(day, period, slot)?;
    self.places.set(day, period, place)
  }

  /// Display view: `"<slot> @ <place>"` where a slot is set, empty elsewhere.
  pub fn final_table(&self) -> Grid {
    let mut table = Grid::new();

    for (day, period, slot) in self.slots.cells() {
      if slot.is_empty() {
        continue;
      }

      let place = self.places.get(day, period).unwrap_or_default();
      table.put(day, period, format!("{slot} @ {place}"));
    }

    table
  }
}

#[cfg(test)]
mod test {
  use crate::TopicTable;

  #[test]
  fn final_table_joins_slot_and_place() -> anyhow::Result<()> {
    let mut table = TopicTable::new();
    table.set_slot(1, 1, "Lecture", "Hall 1")?;
    table.places.set(2, 2, "Hall 2")?;

    let view = table.final_table();
    assert_eq!(view.get(1, 1), Some("Lecture @ Hall 1"));
    // a place without a slot is not scheduled
    assert_eq!(view.get(2, 2), Some(""));
    assert_eq!(view.occupied(), 1);

    Ok(())
  }

  #[test]
  fn reads_legacy_records() -> anyhow::Result<()> {
    let mut expected = TopicTable::new();
    expected.set_slot(0, 5, "Tutorial", "B11")?;

    let record = serde_json::json!({
      "topics": expected.slots.to_legacy(),
      "places": expected.places.rows(),
    });

    let table: TopicTable = serde_json::from_value(record)?;
    assert_eq!(table, expected);
    assert_eq!(table.final_table().get(0, 5), Some("Tutorial @ B11"));

    Ok(())
  }
}
