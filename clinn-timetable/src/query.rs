use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::model::{ProfessorId, Topic, TopicId};
use crate::{Grid, DAYS, PERIODS};

static CHOICE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_(\d+)_(\d+)$").unwrap());

/// Optional narrowing of a timetable query.
///
/// `None` disables a filter, an empty set matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
  pub topics: Option<BTreeSet<TopicId>>,
  pub professors: Option<BTreeSet<ProfessorId>>,
  pub days: Option<BTreeSet<usize>>,
  pub periods: Option<BTreeSet<usize>>,
}

impl Query {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn topics(mut self, ids: impl IntoIterator<Item = TopicId>) -> Self {
    self.topics = Some(ids.into_iter().collect());
    self
  }

  pub fn professors(mut self, ids: impl IntoIterator<Item = ProfessorId>) -> Self {
    self.professors = Some(ids.into_iter().collect());
    self
  }

  pub fn days(mut self, days: impl IntoIterator<Item = usize>) -> Self {
    self.days = Some(days.into_iter().collect());
    self
  }

  pub fn periods(mut self, periods: impl IntoIterator<Item = usize>) -> Self {
    self.periods = Some(periods.into_iter().collect());
    self
  }

  pub fn accepts_topic(&self, topic: &Topic) -> bool {
    if let Some(topics) = &self.topics {
      if !topics.contains(&topic.id) {
        return false;
      }
    }

    match &self.professors {
      Some(professors) => topic.professors.iter().any(|id| professors.contains(id)),
      None => true,
    }
  }

  pub fn accepts_cell(&self, day: usize, period: usize) -> bool {
    let day_ok = self.days.as_ref().map_or(true, |days| days.contains(&day));
    let period_ok = self
      .periods
      .as_ref()
      .map_or(true, |periods| periods.contains(&period));

    day_ok && period_ok
  }
}

/// One cell assignment, written as the token `<topic>_<day>_<period>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Choice {
  pub topic: TopicId,
  pub day: usize,
  pub period: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid choice token {0:?}")]
pub struct InvalidChoice(pub String);

impl Choice {
  pub fn new(topic: TopicId, day: usize, period: usize) -> Self {
    Self { topic, day, period }
  }

  pub fn in_range(&self) -> bool {
    self.day < DAYS && self.period < PERIODS
  }
}

impl fmt::Display for Choice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}_{}", self.topic, self.day, self.period)
  }
}

impl FromStr for Choice {
  type Err = InvalidChoice;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let invalid = || InvalidChoice(value.to_string());
    let captures = CHOICE_REGEX.captures(value.trim()).ok_or_else(invalid)?;

    Ok(Self {
      topic: captures[1].parse().map_err(|_| invalid())?,
      day: captures[2].parse().map_err(|_| invalid())?,
      period: captures[3].parse().map_err(|_| invalid())?,
    })
  }
}

impl Serialize for Choice {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Choice {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let token = String::deserialize(deserializer)?;
    token.parse().map_err(serde::de::Error::custom)
  }
}

/// The overlaid weekly table and the topic behind each occupied cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Merged {
  pub table: Grid,
  pub choices: Vec<Choice>,
}

/// Overlays per-topic display grids into one.
///
/// A later overlay replaces what an earlier one wrote to the same cell.
#[derive(Debug, Default)]
pub struct TimetableMerger {
  table: Grid,
  owners: [[Option<TopicId>; PERIODS]; DAYS],
}

impl TimetableMerger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn overlay(&mut self, topic: TopicId, grid: &Grid, query: &Query) {
    for (day, period, cell) in grid.cells() {
      if cell.is_empty() || !query.accepts_cell(day, period) {
        continue;
      }

      if let Some(previous) = self.owners[day][period].replace(topic) {
        debug!(
          "Topic {} replaces topic {} at day {} period {}",
          topic, previous, day, period
        );
      }

      self.table.put(day, period, cell);
    }
  }

  pub fn finish(self) -> Merged {
    let choices = self
      .owners
      .iter()
      .enumerate()
      .flat_map(|(day, row)| {
        row
          .iter()
          .enumerate()
          .filter_map(move |(period, owner)| owner.map(|topic| Choice::new(topic, day, period)))
      })
      .collect();

    Merged {
      table: self.table,
      choices,
    }
  }
}

#[cfg(test)]
mod test {
  use crate::model::Topic;
  use crate::query::{Choice, Query, TimetableMerger};
  use crate::Grid;

  fn topic(id: u32, professors: Vec<u32>) -> Topic {
    Topic {
      id,
      name: format!("Topic {id}"),
      department: 1,
      professors,
    }
  }

  #[test]
  fn parses_tokens() {
    assert_eq!("12_3_4".parse::<Choice>(), Ok(Choice::new(12, 3, 4)));
    assert_eq!(Choice::new(7, 0, 5).to_string(), "7_0_5");

    for token in ["", "1_2", "1_2_3_4", "a_1_2", "-1_2_3", "1__2"] {
      assert!(token.parse::<Choice>().is_err(), "accepted {token:?}");
    }
  }

  #[test]
  fn tokens_out_of_range_parse_but_are_flagged() -> anyhow::Result<()> {
    let choice: Choice = "1_7_0".parse()?;
    assert!(!choice.in_range());
    assert!(Choice::new(1, 6, 5).in_range());

    Ok(())
  }

  #[test]
  fn choices_serialize_as_tokens() -> anyhow::Result<()> {
    let json = serde_json::to_string(&vec![Choice::new(1, 2, 3)])?;
    assert_eq!(json, r#"["1_2_3"]"#);

    let parsed: Vec<Choice> = serde_json::from_str(&json)?;
    assert_eq!(parsed, vec![Choice::new(1, 2, 3)]);
    assert!(serde_json::from_str::<Choice>(r#""nope""#).is_err());

    Ok(())
  }

  #[test]
  fn topic_filters() {
    let lecture = topic(1, vec![10, 11]);
    let seminar = topic(2, Vec::new());

    assert!(Query::new().accepts_topic(&lecture));
    assert!(Query::new().topics([1]).accepts_topic(&lecture));
    assert!(!Query::new().topics([2]).accepts_topic(&lecture));
    assert!(Query::new().professors([11, 12]).accepts_topic(&lecture));
    assert!(!Query::new().professors([12]).accepts_topic(&lecture));
    assert!(!Query::new().professors([10]).accepts_topic(&seminar));
    assert!(!Query::new().topics([]).accepts_topic(&lecture));
  }

  #[test]
  fn cell_filters() {
    let query = Query::new().days([1, 2]).periods([0]);

    assert!(query.accepts_cell(1, 0));
    assert!(!query.accepts_cell(1, 1));
    assert!(!query.accepts_cell(3, 0));
    assert!(Query::new().accepts_cell(6, 5));
  }

  #[test]
  fn later_overlay_wins() -> anyhow::Result<()> {
    let mut first = Grid::new();
    first.set(0, 0, "A @ 1")?;
    first.set(0, 1, "A2 @ 1")?;
    let mut second = Grid::new();
    second.set(0, 0, "B @ 2")?;

    let mut merger = TimetableMerger::new();
    merger.overlay(1, &first, &Query::new());
    merger.overlay(2, &second, &Query::new());
    let merged = merger.finish();

    assert_eq!(merged.table.get(0, 0), Some("B @ 2"));
    assert_eq!(merged.table.get(0, 1), Some("A2 @ 1"));
    assert_eq!(
      merged.choices,
      vec![Choice::new(2, 0, 0), Choice::new(1, 0, 1)]
    );

    Ok(())
  }

  #[test]
  fn empty_cells_do_not_erase() -> anyhow::Result<()> {
    let mut first = Grid::new();
    first.set(3, 3, "A @ 1")?;

    let mut merger = TimetableMerger::new();
    merger.overlay(1, &first, &Query::new());
    merger.overlay(2, &Grid::new(), &Query::new());
    let merged = merger.finish();

    assert_eq!(merged.table.get(3, 3), Some("A @ 1"));
    assert_eq!(merged.choices, vec![Choice::new(1, 3, 3)]);

    Ok(())
  }
}
