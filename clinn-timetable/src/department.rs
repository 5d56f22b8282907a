use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{Professor, Topic, TopicId, User};
use crate::query::{Merged, Query, TimetableMerger};
use crate::{Result, Store};

/// Topics a user may see: the explicitly chosen ones plus everything offered
/// by the home department, ascending by id.
///
/// Users without a profile see nothing.
pub fn available_topics<'a, S: Store + ?Sized>(store: &'a S, user: &User) -> Vec<&'a Topic> {
  let Some(profile) = &user.profile else {
    debug!("User {} has no profile, no topics available", user.id);
    return Vec::new();
  };

  let mut topics = BTreeMap::new();

  for id in &profile.topics {
    match store.topic(*id) {
      Ok(topic) => {
        topics.insert(topic.id, topic);
      }
      Err(err) => debug!("Skipping chosen topic of user {}: {}", user.id, err),
    }
  }

  for topic in store.topics_in_department(profile.department) {
    topics.insert(topic.id, topic);
  }

  topics.into_values().collect()
}

/// Per-user view of the visible topics and the professors teaching them.
///
/// Computed on demand and never stored.
pub struct DepartmentTable<'a> {
  pub available_topics: Vec<&'a Topic>,
  pub professors: Vec<&'a Professor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentTopics {
  pub department: String,
  pub faculty: String,
  pub topics: Vec<TopicEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
  pub id: TopicId,
  pub name: String,
}

impl<'a> DepartmentTable<'a> {
  pub fn new<S: Store + ?Sized>(store: &'a S, user: &User) -> Self {
    let available_topics = available_topics(store, user);
    let professors = professors(store, &available_topics);

    Self {
      available_topics,
      professors,
    }
  }

  pub fn is_available(&self, topic: TopicId) -> bool {
    self
      .available_topics
      .binary_search_by_key(&topic, |topic| topic.id)
      .is_ok()
  }

  /// Overlays the tables of every visible topic that passes `query`.
  pub fn query<S: Store + ?Sized>(&self, store: &S, query: &Query) -> Merged {
    if self.available_topics.is_empty() {
      return Merged::default();
    }

    let mut merger = TimetableMerger::new();

    for topic in self
      .available_topics
      .iter()
      .filter(|topic| query.accepts_topic(topic))
    {
      match store.topic_table(topic.id) {
        Some(table) => merger.overlay(topic.id, &table.final_table(), query),
        None => debug!("Topic {} has no table yet", topic.id),
      }
    }

    merger.finish()
  }

  /// Visible topics grouped by the name of their department, each group
  /// labelled with the owning faculty.
  pub fn topics_by_department<S: Store + ?Sized>(&self, store: &S) -> Result<Vec<DepartmentTopics>> {
    let mut groups: BTreeMap<String, (String, Vec<TopicEntry>)> = BTreeMap::new();

    for topic in &self.available_topics {
      let department = store.department(topic.department)?;
      let faculty = store.faculty(department.faculty)?;
      groups
        .entry(department.name.clone())
        .or_insert_with(|| (faculty.name.clone(), Vec::new()))
        .1
        .push(TopicEntry {
          id: topic.id,
          name: topic.name.clone(),
        });
    }

    Ok(
      groups
        .into_iter()
        .map(|(department, (faculty, topics))| DepartmentTopics {
          department,
          faculty,
          topics,
        })
        .collect(),
    )
  }
}

/// Professors teaching any of `topics`, without placeholders, ascending by id.
fn professors<'a, S: Store + ?Sized>(store: &'a S, topics: &[&Topic]) -> Vec<&'a Professor> {
  let ids = topics
    .iter()
    .flat_map(|topic| topic.professors.iter().copied())
    .collect::<BTreeSet<_>>();

  ids
    .into_iter()
    .filter_map(|id| match store.professor(id) {
      Ok(professor) => Some(professor),
      Err(err) => {
        debug!("Skipping professor: {}", err);
        None
      }
    })
    .filter(|professor| !professor.is_placeholder())
    .collect()
}

/// Runs `query` against everything `user` can see.
pub fn query_table<S: Store + ?Sized>(store: &S, user: &User, query: &Query) -> Merged {
  DepartmentTable::new(store, user).query(store, query)
}
