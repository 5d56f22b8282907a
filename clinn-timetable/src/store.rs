use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::model::{
  Department, DepartmentId, Faculty, FacultyId, Professor, ProfessorId, Topic, TopicId, User,
  UserId,
};
use crate::{Error, Result, TopicTable};

/// Records the timetable engine reads and the one it writes.
pub trait Store {
  fn user(&self, id: UserId) -> Result<&User>;

  fn topic(&self, id: TopicId) -> Result<&Topic>;

  fn department(&self, id: DepartmentId) -> Result<&Department>;

  fn faculty(&self, id: FacultyId) -> Result<&Faculty>;

  fn professor(&self, id: ProfessorId) -> Result<&Professor>;

  /// Every topic, ascending by id.
  fn topics(&self) -> Vec<&Topic>;

  fn topics_in_department(&self, department: DepartmentId) -> Vec<&Topic> {
    self
      .topics()
      .into_iter()
      .filter(|topic| topic.department == department)
      .collect()
  }

  /// Tables are created lazily, a topic may not have one yet.
  fn topic_table(&self, topic: TopicId) -> Option<&TopicTable>;

  fn personal_table(&self, user: UserId) -> Option<&TopicTable>;

  /// Creates or overwrites the whole personal table of `user`.
  fn save_personal_table(&mut self, user: UserId, table: TopicTable) -> Result<()>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixture {
  faculties: Vec<Faculty>,
  departments: Vec<Department>,
  professors: Vec<Professor>,
  topics: Vec<Topic>,
  users: Vec<User>,
  topic_tables: Vec<TableRecord>,
  personal_tables: Vec<PersonalTableRecord>,
}

#[derive(Debug, Deserialize)]
struct TableRecord {
  topic: TopicId,
  table: TopicTable,
}

#[derive(Debug, Deserialize)]
struct PersonalTableRecord {
  user: UserId,
  table: TopicTable,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  faculties: BTreeMap<FacultyId, Faculty>,
  departments: BTreeMap<DepartmentId, Department>,
  professors: BTreeMap<ProfessorId, Professor>,
  topics: BTreeMap<TopicId, Topic>,
  users: BTreeMap<UserId, User>,
  topic_tables: BTreeMap<TopicId, TopicTable>,
  personal_tables: BTreeMap<UserId, TopicTable>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reads a JSON fixture; tables may use either grid representation.
  pub fn from_json(json: &str) -> Result<Self> {
    let fixture: Fixture =
      serde_json::from_str(json).map_err(|err| Error::Fixture(err.to_string()))?;
    Ok(Self::from_fixture(fixture))
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
      .map_err(|err| Error::Fixture(format!("{}: {err}", path.display())))?;
    let store = Self::from_json(&json)?;

    info!(
      "Loaded {} topics, {} tables and {} users from {}",
      store.topics.len(),
      store.topic_tables.len(),
      store.users.len(),
      path.display()
    );

    Ok(store)
  }

  fn from_fixture(fixture: Fixture) -> Self {
    let mut store = Self::new();

    for faculty in fixture.faculties {
      store.insert_faculty(faculty);
    }
    for department in fixture.departments {
      store.insert_department(department);
    }
    for professor in fixture.professors {
      store.insert_professor(professor);
    }
    for topic in fixture.topics {
      store.insert_topic(topic);
    }
    for user in fixture.users {
      store.insert_user(user);
    }
    for record in fixture.topic_tables {
      store.set_topic_table(record.topic, record.table);
    }
    for record in fixture.personal_tables {
      store.personal_tables.insert(record.user, record.table);
    }

    store
  }

  pub fn insert_faculty(&mut self, faculty: Faculty) {
    self.faculties.insert(faculty.id, faculty);
  }

  pub fn insert_department(&mut self, department: Department) {
    self.departments.insert(department.id, department);
  }

  pub fn insert_professor(&mut self, professor: Professor) {
    self.professors.insert(professor.id, professor);
  }

  pub fn insert_topic(&mut self, topic: Topic) {
    self.topics.insert(topic.id, topic);
  }

  pub fn insert_user(&mut self, user: User) {
    self.users.insert(user.id, user);
  }

  pub fn set_topic_table(&mut self, topic: TopicId, table: TopicTable) {
    self.topic_tables.insert(topic, table);
  }
}

fn found<'a, T>(value: Option<&'a T>, kind: &'static str, id: u32) -> Result<&'a T> {
  value.ok_or(Error::NotFound { kind, id })
}

impl Store for MemoryStore {
  fn user(&self, id: UserId) -> Result<&User> {
    found(self.users.get(&id), "User", id)
  }

  fn topic(&self, id: TopicId) -> Result<&Topic> {
    found(self.topics.get(&id), "Topic", id)
  }

  fn department(&self, id: DepartmentId) -> Result<&Department> {
    found(self.departments.get(&id), "Department", id)
  }

  fn faculty(&self, id: FacultyId) -> Result<&Faculty> {
    found(self.faculties.get(&id), "Faculty", id)
  }

  fn professor(&self, id: ProfessorId) -> Result<&Professor> {
    found(self.professors.get(&id), "Professor", id)
  }

  fn topics(&self) -> Vec<&Topic> {
    self.topics.values().collect()
  }

  fn topic_table(&self, topic: TopicId) -> Option<&TopicTable> {
    self.topic_tables.get(&topic)
  }

  fn personal_table(&self, user: UserId) -> Option<&TopicTable> {
    self.personal_tables.get(&user)
  }

  fn save_personal_table(&mut self, user: UserId, table: TopicTable) -> Result<()> {
    self.user(user)?;
    self.personal_tables.insert(user, table);
    Ok(())
  }
}
