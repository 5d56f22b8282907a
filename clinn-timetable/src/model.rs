use serde::{Deserialize, Serialize};

pub type FacultyId = u32;
pub type DepartmentId = u32;
pub type ProfessorId = u32;
pub type TopicId = u32;
pub type UserId = u32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
  pub id: FacultyId,
  pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub id: DepartmentId,
  pub name: String,
  pub faculty: FacultyId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
  pub id: ProfessorId,
  #[serde(default)]
  pub name: String,
  pub faculty: FacultyId,
}

impl Professor {
  /// Placeholder records carry no name and are never offered for filtering.
  pub fn is_placeholder(&self) -> bool {
    self.name.trim().is_empty()
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub id: TopicId,
  pub name: String,
  pub department: DepartmentId,
  #[serde(default)]
  pub professors: Vec<ProfessorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: UserId,
  pub username: String,
  #[serde(default)]
  pub profile: Option<Profile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub department: DepartmentId,
  /// Topics picked explicitly, e.g. electives of other departments.
  #[serde(default)]
  pub topics: Vec<TopicId>,
}
