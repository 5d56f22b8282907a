use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("{kind} {id} not found")]
  NotFound { kind: &'static str, id: u32 },

  #[error("Malformed grid: {0}")]
  MalformedGrid(String),

  #[error("Cell ({day}, {period}) is outside of the weekly grid")]
  OutOfRange { day: usize, period: usize },

  #[error("Invalid fixture: {0}")]
  Fixture(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
