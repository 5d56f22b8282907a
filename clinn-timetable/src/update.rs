use tracing::{debug, info};

use crate::department::DepartmentTable;
use crate::model::UserId;
use crate::query::Choice;
use crate::{Result, Store};

/// Locks the chosen cells into the personal table of `user`.
///
/// Tokens that do not parse, point outside the week, name a topic the user
/// cannot see or a cell the topic does not occupy are dropped. Cells not
/// named by a token keep their content. Returns the accepted choices in
/// token order.
pub fn update_topics<S, I>(store: &mut S, user: UserId, tokens: I) -> Result<Vec<Choice>>
where
  S: Store + ?Sized,
  I: IntoIterator,
  I::Item: AsRef<str>,
{
  let (table, accepted) = {
    let account = store.user(user)?;
    let visible = DepartmentTable::new(&*store, account);
    let mut table = store.personal_table(user).cloned().unwrap_or_default();
    let mut accepted = Vec::new();

    for token in tokens {
      let token = token.as_ref();

      let choice = match token.parse::<Choice>() {
        Ok(choice) if choice.in_range() => choice,
        Ok(_) | Err(_) => {
          debug!("Dropping invalid token {:?} of user {}", token, user);
          continue;
        }
      };

      if !visible.is_available(choice.topic) {
        debug!("Dropping token {} of user {}: topic not visible", choice, user);
        continue;
      }

      let Some(source) = store.topic_table(choice.topic) else {
        debug!("Dropping token {} of user {}: topic has no table", choice, user);
        continue;
      };

      let slot = source.slots.get(choice.day, choice.period).unwrap_or_default();
      if slot.is_empty() {
        debug!("Dropping token {} of user {}: cell is free", choice, user);
        continue;
      }
      let place = source.places.get(choice.day, choice.period).unwrap_or_default();

      table.set_slot(choice.day, choice.period, slot, place)?;
      accepted.push(choice);
    }

    (table, accepted)
  };

  if accepted.is_empty() {
    return Ok(accepted);
  }

  store.save_personal_table(user, table)?;
  info!("Updated personal table of user {} with {} choices", user, accepted.len());

  Ok(accepted)
}
