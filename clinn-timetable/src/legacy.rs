//! Textual grid encoding found in older records.
//!
//! Tables used to be stored as the printed form of a nested list, e.g.
//! `[['Lecture', ''], ['', 'Lab']]`, or as a JSON document. Printed lists may
//! use either quote style, `u`/`b` prefixes, integer cells and `None`.

use std::iter::Peekable;
use std::str::Chars;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{Error, Result};

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"\s*(?:(\[)|(\])|(,)|[uUbB]?'((?:[^'\\]|\\(?s:.))*)'|[uUbB]?"((?:[^"\\]|\\(?s:.))*)"|(-?\d+)|(None))\s*"#,
  )
  .unwrap()
});

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawCell {
  Text(String),
  Integer(i64),
  Empty,
}

impl RawCell {
  /// `0` and `None` are the defaults of unused cells.
  pub(crate) fn into_text(self) -> String {
    match self {
      RawCell::Text(text) => text,
      RawCell::Integer(0) | RawCell::Empty => String::new(),
      RawCell::Integer(value) => value.to_string(),
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
  Open,
  Close,
  Comma,
  Cell(RawCell),
}

fn tokenize(value: &str) -> Result<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut offset = 0;

  for captures in TOKEN_REGEX.captures_iter(value) {
    let whole = captures.get(0).unwrap();
    if whole.start() != offset {
      return Err(unexpected(value, offset));
    }
    offset = whole.end();

    let token = if captures.get(1).is_some() {
      Token::Open
    } else if captures.get(2).is_some() {
      Token::Close
    } else if captures.get(3).is_some() {
      Token::Comma
    } else if let Some(text) = captures.get(4).or_else(|| captures.get(5)) {
      Token::Cell(RawCell::Text(unescape(text.as_str())?))
    } else if let Some(number) = captures.get(6) {
      let number = number
        .as_str()
        .parse()
        .map_err(|_| Error::MalformedGrid(format!("number {} out of range", number.as_str())))?;
      Token::Cell(RawCell::Integer(number))
    } else {
      Token::Cell(RawCell::Empty)
    };

    tokens.push(token);
  }

  if offset != value.len() {
    return Err(unexpected(value, offset));
  }

  Ok(tokens)
}

fn unexpected(value: &str, offset: usize) -> Error {
  let rest: String = value[offset..].chars().take(12).collect();
  Error::MalformedGrid(format!("unexpected input at offset {offset}: {rest:?}"))
}

fn unescape(value: &str) -> Result<String> {
  let mut result = String::with_capacity(value.len());
  let mut chars = value.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '\\' {
      result.push(c);
      continue;
    }

    let escape = chars
      .next()
      .ok_or_else(|| Error::MalformedGrid("dangling escape".to_string()))?;

    let decoded = match escape {
      '\\' | '\'' | '"' => escape,
      'n' => '\n',
      't' => '\t',
      'r' => '\r',
      'a' => '\u{7}',
      'b' => '\u{8}',
      'f' => '\u{c}',
      'v' => '\u{b}',
      'x' => code_point(&mut chars, 2)?,
      'u' => code_point(&mut chars, 4)?,
      'U' => code_point(&mut chars, 8)?,
      '0'..='7' => {
        let mut code = escape.to_digit(8).unwrap_or_default();
        for _ in 0..2 {
          match chars.peek().and_then(|next| next.to_digit(8)) {
            Some(digit) => {
              code = code * 8 + digit;
              chars.next();
            }
            None => break,
          }
        }
        to_char(code)?
      }
      other => {
        return Err(Error::MalformedGrid(format!(
          "unknown escape sequence \\{other}"
        )))
      }
    };

    result.push(decoded);
  }

  Ok(result)
}

/// Reads exactly `digits` hex digits of a `\x`, `\u` or `\U` escape.
fn code_point(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Result<char> {
  let hex = chars.take(digits).collect::<String>();

  if hex.chars().count() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
    return Err(Error::MalformedGrid(format!(
      "expected {digits} hex digits in escape, found {hex:?}"
    )));
  }

  let code = u32::from_str_radix(&hex, 16)
    .map_err(|err| Error::MalformedGrid(format!("invalid escape {hex:?}: {err}")))?;
  to_char(code)
}

fn to_char(code: u32) -> Result<char> {
  char::from_u32(code)
    .ok_or_else(|| Error::MalformedGrid(format!("escape U+{code:X} is not a character")))
}

struct Parser {
  tokens: std::vec::IntoIter<Token>,
}

impl Parser {
  fn next(&mut self) -> Result<Token> {
    self
      .tokens
      .next()
      .ok_or_else(|| Error::MalformedGrid("unexpected end of input".to_string()))
  }

  fn expect_open(&mut self) -> Result<()> {
    match self.next()? {
      Token::Open => Ok(()),
      other => Err(Error::MalformedGrid(format!("expected '[', found {other:?}"))),
    }
  }

  /// Parses the items of a list whose `[` was already consumed.
  fn list<T>(&mut self, mut item: impl FnMut(&mut Self, Token) -> Result<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();

    loop {
      match self.next()? {
        Token::Close => return Ok(items),
        token => items.push(item(self, token)?),
      }

      match self.next()? {
        Token::Comma => {}
        Token::Close => return Ok(items),
        other => {
          return Err(Error::MalformedGrid(format!(
            "expected ',' or ']', found {other:?}"
          )))
        }
      }
    }
  }

  fn row(&mut self, token: Token) -> Result<Vec<RawCell>> {
    match token {
      Token::Open => self.list(|_, token| match token {
        Token::Cell(cell) => Ok(cell),
        other => Err(Error::MalformedGrid(format!("expected a cell, found {other:?}"))),
      }),
      other => Err(Error::MalformedGrid(format!("expected a row, found {other:?}"))),
    }
  }
}

pub(crate) fn parse(value: &str) -> Result<Vec<Vec<RawCell>>> {
  if let Ok(rows) = serde_json::from_str::<Vec<Vec<RawCell>>>(value) {
    return Ok(rows);
  }

  let mut parser = Parser {
    tokens: tokenize(value)?.into_iter(),
  };

  parser.expect_open()?;
  let rows = parser.list(Parser::row)?;

  if let Some(trailing) = parser.tokens.next() {
    return Err(Error::MalformedGrid(format!(
      "trailing input after grid: {trailing:?}"
    )));
  }

  Ok(rows)
}

pub(crate) fn render<R: AsRef<[String]>>(rows: &[R]) -> String {
  let rows = rows
    .iter()
    .map(|row| {
      let cells = row
        .as_ref()
        .iter()
        .map(|cell| format!("'{}'", cell.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect::<Vec<String>>();
      format!("[{}]", cells.join(", "))
    })
    .collect::<Vec<String>>();

  format!("[{}]", rows.join(", "))
}

#[cfg(test)]
mod test {
  use crate::legacy::{parse, render, RawCell};
  use crate::{Error, Grid};

  #[test]
  fn parses_printed_lists() -> anyhow::Result<()> {
    let rows = parse(r#"[['Lecture', "Hall 1"], [0, None, "it's"]]"#)?;

    assert_eq!(
      rows,
      vec![
        vec![
          RawCell::Text("Lecture".to_string()),
          RawCell::Text("Hall 1".to_string())
        ],
        vec![
          RawCell::Integer(0),
          RawCell::Empty,
          RawCell::Text("it's".to_string())
        ],
      ]
    );

    Ok(())
  }

  #[test]
  fn parses_json() -> anyhow::Result<()> {
    let rows = parse(r#"[["a\"b", null], []]"#)?;
    assert_eq!(rows[0][0], RawCell::Text("a\"b".to_string()));
    assert_eq!(rows[0][1], RawCell::Empty);
    assert!(rows[1].is_empty());

    Ok(())
  }

  #[test]
  fn json_escapes_are_decoded() -> anyhow::Result<()> {
    let rows = parse(r#"[["\u0645\u062d\u0627\u0636\u0631\u0629", "Hall\u00a01", 0]]"#)?;

    assert_eq!(rows[0][0], RawCell::Text("محاضرة".to_string()));
    assert_eq!(rows[0][1], RawCell::Text("Hall\u{a0}1".to_string()));
    assert_eq!(rows[0][2], RawCell::Integer(0));

    Ok(())
  }

  #[test]
  fn printed_escapes_are_decoded() -> anyhow::Result<()> {
    let rows = parse(r"[['Hall\xa01', '\u0645', '\U0001F4DA', 'a\012b', '\0', 'tab\there']]")?;

    assert_eq!(
      rows[0],
      vec![
        RawCell::Text("Hall\u{a0}1".to_string()),
        RawCell::Text("م".to_string()),
        RawCell::Text("\u{1F4DA}".to_string()),
        RawCell::Text("a\nb".to_string()),
        RawCell::Text("\0".to_string()),
        RawCell::Text("tab\there".to_string()),
      ]
    );

    Ok(())
  }

  #[test]
  fn bad_escapes_are_malformed() {
    for input in [
      r"[['\q']]",
      r"[['\x4']]",
      r"[['\xzz']]",
      r"[['\u12']]",
      r"[['\ud800']]",
      r"[['\U00110000']]",
    ] {
      assert!(
        matches!(parse(input), Err(Error::MalformedGrid(_))),
        "accepted {input:?}"
      );
    }
  }

  #[test]
  fn accepts_string_prefixes() -> anyhow::Result<()> {
    let rows = parse(r#"[[u'Lecture', b'B11', U"Hall 1", '']]"#)?;

    assert_eq!(
      rows[0],
      vec![
        RawCell::Text("Lecture".to_string()),
        RawCell::Text("B11".to_string()),
        RawCell::Text("Hall 1".to_string()),
        RawCell::Text(String::new()),
      ]
    );

    Ok(())
  }

  #[test]
  fn rejects_garbage() {
    for input in ["", "[", "[[]", "[['a' 'b']]", "[['a']] x", "{'a'}", "[[['a']]]", "['a']"] {
      assert!(
        matches!(parse(input), Err(Error::MalformedGrid(_))),
        "accepted {input:?}"
      );
    }
  }

  #[test]
  fn render_escapes_quotes() -> anyhow::Result<()> {
    let rendered = render(&[vec!["it's".to_string(), "back\\slash".to_string()]]);
    assert_eq!(rendered, r"[['it\'s', 'back\\slash']]");
    assert_eq!(
      parse(&rendered)?[0],
      vec![
        RawCell::Text("it's".to_string()),
        RawCell::Text("back\\slash".to_string())
      ]
    );

    Ok(())
  }

  #[test]
  fn legacy_round_trip_keeps_every_cell() -> anyhow::Result<()> {
    let mut grid = Grid::new();
    grid.set(0, 0, "Lecture")?;
    grid.set(1, 1, "O'Neil seminar")?;
    grid.set(6, 5, "Lab [B]")?;
    grid.set(3, 2, "محاضرة \u{a0}1")?;

    assert_eq!(Grid::parse_legacy(&grid.to_legacy())?, grid);
    assert_eq!(Grid::parse_legacy(&Grid::new().to_legacy())?, Grid::new());

    Ok(())
  }
}
