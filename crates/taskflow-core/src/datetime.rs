use chrono::{
  DateTime,
  Days,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;

const TIMEZONE_ENV_VAR: &str =
  "TASKFLOW_TIMEZONE";
const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// How a due date is shown next to a task.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub enum DueLabel {
  Today,
  Tomorrow,
  Overdue,
  Upcoming(String)
}

impl DueLabel {
  #[must_use]
  pub fn text(&self) -> &str {
    match self {
      | Self::Today => "Today",
      | Self::Tomorrow => "Tomorrow",
      | Self::Overdue => "Overdue",
      | Self::Upcoming(text) => text
    }
  }

  #[must_use]
  pub fn is_overdue(&self) -> bool {
    matches!(self, Self::Overdue)
  }
}

/// Today beats Tomorrow beats Overdue;
/// anything later gets a short month/day
/// label such as `Oct 20`.
#[must_use]
pub fn due_label(
  due: NaiveDate,
  now: DateTime<Utc>,
  tz: &Tz
) -> DueLabel {
  let today =
    now.with_timezone(tz).date_naive();

  if due == today {
    return DueLabel::Today;
  }
  if today
    .checked_add_days(Days::new(1))
    == Some(due)
  {
    return DueLabel::Tomorrow;
  }
  if due < today {
    return DueLabel::Overdue;
  }
  DueLabel::Upcoming(
    due.format("%b %d").to_string()
  )
}

/// Resolves the zone used to decide what
/// "today" is. The configured value wins,
/// then `TASKFLOW_TIMEZONE`, then UTC.
#[must_use]
pub fn resolve_display_timezone(
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(
        &raw,
        TIMEZONE_ENV_VAR
      )
  {
    return tz;
  }

  chrono_tz::UTC
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::error!(
        timezone = trimmed,
        source,
        error = %err,
        "invalid timezone; ignoring"
      );
      None
    }
  }
}

/// Parses the editor's date field. Empty
/// input means no due date.
pub fn parse_form_date(
  raw: &str
) -> Result<Option<NaiveDate>, String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(
    trimmed,
    FORM_DATE_FORMAT
  )
  .map(Some)
  .map_err(|_| trimmed.to_string())
}

#[must_use]
pub fn format_form_date(
  date: NaiveDate
) -> String {
  date
    .format(FORM_DATE_FORMAT)
    .to_string()
}
