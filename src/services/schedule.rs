use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::task::{RecurrenceUnit, Task, WeekdayTag};

/// Resolves which tasks are due on a calendar date in one time zone.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleResolver {
    timezone: Tz,
}

impl Default for ScheduleResolver {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl ScheduleResolver {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    pub fn is_due_on(&self, task: &Task, date: NaiveDate) -> bool {
        is_due_on(task, self.local_date(task.due_date), date)
    }

    pub fn due_tasks<'a>(&self, tasks: &'a [Task], date: NaiveDate) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.is_due_on(task, date))
            .collect()
    }
}

/// Due-date rule on calendar dates. `due_date` is the task's anchor already
/// converted to the local calendar.
///
/// Explicit weekly days win over the interval. `month` and `year` units
/// have no rule of their own and resolve like a one-off task.
pub fn is_due_on(task: &Task, due_date: NaiveDate, date: NaiveDate) -> bool {
    if !task.status.is_active() {
        return false;
    }

    if let Some(recurrence) = &task.recurrence {
        if recurrence.unit == RecurrenceUnit::Week {
            if let Some(days) = recurrence.explicit_days() {
                return days.contains(&WeekdayTag::from(date.weekday()));
            }

            if due_date.weekday() != date.weekday() {
                return false;
            }
            let period = i64::from(recurrence.interval) * 7;
            let elapsed = date.signed_duration_since(due_date).num_days().abs();
            return elapsed.checked_rem(period) == Some(0);
        }
    }

    due_date == date
}
