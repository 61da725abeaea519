//! `/api/calendar` month and day views.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use {
    chrono::{Datelike, NaiveDate},
    notarium_notes::Task,
};

use crate::{error::ApiError, extract::CurrentUser, state::AppState};

pub fn calendar_router() -> Router<AppState> {
    Router::new()
        .route("/{year}/{month}", get(month_handler))
        .route("/{year}/{month}/{day}", get(day_handler))
}

/// One calendar month: how many blank cells lead the first week (weeks
/// start on Monday) and the tasks bucketed per day.
#[derive(serde::Serialize)]
struct MonthView {
    year: i32,
    month: u32,
    leading_blanks: u32,
    days: Vec<DayCell>,
}

#[derive(serde::Serialize)]
struct DayCell {
    day: u32,
    tasks: Vec<Task>,
}

async fn month_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthView>, ApiError> {
    let first = first_of_month(year, month)?;
    let leading_blanks = first.weekday().num_days_from_monday();
    let day_count = days_in_month(first);

    let mut buckets: Vec<Vec<Task>> = (0..day_count).map(|_| Vec::new()).collect();
    for task in state.tasks.due_in_month(current.user.id, year, month).await? {
        let day = task.due_date.day();
        if let Some(bucket) = buckets.get_mut((day - 1) as usize) {
            bucket.push(task);
        }
    }

    let days = buckets
        .into_iter()
        .enumerate()
        .map(|(i, tasks)| DayCell {
            day: i as u32 + 1,
            tasks,
        })
        .collect();

    Ok(Json(MonthView {
        year,
        month,
        leading_blanks,
        days,
    }))
}

async fn day_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Json<Vec<Task>>, ApiError> {
    first_of_month(year, month)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ApiError::BadRequest("invalid date".into()))?;
    Ok(Json(state.tasks.due_on_day(current.user.id, date).await?))
}

/// Validate year and month and return the month's first day. Years are
/// capped at four digits to match the stored date format.
fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, ApiError> {
    if !(1..=9999).contains(&year) {
        return Err(ApiError::BadRequest("invalid year".into()));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::BadRequest("invalid month".into()))
}

fn days_in_month(first: NaiveDate) -> u32 {
    let (year, month) = (first.year(), first.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map_or(31, |d| d.day())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        let d = |y, m| days_in_month(NaiveDate::from_ymd_opt(y, m, 1).unwrap());
        assert_eq!(d(2026, 1), 31);
        assert_eq!(d(2026, 2), 28);
        assert_eq!(d(2028, 2), 29);
        assert_eq!(d(2026, 4), 30);
        assert_eq!(d(2026, 12), 31);
    }

    #[test]
    fn leading_blanks_count_from_monday() {
        // 2026-03-01 is a Sunday: six blanks before it.
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(first.weekday().num_days_from_monday(), 6);
        // 2026-06-01 is a Monday: no blanks.
        let first = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(first.weekday().num_days_from_monday(), 0);
    }

    #[test]
    fn month_validation() {
        assert!(first_of_month(2026, 1).is_ok());
        assert!(first_of_month(2026, 12).is_ok());
        assert!(first_of_month(2026, 0).is_err());
        assert!(first_of_month(2026, 13).is_err());
        assert!(first_of_month(0, 5).is_err());
        assert!(first_of_month(10000, 5).is_err());
    }
}
