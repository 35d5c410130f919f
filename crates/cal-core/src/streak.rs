//! Activity streak: consecutive logged days ending today.

use chrono::NaiveDate;

/// Count consecutive days, ending at `today`, that have a daily aggregate.
///
/// Returns 0 when `today` itself has no entry. Dates after `today` are
/// ignored, so a future-dated row never resets the streak to 0.
pub fn activity_streak<I>(dates: I, today: NaiveDate) -> u32
where
  I: IntoIterator<Item = NaiveDate>,
{
  let mut dates: Vec<NaiveDate> =
    dates.into_iter().filter(|d| *d <= today).collect();
  dates.sort_unstable_by(|a, b| b.cmp(a));
  dates.dedup();

  let mut streak = 0;
  let mut expected = Some(today);
  for date in dates {
    if Some(date) != expected {
      break;
    }
    streak += 1;
    expected = date.pred_opt();
  }
  streak
}
