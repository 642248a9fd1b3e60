/// Same-day run counter for daily bucketing.
///
/// State is `{current_date, running_count}`. A date's count is committed only
/// when a different date shows up or when the cursor is finished, so
/// [`DayCursor::finish`] must run exactly once at the end of every scan. It
/// consumes the cursor to make that hard to forget.
use chrono::NaiveDate;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct DayCursor {
    current: Option<(NaiveDate, u64)>,
}

impl DayCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one post on `date`, committing the previous run on a date change.
    pub fn observe(&mut self, date: NaiveDate, daily: &mut IndexMap<NaiveDate, u64>) {
        if let Some((current, count)) = self.current.as_mut() {
            if *current == date {
                *count += 1;
                return;
            }
        }
        if let Some((previous, count)) = self.current.replace((date, 1)) {
            commit(daily, previous, count);
        }
    }

    /// Commit the in-progress run.
    pub fn finish(self, daily: &mut IndexMap<NaiveDate, u64>) {
        if let Some((date, count)) = self.current {
            commit(daily, date, count);
        }
    }
}

// Adds rather than overwrites: a date that reappears later in the scan keeps
// both runs.
fn commit(daily: &mut IndexMap<NaiveDate, u64>, date: NaiveDate, count: u64) {
    *daily.entry(date).or_insert(0) += count;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_runs_and_final_flush() {
        let mut daily = IndexMap::new();
        let mut cursor = DayCursor::new();
        for d in [12, 12, 12, 11, 11, 10] {
            cursor.observe(day(d), &mut daily);
        }
        // The last run is still pending until finish
        assert_eq!(daily.len(), 2);
        assert!(!daily.contains_key(&day(10)));

        cursor.finish(&mut daily);
        assert_eq!(daily.get(&day(12)), Some(&3));
        assert_eq!(daily.get(&day(11)), Some(&2));
        assert_eq!(daily.get(&day(10)), Some(&1));
        assert_eq!(daily.keys().copied().collect::<Vec<_>>(), vec![day(12), day(11), day(10)]);
    }

    #[test]
    fn test_single_day() {
        let mut daily = IndexMap::new();
        let mut cursor = DayCursor::new();
        cursor.observe(day(5), &mut daily);
        cursor.observe(day(5), &mut daily);
        assert!(daily.is_empty());
        cursor.finish(&mut daily);
        assert_eq!(daily.get(&day(5)), Some(&2));
    }

    #[test]
    fn test_empty_finish_adds_nothing() {
        let mut daily = IndexMap::new();
        DayCursor::new().finish(&mut daily);
        assert!(daily.is_empty());
    }

    #[test]
    fn test_reappearing_date_accumulates() {
        let mut daily = IndexMap::new();
        let mut cursor = DayCursor::new();
        for d in [3, 2, 3] {
            cursor.observe(day(d), &mut daily);
        }
        cursor.finish(&mut daily);
        assert_eq!(daily.get(&day(3)), Some(&2));
        assert_eq!(daily.values().sum::<u64>(), 3);
    }
}
