use chrono::{DateTime, Utc};

/// Doubles the resolution of a series by inserting the midpoint of every pair
/// of consecutive samples. Original samples are kept; the result is sorted.
pub fn densify(points: &[(DateTime<Utc>, f64)]) -> Vec<(DateTime<Utc>, f64)> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|(t, _)| *t);

    let mut out = Vec::with_capacity(sorted.len().saturating_mul(2));
    for (i, &(t, p)) in sorted.iter().enumerate() {
        out.push((t, p));
        if let Some(&(t_next, p_next)) = sorted.get(i + 1) {
            if t_next > t {
                out.push((t + (t_next - t) / 2, (p + p_next) / 2.0));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).single().expect("valid timestamp")
    }

    #[test]
    fn midpoints_sit_between_neighbours() {
        let out = densify(&[(t(10, 0), 10.0), (t(11, 0), 20.0), (t(12, 0), 0.0)]);
        assert_eq!(out, vec![
            (t(10, 0), 10.0),
            (t(10, 30), 15.0),
            (t(11, 0), 20.0),
            (t(11, 30), 10.0),
            (t(12, 0), 0.0),
        ]);
    }

    #[test]
    fn unsorted_input_is_ordered_first() {
        let out = densify(&[(t(12, 0), 4.0), (t(10, 0), 0.0)]);
        assert_eq!(out[1], (t(10, 0) + Duration::hours(1), 2.0));
        assert!(out.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn trivial_series_are_unchanged() {
        assert!(densify(&[]).is_empty());
        assert_eq!(densify(&[(t(1, 0), 3.0)]), vec![(t(1, 0), 3.0)]);
    }

    #[test]
    fn duplicate_timestamps_get_no_midpoint() {
        let out = densify(&[(t(1, 0), 1.0), (t(1, 0), 2.0)]);
        assert_eq!(out.len(), 2);
    }
}
