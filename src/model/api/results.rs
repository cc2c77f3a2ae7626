use serde::{Deserialize, Serialize};

/// Poll statistics: the percentage breakdown per choice, aligned with choice
/// order, plus the total ballot count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    /// Percentage of the total per choice, in choice order.
    pub values: Vec<f64>,
    /// Choice labels, in choice order.
    pub labels: Vec<String>,
    /// Total ballots cast.
    pub votes: u64,
}

impl PollResults {
    /// Compute the percentage breakdown from per-choice tallies.
    ///
    /// Every percentage is zero when no ballots have been cast.
    pub fn from_tallies(tallies: impl IntoIterator<Item = (String, u64)>) -> Self {
        let (labels, counts): (Vec<String>, Vec<u64>) = tallies.into_iter().unzip();
        let total: u64 = counts.iter().sum();
        let values = counts
            .into_iter()
            .map(|count| {
                if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                }
            })
            .collect();
        Self {
            values,
            labels,
            votes: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uneven_split() {
        let results = PollResults::from_tallies(vec![
            ("A".to_string(), 3),
            ("B".to_string(), 1),
        ]);
        assert_eq!(results.values, vec![75.0, 25.0]);
        assert_eq!(results.labels, vec!["A", "B"]);
        assert_eq!(results.votes, 4);
    }

    #[test]
    fn no_votes_means_all_zero() {
        let results = PollResults::from_tallies(vec![
            ("A".to_string(), 0),
            ("B".to_string(), 0),
            ("C".to_string(), 0),
        ]);
        assert_eq!(results.values, vec![0.0, 0.0, 0.0]);
        assert_eq!(results.votes, 0);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        // A three-way split doesn't divide evenly; the sum must still come
        // out to 100 up to floating point error.
        let results = PollResults::from_tallies(vec![
            ("A".to_string(), 1),
            ("B".to_string(), 1),
            ("C".to_string(), 1),
        ]);
        let sum: f64 = results.values.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(results.votes, 3);
    }

    #[test]
    fn no_choices() {
        let results = PollResults::from_tallies(Vec::new());
        assert!(results.values.is_empty());
        assert!(results.labels.is_empty());
        assert_eq!(results.votes, 0);
    }
}
