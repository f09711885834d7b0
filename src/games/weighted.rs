//! Weighted cumulative tables
//!
//! A draw `u` in `[0, 1)` becomes `threshold = u * W`; the first entry whose
//! running weight reaches the threshold wins. Order therefore matters and
//! tables are authored from the lowest tier to the highest.

use crate::config::WeightedEntry;

/// Ordered `(value, weight)` table with a precomputed total weight
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedTable {
    entries: Vec<WeightedEntry>,
    total_weight: f64,
}

impl WeightedTable {
    /// Build from validated entries. An empty table selects `0.0`.
    pub fn new(entries: Vec<WeightedEntry>) -> Self {
        let total_weight = entries.iter().map(|e| e.weight).sum();
        Self { entries, total_weight }
    }

    /// Uniform-weight table over the given values
    pub fn uniform(values: &[f64]) -> Self {
        Self::new(values.iter().map(|&v| WeightedEntry::new(v, 1.0)).collect())
    }

    pub fn entries(&self) -> &[WeightedEntry] {
        &self.entries
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Index of the entry selected by `draw`
    pub fn select_index(&self, draw: f64) -> usize {
        let threshold = draw * self.total_weight;
        let mut cumulative = 0.0;
        for (i, entry) in self.entries.iter().enumerate() {
            cumulative += entry.weight;
            if cumulative >= threshold {
                return i;
            }
        }
        // Rounding can leave the final cumulative a hair under the threshold
        self.entries.len().saturating_sub(1)
    }

    /// Value of the entry selected by `draw`
    pub fn select(&self, draw: f64) -> f64 {
        self.entries
            .get(self.select_index(draw))
            .map(|e| e.value)
            .unwrap_or(0.0)
    }

    /// Probability of each entry, in table order
    pub fn probabilities(&self) -> Vec<f64> {
        if self.total_weight <= 0.0 {
            return vec![0.0; self.entries.len()];
        }
        self.entries.iter().map(|e| e.weight / self.total_weight).collect()
    }

    /// `Σ p_i * value_i`
    pub fn expected_value(&self) -> f64 {
        self.entries
            .iter()
            .zip(self.probabilities())
            .map(|(e, p)| e.value * p)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn primary() -> WeightedTable {
        WeightedTable::new(GameConfig::default().primary.entries)
    }

    #[test]
    fn test_first_entry_reaching_threshold_wins() {
        let table = WeightedTable::new(vec![
            WeightedEntry::new(1.0, 50.0),
            WeightedEntry::new(2.0, 50.0),
        ]);
        // threshold exactly on the boundary selects the earlier entry
        assert_eq!(table.select(0.5), 1.0);
        assert_eq!(table.select(0.5000001), 2.0);
        assert_eq!(table.select(0.0), 1.0);
    }

    #[test]
    fn test_primary_table_boundaries() {
        let table = primary();
        assert_eq!(table.select(0.10), 0.0);
        assert_eq!(table.select(0.45), 0.0);
        assert_eq!(table.select(0.50), 0.8);
        assert_eq!(table.select(0.70), 1.3);
        assert_eq!(table.select(0.995), 8.0);
        assert_eq!(table.select(0.99999), 200.0);
    }

    #[test]
    fn test_falls_back_to_last_entry() {
        let table = WeightedTable::new(vec![
            WeightedEntry::new(1.0, 0.1),
            WeightedEntry::new(2.0, 0.2),
        ]);
        assert_eq!(table.select(1.0), 2.0);
        assert_eq!(table.select_index(1.0), 1);
    }

    #[test]
    fn test_zero_weight_entries_are_skipped() {
        let table = WeightedTable::new(vec![
            WeightedEntry::new(1.0, 1.0),
            WeightedEntry::new(5.0, 0.0),
            WeightedEntry::new(9.0, 1.0),
        ]);
        assert_eq!(table.select(0.75), 9.0);
    }

    #[test]
    fn test_probabilities_are_normalized() {
        let table = primary();
        let probabilities = table.probabilities();
        assert!(probabilities.iter().all(|p| *p >= 0.0));
        let sum: f64 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((table.total_weight() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_expected_value_of_primary_table() {
        assert!((primary().expected_value() - 0.94825).abs() < 1e-9);
    }

    #[test]
    fn test_empty_table_selects_zero() {
        let table = WeightedTable::new(Vec::new());
        assert_eq!(table.select(0.3), 0.0);
        assert!(table.probabilities().is_empty());
    }
}
