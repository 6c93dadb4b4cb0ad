// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Language aggregation across accepted repositories.
//!
//! Each non-empty repository contributes its language byte sizes into one
//! map. Excluded languages are tracked separately and never surface as a
//! usable metric. Proportions are computed once, after every repository has
//! been merged.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

/// Aggregated usage of a single language across all accepted repositories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageStat {
    /// Total bytes written in this language.
    pub size: u64,
    /// Number of repositories contributing this language.
    pub occurrences: u64,
    /// Display color reported by the service, when known.
    pub color: Option<String>,
    /// Share of the total language bytes, in percent. Zero until the final
    /// proportion pass runs.
    pub proportion_percent: f64
}

/// Accumulator merging per-repository language listings.
///
/// Owned by the discovery pass and frozen into the overview once the final
/// proportion pass has run; never shared across concurrent tasks.
#[derive(Debug, Default)]
pub struct LanguageAccumulator {
    languages: BTreeMap<String, LanguageStat>,
    excluded:  BTreeSet<String>
}

impl LanguageAccumulator {
    /// Merges one language occurrence of `size` bytes.
    ///
    /// The first occurrence creates the entry with the provided color;
    /// subsequent occurrences add size and bump the repository count. A
    /// language in `exclude_langs` is recorded as excluded instead.
    pub fn merge(
        &mut self,
        name: &str,
        size: u64,
        color: Option<&str>,
        exclude_langs: &HashSet<String>
    ) {
        if exclude_langs.contains(name) {
            self.excluded.insert(name.to_string());
            return;
        }

        self.languages
            .entry(name.to_string())
            .and_modify(|stat| {
                stat.size += size;
                stat.occurrences += 1;
            })
            .or_insert_with(|| LanguageStat {
                size,
                occurrences: 1,
                color: color.map(str::to_string),
                proportion_percent: 0.0
            });
    }

    /// Computes each language's share of the total byte count.
    ///
    /// A zero total (no languages found) leaves every proportion at zero
    /// rather than dividing.
    pub fn finalize(mut self) -> (BTreeMap<String, LanguageStat>, BTreeSet<String>) {
        let total: u64 = self.languages.values().map(|stat| stat.size).sum();

        if total > 0 {
            for stat in self.languages.values_mut() {
                stat.proportion_percent = 100.0 * (stat.size as f64 / total as f64);
            }
        }

        (self.languages, self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_exclusions() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn first_occurrence_creates_entry_with_color() {
        let mut accumulator = LanguageAccumulator::default();
        accumulator.merge("Rust", 100, Some("#dea584"), &no_exclusions());

        let (languages, excluded) = accumulator.finalize();
        let rust = languages.get("Rust").expect("missing Rust entry");
        assert_eq!(rust.size, 100);
        assert_eq!(rust.occurrences, 1);
        assert_eq!(rust.color.as_deref(), Some("#dea584"));
        assert!(excluded.is_empty());
    }

    #[test]
    fn repeat_occurrences_add_size_and_keep_first_color() {
        let mut accumulator = LanguageAccumulator::default();
        accumulator.merge("Rust", 100, Some("#dea584"), &no_exclusions());
        accumulator.merge("Rust", 50, Some("#ffffff"), &no_exclusions());

        let (languages, _) = accumulator.finalize();
        let rust = languages.get("Rust").expect("missing Rust entry");
        assert_eq!(rust.size, 150);
        assert_eq!(rust.occurrences, 2);
        assert_eq!(rust.color.as_deref(), Some("#dea584"));
    }

    #[test]
    fn excluded_language_is_tracked_separately() {
        let exclude: HashSet<String> = ["HTML".to_string()].into();
        let mut accumulator = LanguageAccumulator::default();
        accumulator.merge("HTML", 4000, None, &exclude);
        accumulator.merge("Rust", 1000, None, &exclude);

        let (languages, excluded) = accumulator.finalize();
        assert!(!languages.contains_key("HTML"));
        assert!(excluded.contains("HTML"));
        let rust = languages.get("Rust").expect("missing Rust entry");
        assert!((rust.proportion_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn proportions_sum_to_one_hundred() {
        let mut accumulator = LanguageAccumulator::default();
        accumulator.merge("Rust", 300, None, &no_exclusions());
        accumulator.merge("Python", 100, None, &no_exclusions());
        accumulator.merge("Shell", 100, None, &no_exclusions());

        let (languages, _) = accumulator.finalize();
        let total: f64 = languages.values().map(|stat| stat.proportion_percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!((languages["Rust"].proportion_percent - 60.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_keeps_proportions_at_zero() {
        let mut accumulator = LanguageAccumulator::default();
        accumulator.merge("Rust", 0, None, &no_exclusions());

        let (languages, _) = accumulator.finalize();
        assert_eq!(languages["Rust"].proportion_percent, 0.0);
    }

    #[test]
    fn empty_accumulator_finalizes_empty() {
        let (languages, excluded) = LanguageAccumulator::default().finalize();
        assert!(languages.is_empty());
        assert!(excluded.is_empty());
    }

    mod properties {
        use std::collections::HashSet;

        use proptest::prelude::*;

        use super::super::LanguageAccumulator;

        proptest! {
            #[test]
            fn proportions_sum_to_one_hundred_or_zero(
                sizes in proptest::collection::vec((0u8..8, 1u64..100_000), 0..32)
            ) {
                let exclude = HashSet::new();
                let mut accumulator = LanguageAccumulator::default();
                for (tag, size) in &sizes {
                    accumulator.merge(&format!("lang{tag}"), *size, None, &exclude);
                }

                let (languages, _) = accumulator.finalize();
                let total: f64 = languages.values().map(|stat| stat.proportion_percent).sum();
                if languages.is_empty() {
                    prop_assert_eq!(total, 0.0);
                } else {
                    prop_assert!((total - 100.0).abs() < 1e-6);
                }
            }
        }
    }
}
