//! Pairing sheet: who races whom in the next elimination round, and in which lane.

use crate::wire::{PairingEntry, PairingRecord};
use log::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing {
    /// 1-based place on the sheet.
    pub number: usize,
    pub category: String,
    pub left: PairingEntry,
    pub right: PairingEntry,
}

impl Pairing {
    /// The API's pair number when it sends one, else the place on the sheet.
    pub fn label(&self) -> String {
        let pair_num = self.left.pair_num.trim();
        if pair_num.is_empty() {
            self.number.to_string()
        } else {
            pair_num.to_owned()
        }
    }
}

/// Flatten every category item's drivers and pair them off in order.
///
/// Entries `2k` and `2k + 1` form pair `k + 1`. A trailing driver without an
/// opponent is not shown.
pub fn pairings_from_records(records: Vec<PairingRecord>) -> Vec<Pairing> {
    let drivers: Vec<(String, PairingEntry)> = records
        .into_iter()
        .flat_map(|record| {
            let category = record.category;
            record.results.into_iter().map(move |entry| (category.clone(), entry))
        })
        .collect();

    if drivers.len() % 2 == 1
        && let Some((_, odd)) = drivers.last()
    {
        debug!("pairing sheet: {} has no opponent yet", odd.driver_name);
    }

    let mut drivers = drivers.into_iter();
    let mut pairings = Vec::with_capacity(drivers.len() / 2);
    while let (Some((category, left)), Some((_, right))) = (drivers.next(), drivers.next()) {
        pairings.push(Pairing { number: pairings.len() + 1, category, left, right });
    }
    pairings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(name: &str, pair_num: &str, lane: &str) -> PairingEntry {
        PairingEntry {
            driver_name: name.into(),
            pair_num: pair_num.into(),
            position: lane.into(),
            ..Default::default()
        }
    }

    fn record(category: &str, results: Vec<PairingEntry>) -> PairingRecord {
        PairingRecord { category: category.into(), results }
    }

    fn names(pairings: &[Pairing]) -> Vec<(&str, &str)> {
        pairings
            .iter()
            .map(|p| (p.left.driver_name.as_str(), p.right.driver_name.as_str()))
            .collect()
    }

    #[test]
    fn consecutive_drivers_are_paired_in_order() {
        let pairings = pairings_from_records(vec![record(
            "Super Gas",
            vec![driver("A", "1", "Left"), driver("B", "1", "Right"), driver("C", "2", "Left"), driver("D", "2", "Right")],
        )]);
        assert_eq!(names(&pairings), vec![("A", "B"), ("C", "D")]);
        assert_eq!(pairings[1].number, 2);
        assert_eq!(pairings[1].category, "Super Gas");
    }

    #[test]
    fn odd_driver_out_is_dropped() {
        let pairings = pairings_from_records(vec![record(
            "Super Gas",
            vec![driver("A", "", "Left"), driver("B", "", "Right"), driver("C", "", "Left")],
        )]);
        assert_eq!(names(&pairings), vec![("A", "B")]);
    }

    #[test]
    fn pairs_run_across_category_items() {
        let pairings = pairings_from_records(vec![
            record("Super Gas", vec![driver("A", "", ""), driver("B", "", ""), driver("C", "", "")]),
            record("Super Street", vec![driver("D", "", "")]),
        ]);
        assert_eq!(names(&pairings), vec![("A", "B"), ("C", "D")]);
        assert_eq!(pairings[1].category, "Super Gas");
    }

    #[test]
    fn label_prefers_api_pair_number() {
        let pairings = pairings_from_records(vec![record(
            "Super Gas",
            vec![driver("A", "7", ""), driver("B", "7", ""), driver("C", " ", ""), driver("D", "", "")],
        )]);
        assert_eq!(pairings[0].label(), "7");
        assert_eq!(pairings[1].label(), "2");
    }

    #[test]
    fn empty_sheet() {
        assert!(pairings_from_records(Vec::new()).is_empty());
        assert!(pairings_from_records(vec![record("Super Gas", Vec::new())]).is_empty());
    }
}
