use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{AccountSelection, SelectionItem, WalletsConfig};

/// Names picked by a selection, by 1-based position. Out-of-range entries are ignored.
fn pick<'a>(names: &'a [String], selection: &AccountSelection, zero_means_all: bool) -> Vec<&'a String> {
    let at = move |index: usize| index.checked_sub(1).and_then(|i| names.get(i));

    match selection {
        AccountSelection::Index(0) if zero_means_all => names.iter().collect(),
        AccountSelection::Index(0) => Vec::new(),
        AccountSelection::Index(index) => at(*index).into_iter().collect(),
        AccountSelection::List(items) => {
            let mut picked = Vec::new();
            for item in items {
                match *item {
                    SelectionItem::Index(index) => picked.extend(at(index)),
                    SelectionItem::Range((start, end)) if 0 < start && start <= end && end <= names.len() => {
                        picked.extend(&names[start - 1..end]);
                    }
                    SelectionItem::Range(_) => {}
                }
            }
            picked
        }
    }
}

/// Resolve `to_work` minus `to_exclude` against the directory order,
/// shuffled when requested.
pub fn select_accounts(names: &[String], wallets: &WalletsConfig, rng: &mut impl Rng) -> Vec<String> {
    let excluded = pick(names, &wallets.to_exclude, false);

    let mut selected: Vec<String> = Vec::new();
    for name in pick(names, &wallets.to_work, true) {
        if !excluded.contains(&name) && !selected.contains(name) {
            selected.push(name.clone());
        }
    }

    if wallets.shuffle {
        selected.shuffle(rng);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("acc-{}", i)).collect()
    }

    fn wallets(to_work: AccountSelection, to_exclude: AccountSelection) -> WalletsConfig {
        WalletsConfig {
            to_work,
            to_exclude,
            shuffle: false,
        }
    }

    #[test]
    fn zero_selects_everyone() {
        let mut rng = StdRng::seed_from_u64(0);
        let picked = select_accounts(&names(3), &WalletsConfig::default(), &mut rng);
        assert_eq!(picked, names(3));
    }

    #[test]
    fn single_index_and_out_of_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = wallets(AccountSelection::Index(2), AccountSelection::Index(0));
        assert_eq!(select_accounts(&names(3), &config, &mut rng), vec!["acc-2"]);

        let config = wallets(AccountSelection::Index(9), AccountSelection::Index(0));
        assert!(select_accounts(&names(3), &config, &mut rng).is_empty());
    }

    #[test]
    fn lists_ranges_and_exclusions() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = wallets(
            AccountSelection::List(vec![
                SelectionItem::Index(1),
                SelectionItem::Range((3, 6)),
                SelectionItem::Range((5, 99)),
            ]),
            AccountSelection::List(vec![SelectionItem::Index(4), SelectionItem::Range((6, 6))]),
        );
        assert_eq!(
            select_accounts(&names(8), &config, &mut rng),
            vec!["acc-1", "acc-3", "acc-5"]
        );
    }

    #[test]
    fn shuffle_keeps_the_same_set() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut config = WalletsConfig::default();
        config.shuffle = true;
        let mut picked = select_accounts(&names(20), &config, &mut rng);
        picked.sort();
        let mut expected = names(20);
        expected.sort();
        assert_eq!(picked, expected);
    }
}
