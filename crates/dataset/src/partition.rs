//! Leave-one/two-out temporal split of an interaction log.
//!
//! ## Algorithm
//! 1. Group interactions by user, keeping input order within each group
//! 2. Stable-sort each group by timestamp (equal timestamps keep input order)
//! 3. Split each group by its size `n`:
//!    - `n >= 3`: all but the last two → train, second-to-last → valid, last → test
//!    - `n == 2`: first → train, last → test
//!    - `n == 1`: the interaction → train
//!
//! Users are independent, so step 2 and 3 run in parallel with rayon. The
//! result is a pure function of the input: same log, same split.

use catalog::Interaction;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// One user's chronological history, split three ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSplit {
    pub user_id: String,
    pub train: Vec<Interaction>,
    pub valid: Vec<Interaction>,
    pub test: Vec<Interaction>,
}

impl UserSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split of a whole log, one entry per user in ascending user id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionedLog {
    pub users: Vec<UserSplit>,
}

impl PartitionedLog {
    pub fn user(&self, user_id: &str) -> Option<&UserSplit> {
        self.users
            .binary_search_by(|u| u.user_id.as_str().cmp(user_id))
            .ok()
            .map(|idx| &self.users[idx])
    }

    pub fn train(&self) -> impl Iterator<Item = &Interaction> {
        self.users.iter().flat_map(|u| u.train.iter())
    }

    pub fn valid(&self) -> impl Iterator<Item = &Interaction> {
        self.users.iter().flat_map(|u| u.valid.iter())
    }

    pub fn test(&self) -> impl Iterator<Item = &Interaction> {
        self.users.iter().flat_map(|u| u.test.iter())
    }

    /// (train, valid, test) row counts
    pub fn counts(&self) -> (usize, usize, usize) {
        self.users.iter().fold((0, 0, 0), |(tr, va, te), u| {
            (tr + u.train.len(), va + u.valid.len(), te + u.test.len())
        })
    }
}

/// Split one user's interactions.
pub fn split_user(user_id: impl Into<String>, mut history: Vec<Interaction>) -> UserSplit {
    history.sort_by_key(|i| i.timestamp);

    let n = history.len();
    let (test, valid) = match n {
        0 | 1 => (Vec::new(), Vec::new()),
        2 => (history.split_off(1), Vec::new()),
        _ => {
            let test = history.split_off(n - 1);
            let valid = history.split_off(n - 2);
            (test, valid)
        }
    };

    UserSplit {
        user_id: user_id.into(),
        train: history,
        valid,
        test,
    }
}

/// Partition a full interaction log per user.
#[instrument(skip(log), fields(rows = log.len()))]
pub fn partition(log: Vec<Interaction>) -> PartitionedLog {
    let mut by_user: BTreeMap<String, Vec<Interaction>> = BTreeMap::new();
    for interaction in log {
        by_user
            .entry(interaction.user_id.clone())
            .or_default()
            .push(interaction);
    }

    let groups: Vec<(String, Vec<Interaction>)> = by_user.into_iter().collect();
    let users = groups
        .into_par_iter()
        .map(|(user_id, history)| split_user(user_id, history))
        .collect();

    let split = PartitionedLog { users };
    debug!("Partitioned {} users", split.users.len());
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(user: &str, timestamps: &[i64]) -> Vec<Interaction> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| Interaction::new(user, format!("item{}", i), *ts))
            .collect()
    }

    fn timestamps(rows: &[Interaction]) -> Vec<i64> {
        rows.iter().map(|i| i.timestamp).collect()
    }

    #[test]
    fn test_five_interactions() {
        let split = split_user("u", history("u", &[10, 20, 30, 40, 50]));
        assert_eq!(timestamps(&split.train), vec![10, 20, 30]);
        assert_eq!(timestamps(&split.valid), vec![40]);
        assert_eq!(timestamps(&split.test), vec![50]);
    }

    #[test]
    fn test_two_interactions() {
        let split = split_user("u", history("u", &[10, 20]));
        assert_eq!(timestamps(&split.train), vec![10]);
        assert!(split.valid.is_empty());
        assert_eq!(timestamps(&split.test), vec![20]);
    }

    #[test]
    fn test_single_interaction() {
        let split = split_user("u", history("u", &[10]));
        assert_eq!(timestamps(&split.train), vec![10]);
        assert!(split.valid.is_empty());
        assert!(split.test.is_empty());
    }

    #[test]
    fn test_three_interactions() {
        let split = split_user("u", history("u", &[30, 10, 20]));
        assert_eq!(timestamps(&split.train), vec![10]);
        assert_eq!(timestamps(&split.valid), vec![20]);
        assert_eq!(timestamps(&split.test), vec![30]);
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_time() {
        let split = split_user("u", history("u", &[50, 10, 40, 20, 30]));
        assert_eq!(timestamps(&split.train), vec![10, 20, 30]);
        assert_eq!(timestamps(&split.test), vec![50]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let rows = vec![
            Interaction::new("u", "a", 5),
            Interaction::new("u", "b", 5),
            Interaction::new("u", "c", 5),
            Interaction::new("u", "d", 1),
        ];
        let split = split_user("u", rows);

        let items: Vec<_> = split
            .train
            .iter()
            .chain(&split.valid)
            .chain(&split.test)
            .map(|i| i.item_id.as_str())
            .collect();
        assert_eq!(items, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_partition_groups_users_in_order() {
        let mut log = history("bob", &[1, 2, 3]);
        log.extend(history("alice", &[7]));
        log.extend(history("carol", &[4, 9]));

        let result = partition(log);
        let users: Vec<_> = result.users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
        assert_eq!(result.counts(), (3, 1, 2));
        assert_eq!(result.user("carol").map(|u| u.test.len()), Some(1));
        assert!(result.user("dave").is_none());
    }

    #[test]
    fn test_partition_conserves_every_interaction() {
        for n in 0..12 {
            let mut log = Vec::new();
            for user in 0..4 {
                // Scrambled timestamps; longer histories repeat some
                let stamps: Vec<i64> = (0..n + user).map(|i| ((i * 7 + 3) % 11) as i64).collect();
                log.extend(history(&format!("u{}", user), &stamps));
            }

            let result = partition(log.clone());
            let mut rebuilt: Vec<Interaction> = result
                .train()
                .chain(result.valid())
                .chain(result.test())
                .cloned()
                .collect();

            let mut original = log;
            original.sort_by(|a, b| (&a.user_id, &a.item_id, a.timestamp).cmp(&(&b.user_id, &b.item_id, b.timestamp)));
            rebuilt.sort_by(|a, b| (&a.user_id, &a.item_id, a.timestamp).cmp(&(&b.user_id, &b.item_id, b.timestamp)));
            assert_eq!(rebuilt, original);
        }
    }

    #[test]
    fn test_partition_is_deterministic() {
        let mut log = Vec::new();
        for user in 0..50 {
            log.extend(history(&format!("user{}", user), &[3, 1, 3, 2, 1]));
        }
        assert_eq!(partition(log.clone()), partition(log));
    }

    #[test]
    fn test_empty_log() {
        assert!(partition(Vec::new()).users.is_empty());
    }
}
