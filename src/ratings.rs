//! # Rating Source
//!
//! Read-only access to the preference data the factorizer trains on. The
//! source has to be fully materialized: training resolves it once into
//! dense indices and never touches it inside the hot loop.

use std::collections::HashMap;

use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{AlsError, EntityKind};

/// A single `(user, item, value)` observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub user_id: u64,
    pub item_id: u64,
    pub value: f64,
}

impl Preference {
    pub fn new(user_id: u64, item_id: u64, value: f64) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }
}

/// Repeatable, random-access enumeration of users, items and their ratings.
///
/// Preference lists hold `(counterpart_id, value)` pairs: item IDs for a
/// user, user IDs for an item.
pub trait RatingSource: Send + Sync {
    fn user_ids(&self) -> &[u64];
    fn item_ids(&self) -> &[u64];
    fn preferences_from_user(&self, user_id: u64) -> Result<&[(u64, f64)], AlsError>;
    fn preferences_for_item(&self, item_id: u64) -> Result<&[(u64, f64)], AlsError>;

    fn num_users(&self) -> usize {
        self.user_ids().len()
    }

    fn num_items(&self) -> usize {
        self.item_ids().len()
    }
}

/// Rating source held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatings {
    user_ids: Vec<u64>,
    item_ids: Vec<u64>,
    by_user: HashMap<u64, Vec<(u64, f64)>>,
    by_item: HashMap<u64, Vec<(u64, f64)>>,
    num_preferences: usize,
}

impl InMemoryRatings {
    /// Builds the source from raw records.
    ///
    /// IDs are enumerated in first-seen order. A later record for the same
    /// `(user, item)` pair replaces the earlier value.
    pub fn from_preferences<I>(preferences: I) -> Self
    where
        I: IntoIterator<Item = Preference>,
    {
        let mut pairs: Vec<(u64, u64)> = Vec::new();
        let mut values: HashMap<(u64, u64), f64> = HashMap::new();
        for pref in preferences {
            let key = (pref.user_id, pref.item_id);
            if values.insert(key, pref.value).is_none() {
                pairs.push(key);
            }
        }

        let mut ratings = InMemoryRatings::default();
        for (user_id, item_id) in pairs {
            let value = values[&(user_id, item_id)];
            ratings.insert(user_id, item_id, value);
        }
        ratings
    }

    /// Registers catalog items that may have no ratings at all
    pub fn with_items<I>(mut self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        for item_id in item_ids {
            if !self.by_item.contains_key(&item_id) {
                self.by_item.insert(item_id, Vec::new());
                self.item_ids.push(item_id);
            }
        }
        self
    }

    fn insert(&mut self, user_id: u64, item_id: u64, value: f64) {
        let user_ids = &mut self.user_ids;
        self.by_user
            .entry(user_id)
            .or_insert_with(|| {
                user_ids.push(user_id);
                Vec::new()
            })
            .push((item_id, value));

        let item_ids = &mut self.item_ids;
        self.by_item
            .entry(item_id)
            .or_insert_with(|| {
                item_ids.push(item_id);
                Vec::new()
            })
            .push((user_id, value));

        self.num_preferences += 1;
    }

    pub fn num_preferences(&self) -> usize {
        self.num_preferences
    }

    /// All records in user-major enumeration order
    pub fn preferences(&self) -> Vec<Preference> {
        let mut out = Vec::with_capacity(self.num_preferences);
        for &user_id in &self.user_ids {
            for &(item_id, value) in &self.by_user[&user_id] {
                out.push(Preference::new(user_id, item_id, value));
            }
        }
        out
    }

    /// Deterministic hold-out split: every record lands in the test set with
    /// probability `test_fraction`.
    pub fn split(
        &self,
        test_fraction: f64,
        seed: u64,
    ) -> Result<(InMemoryRatings, InMemoryRatings), AlsError> {
        if !(0.0..=1.0).contains(&test_fraction) {
            return Err(AlsError::InvalidConfiguration(format!(
                "test fraction must lie in [0, 1], got {}",
                test_fraction
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let (test, training): (Vec<Preference>, Vec<Preference>) = self
            .preferences()
            .into_iter()
            .partition(|_| rng.gen::<f64>() < test_fraction);

        Ok((
            InMemoryRatings::from_preferences(training),
            InMemoryRatings::from_preferences(test),
        ))
    }
}

impl RatingSource for InMemoryRatings {
    fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    fn item_ids(&self) -> &[u64] {
        &self.item_ids
    }

    fn preferences_from_user(&self, user_id: u64) -> Result<&[(u64, f64)], AlsError> {
        self.by_user
            .get(&user_id)
            .map(|prefs| prefs.as_slice())
            .ok_or(AlsError::not_found(EntityKind::User, user_id))
    }

    fn preferences_for_item(&self, item_id: u64) -> Result<&[(u64, f64)], AlsError> {
        self.by_item
            .get(&item_id)
            .map(|prefs| prefs.as_slice())
            .ok_or(AlsError::not_found(EntityKind::Item, item_id))
    }
}
