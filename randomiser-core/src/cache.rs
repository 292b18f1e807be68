use log::debug;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::assets::AssetSource;
use crate::data::GameData;
use crate::preview::Preview;
use crate::{preview, randomise, RandomiserOutput, RandomiserSettings, Result};

pub const DEFAULT_CAPACITY: usize = 10;

type Entry = (RandomiserSettings, Arc<RandomiserOutput>);

/// Finished runs keyed by their normalized settings. Past capacity the
/// oldest entry is dropped.
pub struct ResultCache {
    capacity: usize,
    entries: Mutex<VecDeque<Entry>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Entry>> {
        // Entries are only ever replaced whole, so a poisoned lock still
        // holds consistent data.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &RandomiserSettings) -> Option<Arc<RandomiserOutput>> {
        self.lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Arc::clone(v))
    }

    /// Store `value`, replacing any entry with the same key.
    pub fn insert(&self, key: RandomiserSettings, value: Arc<RandomiserOutput>) {
        let mut entries = self.lock();
        entries.retain(|(k, _)| *k != key);
        entries.push_back((key, value));
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Long-lived front end: loaded inputs, an asset source and a result cache.
pub struct Randomiser {
    data: GameData,
    assets: Box<dyn AssetSource>,
    cache: ResultCache,
}

impl Randomiser {
    pub fn new(data: GameData, assets: Box<dyn AssetSource>) -> Self {
        Self {
            data,
            assets,
            cache: ResultCache::default(),
        }
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// A full run, served from the cache when an equivalent run finished
    /// before. Two callers racing on the same key both compute; the
    /// results are identical.
    pub fn generate(&self, settings: &RandomiserSettings) -> Result<Arc<RandomiserOutput>> {
        let key = settings.normalized()?;
        if let Some(hit) = self.cache.get(&key) {
            debug!("cache hit for seed {}", hit.seed);
            return Ok(hit);
        }
        let output = Arc::new(randomise(&self.data, self.assets.as_ref(), &key)?);
        self.cache.insert(key, Arc::clone(&output));
        Ok(output)
    }

    pub fn preview(&self, settings: &RandomiserSettings) -> Result<Preview> {
        preview(&self.data, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::SeedInput;

    fn settings(seed: i64) -> RandomiserSettings {
        RandomiserSettings::with_seed(SeedInput::Integer(seed))
    }

    #[test]
    fn oldest_entry_evicted() {
        let randomiser = Randomiser::new(fixtures::game_data(), Box::new(fixtures::assets()));
        let first = randomiser.generate(&settings(0)).unwrap();
        let cache = ResultCache::new(2);
        cache.insert(settings(0), Arc::clone(&first));
        cache.insert(settings(1), Arc::clone(&first));
        cache.insert(settings(2), Arc::clone(&first));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&settings(0)).is_none());
        assert!(cache.get(&settings(2)).is_some());
    }

    #[test]
    fn equivalent_settings_share_one_result() {
        let randomiser = Randomiser::new(fixtures::game_data(), Box::new(fixtures::assets()));
        let a = randomiser
            .generate(&RandomiserSettings::with_seed(SeedInput::Text("abc".into())))
            .unwrap();
        let b = randomiser.generate(&settings(96354)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(randomiser.cache().len(), 1);
    }

    #[test]
    fn preview_matches_generated_layout() {
        let randomiser = Randomiser::new(fixtures::game_data(), Box::new(fixtures::assets()));
        let mut s = settings(8);
        s.act_shuffle = true;
        let preview = randomiser.preview(&s).unwrap();
        let output = randomiser.generate(&s).unwrap();
        assert_eq!(preview, output.preview);
        assert!(preview.act_order.is_some());
    }
}
