use crate::algorithm::types::LearnerProfile;
use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    pub fn get_profile(&self, learner_id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        let key = keys::profile_key(learner_id)?;
        match self.learner_profiles.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Profile with neutral defaults when the learner has never answered.
    pub fn get_profile_or_default(&self, learner_id: &str, now_ms: i64) -> Result<LearnerProfile, StoreError> {
        Ok(self
            .get_profile(learner_id)?
            .unwrap_or_else(|| LearnerProfile::new(learner_id, now_ms)))
    }

    /// Atomic read-modify-write of a profile, creating it on first use.
    pub fn update_profile<F>(&self, learner_id: &str, now_ms: i64, mut apply: F) -> Result<LearnerProfile, StoreError>
    where
        F: FnMut(&mut LearnerProfile),
    {
        let key = keys::profile_key(learner_id)?;
        let updated = Self::cas_update::<LearnerProfile, _>(&self.learner_profiles, "profile", &key, |current| {
            let mut profile = current.unwrap_or_else(|| LearnerProfile::new(learner_id, now_ms));
            apply(&mut profile);
            profile.updated_at = now_ms;
            Ok(Some(profile))
        })?;

        updated.ok_or_else(|| StoreError::NotFound {
            entity: "profile".to_string(),
            key: learner_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::algorithm::types::{Module, SkillElo};
    use crate::store::Store;

    #[test]
    fn missing_profile_defaults() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        assert!(store.get_profile("u1").unwrap().is_none());
        let profile = store.get_profile_or_default("u1", 5).unwrap();
        assert_eq!(profile.rating(Module::Math), 1000.0);
        assert_eq!(profile.created_at, 5);
    }

    #[test]
    fn update_creates_then_mutates() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store
            .update_profile("u1", 10, |p| {
                p.total_questions += 1;
                p.set_rating(Module::English, 1016.0);
            })
            .unwrap();
        let profile = store
            .update_profile("u1", 20, |p| {
                p.total_questions += 1;
                p.skill_elos.insert("Transitions".into(), SkillElo::default());
            })
            .unwrap();

        assert_eq!(profile.total_questions, 2);
        assert_eq!(profile.english_rating, 1016.0);
        assert_eq!(profile.created_at, 10);
        assert_eq!(profile.updated_at, 20);

        let stored = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(stored, profile);
    }
}
