use crate::store::operations::questions::QuestionRecord;
use crate::store::{keys, Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_question_elo_backfill", m002_question_elo_backfill),
    ]
}

/// Apply every migration newer than the stored version.
///
/// Each migration must be idempotent: the process can die after a migration
/// runs but before its version is recorded. The version is persisted after
/// every step and never moves backwards.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.config_versions.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("stored version has {} bytes, expected 4", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .config_versions
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Questions ingested before Elo tracking get their difficulty's starting
/// Elo, and any missing module index entry is rebuilt.
fn m002_question_elo_backfill(store: &Store) -> Result<(), StoreError> {
    let mut backfilled = 0usize;
    for item in store.questions.iter() {
        let (key, value) = item?;
        let mut question: QuestionRecord = Store::deserialize(&value)?;

        if question.elo.is_none() {
            question.elo = Some(question.difficulty.initial_elo());
            store.questions.insert(key, Store::serialize(&question)?)?;
            backfilled += 1;
        }

        let index_key = keys::question_module_index_key(question.module, &question.question_id)?;
        store.questions_by_module.insert(index_key.as_bytes(), &[])?;
    }
    tracing::info!(backfilled, "Question Elo back-fill finished");
    Ok(())
}
