use crate::algorithm::types::{Module, SessionMode};
use crate::store::StoreError;

/// Identifiers are embedded in `:`-separated keys, so they must be non-empty
/// and free of the separator.
fn segment<'a>(kind: &str, value: &'a str) -> Result<&'a str, StoreError> {
    if value.is_empty() || value.contains(':') {
        return Err(StoreError::InvalidKey(format!("invalid {kind}: {value:?}")));
    }
    Ok(value)
}

pub fn question_key(question_id: &str) -> Result<String, StoreError> {
    Ok(segment("question id", question_id)?.to_string())
}

pub fn question_module_index_key(module: Module, question_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}", module, segment("question id", question_id)?))
}

pub fn question_module_prefix(module: Module) -> String {
    format!("{}:", module)
}

pub fn profile_key(learner_id: &str) -> Result<String, StoreError> {
    Ok(segment("learner id", learner_id)?.to_string())
}

pub fn session_key(session_id: &str) -> Result<String, StoreError> {
    Ok(segment("session id", session_id)?.to_string())
}

pub fn active_session_key(
    learner_id: &str,
    module: Module,
    mode: SessionMode,
) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}:{}",
        segment("learner id", learner_id)?,
        module,
        mode.as_str()
    ))
}

pub fn response_key(learner_id: &str, timestamp_ms: i64, response_id: &str) -> Result<String, StoreError> {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    Ok(format!(
        "{}:{:020}:{}",
        segment("learner id", learner_id)?,
        reverse_ts,
        segment("response id", response_id)?
    ))
}

pub fn response_prefix(learner_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("learner id", learner_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_key_orders_by_time_desc() {
        let k_new = response_key("u1", 2000, "r2").unwrap();
        let k_old = response_key("u1", 1000, "r1").unwrap();
        assert!(k_new < k_old);
        assert!(k_new.starts_with(&response_prefix("u1").unwrap()));
    }

    #[test]
    fn separator_in_id_is_rejected() {
        assert!(matches!(profile_key("a:b"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(question_key(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn active_session_key_includes_module_and_mode() {
        let key = active_session_key("u1", Module::Math, SessionMode::SpeedRound).unwrap();
        assert_eq!(key, "u1:math:speed_round");
    }
}
