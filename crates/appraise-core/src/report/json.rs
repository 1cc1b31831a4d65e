use crate::model::StoredCheckResult;

/// Stored results for one actor as pretty JSON.
pub fn results_json(email: &str, results: &[StoredCheckResult]) -> anyhow::Result<String> {
    let v = serde_json::json!({
        "email": email,
        "count": results.len(),
        "results": results,
    });
    Ok(serde_json::to_string_pretty(&v)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckResult, Round};
    use chrono::Utc;

    #[test]
    fn results_are_flattened_with_context() {
        let stored = StoredCheckResult {
            email: "a@example.com".into(),
            task: "t".into(),
            round: Round::Second,
            repo_url: "https://github.com/a/t".into(),
            commit_sha: "c".into(),
            pages_url: "https://a.github.io/t/".into(),
            evaluated_at: Utc::now(),
            result: CheckResult::new("Code quality", 0.8, "tidy", "raw"),
        };
        let text = results_json("a@example.com", &[stored]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["count"], 1);
        assert_eq!(v["results"][0]["check"], "Code quality");
        assert_eq!(v["results"][0]["round"], 2);
        assert_eq!(v["results"][0]["score"], 0.8);
    }
}
