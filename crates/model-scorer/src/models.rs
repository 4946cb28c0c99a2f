mod schemas;

pub use schemas::*;

/// Pick the version with the numerically greatest identifier.
pub fn select_latest(versions: &[ModelVersion]) -> Option<&ModelVersion> {
    versions.iter().max_by_key(|v| v.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn versions(ids: &[u64]) -> Vec<ModelVersion> {
        ids.iter().map(|&v| ModelVersion::new("churn", v)).collect()
    }

    #[rstest]
    #[case(&[1, 2, 5, 3], 5)]
    #[case(&[7], 7)]
    #[case(&[10, 9, 2], 10)]
    fn selects_greatest_version(#[case] ids: &[u64], #[case] expected: u64) {
        let versions = versions(ids);
        assert_eq!(select_latest(&versions).unwrap().version, expected);
    }

    #[test]
    fn no_versions_selects_nothing() {
        assert!(select_latest(&[]).is_none());
    }
}
