use derive_new::new;
use serde::Serialize;

/// Query for `model-versions/search`.
#[derive(Debug, Serialize, new)]
pub struct SearchModelVersionsQuery {
    pub filter: String,
    pub max_results: u32,
    #[new(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl SearchModelVersionsQuery {
    /// Build a query matching every version registered under `name`.
    pub fn by_name(name: &str, max_results: u32) -> Self {
        Self::new(format!("name='{name}'"), max_results)
    }

    pub fn with_page_token(mut self, page_token: Option<String>) -> Self {
        self.page_token = page_token;
        self
    }
}

/// Query identifying one version of a registered model.
#[derive(Debug, Serialize, new)]
pub struct ModelVersionQuery {
    pub name: String,
    pub version: String,
}

/// Query for the artifact proxy listing endpoint.
#[derive(Debug, Serialize, new)]
pub struct ListArtifactsQuery {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_filters_on_name() {
        let query = SearchModelVersionsQuery::by_name("churn-model", 200);
        assert_eq!(query.filter, "name='churn-model'");
        assert_eq!(query.max_results, 200);
        assert!(query.page_token.is_none());
    }

    #[test]
    fn page_token_is_omitted_when_absent() {
        let query = SearchModelVersionsQuery::by_name("m", 10);
        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("page_token").is_none());

        let query = query.with_page_token(Some("abc".to_string()));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["page_token"], "abc");
    }
}
