#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        for schema in ["ErrorResponse", "HealthResponse", "BudgetSummary", "EntryRequest", "TokenResponse"] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "database"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_budget_summary_schema_structure() {
        let properties = object_properties("BudgetSummary");
        for field in ["overall_balance", "remaining_days", "distance_from_target"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        let health_path = openapi.paths.paths.get("/health").expect("/health is documented");
        let health_get = health_path
            .operations
            .get(&PathItemType::Get)
            .expect("GET /health is documented");

        assert!(health_get.responses.responses.contains_key("200"));
        assert!(health_get.responses.responses.contains_key("500"));
    }

    #[test]
    fn test_openapi_documents_budget_routes() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/api/v1/register", PathItemType::Post),
            ("/api/v1/login", PathItemType::Post),
            ("/api/v1/budgets", PathItemType::Get),
            ("/api/v1/budgets", PathItemType::Post),
            ("/api/v1/budgets/{budget_id}", PathItemType::Put),
            ("/api/v1/budgets/{budget_id}/export", PathItemType::Get),
            ("/api/v1/budgets/{budget_id}/entries", PathItemType::Get),
            ("/api/v1/budgets/{budget_id}/incomes", PathItemType::Post),
            ("/api/v1/budgets/{budget_id}/expenses/{entry_id}", PathItemType::Delete),
            ("/api/v1/budgets/{budget_id}/load-recurrences", PathItemType::Post),
            ("/api/v1/categories/{category_id}", PathItemType::Get),
        ];
        for (path, method) in expected {
            let item = paths.get(path).unwrap_or_else(|| panic!("{} is not documented", path));
            assert!(item.operations.contains_key(&method), "{} lacks an operation", path);
        }
    }

    #[test]
    fn test_protected_routes_declare_bearer_auth() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));

        let json = serde_json::to_value(&openapi).unwrap();
        let create_budget = &json["paths"]["/api/v1/budgets"]["post"];
        assert!(create_budget["security"][0].get("bearer_auth").is_some());

        let register = &json["paths"]["/api/v1/register"]["post"];
        assert!(register.get("security").is_none());
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string_pretty(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
