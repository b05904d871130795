use std::sync::Arc;

use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::error;

use crate::{
    error::AppError,
    pages,
    records::prepare_update,
    search::SearchFilters,
    session::{expired_cookie, session_cookie, token_from_headers},
    state::State as AppState,
    store::UpdateOutcome,
};

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RecordQuery {
    #[serde(rename = "memorialID")]
    pub memorial_id: Option<String>,
}

pub async fn index_handler() -> Html<String> {
    Html(pages::landing())
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<SearchFilters>,
) -> Result<Html<String>, AppError> {
    let records = state.store.search(&filters).await.map_err(|e| {
        error!("Search failed: {e}");
        e
    })?;

    Ok(Html(pages::results(&records)))
}

pub async fn login_page_handler() -> Html<String> {
    Html(pages::login_form(None))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let identity = match state
        .store
        .check_credentials(&credentials.username, &credentials.password)
        .await
    {
        Ok(Some(identity)) => identity,
        // A store outage and a bad password both answer 401, the response
        // must not reveal whether the username existed.
        Ok(None) => return Ok(unauthorized()),
        Err(e) => {
            error!("Credential check failed: {e}");
            return Ok(unauthorized());
        }
    };

    let token = state.sessions.create(&identity)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Redirect::to("/updatePage"),
    )
        .into_response())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Html(pages::login_form(Some("Invalid username or password."))),
    )
        .into_response()
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = token_from_headers(&headers);
    state.sessions.destroy(token.as_deref())?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_cookie())]),
        Redirect::to("/"),
    )
        .into_response())
}

pub async fn update_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Html<String> {
    let token = token_from_headers(&headers);

    if state.sessions.authenticated(token.as_deref()).is_some() {
        Html(pages::update_lookup())
    } else {
        Html(pages::login_form(None))
    }
}

pub async fn get_update_record_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RecordQuery>,
) -> Result<Response, AppError> {
    let token = token_from_headers(&headers);
    if state.sessions.authenticated(token.as_deref()).is_none() {
        return Ok(Html(pages::login_form(None)).into_response());
    }

    let Some(id) = query
        .memorial_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Ok(Html(pages::message("No memorial ID was given.")).into_response());
    };

    match state.store.fetch(id).await.map_err(|e| {
        error!("Fetch failed for memorial {id}: {e}");
        e
    })? {
        Some(record) => Ok(Html(pages::edit_form(&record)).into_response()),
        None => Ok(Html(pages::message(&format!(
            "No record found for memorial ID {id}."
        )))
        .into_response()),
    }
}

pub async fn update_record_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Html<String> {
    let token = token_from_headers(&headers);
    if state.sessions.authenticated(token.as_deref()).is_none() {
        return Html(pages::login_form(None));
    }

    let Some(id) = fields
        .iter()
        .find(|(key, _)| key == "memorialID")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
    else {
        return Html(pages::message("No memorial ID was given, nothing was updated."));
    };

    let body = prepare_update(&fields);

    match state.store.update(&id, &body).await {
        Ok(UpdateOutcome::Updated) => Html(pages::message(&format!("Memorial {id} was updated."))),
        Ok(UpdateOutcome::NoMatch) => Html(pages::message(&format!(
            "No update occurred, no record matches memorial ID {id}."
        ))),
        Err(e) => {
            error!("Update failed for memorial {id}: {e}");
            Html(pages::message(
                "The update could not be applied, please try again.",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use serde_json::{Map, Value};

    use super::*;
    use crate::{
        config::Config,
        records::Record,
        session::{SESSION_COOKIE, SESSION_TTL, SessionStore},
        store::{RecordStore, StoreError},
    };

    struct MockStore {
        records: Mutex<Vec<Record>>,
        credentials: Option<(&'static str, &'static str)>,
        fail: bool,
        updates: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl MockStore {
        fn with_records(records: Vec<Record>) -> Self {
            Self {
                records: Mutex::new(records),
                credentials: Some(("admin@example.com", "correct horse")),
                fail: false,
                updates: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_records(Vec::new())
            }
        }
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn search(&self, _filters: &SearchFilters) -> Result<Vec<Record>, StoreError> {
            if self.fail {
                return Err(StoreError::BadStatus(503));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn fetch(&self, memorial_id: &str) -> Result<Option<Record>, StoreError> {
            if self.fail {
                return Err(StoreError::BadStatus(503));
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.memorial_id.map(|id| id.to_string()).as_deref() == Some(memorial_id))
                .cloned())
        }

        async fn update(
            &self,
            memorial_id: &str,
            fields: &Map<String, Value>,
        ) -> Result<UpdateOutcome, StoreError> {
            if self.fail {
                return Err(StoreError::BadStatus(503));
            }

            self.updates
                .lock()
                .unwrap()
                .push((memorial_id.to_string(), fields.clone()));

            let mut records = self.records.lock().unwrap();
            let target = records
                .iter_mut()
                .find(|r| r.memorial_id.map(|id| id.to_string()).as_deref() == Some(memorial_id));

            match target {
                Some(record) => {
                    let mut value = serde_json::to_value(&*record).unwrap();
                    for (key, new_value) in fields {
                        value[key.as_str()] = new_value.clone();
                    }
                    *record = serde_json::from_value(value).unwrap();
                    Ok(UpdateOutcome::Updated)
                }
                None => Ok(UpdateOutcome::NoMatch),
            }
        }

        async fn check_credentials(
            &self,
            username: &str,
            password: &str,
        ) -> Result<Option<String>, StoreError> {
            if self.fail {
                return Err(StoreError::BadStatus(503));
            }
            Ok(self
                .credentials
                .filter(|(u, p)| *u == username && *p == password)
                .map(|(u, _)| u.to_string()))
        }
    }

    fn test_state(store: Arc<MockStore>) -> Arc<AppState> {
        Arc::new(AppState {
            config: Config {
                port: 0,
                store_url: "http://store.invalid".to_string(),
                store_key: "test-key".to_string(),
            },
            store,
            sessions: SessionStore::new(SESSION_TTL),
        })
    }

    fn sample_record() -> Record {
        Record {
            memorial_id: Some(42),
            last_name: Some("Smith".to_string()),
            first_name: Some("Quincy".to_string()),
            birth_year: Some(1900),
            notes: Some("old notes".to_string()),
            ..Default::default()
        }
    }

    fn logged_in(state: &Arc<AppState>) -> HeaderMap {
        let token = state.sessions.create("admin@example.com").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
        );
        headers
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn wrong_password_is_uniform_401_without_session() {
        let state = test_state(Arc::new(MockStore::with_records(Vec::new())));

        let response = login_handler(
            State(state),
            Form(Credentials {
                username: "admin@example.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn store_outage_during_login_is_also_401() {
        let state = test_state(Arc::new(MockStore::failing()));

        let response = login_handler(
            State(state),
            Form(Credentials {
                username: "admin@example.com".to_string(),
                password: "correct horse".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_password_redirects_and_authenticates() {
        let state = test_state(Arc::new(MockStore::with_records(Vec::new())));

        let response = login_handler(
            State(state.clone()),
            Form(Credentials {
                username: "admin@example.com".to_string(),
                password: "correct horse".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/updatePage"
        );

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        let token = cookie
            .strip_prefix(&format!("{SESSION_COOKIE}="))
            .unwrap()
            .split(';')
            .next()
            .unwrap();

        assert_eq!(
            state.sessions.authenticated(Some(token)),
            Some("admin@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn logout_destroys_the_session() {
        let state = test_state(Arc::new(MockStore::with_records(Vec::new())));
        let headers = logged_in(&state);
        let token = token_from_headers(&headers).unwrap();

        let response = logout_handler(State(state.clone()), headers).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert_eq!(state.sessions.authenticated(Some(&token)), None);
    }

    #[tokio::test]
    async fn update_page_renders_login_for_anonymous() {
        let state = test_state(Arc::new(MockStore::with_records(Vec::new())));

        let page = update_page_handler(State(state), HeaderMap::new()).await;

        assert!(page.0.contains("action=\"/login\""));
    }

    #[tokio::test]
    async fn update_page_renders_lookup_when_authenticated() {
        let state = test_state(Arc::new(MockStore::with_records(Vec::new())));
        let headers = logged_in(&state);

        let page = update_page_handler(State(state), headers).await;

        assert!(page.0.contains("action=\"/getUpdateRecord\""));
    }

    #[tokio::test]
    async fn search_renders_matching_records() {
        let state = test_state(Arc::new(MockStore::with_records(vec![sample_record()])));

        let page = search_handler(State(state), Query(SearchFilters::default()))
            .await
            .unwrap();

        assert!(page.0.contains("Smith"));
        assert!(page.0.contains("Quincy"));
    }

    #[tokio::test]
    async fn search_store_error_is_a_500() {
        let state = test_state(Arc::new(MockStore::failing()));

        let result = search_handler(State(state), Query(SearchFilters::default())).await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_record_renders_not_found_message() {
        let state = test_state(Arc::new(MockStore::with_records(vec![sample_record()])));
        let headers = logged_in(&state);

        let response = get_update_record_handler(
            State(state),
            headers,
            Query(RecordQuery {
                memorial_id: Some("999".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No record found"));
    }

    #[tokio::test]
    async fn existing_record_prefills_the_edit_form() {
        let state = test_state(Arc::new(MockStore::with_records(vec![sample_record()])));
        let headers = logged_in(&state);

        let response = get_update_record_handler(
            State(state),
            headers,
            Query(RecordQuery {
                memorial_id: Some("42".to_string()),
            }),
        )
        .await
        .unwrap();

        let body = body_text(response).await;
        assert!(body.contains("old notes"));
        assert!(body.contains("name=\"memorialID\" value=\"42\""));
    }

    #[tokio::test]
    async fn edit_flow_is_gated_for_anonymous_visitors() {
        let state = test_state(Arc::new(MockStore::with_records(vec![sample_record()])));

        let response = get_update_record_handler(
            State(state),
            HeaderMap::new(),
            Query(RecordQuery {
                memorial_id: Some("42".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(body_text(response).await.contains("action=\"/login\""));
    }

    #[tokio::test]
    async fn update_strips_identifier_and_targets_the_given_record() {
        let store = Arc::new(MockStore::with_records(vec![sample_record()]));
        let state = test_state(store.clone());
        let headers = logged_in(&state);

        let page = update_record_handler(
            State(state),
            headers,
            Form(vec![
                ("memorialID".to_string(), "42".to_string()),
                ("memorial_id".to_string(), "99".to_string()),
                ("notes".to_string(), "test".to_string()),
            ]),
        )
        .await;

        assert!(page.0.contains("was updated"));

        let updates = store.updates.lock().unwrap();
        let (id, body) = &updates[0];
        assert_eq!(id, "42");
        assert!(!body.contains_key("memorial_id"));
        assert_eq!(body.get("notes"), Some(&Value::from("test")));
    }

    #[tokio::test]
    async fn updated_record_reads_back_with_identifier_unchanged() {
        let store = Arc::new(MockStore::with_records(vec![sample_record()]));
        let state = test_state(store.clone());
        let headers = logged_in(&state);

        update_record_handler(
            State(state),
            headers,
            Form(vec![
                ("memorialID".to_string(), "42".to_string()),
                ("notes".to_string(), "test".to_string()),
            ]),
        )
        .await;

        let record = store.fetch("42").await.unwrap().unwrap();
        assert_eq!(record.notes.as_deref(), Some("test"));
        assert_eq!(record.memorial_id, Some(42));
    }

    #[tokio::test]
    async fn repeating_an_update_leaves_the_same_state() {
        let store = Arc::new(MockStore::with_records(vec![sample_record()]));
        let state = test_state(store.clone());
        let headers = logged_in(&state);
        let fields = vec![
            ("memorialID".to_string(), "42".to_string()),
            ("notes".to_string(), "test".to_string()),
            ("birth_year".to_string(), "1901".to_string()),
        ];

        update_record_handler(State(state.clone()), headers.clone(), Form(fields.clone())).await;
        let after_first = store.fetch("42").await.unwrap().unwrap();

        update_record_handler(State(state), headers, Form(fields)).await;
        let after_second = store.fetch("42").await.unwrap().unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn update_of_missing_record_reports_no_update() {
        let state = test_state(Arc::new(MockStore::with_records(vec![sample_record()])));
        let headers = logged_in(&state);

        let page = update_record_handler(
            State(state),
            headers,
            Form(vec![
                ("memorialID".to_string(), "999".to_string()),
                ("notes".to_string(), "test".to_string()),
            ]),
        )
        .await;

        assert!(page.0.contains("No update occurred"));
    }

    #[tokio::test]
    async fn update_store_error_renders_a_failure_message() {
        let store = Arc::new(MockStore {
            fail: true,
            ..MockStore::with_records(vec![sample_record()])
        });
        let state = test_state(store);
        let headers = logged_in(&state);

        let page = update_record_handler(
            State(state),
            headers,
            Form(vec![
                ("memorialID".to_string(), "42".to_string()),
                ("notes".to_string(), "test".to_string()),
            ]),
        )
        .await;

        assert!(page.0.contains("could not be applied"));
    }

    #[tokio::test]
    async fn update_without_identifier_changes_nothing() {
        let store = Arc::new(MockStore::with_records(vec![sample_record()]));
        let state = test_state(store.clone());
        let headers = logged_in(&state);

        let page = update_record_handler(
            State(state),
            headers,
            Form(vec![("notes".to_string(), "test".to_string())]),
        )
        .await;

        assert!(page.0.contains("nothing was updated"));
        assert!(store.updates.lock().unwrap().is_empty());
    }
}
