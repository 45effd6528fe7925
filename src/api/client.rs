// HTTP client for the vendor backend: login, library browsing and template CRUD.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{header::HeaderValue, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::headers;
use super::models::{
    Accessory, Envelope, ExerciseGroup, LoginSession, TrainingPartGroup, VerifyIdentity,
    WorkoutSummary, WorkoutTemplate,
};
use super::ApiError;
use crate::config::{AppConfig, Region, LIBRARY_BATCH_SIZE};
use crate::credentials::{CredentialStore, Credentials, UnitSystem};
use crate::workout::{encode_workout, ExerciseFacts, WorkoutDraft};

const VERIFY_IDENTITY: &str = "/api/app/v2/login/verifyIdentity";
const LOGIN_BY_PASSWORD: &str = "/api/app/v2/login/byPass";
const LOGOUT: &str = "/api/app/login/logout";
const USER_INFO: &str = "/api/app/userinfo";
const TRAINING_PART_GROUP: &str = "/api/app/actionLibraryGroup/trainingPartGroup";
const EXERCISE_GROUP_LIST: &str = "/api/app/actionLibraryGroup/list";
const ACCESSORIES: &str = "/api/app/accessories/list";
const TEMPLATE_PAGE: &str = "/api/app/v4/customTrainingTemplate/appPage";
const TEMPLATE_BY_CODE: &str = "/api/app/v3/customTrainingTemplate/detailByCode";
const TEMPLATE: &str = "/api/app/customTrainingTemplate";
const SAVE_TEMPLATE: &str = "/api/app/v2/customTrainingTemplate";

/// Login identity type for e-mail addresses.
const IDENTITY_EMAIL: u8 = 2;

const ACCOUNT_MISSING: &str =
    "Account does not exist. Please register using the official Speediance mobile app first.";
const PASSWORD_MISSING: &str =
    "Account exists but has no password set. Please set a password in the Speediance mobile app.";

/// Result of a login attempt that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn { user_id: String },
    Refused { reason: String, detail: Option<String> },
}

impl LoginOutcome {
    fn refused(reason: &str, detail: Option<String>) -> Self {
        LoginOutcome::Refused {
            reason: reason.to_string(),
            detail,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: u8,
    user_identity: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordLoginRequest<'a> {
    user_identity: &'a str,
    password: &'a str,
    #[serde(rename = "type")]
    kind: u8,
}

#[derive(Serialize)]
struct UnitRequest {
    unit: UnitSystem,
}

pub struct SpeedianceClient {
    http: Client,
    config: AppConfig,
    store: CredentialStore,
    credentials: RwLock<Credentials>,
    library_cache: RwLock<Option<Arc<Vec<ExerciseGroup>>>>,
}

impl SpeedianceClient {
    /// Build a client and load persisted credentials from `config.config_file`.
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let store = CredentialStore::new(config.config_file.clone());
        let credentials = store.load()?;

        info!(
            "credentials loaded from {} logged_in={} region={}",
            store.path().display(),
            credentials.is_logged_in(),
            credentials.region
        );

        Ok(Self {
            http,
            config,
            store,
            credentials: RwLock::new(credentials),
            library_cache: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Snapshot of the current credentials.
    pub fn credentials(&self) -> Credentials {
        self.credentials.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.read().is_logged_in()
    }

    pub fn unit(&self) -> UnitSystem {
        self.credentials.read().unit
    }

    /// Replace the credentials with manually entered values.
    pub fn save_manual_credentials(&self, credentials: Credentials) -> Result<(), ApiError> {
        info!(
            "saving manual credentials user_id={} region={} unit={}",
            credentials.user_id, credentials.region, credentials.unit
        );
        self.store_credentials(credentials)
    }

    /// Two-step password login: identity check, then password exchange.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        region: Region,
    ) -> Result<LoginOutcome, ApiError> {
        let verify_url = self.endpoint(region, VERIFY_IDENTITY, &[])?;
        let resp = self
            .http
            .post(verify_url)
            .headers(headers::anonymous())
            .json(&VerifyRequest {
                kind: IDENTITY_EMAIL,
                user_identity: email,
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            warn!("verifyIdentity failed status={}", status.as_u16());
            return Ok(LoginOutcome::refused(
                "Verify failed",
                Some(status_detail(status, &body)),
            ));
        }

        let verify = decode_envelope::<VerifyIdentity>(&body)?
            .data
            .unwrap_or_default();
        if verify.is_exist == Some(false) {
            return Ok(LoginOutcome::refused(ACCOUNT_MISSING, None));
        }
        if verify.has_pwd == Some(false) {
            return Ok(LoginOutcome::refused(PASSWORD_MISSING, None));
        }

        let login_url = self.endpoint(region, LOGIN_BY_PASSWORD, &[])?;
        let resp = self
            .http
            .post(login_url)
            .headers(headers::anonymous())
            .json(&PasswordLoginRequest {
                user_identity: email,
                password,
                kind: IDENTITY_EMAIL,
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            warn!("byPass login failed status={}", status.as_u16());
            return Ok(LoginOutcome::refused(
                "Login failed",
                Some(status_detail(status, &body)),
            ));
        }

        let session = decode_envelope::<LoginSession>(&body)?
            .data
            .unwrap_or_default();
        let token = session.token.filter(|t| !t.is_empty());
        let (Some(token), false) = (token, session.app_user_id.is_empty()) else {
            return Ok(LoginOutcome::refused(
                "Token or appUserId not found in response",
                Some(format!("Response: {body}")),
            ));
        };

        let user_id = session.app_user_id;
        let unit = self.unit();
        self.store_credentials(Credentials {
            user_id: user_id.clone(),
            token,
            region,
            unit,
        })?;
        info!("login successful user_id={} region={}", user_id, region);

        Ok(LoginOutcome::LoggedIn { user_id })
    }

    /// Tell the backend to end the session (best effort) and forget the token locally.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let credentials = self.credentials();

        if credentials.is_logged_in() {
            match self.send_logout(&credentials).await {
                Ok(status) => debug!("logout status={}", status.as_u16()),
                Err(e) => warn!("Logout error: {}", e),
            }
        }

        self.store_credentials(credentials.cleared())?;
        info!("logged out");
        Ok(())
    }

    async fn send_logout(&self, credentials: &Credentials) -> Result<StatusCode, ApiError> {
        let url = self.endpoint(credentials.region, LOGOUT, &[])?;
        let mut headers = headers::authenticated(credentials)?;
        headers.insert("app_type", HeaderValue::from_static("SOFTWARE"));
        let resp = self.http.post(url).headers(headers).send().await?;
        Ok(resp.status())
    }

    /// Change the unit preference on the backend, then persist it locally.
    pub async fn update_unit(&self, unit: UnitSystem) -> Result<(), ApiError> {
        let credentials = self.session()?;
        let url = self.endpoint(credentials.region, USER_INFO, &[])?;
        let resp = self
            .http
            .put(url)
            .headers(headers::authenticated(&credentials)?)
            .json(&UnitRequest { unit })
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!("unit update failed status={}", status.as_u16());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        self.store_credentials(Credentials {
            unit,
            ..credentials
        })?;
        info!("unit updated to {}", unit);
        Ok(())
    }

    /// Full exercise library with details. Cached in memory until credentials change.
    pub async fn library(&self) -> Result<Arc<Vec<ExerciseGroup>>, ApiError> {
        let cached = self.library_cache.read().clone();
        if let Some(library) = cached {
            return Ok(library);
        }

        let parts: Vec<TrainingPartGroup> = self
            .get_data(TRAINING_PART_GROUP, &[("tabId", "1"), ("deviceTypeList", "1")])
            .await?
            .unwrap_or_default();

        let ids: Vec<i64> = parts
            .iter()
            .flat_map(|part| part.action_library_group_list.iter().map(|ex| ex.id))
            .collect();

        let mut library = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LIBRARY_BATCH_SIZE) {
            library.extend(self.batch_details(chunk).await?);
        }

        info!(
            "library loaded: groups={} muscle_groups={} batches={}",
            library.len(),
            parts.len(),
            ids.len().div_ceil(LIBRARY_BATCH_SIZE)
        );

        let library = Arc::new(library);
        if !library.is_empty() {
            *self.library_cache.write() = Some(library.clone());
        }
        Ok(library)
    }

    pub fn invalidate_library(&self) {
        *self.library_cache.write() = None;
    }

    /// Details for several exercise groups in one call.
    pub async fn batch_details(&self, group_ids: &[i64]) -> Result<Vec<ExerciseGroup>, ApiError> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = group_ids.iter().map(i64::to_string).collect();
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        Ok(self
            .get_data(EXERCISE_GROUP_LIST, &query)
            .await?
            .unwrap_or_default())
    }

    pub async fn accessories(&self) -> Result<Vec<Accessory>, ApiError> {
        Ok(self.get_data(ACCESSORIES, &[]).await?.unwrap_or_default())
    }

    pub async fn exercise_detail(&self, group_id: i64) -> Result<Option<ExerciseGroup>, ApiError> {
        let path = format!("/api/app/actionLibraryGroup/{group_id}");
        self.get_data(&path, &[("isDisplay", "1")]).await
    }

    pub async fn is_exercise_unilateral(&self, group_id: i64) -> Result<bool, ApiError> {
        Ok(self
            .exercise_detail(group_id)
            .await?
            .is_some_and(|detail| detail.is_unilateral()))
    }

    pub async fn user_workouts(&self) -> Result<Vec<WorkoutSummary>, ApiError> {
        Ok(self
            .get_data(
                TEMPLATE_PAGE,
                &[("pageNo", "1"), ("pageSize", "-1"), ("deviceTypes", "1")],
            )
            .await?
            .unwrap_or_default())
    }

    pub async fn workout_detail(&self, code: &str) -> Result<Option<WorkoutTemplate>, ApiError> {
        self.get_data(TEMPLATE_BY_CODE, &[("code", code)]).await
    }

    pub async fn delete_workout(&self, template_id: i64) -> Result<(), ApiError> {
        let credentials = self.session()?;
        let id = template_id.to_string();
        let url = self.endpoint(credentials.region, TEMPLATE, &[("ids", id.as_str())])?;
        let resp = self
            .http
            .delete(url)
            .headers(headers::authenticated(&credentials)?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!("deleted workout template id={}", template_id);
        Ok(())
    }

    /// Create (no id) or update (with id) a workout template.
    ///
    /// Looks up default variants and unilateral flags for every group in the
    /// draft, encodes it and returns the backend's envelope untouched so the
    /// caller can surface its `message`.
    pub async fn save_workout(&self, draft: &WorkoutDraft) -> Result<Envelope<Value>, ApiError> {
        let mut group_ids: Vec<i64> = Vec::new();
        for exercise in &draft.exercises {
            if !group_ids.contains(&exercise.group_id) {
                group_ids.push(exercise.group_id);
            }
        }

        let mut facts = ExerciseFacts::new();
        for chunk in group_ids.chunks(LIBRARY_BATCH_SIZE) {
            for group in self.batch_details(chunk).await? {
                if let Some(variant_id) = group.default_variant_id() {
                    facts.set_default_variant(group.id, variant_id);
                }
            }
        }
        for &group_id in &group_ids {
            facts.set_unilateral(group_id, self.is_exercise_unilateral(group_id).await?);
        }

        let payload = encode_workout(draft, &facts);

        let credentials = self.session()?;
        let url = self.endpoint(credentials.region, SAVE_TEMPLATE, &[])?;
        let resp = self
            .http
            .post(url)
            .headers(headers::authenticated(&credentials)?)
            .json(&payload)
            .send()
            .await?;

        let envelope: Envelope<Value> = read_envelope(resp).await?;
        if envelope.is_success() {
            info!(
                "saved workout name={:?} id={:?} exercises={}",
                payload.name,
                payload.id,
                payload.action_library_list.len()
            );
        } else {
            warn!(
                "save workout rejected code={} message={:?}",
                envelope.code, envelope.message
            );
        }
        Ok(envelope)
    }

    fn session(&self) -> Result<Credentials, ApiError> {
        let credentials = self.credentials();
        if credentials.is_logged_in() {
            Ok(credentials)
        } else {
            Err(ApiError::NotLoggedIn)
        }
    }

    fn store_credentials(&self, credentials: Credentials) -> Result<(), ApiError> {
        self.store.save(&credentials)?;
        *self.credentials.write() = credentials;
        self.invalidate_library();
        Ok(())
    }

    fn endpoint(&self, region: Region, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url(region), path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Authenticated GET returning the envelope's `data`.
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        let credentials = self.session()?;
        let url = self.endpoint(credentials.region, path, query)?;
        debug!("GET {}", url.path());

        let resp = self
            .http
            .get(url)
            .headers(headers::authenticated(&credentials)?)
            .send()
            .await?;

        let envelope: Envelope<T> = read_envelope(resp).await?;
        if envelope.data.is_none() && !envelope.is_success() {
            return Err(ApiError::Rejected {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope.data)
    }
}

async fn read_envelope<T: DeserializeOwned>(resp: Response) -> Result<Envelope<T>, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    match serde_json::from_str::<Envelope<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn status_detail(status: StatusCode, body: &str) -> String {
    format!("Status: {}\nResponse: {}", status.as_u16(), body)
}
