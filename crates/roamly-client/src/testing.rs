//! In-memory [`RemoteApi`] used by the coordinator tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use roamly_shared::{
    AccountCreated, AdventureId, AdventureSummary, ImageId, MatchRecord, PersistedImage,
    UploadItem, UploadOutcome, UserId,
};

use crate::api::{NewAccount, NewAdventure, RemoteApi};
use crate::error::ApiError;

pub(crate) fn record(id: &str, name: &str) -> MatchRecord {
    MatchRecord {
        identifier: UserId::new(id),
        display_name: name.to_string(),
    }
}

pub(crate) fn image(id: &str, caption: &str) -> PersistedImage {
    PersistedImage {
        image_id: ImageId::new(id),
        url: format!("http://cdn.roamly.test/{id}"),
        caption: caption.to_string(),
    }
}

fn server_error(detail: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        detail: detail.to_string(),
    }
}

struct ScriptedSearch {
    delay: Duration,
    response: Option<Vec<MatchRecord>>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    searches: Mutex<Vec<String>>,
    search_script: Mutex<HashMap<String, ScriptedSearch>>,
    gallery: Mutex<Vec<PersistedImage>>,
    next_image: Mutex<u64>,
    failing_captions: Mutex<HashSet<String>>,
    fail_mutations: Mutex<bool>,
    created_only: Mutex<bool>,
    mutations: Mutex<Vec<String>>,
    password: Mutex<Option<(String, String)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_image: Mutex::new(100),
            ..Self::default()
        }
    }

    pub fn script_search(&self, query: &str, delay: Duration, response: Vec<MatchRecord>) {
        self.search_script.lock().unwrap().insert(
            query.to_string(),
            ScriptedSearch {
                delay,
                response: Some(response),
            },
        );
    }

    pub fn fail_search(&self, query: &str) {
        self.search_script.lock().unwrap().insert(
            query.to_string(),
            ScriptedSearch {
                delay: Duration::ZERO,
                response: None,
            },
        );
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn seed_gallery(&self, images: Vec<PersistedImage>) {
        *self.gallery.lock().unwrap() = images;
    }

    pub fn gallery(&self) -> Vec<PersistedImage> {
        self.gallery.lock().unwrap().clone()
    }

    pub fn fail_upload_for(&self, caption: &str) {
        self.failing_captions
            .lock()
            .unwrap()
            .insert(caption.to_string());
    }

    pub fn fail_mutations(&self) {
        *self.fail_mutations.lock().unwrap() = true;
    }

    /// Answer uploads with the created resource instead of the full gallery.
    pub fn answer_uploads_with_created(&self) {
        *self.created_only.lock().unwrap() = true;
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn accept_login(&self, identifier: &str, password: &str) {
        *self.password.lock().unwrap() = Some((identifier.to_string(), password.to_string()));
    }

    fn log(&self, entry: String) {
        self.mutations.lock().unwrap().push(entry);
    }

    fn mutations_failing(&self) -> bool {
        *self.fail_mutations.lock().unwrap()
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn search_users(
        &self,
        query: &str,
        _limit: usize,
    ) -> Result<Vec<MatchRecord>, ApiError> {
        self.searches.lock().unwrap().push(query.to_string());
        let (delay, response) = match self.search_script.lock().unwrap().get(query) {
            Some(scripted) => (scripted.delay, scripted.response.clone()),
            None => (Duration::ZERO, Some(Vec::new())),
        };
        tokio::time::sleep(delay).await;
        response.ok_or_else(|| server_error("search unavailable"))
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<String, ApiError> {
        match &*self.password.lock().unwrap() {
            Some((id, pw)) if id == identifier && pw == password => {
                Ok(crate::session::token_for("42"))
            }
            _ => Err(ApiError::Status {
                status: 404,
                detail: "Password or Identification entered was wrong or does not exist".into(),
            }),
        }
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, ApiError> {
        if account.password.len() < 8 {
            return Err(ApiError::Status {
                status: 400,
                detail: "password must have at least 8 characters".into(),
            });
        }
        Ok(AccountCreated {
            jwt_token: crate::session::token_for("77"),
            username: account.username.clone(),
            email: account.email.clone(),
            created_at: None,
        })
    }

    async fn list_media(
        &self,
        _adventure_id: &AdventureId,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        Ok(self.gallery())
    }

    async fn upload_media(
        &self,
        _token: &str,
        _adventure_id: &AdventureId,
        item: &UploadItem,
    ) -> Result<UploadOutcome, ApiError> {
        self.log(format!("upload:{}", item.caption));
        if self.mutations_failing() || self.failing_captions.lock().unwrap().contains(&item.caption)
        {
            return Err(server_error("upload rejected"));
        }

        let id = {
            let mut next = self.next_image.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let created = image(&id, &item.caption);
        let mut gallery = self.gallery.lock().unwrap();
        gallery.push(created.clone());

        if *self.created_only.lock().unwrap() {
            Ok(UploadOutcome::Created(created))
        } else {
            Ok(UploadOutcome::Snapshot(gallery.clone()))
        }
    }

    async fn delete_media(
        &self,
        _token: &str,
        image_id: &ImageId,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        self.log(format!("delete:{image_id}"));
        if self.mutations_failing() {
            return Err(server_error("delete failed"));
        }
        let mut gallery = self.gallery.lock().unwrap();
        let before = gallery.len();
        gallery.retain(|img| &img.image_id != image_id);
        if gallery.len() == before {
            return Err(ApiError::Status {
                status: 404,
                detail: format!("image with id={image_id} could not be found"),
            });
        }
        Ok(gallery.clone())
    }

    async fn relabel_media(
        &self,
        _token: &str,
        image_id: &ImageId,
        caption: &str,
    ) -> Result<Vec<PersistedImage>, ApiError> {
        self.log(format!("relabel:{image_id}:{caption}"));
        if self.mutations_failing() {
            return Err(server_error("relabel failed"));
        }
        let mut gallery = self.gallery.lock().unwrap();
        let Some(target) = gallery.iter_mut().find(|img| &img.image_id == image_id) else {
            return Err(ApiError::Status {
                status: 404,
                detail: format!("image with id={image_id} could not be found"),
            });
        };
        target.caption = caption.to_string();
        Ok(gallery.clone())
    }

    async fn create_adventure(
        &self,
        _token: &str,
        adventure: &NewAdventure,
    ) -> Result<AdventureSummary, ApiError> {
        self.log(format!(
            "adventure:{}:{}",
            adventure.title,
            adventure
                .images
                .iter()
                .map(|item| item.caption.as_str())
                .collect::<Vec<_>>()
                .join(",")
        ));
        if self.mutations_failing() {
            return Err(server_error("adventure rejected"));
        }
        Ok(AdventureSummary {
            adventure_id: AdventureId::new("5"),
            title: adventure.title.clone(),
            description: adventure.description.clone(),
        })
    }

    async fn delete_adventure(
        &self,
        _token: &str,
        adventure_id: &AdventureId,
    ) -> Result<(), ApiError> {
        self.log(format!("delete-adventure:{adventure_id}"));
        if self.mutations_failing() {
            return Err(ApiError::Status {
                status: 403,
                detail: "You do not have permission to perform this action".into(),
            });
        }
        self.gallery.lock().unwrap().clear();
        Ok(())
    }
}
