//! People directory endpoints under `/api/people`.

use serde_json::Value;

use roster_shared::ApiResponse;
use roster_shared::dto::{ExportFormat, Page, PageQuery, UploadResponse};

use super::{ensure_success, into_data};
use crate::client::ApiClient;
use crate::domain::{NewPerson, Person};
use crate::error::{ClientError, FileError};
use crate::image;
use crate::ports::SelectedFile;

const PEOPLE: &str = "/api/people";
const UPLOAD: &str = "/api/upload";

#[derive(Clone)]
pub struct PeopleApi {
    client: ApiClient,
}

impl PeopleApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /api/people
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Person>, ClientError> {
        into_data(self.client.get::<ApiResponse<Vec<Person>>>(PEOPLE, &[]).await?)
    }

    /// GET /api/people?page=&limit=
    #[tracing::instrument(skip(self))]
    pub async fn page(&self, query: PageQuery) -> Result<Page<Person>, ClientError> {
        let page = query.page.to_string();
        let limit = query.limit.to_string();
        let response: ApiResponse<Page<Person>> = self
            .client
            .get(PEOPLE, &[("page", page.as_str()), ("limit", limit.as_str())])
            .await?;
        into_data(response)
    }

    /// GET /api/people/:id
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Person, ClientError> {
        into_data(self.client.get(&item_path(id)?, &[]).await?)
    }

    /// POST /api/people
    #[tracing::instrument(skip(self, person), fields(name = %person.name))]
    pub async fn create(&self, person: &NewPerson) -> Result<Person, ClientError> {
        let person: Person = into_data(self.client.post(PEOPLE, person).await?)?;
        tracing::info!(id = %person.id, "Person created");
        Ok(person)
    }

    /// PUT /api/people/:id
    #[tracing::instrument(skip(self, person))]
    pub async fn update(&self, id: &str, person: &NewPerson) -> Result<Person, ClientError> {
        into_data(self.client.put(&item_path(id)?, person).await?)
    }

    /// DELETE /api/people/:id
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response: ApiResponse<Value> = self.client.delete(&item_path(id)?).await?;
        ensure_success(response)
    }

    /// GET /api/people/search?q=
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Person>, ClientError> {
        let path = format!("{}/search", PEOPLE);
        into_data(self.client.get(&path, &[("q", query)]).await?)
    }

    /// GET /api/people/export?format=csv|json
    ///
    /// CSV arrives as text; JSON exports are pretty-printed.
    #[tracing::instrument(skip(self))]
    pub async fn export(&self, format: ExportFormat) -> Result<String, ClientError> {
        let path = format!("{}/export", PEOPLE);
        let body: Value = self
            .client
            .get(&path, &[("format", format.as_str())])
            .await?;
        export_text(body)
    }

    /// POST /api/upload with the image as multipart field `file`.
    /// Returns the stored file's URL.
    #[tracing::instrument(skip(self, file), fields(name = %file.name, size = file.size()))]
    pub async fn upload_photo(&self, file: SelectedFile) -> Result<String, ClientError> {
        image::validate(&file, &[])?;
        let response: ApiResponse<UploadResponse> = self.client.upload(UPLOAD, file).await?;
        let uploaded = into_data(response)?;
        tracing::info!(url = %uploaded.url, "Photo uploaded");
        Ok(uploaded.url)
    }

    /// Create a person, first uploading an inline photo and replacing it
    /// with the returned URL.
    pub async fn create_with_photo(&self, mut person: NewPerson) -> Result<Person, ClientError> {
        self.upload_inline_photo(&mut person).await?;
        self.create(&person).await
    }

    /// [`update`](Self::update) with the same photo handling as
    /// [`create_with_photo`](Self::create_with_photo).
    pub async fn update_with_photo(
        &self,
        id: &str,
        mut person: NewPerson,
    ) -> Result<Person, ClientError> {
        self.upload_inline_photo(&mut person).await?;
        self.update(id, &person).await
    }

    async fn upload_inline_photo(&self, person: &mut NewPerson) -> Result<(), ClientError> {
        let Some(photo) = person.photo.as_deref().filter(|p| image::is_data_uri(p)) else {
            return Ok(());
        };
        let file = image::from_data_uri(photo, "photo")
            .ok_or_else(|| FileError::Read("photo is not a valid base64 data URI".to_string()))?;
        person.photo = Some(self.upload_photo(file).await?);
        Ok(())
    }
}

fn item_path(id: &str) -> Result<String, ClientError> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '?', '#', '%']) {
        return Err(ClientError::InvalidRequest(format!("invalid person id '{}'", id)));
    }
    Ok(format!("{}/{}", PEOPLE, id))
}

fn export_text(body: Value) -> Result<String, ClientError> {
    let payload = if body.get("success").is_some() {
        let envelope: ApiResponse<Value> =
            serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        into_data(envelope)?
    } else {
        body
    };

    match payload {
        Value::String(text) => Ok(text),
        other => serde_json::to_string_pretty(&other).map_err(|e| ClientError::Decode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::ports::{HttpMethod, HttpResponse, RequestBody};

    fn ada() -> serde_json::Value {
        json!({"id": "1700000000000", "name": "Ada", "age": 36, "address": "12 Analytical St", "phone": "+44 20 7946 0000"})
    }

    fn new_ada(photo: Option<String>) -> NewPerson {
        NewPerson {
            name: "Ada".into(),
            age: 36,
            address: "12 Analytical St".into(),
            phone: "+44 20 7946 0000".into(),
            photo,
        }
    }

    fn api(outcomes: Vec<HttpResponse>) -> (PeopleApi, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(outcomes.into_iter().map(Ok).collect()));
        let client = client_with(transport.clone(), Arc::default(), Arc::default());
        (PeopleApi::new(client), transport)
    }

    #[tokio::test]
    async fn test_list_unwraps_envelope() {
        let (api, transport) = api(vec![HttpResponse::json(
            200,
            &json!({"success": true, "data": [ada()]}),
        )]);

        let people = api.list().await.unwrap();

        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Ada");
        assert_eq!(transport.last().url, "http://api.test/api/people");
    }

    #[tokio::test]
    async fn test_page_sends_query() {
        let (api, transport) = api(vec![HttpResponse::json(
            200,
            &json!({"success": true, "data": {"items": [ada()], "total": 41, "page": 3, "limit": 20}}),
        )]);

        let page = api.page(PageQuery { page: 3, limit: 20 }).await.unwrap();

        assert_eq!(page.total, 41);
        assert_eq!(transport.last().url, "http://api.test/api/people?page=3&limit=20");
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (api, transport) = api(vec![HttpResponse::json(
            200,
            &json!({"success": true, "data": []}),
        )]);

        assert!(api.search("ada lovelace&co").await.unwrap().is_empty());
        assert_eq!(
            transport.last().url,
            "http://api.test/api/people/search?q=ada+lovelace%26co"
        );
    }

    #[tokio::test]
    async fn test_create_returns_stored_person() {
        let (api, transport) = api(vec![HttpResponse::json(
            201,
            &json!({"success": true, "data": ada()}),
        )]);

        let person = api.create(&new_ada(None)).await.unwrap();

        assert_eq!(person.id, "1700000000000");
        assert_eq!(transport.last().method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_rejected_envelope_surfaces_errors() {
        let (api, _) = api(vec![HttpResponse::json(
            200,
            &json!({"success": false, "errors": ["Phone already registered"]}),
        )]);

        let err = api.create(&new_ada(None)).await.unwrap_err();

        assert_eq!(err.messages(), vec!["Phone already registered".to_string()]);
    }

    #[tokio::test]
    async fn test_update_and_delete_paths() {
        let (api, transport) = api(vec![
            HttpResponse::json(200, &json!({"success": true, "data": ada()})),
            HttpResponse::new(204),
        ]);

        api.update("1700000000000", &new_ada(None)).await.unwrap();
        let sent = transport.last();
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.url, "http://api.test/api/people/1700000000000");

        api.delete("1700000000000").await.unwrap();
        assert_eq!(transport.last().method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (api, transport) = api(vec![]);

        let err = api.get("../admin").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_dot_segment_ids() {
        let (api, transport) = api(vec![HttpResponse::new(204), HttpResponse::new(204)]);

        for id in [".", ".."] {
            let err = api.delete(id).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidRequest(_)));
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_numeric_ids_are_accepted() {
        let (api, _) = api(vec![HttpResponse::json(
            200,
            &json!({"success": true, "data": [{"id": 1700000000000u64, "name": "Ada", "age": 36, "address": "12 Analytical St", "phone": "+44 20 7946 0000"}]}),
        )]);

        let people = api.list().await.unwrap();

        assert_eq!(people[0].id, "1700000000000");
    }

    #[tokio::test]
    async fn test_export_csv_and_json() {
        let (api, _) = api(vec![
            HttpResponse::text(200, "id,name\n1,Ada\n"),
            HttpResponse::json(200, &json!([ada()])),
        ]);

        assert_eq!(api.export(ExportFormat::Csv).await.unwrap(), "id,name\n1,Ada\n");

        let json_text = api.export(ExportFormat::Json).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_create_with_photo_uploads_first() {
        let (api, transport) = api(vec![
            HttpResponse::json(
                201,
                &json!({"success": true, "data": {"url": "/uploads/photo.png"}}),
            ),
            HttpResponse::json(201, &json!({"success": true, "data": ada()})),
        ]);

        let png = SelectedFile::new("me.png", "image/png", vec![0x89, b'P', b'N', b'G', 7]);
        let uri = image::to_data_uri(&png, &[]).unwrap();
        api.create_with_photo(new_ada(Some(uri))).await.unwrap();

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].url.ends_with("/api/upload"));
        match &sent[1].body {
            RequestBody::Json(body) => assert_eq!(body["photo"], "/uploads/photo.png"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_existing_photo_url() {
        let (api, transport) = api(vec![HttpResponse::json(
            200,
            &json!({"success": true, "data": ada()}),
        )]);

        api.update_with_photo("1700000000000", new_ada(Some("/uploads/old.png".into())))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 1);
        match transport.last().body {
            RequestBody::Json(body) => assert_eq!(body["photo"], "/uploads/old.png"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images_locally() {
        let (api, transport) = api(vec![]);

        let err = api
            .upload_photo(SelectedFile::new("notes.txt", "text/plain", b"hi".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::File(FileError::UnsupportedType { .. })));
        assert_eq!(transport.calls(), 0);
    }
}
