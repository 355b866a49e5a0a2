//! Thin client for the hike journal REST API.

use futures::future::{AbortHandle, Abortable, abortable};
use log::{debug, error};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::HikeMapError;
use crate::model::{Hike, ListResponse, Picture, Track, Waypoint};

type Result<T> = std::result::Result<T, HikeMapError>;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain";

/// Request payload. Anything that is not already a string goes out as JSON.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Text(String),
    Json(serde_json::Value),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    fn content_type(&self) -> &'static str {
        match self {
            Self::Text(_) => TEXT,
            Self::Json(_) => JSON,
        }
    }

    fn into_string(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Json(value) => Ok(serde_json::to_string(&value)?),
        }
    }
}

/// Everything the hike page shows, fetched together.
///
/// A fetch that failed leaves its slot at the default.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HikeBundle {
    pub hike: Option<Hike>,
    pub tracks: Vec<Track>,
    pub waypoints: Vec<Waypoint>,
    pub pictures: Vec<Picture>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for an API route; a leading `/` on the route is ignored.
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Send a request and fail on any non-success status.
    pub async fn request(
        &self,
        method: Method,
        route: &str,
        body: Option<RequestBody>,
        query: &[(&str, &str)],
        accept_json: bool,
    ) -> Result<Response> {
        let url = self.url(route);
        debug!("query at: {url}");

        let content_type = body.as_ref().map_or(JSON, RequestBody::content_type);
        let mut builder = self
            .http_client
            .request(method, &url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, if accept_json { JSON } else { TEXT });
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.body(body.into_string()?);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HikeMapError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.request(Method::GET, route, None, query, true).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn hikes(&self) -> Result<Vec<Hike>> {
        let resp: ListResponse<Hike> = self.get_json("/hikes/", &[]).await?;
        Ok(resp.data)
    }

    pub async fn hike(&self, hike_id: i64) -> Result<Hike> {
        self.get_json(&format!("/hikes/{hike_id}"), &[]).await
    }

    pub async fn tracks(&self, hike_id: i64) -> Result<Vec<Track>> {
        let resp: ListResponse<Track> =
            self.get_json(&format!("/tracks/hike/{hike_id}"), &[]).await?;
        Ok(resp.data)
    }

    pub async fn waypoints(&self, hike_id: i64) -> Result<Vec<Waypoint>> {
        let resp: ListResponse<Waypoint> = self
            .get_json(&format!("/hikes/{hike_id}/waypoints"), &[])
            .await?;
        Ok(resp.data)
    }

    pub async fn pictures(&self, hike_id: i64) -> Result<Vec<Picture>> {
        let resp: ListResponse<Picture> =
            self.get_json(&format!("/pictures/hike/{hike_id}"), &[]).await?;
        Ok(resp.data)
    }

    /// Where the image for a picture record is served from.
    pub fn picture_url(&self, picture: &Picture) -> String {
        self.url(&format!("/pictures/{}.{}", picture.id, picture.fmt))
    }

    /// Fetch the hike and its sub-resources concurrently.
    ///
    /// Nothing is retried; each failure is logged and its slot stays empty.
    pub async fn load_hike(&self, hike_id: i64) -> HikeBundle {
        let (hike, tracks, waypoints, pictures) = futures::join!(
            self.hike(hike_id),
            self.tracks(hike_id),
            self.waypoints(hike_id),
            self.pictures(hike_id),
        );

        HikeBundle {
            hike: logged("hike", hike_id, hike),
            tracks: logged("tracks", hike_id, tracks).unwrap_or_default(),
            waypoints: logged("waypoints", hike_id, waypoints).unwrap_or_default(),
            pictures: logged("pictures", hike_id, pictures).unwrap_or_default(),
        }
    }

    /// Like [`ApiClient::load_hike`], but the load can be called off.
    ///
    /// Once the handle is aborted the future resolves to `Err(Aborted)` and
    /// whatever arrived is dropped. The future owns a clone of the client.
    pub fn load_hike_abortable(
        &self,
        hike_id: i64,
    ) -> (Abortable<impl Future<Output = HikeBundle> + use<>>, AbortHandle) {
        let client = self.clone();
        abortable(async move { client.load_hike(hike_id).await })
    }
}

fn logged<T>(what: &str, hike_id: i64, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("failed to load {what} for hike {hike_id}: {err}");
            None
        }
    }
}
