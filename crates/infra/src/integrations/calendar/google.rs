//! Google Calendar client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use gapfinder_core::{CalendarFetch, CalendarSource};
use gapfinder_domain::{
    ApiConfig, CalendarEvent, CalendarSummary, FetchError, GapfinderError, Result, TimeRange,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::AccessTokenProvider;
use super::types::Page;
use crate::http::{FetchRequest, RequestLayer};

/// Google Calendar v3 client over the shared request layer
///
/// Calendar listing holds one scheduler slot for all of its pages. Event
/// fetches for many calendars go through the batch path, one slot per
/// calendar; each page is a separately cached GET.
pub struct GoogleCalendarClient {
    layer: Arc<RequestLayer>,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: Url,
    page_size: u32,
}

impl GoogleCalendarClient {
    /// # Errors
    /// Returns `GapfinderError::Config` when `api.base_url` is not an
    /// absolute http(s) URL.
    pub fn new(
        layer: Arc<RequestLayer>,
        tokens: Arc<dyn AccessTokenProvider>,
        api: &ApiConfig,
    ) -> Result<Self> {
        let base_url = Url::parse(&api.base_url).map_err(|err| {
            GapfinderError::Config(format!("invalid api base_url {}: {err}", api.base_url))
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(GapfinderError::Config(format!(
                "api base_url must be an http(s) URL: {}",
                api.base_url
            )));
        }

        Ok(Self { layer, tokens, base_url, page_size: api.page_size.max(1) })
    }

    pub fn layer(&self) -> &Arc<RequestLayer> {
        &self.layer
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn events_url(&self, calendar_id: &str, range: TimeRange) -> Url {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
        url.query_pairs_mut()
            .append_pair("timeMin", &range.start.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("timeMax", &range.end.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("maxResults", &self.page_size.to_string());
        url
    }

    /// Follow `nextPageToken` until the listing is exhausted.
    async fn fetch_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        access_token: &str,
    ) -> std::result::Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            if let Some(token) = &page_token {
                page_url.query_pairs_mut().append_pair("pageToken", token);
            }

            let request = FetchRequest::get(page_url).with_bearer(access_token);
            let value = self.layer.fetch_cached(&request).await?;
            let page: Page<T> = serde_json::from_value(value).map_err(|err| {
                FetchError::InvalidResponse(format!("unexpected page shape: {err}"))
            })?;
            items.extend(page.items);

            match page.next_page_token {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(FetchError::InvalidResponse(format!(
                        "page token {next} returned twice"
                    )));
                }
                Some(next) => page_token = Some(next),
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    #[instrument(skip(self))]
    async fn list_calendars(&self) -> Result<Vec<CalendarSummary>> {
        let token = self.tokens.access_token().await?;
        let url = self.endpoint(&["calendars"]);

        let calendars: Vec<CalendarSummary> =
            self.layer.schedule(|| self.fetch_pages(url, &token)).await?;

        info!(count = calendars.len(), "calendars listed");
        Ok(calendars)
    }

    #[instrument(skip(self, calendar_ids, range), fields(calendars = calendar_ids.len()))]
    async fn fetch_events(&self, calendar_ids: &[String], range: TimeRange) -> Vec<CalendarFetch> {
        let token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "could not obtain access token");
                return calendar_ids
                    .iter()
                    .map(|id| CalendarFetch::failure(id.clone(), err.clone()))
                    .collect();
            }
        };
        let token = token.as_str();

        let run = self
            .layer
            .run_batch(calendar_ids.to_vec(), |calendar_id| async move {
                let url = self.events_url(&calendar_id, range);
                let events: Vec<CalendarEvent> = self.fetch_pages(url, token).await?;
                debug!(%calendar_id, events = events.len(), "calendar events fetched");
                Ok(events)
            })
            .await;

        calendar_ids
            .iter()
            .zip(run.results)
            .map(|(calendar_id, outcome)| CalendarFetch {
                calendar_id: calendar_id.clone(),
                outcome,
            })
            .collect()
    }
}
