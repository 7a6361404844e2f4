//! `$/progress` reporting for long-running server work.
//!
//! A [`ProgressToken`] wraps one work-done session: `begin` creates the token
//! on the client and sends the `Begin` value, `report` sends intermediate
//! updates, `end` closes the session. Dropping an unfinished token closes it
//! with a "Cancelled" message.

use std::{
    panic::AssertUnwindSafe,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::FutureExt;
use tower_lsp::{Client, lsp_types::*};
use tracing::{debug, warn};

static NEXT_PROGRESS_ID: AtomicU64 = AtomicU64::new(1);
const PROGRESS_TITLE_PREFIX: &str = "arbor-analyzer:";

pub struct ProgressToken {
    client: Option<Client>,
    token: Option<NumberOrString>,
}

impl ProgressToken {
    /// A token that reports nothing, for clients without work-done progress.
    pub fn disabled() -> Self {
        Self {
            client: None,
            token: None,
        }
    }

    pub async fn begin(
        client: &Client,
        title: &str,
        message: Option<String>,
    ) -> Self {
        let id = NEXT_PROGRESS_ID.fetch_add(1, Ordering::Relaxed);
        let token = NumberOrString::String(format!("arborAnalyzer/{}/{id}", title.trim()));
        let display_title = prefixed_progress_title(title);

        // The create request runs detached: editors may answer late or not at
        // all, and the response slot must outlive this call.
        let create_client = client.clone();
        let create_token = token.clone();
        tokio::spawn(async move {
            let params = WorkDoneProgressCreateParams {
                token: create_token,
            };
            match AssertUnwindSafe(create_client.send_request::<request::WorkDoneProgressCreate>(params))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {},
                Ok(Err(error)) => debug!("workDoneProgress/create rejected: {error}"),
                Err(_) => warn!("workDoneProgress/create panicked (client gone?)"),
            }
        });

        let begin = WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: display_title.clone(),
            cancellable: Some(false),
            message,
            percentage: Some(0),
        });
        if !send_progress(client, token.clone(), begin).await {
            warn!("progress begin for '{display_title}' could not be delivered");
            return Self {
                client: None,
                token: None,
            };
        }

        debug!("progress begin: {display_title}");
        Self {
            client: Some(client.clone()),
            token: Some(token),
        }
    }

    /// Intermediate update; `percentage` is clamped to 100.
    pub async fn report(
        &self,
        message: Option<String>,
        percentage: Option<u32>,
    ) {
        let (Some(client), Some(token)) = (&self.client, &self.token) else {
            return;
        };
        let report = WorkDoneProgress::Report(WorkDoneProgressReport {
            cancellable: Some(false),
            message,
            percentage: percentage.map(|value| value.min(100)),
        });
        send_progress(client, token.clone(), report).await;
    }

    pub async fn end(
        mut self,
        message: Option<String>,
    ) {
        let (Some(client), Some(token)) = (self.client.take(), self.token.take()) else {
            return;
        };
        debug!("progress end: {token:?}");
        send_progress(
            &client,
            token,
            WorkDoneProgress::End(WorkDoneProgressEnd {
                message,
            }),
        )
        .await;
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for ProgressToken {
    fn drop(&mut self) {
        let (Some(client), Some(token)) = (self.client.take(), self.token.take()) else {
            return;
        };
        debug!("progress dropped unfinished: {token:?}");
        tokio::spawn(async move {
            send_progress(
                &client,
                token,
                WorkDoneProgress::End(WorkDoneProgressEnd {
                    message: Some("Cancelled".to_string()),
                }),
            )
            .await;
        });
    }
}

/// Returns `false` if sending panicked.
async fn send_progress(
    client: &Client,
    token: NumberOrString,
    value: WorkDoneProgress,
) -> bool {
    AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
        token,
        value: ProgressParamsValue::WorkDone(value),
    }))
    .catch_unwind()
    .await
    .is_ok()
}

fn prefixed_progress_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.starts_with(PROGRESS_TITLE_PREFIX) {
        return trimmed.to_owned();
    }
    format!("{PROGRESS_TITLE_PREFIX} {trimmed}")
}

/// Percentage of `done` out of `total`, 100 for an empty total.
pub(crate) fn percent_of(
    done: usize,
    total: usize,
) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}

#[cfg(test)]
#[path = "../tests/src/progress_tests.rs"]
mod tests;
