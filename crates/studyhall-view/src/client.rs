use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use studyhall_types::api::{
    CreateGroupRequest, ErrorResponse, FilesResponse, GroupFilesRequest, GroupsResponse,
};
use studyhall_types::models::{FileGroups, FileId, UserFile};

use crate::ViewError;
use crate::browser::{FileBrowser, RenderedView};
use crate::cache::Applied;

/// Thin HTTP client for the group and file endpoints.
#[derive(Debug, Clone)]
pub struct GroupsClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl GroupsClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    pub async fn fetch_groups(&self) -> Result<FileGroups, ViewError> {
        let url = self.endpoint(&["groups"])?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let body: GroupsResponse = decode(resp).await?;
        Ok(body.groups)
    }

    pub async fn fetch_files(&self) -> Result<Vec<UserFile>, ViewError> {
        let url = self.endpoint(&["files"])?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let body: FilesResponse = decode(resp).await?;
        Ok(body.files)
    }

    pub async fn create_group(&self, name: &str, file_ids: &[FileId]) -> Result<(), ViewError> {
        let url = self.endpoint(&["groups"])?;
        let body = CreateGroupRequest {
            name: name.to_string(),
            file_ids: file_ids.to_vec(),
        };
        let resp = self.http.post(url).bearer_auth(&self.token).json(&body).send().await?;
        check(resp).await.map(drop)
    }

    /// Adds with `remove == false`, removes otherwise. Both are idempotent server-side.
    pub async fn edit_group(&self, name: &str, file_ids: &[FileId], remove: bool) -> Result<(), ViewError> {
        let url = self.endpoint(&["groups", name, "files"])?;
        let body = GroupFilesRequest {
            file_ids: file_ids.to_vec(),
        };
        let req = if remove {
            self.http.delete(url)
        } else {
            self.http.post(url)
        };
        let resp = req.bearer_auth(&self.token).json(&body).send().await?;
        check(resp).await.map(drop)
    }

    pub async fn delete_group(&self, name: &str) -> Result<(), ViewError> {
        let url = self.endpoint(&["groups", name])?;
        let resp = self.http.delete(url).bearer_auth(&self.token).send().await?;
        check(resp).await.map(drop)
    }

    /// Appends percent-encoded segments; group names may contain spaces or slashes.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ViewError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ViewError::BadBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn check(resp: Response) -> Result<Response, ViewError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(server_error(status, &body))
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ViewError> {
    Ok(check(resp).await?.json::<T>().await?)
}

fn server_error(status: StatusCode, body: &str) -> ViewError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());
    ViewError::Server {
        status: status.as_u16(),
        message,
    }
}

/// Couples a `FileBrowser` with the client. Refreshes may overlap; each one
/// takes a ticket before the request goes out, so only the newest response is
/// ever installed.
pub struct RefreshingBrowser {
    client: GroupsClient,
    browser: Mutex<FileBrowser>,
}

impl RefreshingBrowser {
    pub fn new(client: GroupsClient, browser: FileBrowser) -> Self {
        Self {
            client,
            browser: Mutex::new(browser),
        }
    }

    pub async fn refresh(&self) -> Result<RenderedView, ViewError> {
        let ticket = self.browser.lock().await.begin_fetch();

        let (files, groups) =
            tokio::try_join!(self.client.fetch_files(), self.client.fetch_groups())?;

        let mut browser = self.browser.lock().await;
        if browser.apply_fetch(ticket, &files, groups) == Applied::Stale {
            debug!(generation = ticket.generation(), "Group refresh superseded");
        }
        Ok(browser.render())
    }

    /// Deletes on the server, then refetches. The view never removes the
    /// group locally; the next snapshot is the only source of truth.
    pub async fn delete_group(&self, name: &str) -> Result<RenderedView, ViewError> {
        let result = self.client.delete_group(name).await;
        self.after_mutation("delete", name, result).await
    }

    pub async fn create_group(&self, name: &str, file_ids: &[FileId]) -> Result<RenderedView, ViewError> {
        let result = self.client.create_group(name, file_ids).await;
        self.after_mutation("create", name, result).await
    }

    pub async fn add_to_group(&self, name: &str, file_ids: &[FileId]) -> Result<RenderedView, ViewError> {
        let result = self.client.edit_group(name, file_ids, false).await;
        self.after_mutation("add to", name, result).await
    }

    pub async fn remove_from_group(&self, name: &str, file_ids: &[FileId]) -> Result<RenderedView, ViewError> {
        let result = self.client.edit_group(name, file_ids, true).await;
        self.after_mutation("remove from", name, result).await
    }

    async fn after_mutation(
        &self,
        action: &str,
        name: &str,
        result: Result<(), ViewError>,
    ) -> Result<RenderedView, ViewError> {
        if let Err(e) = result {
            warn!("Failed to {} group {:?}: {}", action, name, e);
            return Err(e);
        }
        self.browser.lock().await.invalidate();
        self.refresh().await
    }

    pub async fn open_group(&self, name: &str) -> Result<RenderedView, ViewError> {
        self.browser.lock().await.open_group(name)
    }

    /// Returns to the default view. If an earlier mutation succeeded but its
    /// refetch failed, the snapshot is still stale and is refetched here.
    pub async fn exit_group_view(&self) -> Result<RenderedView, ViewError> {
        let needs_refetch = {
            let mut browser = self.browser.lock().await;
            browser.exit_group_view();
            browser.cache().needs_refetch()
        };
        if needs_refetch {
            debug!("Group snapshot stale on exit, refetching");
            return self.refresh().await;
        }
        Ok(self.render().await)
    }

    pub async fn render(&self) -> RenderedView {
        self.browser.lock().await.render()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    struct Reply {
        status: u16,
        body: String,
        delay: Duration,
    }

    fn reply(status: u16, body: &str) -> Reply {
        Reply {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn files_body(ids: &[FileId]) -> String {
        let files: Vec<_> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "owner_id": 1,
                    "name": format!("file{id}"),
                    "size": 1,
                    "folder_id": null,
                    "uploaded_at": "2024-01-01T00:00:00Z",
                })
            })
            .collect();
        serde_json::json!({ "files": files }).to_string()
    }

    /// Local HTTP server answering from `handler(route, nth_call)`, where
    /// route is "METHOD /path" and calls are counted per route from 1.
    struct StubServer {
        base: Url,
        calls: Arc<StdMutex<HashMap<String, usize>>>,
    }

    impl StubServer {
        async fn start<F>(handler: F) -> Self
        where
            F: Fn(&str, usize) -> Reply + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handler = Arc::new(handler);
            let calls: Arc<StdMutex<HashMap<String, usize>>> = Arc::default();
            let counts = Arc::clone(&calls);

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let handler = Arc::clone(&handler);
                    let counts = Arc::clone(&counts);
                    tokio::spawn(async move {
                        let route = read_route(&mut socket).await;
                        let nth = {
                            let mut counts = counts.lock().unwrap();
                            let n = counts.entry(route.clone()).or_insert(0);
                            *n += 1;
                            *n
                        };
                        let reply = handler(&route, nth);
                        tokio::time::sleep(reply.delay).await;

                        let reason = StatusCode::from_u16(reply.status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            reply.status,
                            reason,
                            reply.body.len(),
                            reply.body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            });

            Self {
                base: Url::parse(&format!("http://{addr}/api/")).unwrap(),
                calls,
            }
        }

        fn calls(&self, route: &str) -> usize {
            self.calls.lock().unwrap().get(route).copied().unwrap_or(0)
        }

        fn browser(&self) -> RefreshingBrowser {
            RefreshingBrowser::new(
                GroupsClient::new(self.base.clone(), "token"),
                FileBrowser::new("My Files"),
            )
        }
    }

    /// Reads the request head and drains any body; returns "METHOD /path".
    async fn read_route(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break i + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let mut parts = head.split_whitespace();
        format!("{} {}", parts.next().unwrap_or(""), parts.next().unwrap_or(""))
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_newest_files_and_groups() {
        let server = StubServer::start(|route, nth| match route {
            // The first listing is slow and still contains file 3, which
            // was deleted before the second listing was taken.
            "GET /api/files" if nth == 1 => Reply {
                delay: Duration::from_millis(300),
                ..reply(200, &files_body(&[1, 2, 3]))
            },
            "GET /api/files" => reply(200, &files_body(&[1, 2])),
            "GET /api/groups" => reply(200, r#"{"groups":{"A":[1]}}"#),
            _ => reply(404, r#"{"error":"Not found"}"#),
        })
        .await;
        let browser = server.browser();

        let slow = browser.refresh();
        let fast = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            browser.refresh().await
        };
        let (slow, fast) = tokio::join!(slow, fast);
        slow.unwrap();
        assert_eq!(fast.unwrap().visible_ids(), vec![2]);

        assert_eq!(server.calls("GET /api/files"), 2);
        assert_eq!(browser.render().await.visible_ids(), vec![2]);
    }

    #[tokio::test]
    async fn successful_mutations_refetch_groups() {
        let server = StubServer::start(|route, nth| match route {
            "GET /api/files" => reply(200, &files_body(&[1, 2, 3])),
            "GET /api/groups" => match nth {
                1 => reply(200, r#"{"groups":{"A":[1]}}"#),
                2 => reply(200, r#"{"groups":{"A":[1],"B":[2]}}"#),
                3 => reply(200, r#"{"groups":{"A":[1],"B":[2,3]}}"#),
                4 => reply(200, r#"{"groups":{"A":[1],"B":[2]}}"#),
                _ => reply(200, r#"{"groups":{"B":[2]}}"#),
            },
            "POST /api/groups"
            | "POST /api/groups/B/files"
            | "DELETE /api/groups/B/files"
            | "DELETE /api/groups/A" => reply(200, r#"{"groups":{}}"#),
            _ => reply(404, r#"{"error":"Not found"}"#),
        })
        .await;
        let browser = server.browser();
        assert_eq!(browser.refresh().await.unwrap().visible_ids(), vec![2, 3]);

        let view = browser.create_group("B", &[2]).await.unwrap();
        assert_eq!(server.calls("GET /api/groups"), 2);
        assert_eq!(view.visible_ids(), vec![3]);

        let view = browser.add_to_group("B", &[3]).await.unwrap();
        assert_eq!(server.calls("GET /api/groups"), 3);
        assert!(view.visible_ids().is_empty());

        let view = browser.remove_from_group("B", &[3]).await.unwrap();
        assert_eq!(server.calls("GET /api/groups"), 4);
        assert_eq!(view.visible_ids(), vec![3]);

        browser.open_group("A").await.unwrap();
        let view = browser.delete_group("A").await.unwrap();
        assert_eq!(server.calls("DELETE /api/groups/A"), 1);
        assert_eq!(server.calls("GET /api/groups"), 5);
        assert_eq!(view.title, "My Files");
        assert_eq!(view.visible_ids(), vec![1, 3]);
        assert_eq!(view.group_cards.len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_skips_refetch_and_keeps_view() {
        let server = StubServer::start(|route, _| match route {
            "GET /api/files" => reply(200, &files_body(&[1, 2])),
            "GET /api/groups" => reply(200, r#"{"groups":{"A":[1]}}"#),
            _ => reply(404, r#"{"error":"Group not found"}"#),
        })
        .await;
        let browser = server.browser();
        browser.refresh().await.unwrap();
        let before = browser.open_group("A").await.unwrap();

        let err = browser.delete_group("Gone").await.unwrap_err();
        assert!(matches!(
            err,
            ViewError::Server { status: 404, ref message } if message == "Group not found"
        ));
        assert_eq!(server.calls("GET /api/groups"), 1);
        assert!(!browser.browser.lock().await.cache().needs_refetch());
        assert_eq!(browser.render().await, before);
    }

    #[tokio::test]
    async fn exit_refetches_after_failed_refresh() {
        let server = StubServer::start(|route, nth| match route {
            "GET /api/files" => reply(200, &files_body(&[1, 2])),
            "GET /api/groups" => match nth {
                1 => reply(200, r#"{"groups":{"A":[1]}}"#),
                2 => reply(500, r#"{"error":"Internal server error"}"#),
                _ => reply(200, r#"{"groups":{}}"#),
            },
            "DELETE /api/groups/A" => reply(200, r#"{"groups":{}}"#),
            _ => reply(404, r#"{"error":"Not found"}"#),
        })
        .await;
        let browser = server.browser();
        browser.refresh().await.unwrap();
        browser.open_group("A").await.unwrap();

        // The delete lands but the refetch behind it fails.
        let err = browser.delete_group("A").await.unwrap_err();
        assert!(matches!(err, ViewError::Server { status: 500, .. }));
        assert!(browser.browser.lock().await.cache().needs_refetch());

        let view = browser.exit_group_view().await.unwrap();
        assert_eq!(server.calls("GET /api/groups"), 3);
        assert!(!browser.browser.lock().await.cache().needs_refetch());
        assert_eq!(view.visible_ids(), vec![1, 2]);
        assert!(view.group_cards.is_empty());

        // Nothing stale now, so leaving again stays local.
        browser.exit_group_view().await.unwrap();
        assert_eq!(server.calls("GET /api/groups"), 3);
    }

    #[test]
    fn endpoints_encode_group_names() {
        let client = GroupsClient::new(Url::parse("http://localhost:3000/api/").unwrap(), "t");
        let url = client.endpoint(&["groups", "Week 1/2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/groups/Week%201%2F2");

        let bare = GroupsClient::new(Url::parse("http://localhost:3000").unwrap(), "t");
        assert_eq!(
            bare.endpoint(&["groups"]).unwrap().as_str(),
            "http://localhost:3000/groups"
        );
    }

    #[test]
    fn non_hierarchical_base_is_rejected() {
        let client = GroupsClient::new(Url::parse("mailto:someone@example.com").unwrap(), "t");
        assert!(matches!(
            client.endpoint(&["groups"]),
            Err(ViewError::BadBaseUrl(_))
        ));
    }

    #[test]
    fn server_error_prefers_json_message() {
        let err = server_error(StatusCode::NOT_FOUND, r#"{"error":"Group not found"}"#);
        assert!(matches!(
            err,
            ViewError::Server { status: 404, ref message } if message == "Group not found"
        ));

        let err = server_error(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(
            err,
            ViewError::Server { status: 502, ref message } if message == "Bad Gateway"
        ));
    }
}
