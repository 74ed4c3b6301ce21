//! Notion API connector.
//!
//! Pages, databases and blocks through the public v1 API.  Pages created
//! without an explicit parent go under the configured default parent page
//! (`NOTION_PARENT_PAGE_ID`).

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use synapse_kernel::{Outcome, Params, ServiceId, StatusReport};
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::http::{self, Endpoint};
use crate::operations::{DefaultValue, OperationSpec, OperationTable, optional_text, require_text};
use crate::state::ConnectionState;
use crate::traits::Connector;

/// Default Notion API base URL.
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// API version pinned in every request.
const NOTION_VERSION: &str = "2022-06-28";

static OPERATIONS: OperationTable = OperationTable::new(
    ServiceId::Notion,
    &[
        OperationSpec {
            name: "create_page",
            summary: "Create a page under a page or database",
            required: &["title"],
            defaults: &[("content", DefaultValue::Text(""))],
        },
        OperationSpec {
            name: "get_page",
            summary: "Fetch a page",
            required: &["page_id"],
            defaults: &[],
        },
        OperationSpec {
            name: "update_page",
            summary: "Rename or archive a page",
            required: &["page_id"],
            defaults: &[],
        },
        OperationSpec {
            name: "delete_page",
            summary: "Archive a page",
            required: &["page_id"],
            defaults: &[],
        },
        OperationSpec {
            name: "list_pages",
            summary: "List pages, optionally under a parent page",
            required: &[],
            defaults: &[("page_size", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "create_database",
            summary: "Create a database under a page",
            required: &[],
            defaults: &[("title", DefaultValue::Text("New Database"))],
        },
        OperationSpec {
            name: "query_database",
            summary: "Query the rows of a database",
            required: &["database_id"],
            defaults: &[("page_size", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "get_database",
            summary: "Fetch a database",
            required: &["database_id"],
            defaults: &[],
        },
        OperationSpec {
            name: "append_blocks",
            summary: "Append paragraphs to a page",
            required: &["page_id", "content"],
            defaults: &[],
        },
        OperationSpec {
            name: "get_blocks",
            summary: "List the blocks of a page",
            required: &["page_id"],
            defaults: &[],
        },
        OperationSpec {
            name: "search",
            summary: "Search pages and databases",
            required: &[],
            defaults: &[
                ("query", DefaultValue::Text("")),
                ("page_size", DefaultValue::Integer(10)),
            ],
        },
        OperationSpec {
            name: "status",
            summary: "Connection status",
            required: &[],
            defaults: &[],
        },
    ],
);

/// Notion connector.
pub struct NotionConnector {
    state: ConnectionState,
    token: Option<String>,
    default_parent: Option<String>,
    endpoint: Endpoint,
    client: Option<reqwest::Client>,
}

impl NotionConnector {
    /// Build the connector and run the handshake when a token is present.
    pub async fn connect(
        token: Option<String>,
        default_parent: Option<String>,
        endpoint: Endpoint,
    ) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let mut connector = Self {
            state: ConnectionState::initial(token.is_some()),
            token,
            default_parent: default_parent.filter(|p| !p.trim().is_empty()),
            client: endpoint
                .client()
                .inspect_err(|e| warn!(error = %e, "Notion HTTP client unavailable"))
                .ok(),
            endpoint,
        };
        if connector.token.is_none() {
            debug!("NOTION_TOKEN not set, Notion connector left unconfigured");
            return connector;
        }

        let handshake = match connector.request(Method::GET, "/users/me") {
            Ok(request) => connector.send(request, "handshake").await,
            Err(e) => Err(e),
        }
            .map(|_| ());
        match &handshake {
            Ok(()) => info!("Notion connected"),
            Err(e) => warn!(error = %e, "Notion handshake failed"),
        }
        connector.state = connector.state.clone().complete(handshake);
        connector
    }

    /// Build from `NOTION_TOKEN` and `NOTION_PARENT_PAGE_ID`.
    pub async fn from_env(endpoint: Endpoint) -> Self {
        Self::connect(
            std::env::var("NOTION_TOKEN").ok(),
            std::env::var("NOTION_PARENT_PAGE_ID").ok(),
            endpoint,
        )
        .await
    }

    /// The static operation catalog.
    pub fn table() -> &'static OperationTable {
        &OPERATIONS
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let Some(client) = &self.client else {
            return Err(AdapterError::NotConnected {
                service: "Notion".into(),
            });
        };
        let builder = client
            .request(method, self.endpoint.url(path))
            .header("Notion-Version", NOTION_VERSION);
        Ok(match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        if self.token.is_none() {
            return Err(AdapterError::AuthRequired {
                service: "Notion".into(),
                credential: "NOTION_TOKEN".into(),
            });
        }
        http::send_json(request, ServiceId::Notion, operation, self.endpoint.timeout_secs).await
    }

    fn parent_page(&self, params: &Params, operation: &str) -> Result<String> {
        optional_text(params, "parent_page_id")
            .or_else(|| self.default_parent.clone())
            .ok_or_else(|| AdapterError::InvalidParams {
                operation: operation.to_owned(),
                reason: "no parent page given and NOTION_PARENT_PAGE_ID is not set".into(),
            })
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    async fn create_page(&self, params: &Params) -> Result<Outcome> {
        let title = require_text(params, "create_page", "title")?;
        let (parent, title_property) = match optional_text(params, "parent_database_id") {
            Some(database_id) => (json!({ "database_id": database_id }), "Name"),
            None => (
                json!({ "page_id": self.parent_page(params, "create_page")? }),
                "title",
            ),
        };
        let mut body = json!({
            "parent": parent,
            "properties": { title_property: { "title": rich_text(&title) } },
        });
        let children = paragraph_blocks(params.get_str("content").unwrap_or_default());
        if !children.is_empty() {
            body["children"] = Value::Array(children);
        }
        let page = self
            .send(self.request(Method::POST, "/pages")?.json(&body), "create_page")
            .await?;
        let id = str_field(&page, "id");
        Ok(Outcome::ok(format!("✅ Page '{title}' created successfully!"))
            .with("page_id", id.clone())
            .with("page_url", page_url(&page, &id)))
    }

    async fn get_page(&self, params: &Params) -> Result<Outcome> {
        let page_id = require_text(params, "get_page", "page_id")?;
        let page = self
            .send(self.request(Method::GET, &format!("/pages/{page_id}"))?, "get_page")
            .await?;
        let title = page_title(&page);
        Ok(Outcome::ok(format!("📄 {title}"))
            .with("page_id", page_id.clone())
            .with("title", title)
            .with("archived", page.get("archived").and_then(Value::as_bool).unwrap_or(false))
            .with("created", str_field(&page, "created_time"))
            .with("page_url", page_url(&page, &page_id)))
    }

    async fn update_page(&self, params: &Params) -> Result<Outcome> {
        let page_id = require_text(params, "update_page", "page_id")?;
        let mut body = json!({});
        if let Some(title) = optional_text(params, "title") {
            body["properties"] = json!({ "title": { "title": rich_text(&title) } });
        }
        if let Some(archived) = params.get_bool("archived") {
            body["archived"] = Value::Bool(archived);
        }
        if body.as_object().is_some_and(|b| b.is_empty()) {
            return Err(AdapterError::InvalidParams {
                operation: "update_page".into(),
                reason: "nothing to update: give a title or archived flag".into(),
            });
        }
        let page = self
            .send(
                self.request(Method::PATCH, &format!("/pages/{page_id}"))?.json(&body),
                "update_page",
            )
            .await?;
        Ok(Outcome::ok("✅ Page updated!").with("page_url", page_url(&page, &page_id)))
    }

    async fn delete_page(&self, params: &Params) -> Result<Outcome> {
        let page_id = require_text(params, "delete_page", "page_id")?;
        self.send(
            self.request(Method::PATCH, &format!("/pages/{page_id}"))?
                .json(&json!({ "archived": true })),
            "delete_page",
        )
        .await?;
        Ok(Outcome::ok("✅ Page archived!").with("page_id", page_id))
    }

    async fn list_pages(&self, params: &Params) -> Result<Outcome> {
        let page_size = params.get_int("page_size").unwrap_or(10);
        let pages = match optional_text(params, "parent_page_id") {
            Some(parent) => {
                let children = self
                    .send(
                        self.request(Method::GET, &format!("/blocks/{parent}/children"))?
                            .query(&[("page_size", page_size.to_string())]),
                        "list_pages",
                    )
                    .await?;
                results(&children)
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("child_page"))
                    .map(|b| {
                        let id = str_field(b, "id");
                        json!({
                            "id": id,
                            "title": b.pointer("/child_page/title").and_then(Value::as_str).unwrap_or_default(),
                            "url": notion_url(&id),
                        })
                    })
                    .collect::<Vec<_>>()
            }
            None => {
                let body = json!({
                    "filter": { "property": "object", "value": "page" },
                    "page_size": page_size,
                });
                let found = self
                    .send(self.request(Method::POST, "/search")?.json(&body), "list_pages")
                    .await?;
                shape_results(&found)
            }
        };
        Ok(Outcome::ok(format!("Found {} pages in Notion", pages.len())).with("pages", pages))
    }

    // -----------------------------------------------------------------------
    // Databases
    // -----------------------------------------------------------------------

    async fn create_database(&self, params: &Params) -> Result<Outcome> {
        let title = optional_text(params, "title").unwrap_or_else(|| "New Database".into());
        let parent = self.parent_page(params, "create_database")?;
        let body = json!({
            "parent": { "type": "page_id", "page_id": parent },
            "title": rich_text(&title),
            "properties": { "Name": { "title": {} } },
        });
        let database = self
            .send(self.request(Method::POST, "/databases")?.json(&body), "create_database")
            .await?;
        let id = str_field(&database, "id");
        Ok(Outcome::ok(format!("✅ Database '{title}' created successfully!"))
            .with("database_id", id.clone())
            .with("database_url", page_url(&database, &id)))
    }

    async fn query_database(&self, params: &Params) -> Result<Outcome> {
        let database_id = require_text(params, "query_database", "database_id")?;
        let body = json!({ "page_size": params.get_int("page_size").unwrap_or(10) });
        let rows = self
            .send(
                self.request(Method::POST, &format!("/databases/{database_id}/query"))?
                    .json(&body),
                "query_database",
            )
            .await?;
        let rows = shape_results(&rows);
        Ok(Outcome::ok(format!("Found {} rows", rows.len())).with("results", rows))
    }

    async fn get_database(&self, params: &Params) -> Result<Outcome> {
        let database_id = require_text(params, "get_database", "database_id")?;
        let database = self
            .send(
                self.request(Method::GET, &format!("/databases/{database_id}"))?,
                "get_database",
            )
            .await?;
        let title = database
            .get("title")
            .map(plain_text)
            .unwrap_or_default();
        let properties: Vec<String> = database
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        Ok(Outcome::ok(format!("🗃️ {title} ({} properties)", properties.len()))
            .with("title", title)
            .with("properties", properties)
            .with("database_url", page_url(&database, &database_id)))
    }

    // -----------------------------------------------------------------------
    // Blocks and search
    // -----------------------------------------------------------------------

    async fn append_blocks(&self, params: &Params) -> Result<Outcome> {
        let page_id = require_text(params, "append_blocks", "page_id")?;
        let content = require_text(params, "append_blocks", "content")?;
        let children = paragraph_blocks(&content);
        let count = children.len();
        self.send(
            self.request(Method::PATCH, &format!("/blocks/{page_id}/children"))?
                .json(&json!({ "children": children })),
            "append_blocks",
        )
        .await?;
        Ok(Outcome::ok(format!("✅ Added {count} blocks to page!"))
            .with("page_url", notion_url(&page_id)))
    }

    async fn get_blocks(&self, params: &Params) -> Result<Outcome> {
        let page_id = require_text(params, "get_blocks", "page_id")?;
        let children = self
            .send(
                self.request(Method::GET, &format!("/blocks/{page_id}/children"))?,
                "get_blocks",
            )
            .await?;
        let blocks: Vec<Value> = results(&children)
            .iter()
            .map(|b| {
                json!({
                    "id": str_field(b, "id"),
                    "type": str_field(b, "type"),
                    "text": block_text(b),
                })
            })
            .collect();
        Ok(Outcome::ok(format!("Found {} blocks", blocks.len())).with("blocks", blocks))
    }

    async fn search(&self, params: &Params) -> Result<Outcome> {
        let query = optional_text(params, "query").unwrap_or_default();
        let body = json!({
            "query": query,
            "page_size": params.get_int("page_size").unwrap_or(10),
        });
        let found = self
            .send(self.request(Method::POST, "/search")?.json(&body), "search")
            .await?;
        let results = shape_results(&found);
        Ok(Outcome::ok(format!("Found {} results", results.len())).with("results", results))
    }

    async fn status_outcome(&self) -> Result<Outcome> {
        let report = self.status().await?;
        Ok(Outcome::ok(report.message).with("status", report.status.as_str()))
    }
}

#[async_trait]
impl Connector for NotionConnector {
    fn service(&self) -> ServiceId {
        ServiceId::Notion
    }

    fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn operations(&self) -> &'static OperationTable {
        &OPERATIONS
    }

    async fn status(&self) -> Result<StatusReport> {
        if let Some(report) = self.state.offline_report(ServiceId::Notion) {
            return Ok(report);
        }
        let me = self.send(self.request(Method::GET, "/users/me")?, "status").await?;
        let name = me
            .pointer("/bot/workspace_name")
            .or_else(|| me.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("workspace");
        Ok(StatusReport::connected(format!("Connected to Notion ({name})")))
    }

    async fn execute(&self, operation: &str, params: Params) -> Result<Outcome> {
        debug!(operation, "executing Notion operation");
        match operation {
            "create_page" => self.create_page(&params).await,
            "get_page" => self.get_page(&params).await,
            "update_page" => self.update_page(&params).await,
            "delete_page" => self.delete_page(&params).await,
            "list_pages" => self.list_pages(&params).await,
            "create_database" => self.create_database(&params).await,
            "query_database" => self.query_database(&params).await,
            "get_database" => self.get_database(&params).await,
            "append_blocks" => self.append_blocks(&params).await,
            "get_blocks" => self.get_blocks(&params).await,
            "search" => self.search(&params).await,
            "status" => self.status_outcome().await,
            _ => Err(AdapterError::UnknownOperation {
                service: "Notion".into(),
                operation: operation.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn results(list: &Value) -> &[Value] {
    list.get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn rich_text(text: &str) -> Value {
    json!([{ "type": "text", "text": { "content": text } }])
}

/// Public URL of a page or database id.
pub fn notion_url(id: &str) -> String {
    format!("https://notion.so/{}", id.replace('-', ""))
}

fn page_url(object: &Value, id: &str) -> String {
    object
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| notion_url(id))
}

/// One paragraph block per non-empty line of `content`.
pub fn paragraph_blocks(content: &str) -> Vec<Value> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(line) },
            })
        })
        .collect()
}

/// Concatenate the `plain_text` of a rich text array.
pub fn plain_text(rich: &Value) -> String {
    rich.as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("plain_text")
                        .or_else(|| p.pointer("/text/content"))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Title of a page: the value of whichever property has type `title`.
pub fn page_title(page: &Value) -> String {
    page.get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|p| p.get("title"))
        .map(plain_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_owned())
}

/// Text content of a block, whatever its type.
pub fn block_text(block: &Value) -> String {
    let kind = block.get("type").and_then(Value::as_str).unwrap_or_default();
    block
        .get(kind)
        .and_then(|body| body.get("rich_text"))
        .map(plain_text)
        .unwrap_or_default()
}

/// Reduce search or query results to id, title, object kind and URL.
pub fn shape_results(list: &Value) -> Vec<Value> {
    results(list)
        .iter()
        .map(|item| {
            let id = str_field(item, "id");
            let title = match item.get("object").and_then(Value::as_str) {
                Some("database") => item.get("title").map(plain_text).unwrap_or_default(),
                _ => page_title(item),
            };
            json!({
                "id": id,
                "title": title,
                "object": str_field(item, "object"),
                "created": str_field(item, "created_time"),
                "url": page_url(item, &id),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use synapse_kernel::StatusState;

    use super::*;

    #[test]
    fn url_drops_dashes() {
        assert_eq!(
            notion_url("1234abcd-0000-1111-2222-333344445555"),
            "https://notion.so/1234abcd000011112222333344445555"
        );
    }

    #[test]
    fn paragraphs_skip_blank_lines() {
        let blocks = paragraph_blocks("First line\n\n  Second line  \n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[1]["paragraph"]["rich_text"][0]["text"]["content"],
            "Second line"
        );
        assert!(paragraph_blocks("").is_empty());
    }

    #[test]
    fn title_comes_from_title_property() {
        let page = json!({
            "properties": {
                "Status": {"type": "select"},
                "Name": {"type": "title", "title": [{"plain_text": "Road"}, {"plain_text": "map"}]}
            }
        });
        assert_eq!(page_title(&page), "Roadmap");
        assert_eq!(page_title(&json!({})), "Untitled");
    }

    #[test]
    fn block_text_follows_block_type() {
        let block = json!({
            "type": "heading_1",
            "heading_1": {"rich_text": [{"plain_text": "Intro"}]}
        });
        assert_eq!(block_text(&block), "Intro");
        assert_eq!(block_text(&json!({"type": "divider", "divider": {}})), "");
    }

    #[test]
    fn search_results_are_shaped() {
        let found = json!({"results": [
            {"object": "database", "id": "d1", "title": [{"plain_text": "Tasks"}], "url": "https://notion.so/d1"},
            {"object": "page", "id": "p-1", "properties": {"title": {"type": "title", "title": [{"plain_text": "Notes"}]}}}
        ]});
        let shaped = shape_results(&found);
        assert_eq!(shaped[0]["title"], "Tasks");
        assert_eq!(shaped[1]["title"], "Notes");
        assert_eq!(shaped[1]["url"], "https://notion.so/p1");
    }

    #[test]
    fn table_defaults() {
        let spec = NotionConnector::table().get("create_database").unwrap();
        let mut params = Params::new();
        spec.apply_defaults(&mut params);
        assert_eq!(params.get_str("title"), Some("New Database"));
    }

    #[tokio::test]
    async fn unconfigured_without_token() {
        let connector =
            NotionConnector::connect(None, None, Endpoint::new(DEFAULT_API_URL, 5)).await;
        assert!(!connector.is_connected());
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        assert!(report.message.contains("NOTION_TOKEN"));
    }

    #[tokio::test]
    async fn missing_parent_is_invalid_params() {
        let connector = NotionConnector::connect(
            Some("secret_x".into()),
            None,
            Endpoint::new("http://127.0.0.1:9", 2),
        )
        .await;
        assert!(matches!(connector.state(), ConnectionState::Failed { .. }));
        let err = connector
            .execute("create_page", Params::new().with("title", "Plan"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams { .. }));
    }
}
