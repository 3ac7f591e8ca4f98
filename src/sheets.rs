use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use self::auth::{GoogleAuthError, TokenProvider};

pub mod auth;

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_ENDPOINT: &str = "https://www.googleapis.com";

// Dimensions for tabs this job creates itself
const NEW_TAB_ROWS: u32 = 2000;
const NEW_TAB_COLS: u32 = 50;

/// Minimal Google Sheets/Drive REST client: only the calls this job needs,
/// not a general-purpose spreadsheet SDK.
pub struct SheetsClient {
    http: Client,
    token: TokenProvider,
    sheets_endpoint: String,
    drive_endpoint: String,
}

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Google authentication failed: {0}")]
    Auth(String),
    #[error("Spreadsheet `{0}` was not found in Drive")]
    SpreadsheetNotFound(String),
    #[error("Sheets API error ({0}): {1}")]
    Api(u16, String),
    #[error("Unexpected Sheets response: {0}")]
    UnexpectedResponse(String),
    #[error("Sheets transport failure: {0}")]
    Transport(String),
}

impl From<GoogleAuthError> for SheetsError {
    fn from(err: GoogleAuthError) -> Self {
        Self::Auth(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[allow(dead_code)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateReply {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(rename = "addSheet")]
    add_sheet: Option<AddSheetReply>,
}

#[derive(Debug, Deserialize)]
struct AddSheetReply {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl SheetsClient {
    pub fn new(http: Client, token: TokenProvider) -> Self {
        Self::with_endpoints(
            http,
            token,
            DEFAULT_SHEETS_ENDPOINT.to_string(),
            DEFAULT_DRIVE_ENDPOINT.to_string(),
        )
    }

    pub fn with_endpoints(
        http: Client,
        token: TokenProvider,
        sheets_endpoint: String,
        drive_endpoint: String,
    ) -> Self {
        Self {
            http,
            token,
            sheets_endpoint: sheets_endpoint.trim_end_matches('/').to_string(),
            drive_endpoint: drive_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a spreadsheet document id by its Drive name.
    pub async fn find_spreadsheet(&self, name: &str) -> Result<String, SheetsError> {
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            name.replace('\'', "\\'")
        );
        let token = self.token.token().await?;
        let response = self
            .http
            .get(format!("{}/drive/v3/files", self.drive_endpoint))
            .bearer_auth(&token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name)"),
                ("pageSize", "10"),
            ])
            .send()
            .await
            .map_err(transport)?;
        let list: FileList = check(response).await?.json().await.map_err(transport)?;
        list.files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| SheetsError::SpreadsheetNotFound(name.to_string()))
    }

    /// Return the sheet id of the worksheet titled `title`, creating the
    /// worksheet when the spreadsheet does not have it yet.
    pub async fn ensure_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<i64, SheetsError> {
        let token = self.token.token().await?;
        let response = self
            .http
            .get(format!(
                "{}/v4/spreadsheets/{spreadsheet_id}",
                self.sheets_endpoint
            ))
            .bearer_auth(&token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await
            .map_err(transport)?;
        let meta: SpreadsheetMeta = check(response).await?.json().await.map_err(transport)?;
        if let Some(sheet) = meta.sheets.iter().find(|s| s.properties.title == title) {
            return Ok(sheet.properties.sheet_id);
        }

        debug!("Worksheet `{title}` not found, creating it");
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": NEW_TAB_ROWS, "columnCount": NEW_TAB_COLS }
                    }
                }
            }]
        });
        let reply: BatchUpdateReply = self
            .batch_update(spreadsheet_id, &body)
            .await?
            .json()
            .await
            .map_err(transport)?;
        reply
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|added| added.properties.sheet_id)
            .ok_or_else(|| {
                SheetsError::UnexpectedResponse(
                    "batchUpdate reply did not include the new sheet".to_string(),
                )
            })
    }

    /// Read every populated cell of a tab. An empty tab yields an empty set
    /// of rows, not an error.
    pub async fn read_tab(
        &self,
        spreadsheet_id: &str,
        tab: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        self.get_values(spreadsheet_id, &format!("'{tab}'")).await
    }

    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.token.token().await?;
        let response = self
            .http
            .get(format!(
                "{}/v4/spreadsheets/{spreadsheet_id}/values/{}",
                self.sheets_endpoint,
                encode_range(range)
            ))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport)?;
        let payload: ValueRange = check(response).await?.json().await.map_err(transport)?;
        Ok(payload.values)
    }

    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let token = self.token.token().await?;
        let response = self
            .http
            .put(format!(
                "{}/v4/spreadsheets/{spreadsheet_id}/values/{}",
                self.sheets_endpoint,
                encode_range(range)
            ))
            .bearer_auth(&token)
            // RAW avoids locale/date auto-parsing of cell values
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    /// Append rows anchored to `range` so they extend that table instead of
    /// landing in a detached range off to the right.
    pub async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let token = self.token.token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v4/spreadsheets/{spreadsheet_id}/values/{}:append",
                self.sheets_endpoint,
                encode_range(range)
            ))
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    pub async fn freeze_top_row(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
    ) -> Result<(), SheetsError> {
        let body = json!({
            "requests": [{
                "updateSheetProperties": {
                    "properties": {
                        "sheetId": sheet_id,
                        "gridProperties": { "frozenRowCount": 1 }
                    },
                    "fields": "gridProperties.frozenRowCount"
                }
            }]
        });
        self.batch_update(spreadsheet_id, &body).await?;
        Ok(())
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        body: &serde_json::Value,
    ) -> Result<Response, SheetsError> {
        let token = self.token.token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v4/spreadsheets/{spreadsheet_id}:batchUpdate",
                self.sheets_endpoint
            ))
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check(response).await
    }
}

async fn check(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorPayload>(&body)
        .map(|payload| payload.error.message)
        .unwrap_or(body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(SheetsError::Auth(message))
    } else {
        Err(SheetsError::Api(status.as_u16(), message))
    }
}

fn transport(err: reqwest::Error) -> SheetsError {
    SheetsError::Transport(err.to_string())
}

/// Percent-encode an A1 range for use as a URL path segment. Tab titles may
/// carry spaces, quotes, or non-ASCII characters.
fn encode_range(range: &str) -> String {
    let mut out = String::with_capacity(range.len());
    for byte in range.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b':' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::encode_range;

    #[test]
    fn encodes_quoted_tab_ranges() {
        assert_eq!(encode_range("'log'!A1:H1"), "%27log%27!A1:H1");
        assert_eq!(encode_range("'My Tab'"), "%27My%20Tab%27");
    }

    #[test]
    fn leaves_plain_ranges_alone() {
        assert_eq!(encode_range("A1:H1"), "A1:H1");
    }
}
