use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Address, AuthenticatedUser, CompanyType, GeoPoint, UploadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Wire encoding used by the collection endpoint (`$sort[field]=-1`).
    pub fn as_wire(&self) -> i8 {
        match self {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        }
    }
}

/// Filtered, sorted, paginated query against a remote collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: serde_json::Map<String, Value>,
    pub sort: Vec<(String, SortDir)>,
    pub limit: u32,
    pub skip: u64,
}

impl ListQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn filtered(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    pub fn sorted_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortDir::Desc));
        self
    }

    pub fn sorted_asc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortDir::Asc));
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }
}

/// One page of a paginated collection response.
///
/// `data` keeps the server order verbatim; `data.len() <= limit` always
/// holds on a conforming server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub skip: u64,
}

impl<T> ListPage<T> {
    /// Whether the server has no further pages beyond this one.
    pub fn is_last(&self) -> bool {
        (self.data.len() as u32) < self.limit
            || self.skip + self.data.len() as u64 >= self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadRequest {
    pub key: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadResponse {
    pub upload_id: UploadId,
    pub key: String,
}

/// One chunk of a multipart transfer; `content` is the base64-encoded byte
/// range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendPartRequest {
    pub part_number: u32,
    pub upload_id: UploadId,
    pub key: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartAck {
    #[serde(rename = "ETag")]
    pub e_tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "ETag")]
    pub e_tag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub upload_id: UploadId,
    pub key: String,
    pub parts: Vec<CompletedPart>,
    pub file_type: String,
}

/// Authentication exchange with the remote service. The identity-provider
/// token goes in `access_token` together with the chosen strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub strategy: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub access_token: String,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationUserData {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCompanyData {
    pub company_name: String,
    #[serde(rename = "type")]
    pub company_type: CompanyType,
    pub location: GeoJsonPoint,
    pub address: Address,
}

/// GeoJSON point: coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(value: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [value.longitude, value.latitude],
        }
    }
}
