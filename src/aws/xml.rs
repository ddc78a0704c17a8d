#[derive(Debug, Deserialize)]
#[serde(rename = "AssumeRoleWithSAMLResponse")]
pub struct AssumeRoleWithSAMLResponse {
    #[serde(rename = "AssumeRoleWithSAMLResult")]
    pub result: AssumeRoleWithSAMLResult,
    #[serde(rename = "ResponseMetadata")]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct AssumeRoleWithSAMLResult {
    #[serde(rename = "Credentials")]
    pub credentials: Credentials,
    #[serde(rename = "AssumedRoleUser")]
    pub assumed_role_user: Option<AssumedRoleUser>,
    #[serde(rename = "Subject")]
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssumedRoleUser {
    #[serde(rename = "Arn")]
    pub arn: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    #[serde(rename = "Expiration")]
    pub expiration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "ErrorResponse")]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: ErrorDetail,
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}
