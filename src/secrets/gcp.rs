use google_cloud_secretmanager_v1::client::SecretManagerService;

use super::SecretError;

/// Reads one version of a Google Secret Manager secret as text.
///
/// `name` is the full resource name (`projects/<p>/secrets/<s>`).
pub async fn fetch_secret(name: &str, version: &str) -> Result<String, SecretError> {
    let resource = format!("{name}/versions/{version}");

    let client = SecretManagerService::builder()
        .build()
        .await
        .map_err(|e| SecretError::Client(Box::new(e)))?;

    let response = client
        .access_secret_version()
        .set_name(resource.clone())
        .send()
        .await
        .map_err(|e| SecretError::Client(Box::new(e)))?;

    let payload = response
        .payload
        .ok_or_else(|| SecretError::EmptyPayload(resource.clone()))?;

    let secret = std::str::from_utf8(&payload.data)
        .map_err(|_| SecretError::NotUtf8(resource))?;

    Ok(secret.trim_end().to_string())
}
