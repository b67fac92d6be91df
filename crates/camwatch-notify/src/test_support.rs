//! Shared fixtures for sink tests.

pub const TEST_CLIENT_EMAIL: &str = "camwatch@camwatch-test.iam.gserviceaccount.com";

/// Throwaway 2048-bit RSA key, PKCS#8 PEM, used only by tests.
pub const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_rsa_key.pem");

/// Service-account JSON pointing its token endpoint at `token_uri`.
pub fn service_account_json(token_uri: &str) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "camwatch-test",
        "client_email": TEST_CLIENT_EMAIL,
        "private_key": TEST_PRIVATE_KEY,
        "token_uri": token_uri,
    })
    .to_string()
}
