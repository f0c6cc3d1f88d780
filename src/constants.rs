//! Storage keys and persisted tags.
//!
//! Every value in the secure store is a string under one of these keys.

/// Default namespace for the on-disk store.
pub const STORE_NAMESPACE: &str = "software.amazon.location.auth";

/// Credential mode tag.
pub const METHOD: &str = "method";

/// Identity pool identifier (federated mode only).
pub const IDENTITY_POOL_ID: &str = "identityPoolId";

/// Region name.
pub const REGION: &str = "region";

pub const ACCESS_KEY_ID: &str = "accessKeyId";
pub const SECRET_KEY: &str = "secretKey";
pub const SESSION_TOKEN: &str = "sessionToken";

/// Expiration as decimal epoch seconds.
pub const EXPIRATION: &str = "expiration";

/// Persisted tag for federated mode.
pub const METHOD_FEDERATED: &str = "cognito";

/// Persisted tag for external mode.
pub const METHOD_EXTERNAL: &str = "custom";

/// Keys owned by the credential cache, in write order.
pub const CREDENTIAL_KEYS: [&str; 4] = [ACCESS_KEY_ID, SECRET_KEY, SESSION_TOKEN, EXPIRATION];

/// Environment variable for the identity pool id.
pub const ENV_IDENTITY_POOL_ID: &str = "LOCAUTH_IDENTITY_POOL_ID";

/// Environment variable for the region, checked before `AWS_REGION`.
pub const ENV_REGION: &str = "LOCAUTH_REGION";

pub const ENV_AWS_REGION: &str = "AWS_REGION";
