use std::collections::HashSet;

/// Built-in executor names. The registry is read-only after startup and
/// shared across request tasks.
pub const EXEC_BASIC_AUTH: &str = "basic-auth";
pub const EXEC_AUTH_ASSERT: &str = "auth-assert";
pub const EXEC_PROVISIONING: &str = "provision";
pub const EXEC_USER_TYPE_RESOLVER: &str = "user-type-resolver";
pub const EXEC_GOOGLE_OIDC: &str = "google-oidc";
pub const EXEC_GITHUB_OAUTH: &str = "github-oauth";
pub const EXEC_SMS_OTP: &str = "sms-otp";

#[derive(Debug, Clone, Default)]
pub struct ExecutorRegistry {
    names: HashSet<String>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        ExecutorRegistry {
            names: HashSet::new(),
        }
    }

    /// Registry seeded with every built-in executor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in [
            EXEC_BASIC_AUTH,
            EXEC_AUTH_ASSERT,
            EXEC_PROVISIONING,
            EXEC_USER_TYPE_RESOLVER,
            EXEC_GOOGLE_OIDC,
            EXEC_GITHUB_OAUTH,
            EXEC_SMS_OTP,
        ] {
            registry.register(name);
        }
        registry
    }

    pub fn register(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
