// Cookie, session and flash holders

use std::collections::HashMap;

/// A request cookie
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

macro_rules! string_store {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            data: HashMap<String, String>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn get(&self, key: &str) -> Option<&str> {
                self.data.get(key).map(String::as_str)
            }

            pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
                self.data.insert(key.into(), value.into());
            }

            pub fn remove(&mut self, key: &str) -> Option<String> {
                self.data.remove(key)
            }

            pub fn contains(&self, key: &str) -> bool {
                self.data.contains_key(key)
            }

            pub fn is_empty(&self) -> bool {
                self.data.is_empty()
            }

            pub fn clear(&mut self) {
                self.data.clear();
            }
        }
    };
}

string_store!(
    /// Session values. Signing and serialization belong to the session layer.
    SessionCookie
);

string_store!(
    /// Values that live until the next request.
    FlashCookie
);
