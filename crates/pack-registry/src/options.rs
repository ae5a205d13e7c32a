use secrecy::SecretString;

/// `spec §4.1` "Add" opts.
#[derive(Debug, Default)]
pub struct AddOptions {
    pub registry_name: String,
    pub source: String,
    pub pack_name: Option<String>,
    pub ref_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl AddOptions {
    pub fn new(registry_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_pack_name(mut self, pack_name: impl Into<String>) -> Self {
        self.pack_name = Some(pack_name.into());
        self
    }

    pub fn with_ref_name(mut self, ref_name: impl Into<String>) -> Self {
        self.ref_name = Some(ref_name.into());
        self
    }
}

/// `spec §4.1` "Delete" opts.
#[derive(Debug, Default)]
pub struct DeleteOptions {
    pub registry_name: String,
    pub pack_name: Option<String>,
    pub ref_name: Option<String>,
}

impl DeleteOptions {
    pub fn new(registry_name: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            ..Self::default()
        }
    }

    pub fn with_pack_name(mut self, pack_name: impl Into<String>) -> Self {
        self.pack_name = Some(pack_name.into());
        self
    }

    pub fn with_ref_name(mut self, ref_name: impl Into<String>) -> Self {
        self.ref_name = Some(ref_name.into());
        self
    }
}

/// `spec §4.1` "Get" opts. `ref_name: None` aggregates packs across every
/// ref cached for the registry (used by `List`/`registry list`); `Some`
/// scopes the result to a single ref's packs (used right after `Add`).
#[derive(Debug, Default)]
pub struct GetOptions {
    pub registry_name: String,
    pub ref_name: Option<String>,
}

impl GetOptions {
    pub fn new(registry_name: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            ref_name: None,
        }
    }

    pub fn with_ref_name(mut self, ref_name: impl Into<String>) -> Self {
        self.ref_name = Some(ref_name.into());
        self
    }
}
