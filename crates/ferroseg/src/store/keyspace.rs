use crate::{Error, Result};

/// Default name of the counter holding the last assigned rule id.
pub const DEFAULT_RULE_ID_KEY: &str = "sequence:rule:id";

/// Default name of the map from business key to rule record.
pub const DEFAULT_RULE_DATA_KEY: &str = "sequence:rule:data";

/// Default prefix of the per-key offset counters.
pub const DEFAULT_OFFSET_PREFIX: &str = "sequence:key:";

/// The three backend names a repository owns.
///
/// - one counter for rule-id assignment,
/// - one map holding every rule record,
/// - one counter per business key, named `offset_prefix + key`.
///
/// Because offset counters are derived from caller-supplied keys, the prefix
/// must not be a prefix of the other two names: otherwise some business key
/// would address the id counter or the data map. [`Keyspace::new`] enforces
/// this.
///
/// # Example
///
/// ```
/// use ferroseg::Keyspace;
///
/// let keyspace = Keyspace::default();
/// assert_eq!(keyspace.offset_key("order_id"), "sequence:key:order_id");
///
/// let tenant = Keyspace::default().namespaced("tenant-a").unwrap();
/// assert_eq!(tenant.rule_id_key(), "tenant-a:sequence:rule:id");
///
/// assert!(Keyspace::new("seq:id", "seq:data", "seq:").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    rule_id_key: String,
    rule_data_key: String,
    offset_prefix: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self {
            rule_id_key: DEFAULT_RULE_ID_KEY.to_owned(),
            rule_data_key: DEFAULT_RULE_DATA_KEY.to_owned(),
            offset_prefix: DEFAULT_OFFSET_PREFIX.to_owned(),
        }
    }
}

impl Keyspace {
    /// Builds a validated keyspace.
    ///
    /// # Errors
    /// - [`Error::InvalidKeyspace`] if a name is empty, the id counter and
    ///   data map share a name, or either starts with the offset prefix.
    pub fn new(
        rule_id_key: impl Into<String>,
        rule_data_key: impl Into<String>,
        offset_prefix: impl Into<String>,
    ) -> Result<Self> {
        let keyspace = Self {
            rule_id_key: rule_id_key.into(),
            rule_data_key: rule_data_key.into(),
            offset_prefix: offset_prefix.into(),
        };
        keyspace.validate()?;
        Ok(keyspace)
    }

    /// Prefixes all three names with `namespace:`, for several independent
    /// repositories sharing one backend.
    ///
    /// The namespace may not contain `:`. Otherwise namespace `a` would own
    /// the offset prefix `a:sequence:key:` and, through it, every name of
    /// namespace `a:sequence:key:x`.
    ///
    /// # Errors
    /// - [`Error::InvalidKeyspace`] if `namespace` is empty or contains `:`.
    pub fn namespaced(&self, namespace: &str) -> Result<Self> {
        if namespace.is_empty() {
            return Err(invalid("namespace must not be empty"));
        }
        if namespace.contains(':') {
            return Err(invalid(format!("namespace [{namespace}] must not contain ':'")));
        }
        Self::new(
            format!("{namespace}:{}", self.rule_id_key),
            format!("{namespace}:{}", self.rule_data_key),
            format!("{namespace}:{}", self.offset_prefix),
        )
    }

    pub fn rule_id_key(&self) -> &str {
        &self.rule_id_key
    }

    pub fn rule_data_key(&self) -> &str {
        &self.rule_data_key
    }

    pub fn offset_prefix(&self) -> &str {
        &self.offset_prefix
    }

    /// The counter name holding the offset for business key `key`.
    pub fn offset_key(&self, key: &str) -> String {
        let mut name = String::with_capacity(self.offset_prefix.len() + key.len());
        name.push_str(&self.offset_prefix);
        name.push_str(key);
        name
    }

    fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("rule id key", &self.rule_id_key),
            ("rule data key", &self.rule_data_key),
            ("offset prefix", &self.offset_prefix),
        ] {
            if value.is_empty() {
                return Err(invalid(format!("{label} must not be empty")));
            }
        }
        if self.rule_id_key == self.rule_data_key {
            return Err(invalid(format!(
                "rule id key and rule data key are both [{}]",
                self.rule_id_key
            )));
        }
        for name in [&self.rule_id_key, &self.rule_data_key] {
            if name.starts_with(&self.offset_prefix) {
                return Err(invalid(format!(
                    "[{name}] is shadowed by offset prefix [{}]",
                    self.offset_prefix
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidKeyspace {
        reason: reason.into(),
    }
}

/// Command-line / environment overrides for a [`Keyspace`].
///
/// Meant to be flattened into a binary's own `clap` parser:
///
/// ```
/// use clap::Parser;
/// use ferroseg::{Keyspace, KeyspaceArgs};
///
/// #[derive(Parser)]
/// struct Args {
///     #[command(flatten)]
///     keyspace: KeyspaceArgs,
/// }
///
/// let args = Args::parse_from(["bin", "--offset-prefix", "ids:"]);
/// let keyspace = Keyspace::try_from(args.keyspace).unwrap();
/// assert_eq!(keyspace.offset_key("a"), "ids:a");
/// ```
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug, Clone)]
pub struct KeyspaceArgs {
    /// Counter holding the last assigned rule id.
    ///
    /// Environment variable: `FERROSEG_RULE_ID_KEY`
    #[arg(long, env = "FERROSEG_RULE_ID_KEY", default_value = DEFAULT_RULE_ID_KEY)]
    pub rule_id_key: String,

    /// Map holding every rule record, keyed by business key.
    ///
    /// Environment variable: `FERROSEG_RULE_DATA_KEY`
    #[arg(long, env = "FERROSEG_RULE_DATA_KEY", default_value = DEFAULT_RULE_DATA_KEY)]
    pub rule_data_key: String,

    /// Prefix for per-key offset counters.
    ///
    /// Environment variable: `FERROSEG_OFFSET_PREFIX`
    #[arg(long, env = "FERROSEG_OFFSET_PREFIX", default_value = DEFAULT_OFFSET_PREFIX)]
    pub offset_prefix: String,

    /// Optional namespace prepended to all three names.
    ///
    /// Environment variable: `FERROSEG_NAMESPACE`
    #[arg(long, env = "FERROSEG_NAMESPACE")]
    pub namespace: Option<String>,
}

#[cfg(feature = "cli")]
impl TryFrom<KeyspaceArgs> for Keyspace {
    type Error = Error;

    fn try_from(args: KeyspaceArgs) -> Result<Self, Self::Error> {
        let keyspace = Self::new(args.rule_id_key, args.rule_data_key, args.offset_prefix)?;
        match args.namespace {
            Some(namespace) => keyspace.namespaced(&namespace),
            None => Ok(keyspace),
        }
    }
}
