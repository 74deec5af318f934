//! Dialect classification and the per-data-source profile cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::driver::DatabaseMetadata;
use crate::error::SqlPagerError;

/// The database engines whose windowing syntax this crate knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Dialect {
    /// Microsoft SQL Server
    #[value(name = "sqlserver")]
    SqlServer,
    /// Oracle Database
    Oracle,
    /// `MySQL` and compatible servers
    #[value(name = "mysql")]
    MySql,
    /// `SQLite`
    Sqlite,
}

// Matched against the lower-cased product name; earlier entries win.
const PRODUCT_TOKENS: [(&str, Dialect); 4] = [
    ("microsoft", Dialect::SqlServer),
    ("oracle", Dialect::Oracle),
    ("mysql", Dialect::MySql),
    ("sqlite", Dialect::Sqlite),
];

impl Dialect {
    /// Classify a product name such as `"Microsoft SQL Server"`.
    ///
    /// # Errors
    /// Returns `SqlPagerError::UnsupportedDialect` when no known token appears in the name.
    pub fn classify(product_name: &str) -> Result<Dialect, SqlPagerError> {
        let lowered = product_name.to_lowercase();
        PRODUCT_TOKENS
            .iter()
            .find(|(token, _)| lowered.contains(token))
            .map(|(_, dialect)| *dialect)
            .ok_or_else(|| SqlPagerError::UnsupportedDialect {
                product: product_name.to_string(),
            })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::SqlServer => "SqlServer",
            Dialect::Oracle => "Oracle",
            Dialect::MySql => "MySql",
            Dialect::Sqlite => "Sqlite",
        };
        f.write_str(name)
    }
}

/// Metadata captured from a connection the first time its data source is seen.
///
/// Fields that could not be read are left empty (`None` for `max_connections`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DialectProfile {
    pub product_name: String,
    pub product_version: String,
    pub driver_name: String,
    pub driver_version: String,
    pub user_name: String,
    pub url: String,
    pub max_connections: Option<u32>,
}

fn field_or_default<T: Default>(field: &str, read: Result<T, SqlPagerError>) -> T {
    read.unwrap_or_else(|err| {
        tracing::warn!(field, error = %err, "could not read connection metadata field");
        T::default()
    })
}

impl DialectProfile {
    /// Read every field, tolerating individual failures.
    #[must_use]
    pub fn read(metadata: &dyn DatabaseMetadata) -> Self {
        Self {
            product_name: field_or_default("product_name", metadata.product_name()),
            product_version: field_or_default("product_version", metadata.product_version()),
            driver_name: field_or_default("driver_name", metadata.driver_name()),
            driver_version: field_or_default("driver_version", metadata.driver_version()),
            user_name: field_or_default("user_name", metadata.user_name()),
            url: field_or_default("url", metadata.url()),
            max_connections: metadata
                .max_connections()
                .map_err(|err| {
                    tracing::warn!(field = "max_connections", error = %err, "could not read connection metadata field");
                })
                .ok(),
        }
    }

    /// # Errors
    /// Returns `SqlPagerError::UnsupportedDialect` carrying the product name.
    pub fn dialect(&self) -> Result<Dialect, SqlPagerError> {
        Dialect::classify(&self.product_name)
    }
}

/// Caches one [`DialectProfile`] per data source.
///
/// A cached profile is reused while the connection reports the same URL (compared
/// case-insensitively) and replaced when it changes. Profiles are built completely before
/// they are published, so readers never see a partial one; concurrent first detections may
/// both read metadata and the last one wins.
#[derive(Debug, Default)]
pub struct DialectDetector {
    profiles: RwLock<HashMap<String, Arc<DialectProfile>>>,
}

impl DialectDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect the dialect, using the connection URL as the data-source identity.
    ///
    /// # Errors
    /// Returns `SqlPagerError::UnsupportedDialect` when the product is not recognised.
    pub fn detect(&self, metadata: &dyn DatabaseMetadata) -> Result<Dialect, SqlPagerError> {
        let url = field_or_default("url", metadata.url());
        self.detect_with_url(&url, &url, metadata)
    }

    /// Detect the dialect for a named data source.
    ///
    /// # Errors
    /// Returns `SqlPagerError::UnsupportedDialect` when the product is not recognised.
    pub fn detect_for(
        &self,
        source: &str,
        metadata: &dyn DatabaseMetadata,
    ) -> Result<Dialect, SqlPagerError> {
        let url = field_or_default("url", metadata.url());
        self.detect_with_url(source, &url, metadata)
    }

    /// The profile currently cached for `source`, if any.
    #[must_use]
    pub fn profile(&self, source: &str) -> Option<Arc<DialectProfile>> {
        let profiles = match self.profiles.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        profiles.get(source).cloned()
    }

    /// Forget the cached profile for `source`.
    pub fn invalidate(&self, source: &str) {
        let mut profiles = match self.profiles.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        profiles.remove(source);
    }

    fn detect_with_url(
        &self,
        source: &str,
        url: &str,
        metadata: &dyn DatabaseMetadata,
    ) -> Result<Dialect, SqlPagerError> {
        if let Some(profile) = self.profile(source)
            && profile.url.eq_ignore_ascii_case(url)
        {
            return profile.dialect();
        }

        let profile = Arc::new(DialectProfile::read(metadata));
        tracing::debug!(
            source,
            product = %profile.product_name,
            version = %profile.product_version,
            "read connection metadata"
        );
        let dialect = profile.dialect();
        {
            let mut profiles = match self.profiles.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            profiles.insert(source.to_string(), profile);
        }
        dialect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Meta {
        product: &'static str,
        url: RwLock<String>,
        product_reads: AtomicUsize,
        fail_user: bool,
    }

    impl Meta {
        fn new(product: &'static str, url: &str) -> Self {
            Self {
                product,
                url: RwLock::new(url.to_string()),
                product_reads: AtomicUsize::new(0),
                fail_user: false,
            }
        }
    }

    impl DatabaseMetadata for Meta {
        fn product_name(&self) -> Result<String, SqlPagerError> {
            self.product_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.product.to_string())
        }
        fn product_version(&self) -> Result<String, SqlPagerError> {
            Ok("1.0".into())
        }
        fn driver_name(&self) -> Result<String, SqlPagerError> {
            Ok("test".into())
        }
        fn driver_version(&self) -> Result<String, SqlPagerError> {
            Ok("0.1".into())
        }
        fn user_name(&self) -> Result<String, SqlPagerError> {
            if self.fail_user {
                Err(SqlPagerError::ExecutionError("no user".into()))
            } else {
                Ok("scott".into())
            }
        }
        fn url(&self) -> Result<String, SqlPagerError> {
            Ok(self.url.read().unwrap().clone())
        }
        fn max_connections(&self) -> Result<u32, SqlPagerError> {
            Ok(10)
        }
    }

    #[test]
    fn classifies_by_first_matching_token() {
        assert_eq!(Dialect::classify("Microsoft SQL Server").unwrap(), Dialect::SqlServer);
        assert_eq!(Dialect::classify("Oracle").unwrap(), Dialect::Oracle);
        assert_eq!(Dialect::classify("MySQL").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::classify("SQLite").unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::classify("oracle mysql bridge").unwrap(), Dialect::Oracle);
        match Dialect::classify("PostgreSQL") {
            Err(SqlPagerError::UnsupportedDialect { product }) => assert_eq!(product, "PostgreSQL"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detection_is_cached_per_url() {
        let detector = DialectDetector::new();
        let meta = Meta::new("MySQL", "mysql://db/app");
        assert_eq!(detector.detect(&meta).unwrap(), Dialect::MySql);
        assert_eq!(detector.detect(&meta).unwrap(), Dialect::MySql);
        assert_eq!(meta.product_reads.load(Ordering::SeqCst), 1);

        *meta.url.write().unwrap() = "mysql://other/app".into();
        assert_eq!(detector.detect(&meta).unwrap(), Dialect::MySql);
        assert_eq!(meta.product_reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn named_sources_are_independent_and_url_change_refreshes() {
        let detector = DialectDetector::new();
        let oracle = Meta::new("Oracle", "oracle://a/xe");
        let sqlite = Meta::new("SQLite", "file:b.db");
        assert_eq!(detector.detect_for("a", &oracle).unwrap(), Dialect::Oracle);
        assert_eq!(detector.detect_for("b", &sqlite).unwrap(), Dialect::Sqlite);
        assert_eq!(detector.detect_for("a", &oracle).unwrap(), Dialect::Oracle);
        assert_eq!(oracle.product_reads.load(Ordering::SeqCst), 1);

        assert_eq!(detector.detect_for("a", &sqlite).unwrap(), Dialect::Sqlite);
        assert_eq!(detector.profile("a").unwrap().url, "file:b.db");

        detector.invalidate("a");
        assert!(detector.profile("a").is_none());
    }

    #[test]
    fn unreadable_fields_are_left_empty() {
        let mut meta = Meta::new("Microsoft SQL Server", "sqlserver://x");
        meta.fail_user = true;
        let profile = DialectProfile::read(&meta);
        assert_eq!(profile.user_name, "");
        assert_eq!(profile.max_connections, Some(10));
        assert_eq!(profile.dialect().unwrap(), Dialect::SqlServer);
    }

    #[test]
    fn unsupported_product_is_cached_but_still_fails() {
        let detector = DialectDetector::new();
        let meta = Meta::new("PostgreSQL", "pg://x");
        assert!(detector.detect(&meta).is_err());
        assert!(detector.detect(&meta).is_err());
        assert_eq!(meta.product_reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_detections_publish_complete_profiles() {
        const THREADS: usize = 8;
        let detector = DialectDetector::new();
        let meta = Meta::new("Microsoft SQL Server", "sqlserver://shared");
        let barrier = Barrier::new(THREADS);
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    barrier.wait();
                    assert_eq!(detector.detect_for("shared", &meta).unwrap(), Dialect::SqlServer);
                    let seen = detector.profile("shared").unwrap();
                    assert_eq!(seen.product_name, "Microsoft SQL Server");
                    assert_eq!(seen.max_connections, Some(10));
                });
            }
        });
        let reads = meta.product_reads.load(Ordering::SeqCst);
        assert!((1..=THREADS).contains(&reads), "{reads} metadata reads");
        assert_eq!(*detector.profile("shared").unwrap(), DialectProfile::read(&meta));
    }
}
