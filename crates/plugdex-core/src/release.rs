//! Plugin release and plugin capabilities.

use std::fmt::Debug;

use crate::Metadata;

/// One offering of a plugin from a repository.
///
/// Releases are owned by exactly one repository. The core only relies on
/// their identity: two releases are the same if they come from the same
/// repository and carry the same plugin id and version.
pub trait PluginRelease: Debug {
    /// Returns the id of the repository offering this release.
    fn repo_id(&self) -> &str;

    /// Returns the metadata describing this release.
    fn metadata(&self) -> &Metadata;

    /// Returns the plugin id.
    fn plugin_id(&self) -> &str {
        self.metadata().id()
    }

    /// Returns the version of this release.
    ///
    /// The available version wins over the installed one.
    fn version(&self) -> Option<&str> {
        let metadata = self.metadata();
        metadata
            .get_str("version_available")
            .ok()
            .flatten()
            .or_else(|| metadata.get_str("version_installed").ok().flatten())
    }

    /// Returns `true` if `other` denotes the same release.
    fn same_release(&self, other: &dyn PluginRelease) -> bool {
        self.repo_id() == other.repo_id()
            && self.plugin_id() == other.plugin_id()
            && self.version() == other.version()
    }
}

impl PartialEq for dyn PluginRelease + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.same_release(other)
    }
}

/// A logical plugin, aggregating its releases across repositories.
pub trait Plugin: Debug {
    /// Returns the plugin id.
    fn id(&self) -> &str;

    /// Returns `true` if some release of this plugin is installed.
    fn installed(&self) -> bool;

    /// Returns `true` if some release of this plugin can be installed.
    fn available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Release {
        repo: &'static str,
        metadata: Metadata,
    }

    impl PluginRelease for Release {
        fn repo_id(&self) -> &str {
            self.repo
        }

        fn metadata(&self) -> &Metadata {
            &self.metadata
        }
    }

    fn release(repo: &'static str, values: &[(&str, &str)]) -> Box<dyn PluginRelease> {
        let mut pairs = vec![("id", "qdemo"), ("name", "Demo")];
        pairs.extend_from_slice(values);
        Box::new(Release {
            repo,
            metadata: Metadata::new(pairs).unwrap(),
        })
    }

    #[test]
    fn test_version_prefers_available() {
        let r = release(
            "remote",
            &[("version_installed", "1.0"), ("version_available", "1.1")],
        );
        assert_eq!(r.version(), Some("1.1"));

        let r = release("local", &[("version_installed", "1.0")]);
        assert_eq!(r.version(), Some("1.0"));

        let r = release("local", &[]);
        assert_eq!(r.version(), None);
    }

    #[test]
    fn test_equality_by_identity() {
        let a = release("local", &[("version_installed", "1.0")]);
        let b = release("local", &[("version_installed", "1.0"), ("tags", "x")]);
        let c = release("other", &[("version_installed", "1.0")]);
        let d = release("local", &[("version_installed", "2.0")]);

        assert!(*a == *b);
        assert!(*a != *c);
        assert!(*a != *d);
    }
}
