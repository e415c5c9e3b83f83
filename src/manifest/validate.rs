// src/manifest/validate.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, SvctestError};
use crate::manifest::model::Manifest;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("name pattern is a valid regex")
});

/// App and service names: lowercase alphanumerics and dashes.
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn validate_manifest(manifest: &Manifest) -> Result<()> {
    if manifest.services.is_empty() {
        return Err(SvctestError::Config(
            "manifest must declare at least one [[service]]".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for service in &manifest.services {
        if !is_valid_name(&service.name) {
            return Err(SvctestError::Config(format!(
                "invalid service name '{}'",
                service.name
            )));
        }
        if !seen.insert(service.name.as_str()) {
            return Err(SvctestError::Config(format!(
                "service '{}' is declared more than once",
                service.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, ServiceSpec};

    #[test]
    fn parses_services_in_declaration_order() {
        let manifest = Manifest::parse(
            r#"
[[service]]
name = "web"

[[service]]
name = "worker"
test = "pytest -x"
"#,
        )
        .unwrap();

        let names: Vec<_> = manifest.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["web", "worker"]);
        assert!(!manifest.services[0].has_test());
        assert_eq!(manifest.services[1].test, "pytest -x");
    }

    #[test]
    fn only_an_empty_command_means_no_test() {
        assert!(!ServiceSpec::new("web", "").has_test());
        assert!(ServiceSpec::new("web", " ").has_test());
        assert!(ServiceSpec::new("web", "true").has_test());
    }

    #[test]
    fn rejects_duplicate_service_names() {
        let err = Manifest::parse(
            r#"
[[service]]
name = "web"

[[service]]
name = "web"
test = "true"
"#,
        )
        .unwrap_err();

        match err {
            SvctestError::Config(msg) => assert!(msg.contains("more than once")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_names_and_empty_manifests() {
        assert!(Manifest::parse("[[service]]\nname = \"Web_1\"\n").is_err());
        assert!(Manifest::parse("").is_err());
    }

    #[test]
    fn name_pattern() {
        assert!(is_valid_name("worker-2"));
        assert!(!is_valid_name("-worker"));
        assert!(!is_valid_name(""));
    }
}
