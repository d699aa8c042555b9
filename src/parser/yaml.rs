use super::types::{StepSpec, Suite};
use crate::error::SuiteError;
use std::path::{Path, PathBuf};

/// Suites compiled into the binary: (name, YAML source)
const BUILTIN_SUITES: &[(&str, &str)] = &[
    ("smoke", include_str!("../../suites/smoke.yaml")),
    ("payment", include_str!("../../suites/payment.yaml")),
];

pub const DEFAULT_SUITE: &str = "smoke";

/// Parse a YAML suite file
pub fn parse_suite_file(path: &Path) -> Result<Suite, SuiteError> {
    let content = std::fs::read_to_string(path).map_err(|source| SuiteError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut suite = parse_suite_content(&content)?;
    if suite.name.trim().is_empty() {
        suite.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("suite")
            .to_string();
    }
    validate(&suite)?;
    Ok(suite)
}

/// Parse YAML content into a Suite without validating it
pub fn parse_suite_content(content: &str) -> Result<Suite, SuiteError> {
    // A bare list of steps is a public-only suite
    if let Ok(steps) = serde_yaml::from_str::<Vec<StepSpec>>(content) {
        return Ok(Suite {
            name: String::new(),
            description: None,
            base_url: None,
            default_timeout_ms: None,
            public: steps,
            login: None,
            steps: Vec::new(),
        });
    }

    Ok(serde_yaml::from_str::<Suite>(content)?)
}

/// Names of the suites shipped with the binary
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_SUITES.iter().map(|(name, _)| *name)
}

pub fn builtin_suite(name: &str) -> Result<Suite, SuiteError> {
    let (_, source) = BUILTIN_SUITES
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| SuiteError::UnknownBuiltin(name.to_string()))?;

    let suite = parse_suite_content(source)?;
    validate(&suite)?;
    Ok(suite)
}

/// Resolve `--suite`: a YAML file, a directory of YAML files, or a built-in name
pub fn load_suites(source: &str) -> Result<Vec<Suite>, SuiteError> {
    let path = Path::new(source);
    if path.is_dir() {
        return collect_suite_files(path)
            .iter()
            .map(|p| parse_suite_file(p))
            .collect();
    }
    if path.is_file() {
        return Ok(vec![parse_suite_file(path)?]);
    }
    Ok(vec![builtin_suite(source)?])
}

/// All .yaml/.yml files below `dir`, sorted for a stable run order
pub fn collect_suite_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Structural checks that would otherwise surface mid-run
pub fn validate(suite: &Suite) -> Result<(), SuiteError> {
    let invalid = |reason: String| SuiteError::Invalid {
        suite: suite.name.clone(),
        reason,
    };

    if !suite.steps.is_empty() && suite.login.is_none() {
        return Err(invalid(format!(
            "{} authenticated step(s) but no login block",
            suite.steps.len()
        )));
    }

    if let Some(login) = &suite.login {
        if login.phone.trim().is_empty() {
            return Err(invalid("login phone is empty".to_string()));
        }
    }

    for (index, step) in suite.public.iter().chain(suite.steps.iter()).enumerate() {
        if step.name.trim().is_empty() {
            return Err(invalid(format!("step #{} has no name", index)));
        }
        if !step.path.starts_with('/') {
            return Err(invalid(format!(
                "step '{}' path must start with '/': {}",
                step.name, step.path
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;

    #[test]
    fn test_parse_suite() {
        let yaml = r#"
name: profile
baseUrl: http://localhost:9090
public:
  - name: health
    path: /api/health
    tags: [basic]
login:
  phone: "13800138000"
  params:
    gender: FEMALE
steps:
  - name: update profile
    method: put
    path: /api/users/profile/${user_id}
    requires: [user_id]
    body:
      nickname: tester
  - name: search
    path: /api/users/search
    query:
      page: 0
      gender: FEMALE
"#;

        let suite = parse_suite_content(yaml).unwrap();
        validate(&suite).unwrap();

        assert_eq!(suite.name, "profile");
        assert_eq!(suite.base_url.as_deref(), Some("http://localhost:9090"));
        assert_eq!(suite.public[0].method, Method::Get);
        assert_eq!(suite.steps[0].method, Method::Put);
        assert!(suite.steps[0].sends_auth());

        let login = suite.login.as_ref().unwrap();
        assert_eq!(login.send_code_path, "/api/auth/send-code");
        assert_eq!(login.param_pairs(), vec![("gender".to_string(), "FEMALE".to_string())]);

        let query = suite.steps[1].query_pairs();
        assert!(query.contains(&("page".to_string(), "0".to_string())));
    }

    #[test]
    fn test_bare_list_is_public_suite() {
        let yaml = r#"
- name: health
  path: /api/health
- name: swagger
  path: /swagger-ui.html
"#;
        let suite = parse_suite_content(yaml).unwrap();
        assert_eq!(suite.public.len(), 2);
        assert!(!suite.needs_login());
    }

    #[test]
    fn test_authenticated_steps_require_login() {
        let yaml = r#"
name: broken
steps:
  - name: profile
    path: /api/users/profile
"#;
        let suite = parse_suite_content(yaml).unwrap();
        assert!(matches!(validate(&suite), Err(SuiteError::Invalid { .. })));
    }

    #[test]
    fn test_relative_path_rejected() {
        let yaml = r#"
- name: health
  path: api/health
"#;
        let suite = parse_suite_content(yaml).unwrap();
        assert!(validate(&suite).is_err());
    }

    #[test]
    fn test_builtin_suites_are_valid() {
        for name in builtin_names() {
            let suite = builtin_suite(name).unwrap();
            assert!(suite.step_count() > 0, "{} is empty", name);
        }
        assert!(matches!(
            builtin_suite("nope"),
            Err(SuiteError::UnknownBuiltin(_))
        ));
    }

    #[test]
    fn test_select_by_tags() {
        let suite = builtin_suite(DEFAULT_SUITE).unwrap();
        let basic = suite.select(&["basic".to_string()]);
        assert!(!basic.public.is_empty());
        assert!(basic.steps.is_empty());
        assert!(!basic.needs_login());
    }
}
