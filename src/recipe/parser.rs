// src/recipe/parser.rs

//! Recipe file parsing and lookup

use crate::error::{Error, Result};
use crate::recipe::format::{Recipe, TagPrefix};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Recipe file extensions, in lookup order
const RECIPE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Parse a recipe from a YAML string
///
/// `path` is only used for error messages.
pub fn parse_recipe(name: &str, content: &str, path: &Path) -> Result<Recipe> {
    let mut recipe: Recipe = serde_yaml::from_str(content).map_err(|e| Error::InvalidRecipe {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    recipe.name = name.to_string();
    Ok(recipe)
}

/// Parse a recipe from a file
pub fn parse_recipe_file(name: &str, path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
        context: format!("Failed to read recipe file {}", path.display()),
        source: e,
    })?;

    parse_recipe(name, &content, path)
}

/// Validate a recipe for completeness and correctness
///
/// Hard problems are errors; soft ones come back as warnings.
pub fn validate_recipe(recipe: &Recipe, path: &Path) -> Result<Vec<String>> {
    let invalid = |reason: String| Error::InvalidRecipe {
        path: path.to_path_buf(),
        reason,
    };
    let mut warnings = Vec::new();

    // version and repo go verbatim into the checkout ref, the image tag and
    // command arguments
    let version = recipe.version.as_str();
    if version.trim().is_empty() {
        return Err(invalid("version cannot be empty".to_string()));
    }
    if version.trim() != version {
        return Err(invalid(format!(
            "version must not have surrounding whitespace: {:?}",
            version
        )));
    }
    if version.starts_with('-') {
        return Err(invalid(format!("version must not start with '-': {}", version)));
    }

    let repo = recipe.upstream.repo.as_str();
    if repo.trim().is_empty() {
        return Err(invalid("upstream.repo cannot be empty".to_string()));
    }
    if repo.trim() != repo {
        return Err(invalid(format!(
            "upstream.repo must not have surrounding whitespace: {:?}",
            repo
        )));
    }
    if repo.starts_with('-') {
        return Err(invalid(format!("upstream.repo must not start with '-': {}", repo)));
    }

    // A prefixed version would produce refs like "vv1.2.0"
    if let TagPrefix::Prefix(prefix) = &recipe.upstream.tag_prefix
        && recipe.version.starts_with(prefix.as_str())
    {
        return Err(invalid(format!(
            "ambiguous checkout ref: version {:?} already starts with tagPrefix {:?}",
            recipe.version, prefix
        )));
    }

    let checkout_ref = recipe.checkout_ref();
    if checkout_ref.starts_with('-') {
        return Err(invalid(format!(
            "checkout ref must not start with '-': {}",
            checkout_ref
        )));
    }
    if checkout_ref.chars().any(char::is_whitespace) {
        return Err(invalid(format!(
            "checkout ref must not contain whitespace: {:?}",
            checkout_ref
        )));
    }

    for (i, step) in recipe.build.steps.iter().enumerate() {
        if step.trim().is_empty() {
            return Err(invalid(format!("build step {} is empty", i + 1)));
        }
    }

    if recipe.build.steps.is_empty() {
        warnings.push("No build steps; source will be packaged as fetched".to_string());
    }

    Ok(warnings)
}

/// Resolves recipe names to files under a recipes root
#[derive(Debug, Clone)]
pub struct RecipeLoader {
    root: PathBuf,
}

impl RecipeLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the recipe file for `name`
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        check_name(name, &self.root)?;

        for ext in RECIPE_EXTENSIONS {
            let path = self.root.join(format!("{}.{}", name, ext));
            if path.is_file() {
                return Ok(path);
            }
        }

        Err(Error::RecipeNotFound {
            name: name.to_string(),
            path: self.root.join(format!("{}.{}", name, RECIPE_EXTENSIONS[0])),
        })
    }

    /// Locate, parse and validate the recipe for `name`
    ///
    /// Returns the recipe together with any validation warnings.
    pub fn load(&self, name: &str) -> Result<(Recipe, Vec<String>)> {
        let path = self.locate(name)?;
        debug!("Loading recipe {} from {}", name, path.display());

        let recipe = parse_recipe_file(name, &path)?;
        let warnings = validate_recipe(&recipe, &path)?;
        Ok((recipe, warnings))
    }
}

/// Recipe names double as file and directory names
fn check_name(name: &str, root: &Path) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_whitespace);

    if bad {
        return Err(Error::InvalidRecipe {
            path: root.join(name),
            reason: format!("invalid recipe name: {:?}", name),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FOO: &str = r#"
version: "1.2.0"
upstream:
  repo: https://example/foo.git
  tagPrefix: v
build:
  steps:
    - echo hello
    - make
    - make install
"#;

    fn parse(content: &str) -> Result<Recipe> {
        parse_recipe("foo", content, Path::new("recipes/foo.yaml"))
    }

    #[test]
    fn test_parse_valid_recipe() {
        let recipe = parse(FOO).unwrap();
        assert_eq!(recipe.name, "foo");
        assert_eq!(recipe.version, "1.2.0");
        assert_eq!(recipe.upstream.repo, "https://example/foo.git");
        assert_eq!(recipe.upstream.tag_prefix, TagPrefix::Prefix("v".to_string()));
        assert_eq!(recipe.build.steps, vec!["echo hello", "make", "make install"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(FOO).unwrap(), parse(FOO).unwrap());
    }

    #[test]
    fn test_parse_without_tag_prefix() {
        let content = r#"
version: "2.0"
upstream:
  repo: https://example/bar.git
build:
  steps: []
"#;
        let recipe = parse(content).unwrap();
        assert_eq!(recipe.upstream.tag_prefix, TagPrefix::None);
        assert_eq!(recipe.checkout_ref(), "2.0");
    }

    #[test]
    fn test_parse_missing_version() {
        let content = r#"
upstream:
  repo: https://example/foo.git
build:
  steps: [make]
"#;
        let err = parse(content).unwrap_err();
        assert!(matches!(err, Error::InvalidRecipe { .. }));
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_parse_missing_steps() {
        let content = r#"
version: "1.0"
upstream:
  repo: https://example/foo.git
build: {}
"#;
        assert!(parse(content).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let content = r#"
version: "1.0"
upstream:
  repo: https://example/foo.git
  branch: main
build:
  steps: [make]
"#;
        assert!(parse(content).is_err());
    }

    #[test]
    fn test_validate_empty_version() {
        let content = r#"
version: ""
upstream:
  repo: https://example/foo.git
build:
  steps: [make]
"#;
        let recipe = parse(content).unwrap();
        assert!(validate_recipe(&recipe, Path::new("foo.yaml")).is_err());
    }

    #[test]
    fn test_validate_ambiguous_prefix() {
        let content = r#"
version: v1.2.0
upstream:
  repo: https://example/foo.git
  tagPrefix: v
build:
  steps: [make]
"#;
        let recipe = parse(content).unwrap();
        let err = validate_recipe(&recipe, Path::new("foo.yaml")).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_validate_ref_that_looks_like_an_option() {
        for prefix in ["-", "--"] {
            let content = format!(
                "version: \"1.2.0\"\nupstream:\n  repo: https://example/foo.git\n  tagPrefix: \"{}\"\nbuild:\n  steps: [make]\n",
                prefix
            );
            let recipe = parse(&content).unwrap();
            let err = validate_recipe(&recipe, Path::new("foo.yaml")).unwrap_err();
            assert!(err.to_string().contains("checkout ref"), "{}", err);
        }
    }

    #[test]
    fn test_validate_version_with_whitespace() {
        for version in [" 1.2.0", "1.2.0 ", "1.2 .0"] {
            let content = format!(
                "version: \"{}\"\nupstream:\n  repo: https://example/foo.git\nbuild:\n  steps: [make]\n",
                version
            );
            let recipe = parse(&content).unwrap();
            assert!(
                matches!(
                    validate_recipe(&recipe, Path::new("foo.yaml")),
                    Err(Error::InvalidRecipe { .. })
                ),
                "version {:?} should be rejected",
                version
            );
        }
    }

    #[test]
    fn test_validate_blank_step() {
        let content = r#"
version: "1.0"
upstream:
  repo: https://example/foo.git
build:
  steps: [make, "  "]
"#;
        let recipe = parse(content).unwrap();
        assert!(validate_recipe(&recipe, Path::new("foo.yaml")).is_err());
    }

    #[test]
    fn test_validate_warns_on_no_steps() {
        let content = r#"
version: "1.0"
upstream:
  repo: https://example/foo.git
build:
  steps: []
"#;
        let recipe = parse(content).unwrap();
        let warnings = validate_recipe(&recipe, Path::new("foo.yaml")).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_loader_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = RecipeLoader::new(dir.path());
        let err = loader.load("missing").unwrap_err();
        assert!(matches!(err, Error::RecipeNotFound { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_loader_finds_yml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("foo.yml"), FOO).unwrap();
        let loader = RecipeLoader::new(dir.path());
        let (recipe, warnings) = loader.load("foo").unwrap();
        assert_eq!(recipe.checkout_ref(), "v1.2.0");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_loader_rejects_path_names() {
        let dir = TempDir::new().unwrap();
        let loader = RecipeLoader::new(dir.path());
        for name in ["../etc/passwd", "a/b", "", ".hidden"] {
            assert!(
                matches!(loader.locate(name), Err(Error::InvalidRecipe { .. })),
                "name {:?} should be rejected",
                name
            );
        }
    }
}
