//! External links for a page: edit on source host, report an issue

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::config::RepositoryConfig;
use crate::doc::Document;

/// Characters left as-is in form-encoded query values
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Path segments keep `/` so nested files stay readable
const PATH_SEGMENT: &AsciiSet = &FORM_VALUE.remove(b'/').remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub edit: String,
    pub issue: String,
}

/// Builds repository URLs from a document's source file
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    repo: RepositoryConfig,
}

impl LinkBuilder {
    pub fn new(repo: RepositoryConfig) -> Self {
        Self { repo }
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/{}",
            self.repo.host.trim_end_matches('/'),
            self.repo.name.trim_matches('/')
        )
    }

    pub fn edit_url(&self, source_file: &str) -> String {
        let mut file = String::new();
        let root = self.repo.content_root.trim_matches('/');
        if !root.is_empty() {
            file.push_str(root);
            file.push('/');
        }
        file.push_str(source_file.trim_start_matches('/'));

        format!(
            "{}/blob/{}/{}",
            self.repo_url(),
            utf8_percent_encode(&self.repo.branch, PATH_SEGMENT),
            utf8_percent_encode(&file, PATH_SEGMENT)
        )
    }

    /// New-issue URL, prefilled with the page's file when given
    pub fn issue_url(&self, source_file: Option<&str>) -> String {
        let base = format!("{}/issues/new", self.repo_url());
        let Some(file) = source_file else {
            return base;
        };

        let title = format!("Issue with documentation page: {}", file);
        let body = format!(
            "## Issue Description\n\n<!-- Describe the issue you found -->\n\n## Page\n\nFile: `{}`\n\n## Additional Context\n\n<!-- Add any additional context about the issue -->",
            file
        );

        format!(
            "{}?title={}&body={}",
            base,
            form_encode(&title),
            form_encode(&body)
        )
    }

    pub fn for_document(&self, doc: &Document) -> PageLinks {
        PageLinks {
            edit: self.edit_url(&doc.source_file),
            issue: self.issue_url(Some(&doc.source_file)),
        }
    }
}

/// `application/x-www-form-urlencoded` value encoding (space as `+`)
fn form_encode(value: &str) -> String {
    value
        .split(' ')
        .map(|part| utf8_percent_encode(part, FORM_VALUE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> LinkBuilder {
        LinkBuilder::new(RepositoryConfig::default())
    }

    #[test]
    fn test_edit_url() {
        assert_eq!(
            builder().edit_url("guide/setup.mdx"),
            "https://github.com/JoeBuildsStuff/myStax/blob/main/content/docs/guide/setup.mdx"
        );
    }

    #[test]
    fn test_edit_url_encodes_spaces_and_handles_empty_root() {
        let repo = RepositoryConfig {
            host: "https://github.com/".to_string(),
            content_root: String::new(),
            ..RepositoryConfig::default()
        };
        assert_eq!(
            LinkBuilder::new(repo).edit_url("my page.md"),
            "https://github.com/JoeBuildsStuff/myStax/blob/main/my%20page.md"
        );
    }

    #[test]
    fn test_issue_url_without_file() {
        assert_eq!(
            builder().issue_url(None),
            "https://github.com/JoeBuildsStuff/myStax/issues/new"
        );
    }

    #[test]
    fn test_issue_url_with_file() {
        let url = builder().issue_url(Some("index.mdx"));
        assert!(url.starts_with(
            "https://github.com/JoeBuildsStuff/myStax/issues/new?title=Issue+with+documentation+page%3A+index.mdx&body="
        ));
        assert!(url.contains("%23%23+Issue+Description%0A%0A"));
        assert!(url.contains("File%3A+%60index.mdx%60"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_form_encode() {
        assert_eq!(form_encode("a b&c=d"), "a+b%26c%3Dd");
        assert_eq!(form_encode("x-y_z.*"), "x-y_z.*");
    }
}
