//! News drafts and the payload posted to `/create-news`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::SubmitError;
use crate::html::serialize_document;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    #[serde(rename = "contentJSON")]
    pub content_json: Document,
    #[serde(rename = "contentHTML")]
    pub content_html: String,
    #[serde(default)]
    pub uploaded_images: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateNewsResponse {
    #[serde(default)]
    pub message: String,
}

/// What `GET /news/:id` returns. Only `content_html` is rendered.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "contentHTML")]
    pub content_html: String,
    #[serde(default)]
    pub cover_photo: Option<String>,
}

/// Same shape as the request, but tolerant of missing fields so that a
/// half-written draft still opens.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFile {
    #[serde(default)]
    title: String,
    #[serde(rename = "contentJSON", default)]
    content_json: Document,
    #[serde(default)]
    uploaded_images: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub document: Document,
    /// Urls of images this session stored on the upload server.
    pub uploaded_images: Vec<String>,
}

impl NewsDraft {
    pub fn new(title: impl Into<String>, document: Document) -> Self {
        Self {
            title: title.into(),
            document,
            uploaded_images: Vec::new(),
        }
    }

    pub fn record_upload(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.uploaded_images.contains(&url) {
            self.uploaded_images.push(url);
        }
    }

    /// Payload as it stands, without validation. Uploads no longer referenced
    /// by the document are dropped.
    pub fn payload(&self) -> CreateNewsRequest {
        let referenced = self.document.image_urls();
        CreateNewsRequest {
            title: self.title.trim().to_string(),
            content_json: self.document.clone(),
            content_html: serialize_document(&self.document),
            uploaded_images: self
                .uploaded_images
                .iter()
                .filter(|url| referenced.contains(url))
                .cloned()
                .collect(),
        }
    }

    /// The request to post, or the reason it must not be sent.
    pub fn submission(&self) -> Result<CreateNewsRequest, SubmitError> {
        if self.title.trim().is_empty() {
            return Err(SubmitError::MissingTitle);
        }
        if self.document.is_blank() {
            return Err(SubmitError::EmptyDocument);
        }
        Ok(self.payload())
    }

    pub fn load(path: &Path) -> Result<Self, SubmitError> {
        let content = fs::read_to_string(path)?;
        let file: DraftFile = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded draft");
        Ok(Self {
            title: file.title,
            document: file.content_json,
            uploaded_images: file.uploaded_images,
        })
    }

    /// Opens `path`, or starts an empty draft if it does not exist yet.
    pub fn load_or_new(path: &Path) -> Result<Self, SubmitError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SubmitError> {
        let json = serde_json::to_string_pretty(&self.payload())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), "saved draft");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockType, TreeNode};

    fn story() -> Document {
        Document::from_tree(vec![
            TreeNode::element(BlockType::HeadingOne, vec![TreeNode::text("Storm")]),
            TreeNode::paragraph("Power is back."),
        ])
    }

    #[test]
    fn fresh_draft_is_rejected_before_sending() {
        let draft = NewsDraft::new("Update", Document::new());
        assert!(matches!(draft.submission(), Err(SubmitError::EmptyDocument)));
    }

    #[test]
    fn whitespace_only_content_counts_as_empty() {
        let draft = NewsDraft::new("Update", Document::from_tree(vec![TreeNode::paragraph("  \n ")]));
        assert!(matches!(draft.submission(), Err(SubmitError::EmptyDocument)));
    }

    #[test]
    fn image_alone_is_content() {
        let draft = NewsDraft::new(
            "Photo",
            Document::from_tree(vec![TreeNode::image("https://cdn.example/a.png"), TreeNode::paragraph("")]),
        );
        assert!(draft.submission().is_ok());
    }

    #[test]
    fn missing_title_is_rejected() {
        let draft = NewsDraft::new("   ", story());
        assert!(matches!(draft.submission(), Err(SubmitError::MissingTitle)));
    }

    #[test]
    fn submission_carries_json_and_html() {
        let draft = NewsDraft::new(" Storm ", story());
        let request = draft.submission().expect("valid");
        let value = serde_json::to_value(&request).expect("encodes");
        assert_eq!(value["title"], "Storm");
        assert_eq!(value["contentHTML"], "<h1>Storm</h1><p>Power is back.</p>");
        assert_eq!(value["contentJSON"][0]["type"], "heading-one");
        assert_eq!(value["contentJSON"][1]["children"][0]["text"], "Power is back.");
        assert_eq!(value["uploadedImages"], serde_json::json!([]));
    }

    #[test]
    fn unreferenced_uploads_are_not_reported() {
        let mut draft = NewsDraft::new(
            "Photos",
            Document::from_tree(vec![TreeNode::image("https://cdn.example/kept.png")]),
        );
        draft.record_upload("https://cdn.example/kept.png");
        draft.record_upload("https://cdn.example/removed.png");
        draft.record_upload("https://cdn.example/kept.png");
        assert_eq!(draft.uploaded_images.len(), 2);
        assert_eq!(
            draft.payload().uploaded_images,
            vec!["https://cdn.example/kept.png".to_string()]
        );
    }

    #[test]
    fn saved_draft_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts").join("storm.json");
        let draft = NewsDraft::new("Storm", story());
        draft.save(&path).expect("saves");

        let loaded = NewsDraft::load(&path).expect("loads");
        assert_eq!(loaded, draft);
    }

    #[test]
    fn missing_draft_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let draft = NewsDraft::load_or_new(&dir.path().join("new.json")).expect("empty");
        assert!(draft.title.is_empty());
        assert!(draft.document.is_blank());
    }

    #[test]
    fn article_response_ignores_extra_fields() {
        let article: NewsArticle = serde_json::from_str(
            r#"{"title":"T","contentHTML":"<p>x</p>","coverPhoto":"c.png","author":"someone"}"#,
        )
        .expect("decodes");
        assert_eq!(article.content_html, "<p>x</p>");
        assert_eq!(article.cover_photo.as_deref(), Some("c.png"));
    }
}
