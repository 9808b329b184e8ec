//! Form input for posts and comments, and the field-level messages shown
//! when it does not validate.

use axum::extract::Multipart;
use bytes::Bytes;
use serde::Deserialize;

use crate::db::models::Group;
use crate::error::AppResult;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Raw post form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormErrors {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none() && self.image.is_none()
    }
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

impl PostForm {
    /// Read the `multipart/form-data` body of the create and edit pages.
    pub async fn from_multipart(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = field.text().await?,
                "group" => form.group = field.text().await?,
                "image-clear" => {
                    let value = field.text().await?;
                    form.clear_image = matches!(value.trim(), "on" | "true" | "1");
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if !(file_name.is_empty() && data.is_empty()) {
                        form.image = Some(UploadedFile { file_name, data });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn group_id(&self) -> Option<i64> {
        self.group.trim().parse().ok()
    }

    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, PostFormErrors> {
        let mut errors = PostFormErrors::default();

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.text = Some(REQUIRED.to_string());
        }

        let raw_group = self.group.trim();
        let group_id = if raw_group.is_empty() {
            None
        } else {
            match raw_group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.group = Some(INVALID_CHOICE.to_string());
                    None
                }
            }
        };

        if let Some(image) = &self.image {
            if image.data.is_empty() || imagesize::blob_size(&image.data).is_err() {
                errors.image = Some(INVALID_IMAGE.to_string());
            }
        }

        if errors.is_empty() {
            Ok(ValidPost {
                text,
                group_id,
                image: self.image.clone(),
                clear_image: self.clear_image,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, String> {
        let text = self.text.trim();
        if text.is_empty() {
            Err(REQUIRED.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}
