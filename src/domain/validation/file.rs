//! Uploaded file declaration

use tracing::{debug, warn};

use super::parameter::{describe_properties, Parameter, ParameterBase};
use super::types::{ResolvedValue, UploadedFile, ValidationError};
use super::validation_set::FileInputs;

/// Upload ceiling used when none is configured (2 MiB)
pub const DEFAULT_UPLOAD_MAX_FILESIZE: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FileParameter {
    base: ParameterBase,
    mime_types: Option<Vec<String>>,
    max_size: Option<u64>,
    upload_ceiling: u64,
    value: Option<Option<UploadedFile>>,
}

impl FileParameter {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            base: ParameterBase::new(name, required),
            mime_types: None,
            max_size: None,
            upload_ceiling: DEFAULT_UPLOAD_MAX_FILESIZE,
            value: None,
        }
    }

    /// Largest size a `max_size` limit may take
    pub fn with_upload_ceiling(mut self, ceiling: u64) -> Self {
        self.upload_ceiling = ceiling;
        self
    }

    pub fn required(&mut self, required: bool) -> &mut Self {
        self.base.required = required;
        self
    }

    /// Accepted MIME types; an empty list removes the constraint
    pub fn mime_type<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: Vec<String> = types.into_iter().map(Into::into).collect();
        self.mime_types = if types.is_empty() { None } else { Some(types) };
        self
    }

    /// Size limit in bytes. Ignored unless positive and below the upload ceiling.
    pub fn max_size(&mut self, size: i64) -> &mut Self {
        match u64::try_from(size) {
            Ok(size) if size > 0 && size < self.upload_ceiling => self.max_size = Some(size),
            _ => warn!(
                parameter = %self.base.name,
                size,
                ceiling = self.upload_ceiling,
                "Ignoring file size limit"
            ),
        }
        self
    }

    pub fn mime_types(&self) -> Option<&[String]> {
        self.mime_types.as_deref()
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.max_size
    }

    /// The file kept by the last successful validation. `None` when never
    /// validated or when an optional file was absent.
    pub fn value(&self) -> Option<&UploadedFile> {
        self.value.as_ref().and_then(Option::as_ref)
    }

    pub fn is_valid(&mut self, inputs: &FileInputs) -> Result<(), ValidationError> {
        match self.check(inputs) {
            Ok(file) => {
                self.value = Some(file);
                Ok(())
            }
            Err(err) => {
                debug!(parameter = %self.base.name, reason = %err, "File parameter rejected");
                self.value = None;
                Err(err)
            }
        }
    }

    /// Validate without storing anything; an absent optional file yields `None`
    pub fn check(&self, inputs: &FileInputs) -> Result<Option<UploadedFile>, ValidationError> {
        let file = match self.base.lookup(inputs) {
            Some(file) => file,
            None if self.base.check_require(false) => return Ok(None),
            None => {
                return Err(ValidationError::new(format!(
                    "The file parameter \"{}\" is required and is not defined in file request parameters.",
                    self.base.name
                )))
            }
        };

        if let Some(types) = &self.mime_types {
            if !types.iter().any(|t| *t == file.mime_type) {
                return Err(ValidationError::new(format!(
                    "The mimeType \"{}\" for the file parameter \"{}\" is not valid, must be \"{}\"",
                    file.mime_type,
                    self.base.name,
                    types.join(",")
                )));
            }
        }

        if let Some(limit) = self.max_size {
            if file.size > limit {
                return Err(ValidationError::new(format!(
                    "The file parameter \"{}\" is too big, must be smaller than {}.",
                    self.base.name, limit
                )));
            }
        }

        Ok(Some(file.clone()))
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

impl Parameter for FileParameter {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_required(&self) -> bool {
        self.base.required
    }

    fn resolved(&self) -> Option<ResolvedValue> {
        self.value.clone().map(ResolvedValue::File)
    }

    fn describe(&self, full: bool) -> String {
        let mut out = self.base.name.clone();
        if full {
            out.push(':');
            describe_properties(
                &mut out,
                &[
                    ("required", self.base.required.to_string()),
                    (
                        "mimeType",
                        self.mime_types
                            .as_ref()
                            .map(|types| types.join(", "))
                            .unwrap_or_else(|| "null".to_string()),
                    ),
                    (
                        "maxSize",
                        self.max_size
                            .map(|size| size.to_string())
                            .unwrap_or_else(|| "null".to_string()),
                    ),
                ],
            );
        }
        out
    }
}
