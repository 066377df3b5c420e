use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{UploadErrorCode, UploadedFile};
use crate::protocol::UploadError;

/// Uploaded files keyed by form field name.
pub type UploadedFiles = BTreeMap<String, UploadedFileNode>;

/// A single upload, or a group of them under a bracketed field name such as `photos[]`.
#[derive(Debug, Clone)]
pub enum UploadedFileNode {
    File(UploadedFile),
    Nested(UploadedFiles),
}

impl UploadedFileNode {
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadedFileNode::File(file) => Some(file),
            UploadedFileNode::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&UploadedFiles> {
        match self {
            UploadedFileNode::File(_) => None,
            UploadedFileNode::Nested(files) => Some(files),
        }
    }
}

impl From<UploadedFile> for UploadedFileNode {
    fn from(file: UploadedFile) -> Self {
        UploadedFileNode::File(file)
    }
}

impl From<UploadedFiles> for UploadedFileNode {
    fn from(files: UploadedFiles) -> Self {
        UploadedFileNode::Nested(files)
    }
}

fn children(value: &Value) -> Option<Vec<(String, &Value)>> {
    match value {
        Value::Object(map) => Some(map.iter().map(|(key, value)| (key.clone(), value)).collect()),
        Value::Array(items) => Some(items.iter().enumerate().map(|(index, value)| (index.to_string(), value)).collect()),
        _ => None,
    }
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Build an upload tree from upload descriptions keyed by form field name.
///
/// Each entry is either a single specification (`tmp_name`, `size`, `error` and the
/// optional `name` and `type`), a specification whose fields are parallel trees
/// (`{"tmp_name": ["a", "b"], "size": [1, 2], ...}`), or a group of entries.
pub fn normalize_specs(specs: &Value) -> Result<UploadedFiles, UploadError> {
    let entries = children(specs).ok_or_else(|| UploadError::malformed_spec("expected a group of file specifications"))?;

    let mut files = UploadedFiles::new();
    for (key, value) in entries {
        let node = match value {
            Value::Object(spec) => match spec.get("tmp_name") {
                Some(Value::String(_)) => UploadedFileNode::File(file_from_spec(spec)?),
                Some(tmp_names) if is_container(tmp_names) => UploadedFileNode::Nested(normalize_parallel(spec, tmp_names)?),
                Some(_) => return Err(UploadError::malformed_spec(format!("invalid tmp_name for {key:?}"))),
                None => UploadedFileNode::Nested(normalize_specs(value)?),
            },
            Value::Array(_) => UploadedFileNode::Nested(normalize_specs(value)?),
            _ => return Err(UploadError::malformed_spec(format!("malformed file upload for {key:?}"))),
        };
        files.insert(key, node);
    }

    Ok(files)
}

fn normalize_parallel(spec: &Map<String, Value>, tmp_names: &Value) -> Result<UploadedFiles, UploadError> {
    let (Some(sizes), Some(errors)) = (spec.get("size").filter(|v| is_container(v)), spec.get("error").filter(|v| is_container(v)))
    else {
        return Err(UploadError::malformed_spec(
            "nested specifications must carry tmp_name, size and error as parallel trees",
        ));
    };

    normalize_tree(tmp_names, sizes, errors, spec.get("name"), spec.get("type"))
}

fn normalize_tree(
    tmp_names: &Value,
    sizes: &Value,
    errors: &Value,
    names: Option<&Value>,
    types: Option<&Value>,
) -> Result<UploadedFiles, UploadError> {
    let mut files = UploadedFiles::new();

    for (key, tmp_name) in children(tmp_names).unwrap_or_default() {
        let size = child(sizes, &key);
        let error = child(errors, &key);
        let name = names.and_then(|names| child(names, &key));
        let media_type = types.and_then(|types| child(types, &key));

        let node = if is_container(tmp_name) {
            let missing = || UploadError::malformed_spec(format!("size and error trees do not match tmp_name at {key:?}"));
            UploadedFileNode::Nested(normalize_tree(
                tmp_name,
                size.filter(|size| is_container(size)).ok_or_else(missing)?,
                error.filter(|error| is_container(error)).ok_or_else(missing)?,
                name,
                media_type,
            )?)
        } else {
            UploadedFileNode::File(file_from_parts(tmp_name, size, error, name, media_type)?)
        };
        files.insert(key, node);
    }

    Ok(files)
}

/// Build one upload from a single upload description.
pub(crate) fn file_from_spec(spec: &Map<String, Value>) -> Result<UploadedFile, UploadError> {
    let tmp_name = spec.get("tmp_name").ok_or_else(|| UploadError::malformed_spec("missing tmp_name"))?;
    file_from_parts(tmp_name, spec.get("size"), spec.get("error"), spec.get("name"), spec.get("type"))
}

fn file_from_parts(
    tmp_name: &Value,
    size: Option<&Value>,
    error: Option<&Value>,
    name: Option<&Value>,
    media_type: Option<&Value>,
) -> Result<UploadedFile, UploadError> {
    let tmp_name = tmp_name.as_str().ok_or_else(|| UploadError::malformed_spec("tmp_name must be a string"))?;

    let error = match error {
        None | Some(Value::Null) => UploadErrorCode::Ok,
        Some(code) => code
            .as_u64()
            .and_then(|code| u8::try_from(code).ok())
            .ok_or_else(|| UploadError::malformed_spec(format!("invalid upload error code {code}")))
            .and_then(UploadErrorCode::try_from)?,
    };

    let mut builder = UploadedFile::from_path(tmp_name).error(error);
    match size {
        None | Some(Value::Null) => {}
        Some(size) => {
            let size = size.as_u64().ok_or_else(|| UploadError::malformed_spec(format!("invalid upload size {size}")))?;
            builder = builder.size(size);
        }
    }
    if let Some(name) = name.and_then(Value::as_str) {
        builder = builder.client_filename(name);
    }
    if let Some(media_type) = media_type.and_then(Value::as_str) {
        builder = builder.client_media_type(media_type);
    }

    Ok(builder.build())
}
