//! Handler dispatch: sub-resource query parameters select the handler.
//!
//! Dispatch is a pure function from the validated request's resource
//! identifiers and query parameters to a closed [`HandlerKind`] enumeration.
//! It is evaluated as a fixed priority list: the first matching sub-resource
//! wins and later rules are never reached. Downstream code switches
//! exhaustively on the tag; the handlers themselves live outside this core.

/// Sub-resources this gateway recognizes but does not implement. Their
/// presence selects the always-failing unsupported handler.
const UNSUPPORTED_SUB_RESOURCES: &[&str] = &[
    "notification",
    "policy",
    "requestPayment",
    "torrent",
    "website",
    "cors",
    "tagging",
    "restore",
];

/// The handler that owns a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// ACL read/write (`?acl`).
    Acl,
    /// Multi-object delete (`?delete`).
    MultiObjectDelete,
    /// Bucket location (`?location`).
    Location,
    /// Bucket logging status (`?logging`).
    LoggingStatus,
    /// Single multipart part upload (`?partNumber`).
    Part,
    /// Operations on one multipart upload (`?uploadId`).
    Upload,
    /// Multipart initiate/list (`?uploads`).
    Uploads,
    /// Bucket versioning (`?versioning`).
    Versioning,
    /// A recognized but unimplemented sub-resource; always fails.
    Unsupported,
    /// Plain object operation.
    Object,
    /// Plain bucket operation.
    Bucket,
    /// Account-level (service) operation.
    Service,
}

impl HandlerKind {
    /// A short tag for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::MultiObjectDelete => "multi-object-delete",
            Self::Location => "location",
            Self::LoggingStatus => "logging-status",
            Self::Part => "part",
            Self::Upload => "upload",
            Self::Uploads => "uploads",
            Self::Versioning => "versioning",
            Self::Unsupported => "unsupported",
            Self::Object => "object",
            Self::Bucket => "bucket",
            Self::Service => "service",
        }
    }
}

/// The resource level a request addresses; selects the status-translation
/// tables for the backend's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// No container in the path: the whole account.
    Service,
    /// A container without an object.
    Bucket,
    /// A container plus an object.
    Object,
}

impl ResourceKind {
    /// Derive the resource kind from which identifiers are set.
    #[must_use]
    pub fn of(container: Option<&str>, object: Option<&str>) -> Self {
        match (container, object) {
            (Some(_), Some(_)) => Self::Object,
            (Some(_), None) => Self::Bucket,
            (None, _) => Self::Service,
        }
    }
}

/// Select the handler for a request. First match wins.
#[must_use]
pub fn dispatch(
    container: Option<&str>,
    object: Option<&str>,
    params: &[(String, String)],
) -> HandlerKind {
    if has_param(params, "acl") {
        return HandlerKind::Acl;
    }
    if has_param(params, "delete") {
        return HandlerKind::MultiObjectDelete;
    }
    if has_param(params, "location") {
        return HandlerKind::Location;
    }
    if has_param(params, "logging") {
        return HandlerKind::LoggingStatus;
    }
    if has_param(params, "partNumber") {
        return HandlerKind::Part;
    }
    if has_param(params, "uploadId") {
        return HandlerKind::Upload;
    }
    if has_param(params, "uploads") {
        return HandlerKind::Uploads;
    }
    if has_param(params, "versioning") {
        return HandlerKind::Versioning;
    }

    if params
        .iter()
        .any(|(key, _)| UNSUPPORTED_SUB_RESOURCES.contains(&key.as_str()))
    {
        return HandlerKind::Unsupported;
    }

    match ResourceKind::of(container, object) {
        ResourceKind::Object => HandlerKind::Object,
        ResourceKind::Bucket => HandlerKind::Bucket,
        ResourceKind::Service => HandlerKind::Service,
    }
}

/// Whether a query parameter is present, regardless of value.
fn has_param(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(keys: &[&str]) -> Vec<(String, String)> {
        keys.iter().map(|k| ((*k).to_owned(), String::new())).collect()
    }

    #[test]
    fn test_should_dispatch_sub_resources_in_priority_order() {
        // uploadId outranks versioning even though both are present.
        let both = params(&["versioning", "uploadId"]);
        assert_eq!(
            dispatch(Some("bucket"), Some("key"), &both),
            HandlerKind::Upload
        );

        // acl outranks everything.
        let acl_first = params(&["delete", "acl"]);
        assert_eq!(dispatch(Some("bucket"), None, &acl_first), HandlerKind::Acl);

        // partNumber outranks uploadId.
        let part = params(&["uploadId", "partNumber"]);
        assert_eq!(
            dispatch(Some("bucket"), Some("key"), &part),
            HandlerKind::Part
        );
    }

    #[test]
    fn test_should_dispatch_each_sub_resource() {
        let cases = [
            ("acl", HandlerKind::Acl),
            ("delete", HandlerKind::MultiObjectDelete),
            ("location", HandlerKind::Location),
            ("logging", HandlerKind::LoggingStatus),
            ("partNumber", HandlerKind::Part),
            ("uploadId", HandlerKind::Upload),
            ("uploads", HandlerKind::Uploads),
            ("versioning", HandlerKind::Versioning),
        ];
        for (key, expected) in cases {
            assert_eq!(
                dispatch(Some("bucket"), Some("key"), &params(&[key])),
                expected,
                "sub-resource {key}"
            );
        }
    }

    #[test]
    fn test_should_dispatch_unsupported_sub_resources() {
        for &key in UNSUPPORTED_SUB_RESOURCES {
            assert_eq!(
                dispatch(Some("bucket"), None, &params(&[key])),
                HandlerKind::Unsupported,
                "sub-resource {key}"
            );
        }
    }

    #[test]
    fn test_should_prefer_supported_over_unsupported_sub_resources() {
        let mixed = params(&["tagging", "versioning"]);
        assert_eq!(
            dispatch(Some("bucket"), None, &mixed),
            HandlerKind::Versioning
        );
    }

    #[test]
    fn test_should_fall_back_on_resource_identifiers() {
        assert_eq!(
            dispatch(Some("bucket"), Some("key"), &[]),
            HandlerKind::Object
        );
        assert_eq!(dispatch(Some("bucket"), None, &[]), HandlerKind::Bucket);
        assert_eq!(dispatch(None, None, &[]), HandlerKind::Service);
    }

    #[test]
    fn test_should_ignore_unrecognized_parameters() {
        let noise = params(&["prefix", "max-keys"]);
        assert_eq!(dispatch(Some("bucket"), None, &noise), HandlerKind::Bucket);
    }

    #[test]
    fn test_should_derive_resource_kind_from_identifiers() {
        assert_eq!(
            ResourceKind::of(Some("b"), Some("k")),
            ResourceKind::Object
        );
        assert_eq!(ResourceKind::of(Some("b"), None), ResourceKind::Bucket);
        assert_eq!(ResourceKind::of(None, None), ResourceKind::Service);
    }
}
