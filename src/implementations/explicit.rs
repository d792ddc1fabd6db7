//! Implementations declared inside a spec block.
//!
//! ```text
//! defineCommand({
//!   meta: { key: 'billing.charge', version: '1' },
//!   implementations: [
//!     { path: 'src/handlers/billing-charge.handler.ts', type: 'handler' },
//!   ],
//! })
//! ```
use super::ImplementationType;
use crate::classify::DEFAULT_VERSION;
use crate::document::{array_elements, define_blocks, identity_object, object_field, string_field};
use std::path::Path;

/// One entry of an `implementations` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredImplementation {
    pub path: String,
    pub impl_type: ImplementationType,
    pub description: Option<String>,
}

/// Object literal of the block declaring `key@version`, if the document has one.
pub fn spec_block<'a>(content: &'a str, key: &str, version: &str) -> Option<&'a str> {
    define_blocks(content)
        .into_iter()
        .filter_map(|block| block.object)
        .find(|object| {
            let identity = identity_object(object);
            string_field(identity, "key").as_deref() == Some(key)
                && string_field(identity, "version")
                    .as_deref()
                    .unwrap_or(DEFAULT_VERSION)
                    == version
        })
}

/// Parse the `implementations` list of a spec object.
///
/// When `object` is not itself an object literal (no matching block was
/// found), the first `implementations:` array anywhere in the text is used.
pub fn parse_implementations(object: &str) -> Vec<DeclaredImplementation> {
    let list = if object.trim_start().starts_with('{') {
        object_field(object, "implementations")
    } else {
        define_blocks(object)
            .into_iter()
            .filter_map(|block| block.object)
            .find_map(|object| object_field(object, "implementations"))
    };
    list.map(array_elements)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            let path = string_field(entry, "path").filter(|path| !path.trim().is_empty())?;
            let impl_type = string_field(entry, "type")
                .map(|raw| ImplementationType::parse(&raw))
                .unwrap_or_else(|| ImplementationType::infer(Path::new(&path)));
            Some(DeclaredImplementation {
                path,
                impl_type,
                description: string_field(entry, "description"),
            })
        })
        .collect()
}
