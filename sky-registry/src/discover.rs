//! Operation discovery over a backend's declared member table.
//!
//! Discovery is a pure filter-and-enrich pass: private members and members
//! without a recognized verb prefix are skipped, documentation yields the
//! summary and per-parameter descriptions, and the surviving members become
//! operation descriptors sorted by name.

use std::collections::BTreeMap;

use sky_primitives::{OperationDescriptor, ParameterDescriptor};
use sky_services::{MemberSpec, ParamSpec};

/// Verb prefixes that mark a member as dispatchable.
const VERB_PREFIXES: &[&str] = &[
    "query_",
    "get_",
    "list_",
    "search_",
    "download_",
    "fetch_",
    "resolve_",
    "find_",
    "locate_",
    "cone_search",
];

/// Builds operation descriptors from a module's member table.
///
/// The result is deterministic for a fixed table: members are filtered by
/// the dispatch rules and sorted by operation name.
#[must_use]
pub fn discover_operations(module_id: &str, members: &[MemberSpec]) -> Vec<OperationDescriptor> {
    let mut operations: Vec<OperationDescriptor> = members
        .iter()
        .filter(|member| is_dispatchable(member.name()))
        .map(|member| describe(module_id, member))
        .collect();
    operations.sort_by(|a, b| a.name().cmp(b.name()));
    operations
}

fn is_dispatchable(name: &str) -> bool {
    if name.starts_with('_') {
        return false;
    }
    VERB_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn describe(module_id: &str, member: &MemberSpec) -> OperationDescriptor {
    let descriptions = parse_parameter_docs(member.doc());
    let summary = member
        .doc()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let parameters = member
        .params()
        .iter()
        .enumerate()
        .map(|(position, param)| {
            let mut descriptor = parameter_descriptor(param, position);
            if let Some(description) = descriptions.get(descriptor.name()) {
                descriptor = descriptor.with_description(description.clone());
            }
            descriptor
        })
        .collect();

    OperationDescriptor::new(member.name(), module_id, parameters, summary)
}

fn parameter_descriptor(param: &ParamSpec, position: usize) -> ParameterDescriptor {
    if param.is_variadic() {
        // Variable-arity keyword markers surface as one optional mapping.
        return ParameterDescriptor::optional(
            "kwargs",
            "mapping",
            serde_json::json!({}),
            position,
        );
    }
    match param.default() {
        None => ParameterDescriptor::required(param.name(), param.type_hint(), position),
        Some(default) => ParameterDescriptor::optional(
            param.name(),
            param.type_hint(),
            default.clone(),
            position,
        ),
    }
}

/// Extracts `name : description` entries from a numpy-style `Parameters`
/// section.
///
/// Lines before the section header are ignored; the section ends at the
/// next blank-line-delimited header or the end of the text. Parsing is
/// best-effort and never fails.
#[must_use]
pub fn parse_parameter_docs(doc: &str) -> BTreeMap<String, String> {
    let mut descriptions = BTreeMap::new();
    let mut lines = doc.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if line != "Parameters" {
            continue;
        }
        // Header underline.
        if lines.peek().is_some_and(|next| next.starts_with("---")) {
            lines.next();
        }
        for entry in lines.by_ref() {
            if entry.is_empty() {
                break;
            }
            if let Some((name, description)) = entry.split_once(" : ") {
                descriptions.insert(name.trim().to_owned(), description.trim().to_owned());
            }
        }
        break;
    }

    descriptions
}
