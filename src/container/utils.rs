use std::collections::HashMap;

/// Splits an image reference of the form `registry/repository:tag` into its parts.
///
/// Everything before the first `/` is treated as the registry, and everything after the first
/// `:` of the remainder as the tag. Missing parts are returned as empty strings.
pub fn split_docker_image(image: &str) -> (String, String, String) {
    let (registry, repository) = match image.split_once('/') {
        Some((registry, rest)) => (registry, rest),
        None => ("", image),
    };
    let (repository, tag) = repository.split_once(':').unwrap_or((repository, ""));

    (registry.to_owned(), repository.to_owned(), tag.to_owned())
}

/// Turns a list of `KEY=VALUE` entries into a map.
///
/// Only the first `=` separates key and value. Entries without any `=` map to an empty value.
pub fn split_key_value_slice<S: AsRef<str>>(entries: &[S]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((k, v)) => (k.to_owned(), v.to_owned()),
                None => (entry.to_owned(), String::new()),
            }
        })
        .collect()
}
