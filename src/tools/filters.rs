//! Extension shorthands shared by `index` and the query commands.

use std::collections::BTreeSet;

/// Extensions selected by `--img`.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "heic", "webp", "gif", "tiff"];

/// Builds an extension allow-set from the CLI shorthands.
///
/// `extra` entries are lowercased and may carry a leading dot. An empty
/// result means "no filter".
#[must_use]
pub fn extension_filter(pdf: bool, img: bool, extra: &[String]) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    if pdf {
        set.insert("pdf".to_string());
    }
    if img {
        set.extend(IMAGE_EXTENSIONS.iter().map(|e| (*e).to_string()));
    }
    for e in extra {
        let e = e.trim().trim_start_matches('.').to_lowercase();
        if !e.is_empty() {
            set.insert(e);
        }
    }
    set
}
