use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Pages Service
///
/// Serves the statically exported dashboard. Directory requests resolve to their `index.html`,
/// and unknown paths fall back to the export's `404.html`.
pub fn pages_service(static_dir: &str) -> ServeDir<tower_http::set_status::SetStatus<ServeFile>> {
    let root = Path::new(static_dir);
    ServeDir::new(root)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(root.join("404.html")))
}
