use mime::Mime;
use std::path::Path;

/// Content type for a multipart part, guessed from the file extension
pub fn for_path(path: &Path) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json" | "map") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("xml") => mime::TEXT_XML,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        Some("pdf") => mime::APPLICATION_PDF,
        Some(other) => parse_extra(other),
        None => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_extra(ext: &str) -> Mime {
    let essence = match ext {
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => return mime::APPLICATION_OCTET_STREAM,
    };

    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
