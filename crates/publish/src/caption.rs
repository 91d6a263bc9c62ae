//! Pure caption assembly and media URL validation.

use crate::platform::Platform;

/// Marker appended when a caption is hard-truncated.
const ELLIPSIS: char = '…';

/// Image extensions the provider accepts for feed media.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Assemble a caption from campaign content.
///
/// Layout: `headline\n\nbody\n\ncta`, then `\n\n#a #b …` when hashtags are
/// present. The result is hard-truncated to the platform caption limit on
/// a char boundary, with the final char replaced by `…` when truncation
/// occurred. Deterministic: same inputs, same output.
#[must_use]
pub fn format_caption(
    headline: &str,
    body: &str,
    cta: &str,
    hashtags: &[String],
    platform: Platform,
) -> String {
    let mut caption = format!("{headline}\n\n{body}\n\n{cta}");

    if !hashtags.is_empty() {
        let tags = hashtags
            .iter()
            .map(|t| format!("#{}", t.trim_start_matches('#')))
            .collect::<Vec<_>>()
            .join(" ");
        caption.push_str("\n\n");
        caption.push_str(&tags);
    }

    let limit = platform.caption_limit();
    if caption.chars().count() > limit {
        caption = caption.chars().take(limit.saturating_sub(1)).collect();
        caption.push(ELLIPSIS);
    }
    caption
}

/// Whether `url` is an absolute URL whose path ends in a supported image
/// extension. Used as a precondition gate so no provider call is made for
/// media Instagram would reject anyway.
#[must_use]
pub fn validate_media_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}
