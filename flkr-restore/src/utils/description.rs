//! Description text sent to the destination

/// Longest description the media item API accepts
///
/// See <https://developers.google.com/photos/library/reference/rest/v1/mediaItems/batchCreate#NewMediaItem>
pub const MAX_DESCRIPTION_CHARS: usize = 909;

/// Sent instead of a description that is too long
pub const DESCRIPTION_PLACEHOLDER: &str = "Too much description text";

/// Decode the HTML entities Flickr leaves in exported text and apply the length cap
///
/// `subject` names what the description belongs to, for the log line.
pub fn convert_description(description: &str, subject: &str) -> String {
    let decoded = description.replace("&quot;", "\"").replace("&amp;", "&");

    if decoded.chars().count() > MAX_DESCRIPTION_CHARS {
        tracing::info!("replaced Too much description text for {}", subject);
        return DESCRIPTION_PLACEHOLDER.to_string();
    }
    decoded
}
