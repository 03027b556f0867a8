use url::Url;

use crate::error::{RecapError, Result};

/// Extract a video identifier from a user-supplied YouTube URL.
///
/// Long-form URLs carry the id in the `v` query parameter; an empty `v=` is
/// treated as absent. Shortened URLs (youtu.be) carry it as the last path
/// segment, and a trailing slash shifts it one segment back.
pub fn resolve_video_id(raw_url: &str) -> Result<String> {
    let parsed = Url::parse(raw_url).map_err(|_| RecapError::InvalidUrl {
        url: raw_url.to_string(),
    })?;

    if let Some((_, value)) = parsed
        .query_pairs()
        .find(|(key, value)| key == "v" && !value.is_empty())
    {
        return Ok(value.into_owned());
    }

    let mut segments: Vec<&str> = parsed.path().split('/').collect();
    let mut candidate = segments.pop().unwrap_or_default();
    if candidate.is_empty() {
        candidate = segments.pop().unwrap_or_default();
    }

    if candidate.is_empty() {
        return Err(RecapError::InvalidUrl {
            url: raw_url.to_string(),
        });
    }

    Ok(candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_watch_url() {
        let id = resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn v_parameter_among_other_query_parameters() {
        let id = resolve_video_id("https://www.youtube.com/watch?feature=share&v=abc123&t=42s")
            .unwrap();
        assert_eq!(id, "abc123");
    }

    #[test]
    fn shortened_url() {
        let id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn shortened_url_with_trailing_slash() {
        let id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ/").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn empty_v_parameter_falls_through_to_path() {
        let id = resolve_video_id("https://youtu.be/xyz789?v=").unwrap();
        assert_eq!(id, "xyz789");
    }

    #[test]
    fn empty_path_and_no_v_parameter_is_invalid() {
        let result = resolve_video_id("https://youtu.be");
        assert!(matches!(result, Err(RecapError::InvalidUrl { .. })));
    }

    #[test]
    fn empty_v_parameter_and_empty_path_is_invalid() {
        let result = resolve_video_id("https://www.youtube.com/?v=");
        assert!(matches!(result, Err(RecapError::InvalidUrl { .. })));
    }

    #[test]
    fn unparseable_url_is_invalid() {
        let result = resolve_video_id("not a url at all");
        assert!(matches!(result, Err(RecapError::InvalidUrl { .. })));
    }
}
