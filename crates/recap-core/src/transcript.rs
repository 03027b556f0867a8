use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RecapError, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const USER_AGENT: &str = "Mozilla/5.0";

/// One timed caption entry from a video's transcript track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Source of ordered transcript fragments for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptFragment>>;
}

/// Join fragment texts with a single space, preserving source order.
///
/// No normalization beyond the join. A transcript with no usable text is
/// rejected here so the model is never invoked on empty input.
pub fn assemble(fragments: &[TranscriptFragment]) -> Result<String> {
    if fragments.is_empty() {
        return Err(RecapError::EmptyTranscript);
    }

    let text = fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if text.trim().is_empty() {
        return Err(RecapError::EmptyTranscript);
    }

    Ok(text)
}

/// Transcript source backed by YouTube's public caption tracks.
///
/// The watch page embeds a player response JSON that lists the caption
/// tracks; the first track's timedtext document holds the cues.
pub struct YouTubeTranscriptClient {
    client: reqwest::Client,
    player_response: Regex,
}

impl YouTubeTranscriptClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            player_response: Regex::new(r#"(?s)ytInitialPlayerResponse\s*=\s*(\{.*?\});"#)
                .expect("player response pattern"),
        }
    }
}

impl Default for YouTubeTranscriptClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscriptClient {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        let unavailable = |reason: String| RecapError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason,
        };

        let watch_url = format!("{WATCH_URL}{video_id}");
        debug!(video_id, "fetching watch page");
        let page = self
            .client
            .get(&watch_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| unavailable(format!("failed to fetch watch page: {e}")))?
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read watch page: {e}")))?;

        let player_json = self
            .player_response
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .ok_or_else(|| unavailable("no player response found on watch page".to_string()))?;

        let player: serde_json::Value = serde_json::from_str(player_json.as_str())
            .map_err(|e| unavailable(format!("malformed player response: {e}")))?;

        let track_url = caption_track_url(&player).ok_or_else(|| {
            unavailable("transcripts are disabled or missing for this video".to_string())
        })?;

        debug!(video_id, "fetching caption track");
        let xml = self
            .client
            .get(track_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| unavailable(format!("failed to fetch caption track: {e}")))?
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read caption track: {e}")))?;

        let fragments = parse_timedtext(&xml).map_err(unavailable)?;
        debug!(video_id, fragments = fragments.len(), "parsed caption track");
        Ok(fragments)
    }
}

/// First caption track URL from a player response, if the video has any.
fn caption_track_url(player: &serde_json::Value) -> Option<&str> {
    player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")?
        .as_array()?
        .first()?
        .get("baseUrl")?
        .as_str()
}

/// Parse a timedtext caption document into ordered fragments.
///
/// Cue text may span nested markup, so text events are accumulated until the
/// cue closes. Timedtext double-escapes entities; one extra decode pass runs
/// after the XML unescape.
fn parse_timedtext(xml: &str) -> std::result::Result<Vec<TranscriptFragment>, String> {
    let mut reader = Reader::from_str(xml);

    let mut fragments = Vec::new();
    let mut current: Option<(f64, f64, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => {
                let start = cue_attribute(&e, "start")?;
                let duration = cue_attribute(&e, "dur")?;
                current = Some((start, duration, String::new()));
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"text" => {
                let start = cue_attribute(&e, "start")?;
                let duration = cue_attribute(&e, "dur")?;
                fragments.push(TranscriptFragment {
                    text: String::new(),
                    start,
                    duration,
                });
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    let piece = t.unescape().map_err(|e| format!("bad cue text: {e}"))?;
                    let piece = decode_html_entities(piece.trim());
                    if !piece.is_empty() {
                        if !buf.is_empty() {
                            buf.push(' ');
                        }
                        buf.push_str(&piece);
                    }
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                if let Some((start, duration, text)) = current.take() {
                    fragments.push(TranscriptFragment {
                        text,
                        start,
                        duration,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed caption document: {e}")),
        }
    }

    Ok(fragments)
}

fn cue_attribute(e: &BytesStart<'_>, name: &str) -> std::result::Result<f64, String> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|e| format!("bad cue attribute {name}: {e}"))?
        .ok_or_else(|| format!("cue is missing the {name} attribute"))?;
    let value = attr
        .unescape_value()
        .map_err(|e| format!("bad cue attribute {name}: {e}"))?;
    value
        .parse::<f64>()
        .map_err(|e| format!("cue attribute {name} is not a number: {e}"))
}

/// Entities that survive one round of XML unescaping.
fn decode_html_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}
