//! Source badges

/// Engagement above this marks an article as trending
pub const TRENDING_THRESHOLD: f64 = 100.0;

/// Badge text for an origin feed
pub fn source_label(source: &str) -> String {
    source.to_uppercase()
}

/// Badge tone for an origin feed; unknown feeds share the default tone
pub fn source_tone(source: &str) -> &'static str {
    match source {
        "hackernews" => "hackernews",
        "reddit" => "reddit",
        "github" => "github",
        "newsapi" => "newsapi",
        _ => "default",
    }
}

pub fn is_trending(engagement_score: f64) -> bool {
    engagement_score > TRENDING_THRESHOLD
}
