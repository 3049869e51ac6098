/// Default tip amount reported for creators who never configured one.
pub const DEFAULT_TIP_AMOUNT: f64 = 0.1;

/// Number of tips returned by list endpoints when no limit is given.
pub const DEFAULT_TIP_LIST_LIMIT: u32 = 50;

/// Upper bound on the `limit` query parameter of list endpoints.
pub const MAX_TIP_LIST_LIMIT: u32 = 500;

/// OAuth scope requested from Google when linking a YouTube channel.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";
