/// The channel identifiers bound to a single creator.
///
/// A creator can be addressed through two disjoint key spaces: the legacy
/// channel id supplied at direct registration, and the YouTube channel id
/// obtained by OAuth linking.  Either may be absent, and both may be present
/// at once (a creator who used both registration paths).  A given value is
/// bound to at most one creator across both spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub legacy: Option<String>,
    pub youtube: Option<String>,
}

impl ChannelIdentity {
    /// The identifier shown to clients: the YouTube id once linked,
    /// otherwise the legacy one.
    pub fn primary(&self) -> Option<&str> {
        self.youtube.as_deref().or(self.legacy.as_deref())
    }

    /// Both identifiers bound to different values.
    pub fn is_dual(&self) -> bool {
        matches!((&self.legacy, &self.youtube), (Some(l), Some(y)) if l != y)
    }

    /// Every identifier present, legacy first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.legacy
            .as_deref()
            .into_iter()
            .chain(self.youtube.as_deref())
    }
}

/// How a caller addresses a creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorLookup {
    /// A channel id, matched against the legacy and YouTube key spaces together.
    Channel(String),
    /// A wallet address.
    Wallet(String),
}

impl CreatorLookup {
    /// Build a lookup from optional request parameters.
    ///
    /// The channel id wins when both are supplied.  Empty strings count as
    /// absent.  Returns `None` when neither is usable.
    pub fn from_params(channel_id: Option<String>, wallet_address: Option<String>) -> Option<Self> {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        non_empty(channel_id)
            .map(Self::Channel)
            .or_else(|| non_empty(wallet_address).map(Self::Wallet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(legacy: Option<&str>, youtube: Option<&str>) -> ChannelIdentity {
        ChannelIdentity {
            legacy: legacy.map(str::to_string),
            youtube: youtube.map(str::to_string),
        }
    }

    #[test]
    fn test_primary_prefers_youtube() {
        let identity = pair(Some("legacy"), Some("UCabc"));
        assert_eq!(identity.primary(), Some("UCabc"));
        assert_eq!(identity.ids().collect::<Vec<_>>(), vec!["legacy", "UCabc"]);
        assert!(identity.is_dual());
    }

    #[test]
    fn test_legacy_only_identity() {
        let identity = pair(Some("chan1"), None);
        assert_eq!(identity.primary(), Some("chan1"));
        assert_eq!(identity.ids().collect::<Vec<_>>(), vec!["chan1"]);
        assert!(!identity.is_dual());
        assert_eq!(ChannelIdentity::default().ids().count(), 0);
    }

    #[test]
    fn test_same_value_in_both_slots_is_not_dual() {
        assert!(!pair(Some("UCabc"), Some("UCabc")).is_dual());
    }

    #[test]
    fn test_lookup_channel_takes_priority() {
        let lookup = CreatorLookup::from_params(Some("chan".into()), Some("wallet".into()));
        assert_eq!(lookup, Some(CreatorLookup::Channel("chan".into())));
    }

    #[test]
    fn test_lookup_falls_back_to_wallet() {
        let lookup = CreatorLookup::from_params(Some("  ".into()), Some("wallet".into()));
        assert_eq!(lookup, Some(CreatorLookup::Wallet("wallet".into())));
        assert_eq!(CreatorLookup::from_params(None, None), None);
    }
}
