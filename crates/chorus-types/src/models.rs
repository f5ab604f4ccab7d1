use serde::{Deserialize, Serialize};

/// What caused a notification. Stored as the SCREAMING_SNAKE tag in the
/// `notifications.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Comment,
    Like,
    Vote,
    FriendRequest,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Comment => "COMMENT",
            NotificationKind::Like => "LIKE",
            NotificationKind::Vote => "VOTE",
            NotificationKind::FriendRequest => "FRIEND_REQUEST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMMENT" => Some(NotificationKind::Comment),
            "LIKE" => Some(NotificationKind::Like),
            "VOTE" => Some(NotificationKind::Vote),
            "FRIEND_REQUEST" => Some(NotificationKind::FriendRequest),
            _ => None,
        }
    }
}

/// Friend-request lifecycle. A declined request is deleted, so only the
/// surviving states exist in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(RequestStatus::Pending),
            "ACCEPTED" => Some(RequestStatus::Accepted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Up => "UP",
            VoteKind::Down => "DOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(VoteKind::Up),
            "DOWN" => Some(VoteKind::Down),
            _ => None,
        }
    }
}

/// Hosting services we know how to turn into an embeddable fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistProvider {
    YouTube,
    AppleMusic,
    Spotify,
}

impl PlaylistProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistProvider::YouTube => "youtube",
            PlaylistProvider::AppleMusic => "applemusic",
            PlaylistProvider::Spotify => "spotify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "youtube" => Some(PlaylistProvider::YouTube),
            "applemusic" => Some(PlaylistProvider::AppleMusic),
            "spotify" => Some(PlaylistProvider::Spotify),
            _ => None,
        }
    }
}
