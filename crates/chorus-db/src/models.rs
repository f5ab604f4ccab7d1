//! Database row types, mapping directly to SQLite rows. Distinct from the
//! chorus-types API models so the DB layer stays independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

pub struct FriendRequestRow {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub recipient_id: String,
    pub status: String,
    pub created_at: String,
}

/// One friendship edge resolved to the user on the other side.
pub struct FriendRow {
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub friends_since: String,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub published: bool,
    pub created_at: String,
}

/// Post with its like count, for the trending section of the feed.
pub struct RankedPostRow {
    pub post: PostRow,
    pub like_count: i64,
}

pub struct PostTagRow {
    pub post_id: String,
    pub tag_name: String,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub body: String,
    pub created_at: String,
}

pub struct LikeRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created_at: String,
}

pub struct VoteRow {
    pub id: String,
    pub comment_id: String,
    pub user_id: String,
    pub kind: String,
    pub created_at: String,
}

pub struct TagRow {
    pub id: String,
    pub name: String,
}

pub struct NotificationRow {
    pub id: String,
    pub kind: String,
    pub recipient_id: String,
    pub trigger_user_id: String,
    pub trigger_username: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

pub struct PlaylistRow {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub url: String,
    pub provider: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub embed_code: String,
    pub created_at: String,
}
