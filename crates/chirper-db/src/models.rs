/// Database row types. These map directly to SQLite rows and stay
/// independent of the chirper-types API models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ChirpRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub message: String,
    pub liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Values needed to insert a chirp; the author's name comes from the join on read.
pub struct NewChirpRow<'a> {
    pub id: &'a str,
    pub author_id: &'a str,
    pub message: &'a str,
    pub created_at: &'a str,
}
