/// Store-assigned identity of a post.
pub type PostId = i64;

/// Identity of a user, as issued by the authentication service.
pub type UserId = i64;

/// The caller of a read operation. `None` means anonymous.
pub type Viewer = Option<UserId>;

/// Maps the raw user id found on a request to a [`Viewer`]: `0` is the anonymous caller.
pub fn viewer(raw_user_id: i64) -> Viewer {
    (raw_user_id != 0).then_some(raw_user_id)
}
