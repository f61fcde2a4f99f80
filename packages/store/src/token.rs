/// Key under which the auth token is persisted.
pub const TOKEN_KEY: &str = "auth_token";

/// Synchronous storage for a single persisted token.
///
/// Implementations never fail loudly: a read that cannot be served returns
/// `None` and a write that cannot be performed is logged and dropped. The
/// authoritative session always lives on the backend, so losing the token only
/// means the user has to log in again.
pub trait TokenStore {
    /// Return the persisted token, if any.
    fn load(&self) -> Option<String>;

    /// Persist `token`, replacing any previous value.
    fn save(&self, token: &str);

    /// Remove the persisted token.
    fn clear(&self);
}

impl<T: TokenStore + ?Sized> TokenStore for &T {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) {
        (**self).save(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}
