use typed_builder::TypedBuilder;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 5;

/// Configures a [`ShortenerService`](crate::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Origin every shortened link is built from.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
    /// Most candidates accepted in one shortening batch.
    #[builder(default = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
